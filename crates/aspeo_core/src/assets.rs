//! Bundled camera models.

/// Identity pinhole camera used for the left image of camera-less pairs.
pub const BLACK_LEFT_TSAI: &str = include_str!("../assets/black_left.tsai");

/// Identity pinhole camera, offset by one unit along x, for the right image.
pub const BLACK_RIGHT_TSAI: &str = include_str!("../assets/black_right.tsai");
