//! Pair resolution: pairing files and synthesized combinations.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use super::errors::{ResolveError, ResolveResult};
use crate::config::WorkflowConfig;
use crate::models::Pair;

/// Options for reading a pairing file.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairFileOptions<'a> {
    /// Skip the first non-empty line.
    pub header: bool,
    /// Every referenced id must be one of these.
    pub known_ids: Option<&'a [String]>,
    /// Keep only the first N ids of each line.
    pub first: Option<usize>,
}

/// Read pairs from a pairing file.
pub fn read_pairs(path: &Path, options: PairFileOptions<'_>) -> ResolveResult<Vec<Pair>> {
    let content = fs::read_to_string(path).map_err(|e| ResolveError::read(path, e))?;
    parse_pairs(path, &content, options)
}

/// Parse pairing file content. `path` is only used in errors.
pub fn parse_pairs(
    path: &Path,
    content: &str,
    options: PairFileOptions<'_>,
) -> ResolveResult<Vec<Pair>> {
    let rows = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, tokens)| !tokens.is_empty())
        .skip(usize::from(options.header));

    let mut pairs = Vec::new();
    for (line, mut tokens) in rows {
        if let Some(n) = options.first {
            tokens.truncate(n);
        }
        let found = tokens.len();
        let ids = tokens.into_iter().map(str::to_string).collect();
        let pair = Pair::from_ids(ids).ok_or_else(|| ResolveError::InvalidPairWidth {
            path: path.to_path_buf(),
            line,
            found,
        })?;
        pairs.push(pair);
    }

    if let Some(known) = options.known_ids {
        check_known_ids(&pairs, known)?;
    }
    if pairs.is_empty() {
        return Err(ResolveError::EmptyPairs);
    }
    check_fragments(&pairs)?;
    Ok(pairs)
}

/// Pairs for a workflow: the pairing file when configured, otherwise every
/// 2-combination of `known_ids`.
pub fn resolve_pairs(
    config: &WorkflowConfig,
    known_ids: &[String],
    first: Option<usize>,
) -> ResolveResult<Vec<Pair>> {
    match config.pairs {
        Some(ref path) => read_pairs(
            path,
            PairFileOptions {
                header: config.pairs_header,
                known_ids: Some(known_ids),
                first,
            },
        ),
        None => {
            let pairs = full_pairs(known_ids);
            if pairs.is_empty() {
                return Err(ResolveError::EmptyPairs);
            }
            check_fragments(&pairs)?;
            Ok(pairs)
        }
    }
}

/// Every unordered 2-combination, ascending index order.
pub fn full_pairs(ids: &[String]) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            pairs.push(Pair::stereo(ids[i].clone(), ids[j].clone()));
        }
    }
    pairs
}

/// Distinct ids across all pairs, in first-seen order.
pub fn ids_from_pairs(pairs: &[Pair]) -> Vec<String> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .flat_map(|p| p.ids())
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn check_known_ids(pairs: &[Pair], known: &[String]) -> ResolveResult<()> {
    for pair in pairs {
        if let Some(id) = pair.ids().iter().find(|id| !known.contains(*id)) {
            return Err(ResolveError::UnknownPairId {
                id: id.clone(),
                pair: pair.clone(),
            });
        }
    }
    Ok(())
}

/// Distinct pairs must not share an output fragment.
///
/// Ids are joined with `_`, so `a_b + c` and `a + b_c` would collide.
pub fn check_fragments(pairs: &[Pair]) -> ResolveResult<()> {
    let mut stems: HashMap<String, &Pair> = HashMap::new();
    for pair in pairs {
        let stem = pair.stem();
        match stems.get(&stem) {
            Some(existing) if *existing != pair => {
                return Err(ResolveError::FragmentCollision {
                    first: (*existing).clone(),
                    second: pair.clone(),
                    stem,
                });
            }
            Some(_) => {}
            None => {
                stems.insert(stem, pair);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(content: &str, options: PairFileOptions<'_>) -> ResolveResult<Vec<Pair>> {
        parse_pairs(Path::new("pairs.txt"), content, options)
    }

    #[test]
    fn reads_pairs_and_triplets_in_file_order() {
        let pairs = parse("b\tc\n\na b c\n", PairFileOptions::default()).unwrap();
        assert_eq!(
            pairs,
            vec![Pair::stereo("b", "c"), Pair::triplet("a", "b", "c")]
        );
    }

    #[test]
    fn header_line_is_skipped() {
        let options = PairFileOptions {
            header: true,
            ..Default::default()
        };
        let pairs = parse("left right\na b\n", options).unwrap();
        assert_eq!(pairs, vec![Pair::stereo("a", "b")]);
    }

    #[test]
    fn bad_width_is_rejected_unless_truncated() {
        let content = "a b 0.5 12\n";
        assert!(matches!(
            parse(content, PairFileOptions::default()),
            Err(ResolveError::InvalidPairWidth { line: 1, found: 4, .. })
        ));

        let truncated = PairFileOptions {
            first: Some(2),
            ..Default::default()
        };
        assert_eq!(parse(content, truncated).unwrap(), vec![Pair::stereo("a", "b")]);
    }

    #[test]
    fn unknown_id_is_a_configuration_error() {
        let known = ids(&["a", "b"]);
        let options = PairFileOptions {
            known_ids: Some(&known),
            ..Default::default()
        };
        match parse("a b\na c\n", options) {
            Err(ResolveError::UnknownPairId { id, pair }) => {
                assert_eq!(id, "c");
                assert_eq!(pair, Pair::stereo("a", "c"));
            }
            other => panic!("expected unknown id error, got {:?}", other),
        }
    }

    #[test]
    fn empty_pair_file_is_rejected() {
        assert!(matches!(
            parse("\n\n", PairFileOptions::default()),
            Err(ResolveError::EmptyPairs)
        ));
    }

    #[test]
    fn full_pairs_count_and_order() {
        for n in 0usize..8 {
            let list: Vec<String> = (0..n).map(|i| format!("s{}", i)).collect();
            let pairs = full_pairs(&list);
            assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);

            let mut seen = HashSet::new();
            for pair in &pairs {
                let (l, r) = pair.left_right();
                assert_ne!(l, r);
                let key = if l < r { (l, r) } else { (r, l) };
                assert!(seen.insert(key), "duplicate pair {}", pair);
            }
        }

        assert_eq!(
            full_pairs(&ids(&["a", "b", "c"])),
            vec![
                Pair::stereo("a", "b"),
                Pair::stereo("a", "c"),
                Pair::stereo("b", "c")
            ]
        );
    }

    #[test]
    fn ids_from_pairs_keeps_first_seen_order() {
        let pairs = vec![Pair::stereo("c", "a"), Pair::triplet("a", "b", "c")];
        assert_eq!(ids_from_pairs(&pairs), ids(&["c", "a", "b"]));
    }

    #[test]
    fn colliding_fragments_are_rejected() {
        let pairs = vec![Pair::stereo("a_b", "c"), Pair::stereo("a", "b_c")];
        assert!(matches!(
            check_fragments(&pairs),
            Err(ResolveError::FragmentCollision { .. })
        ));

        let distinct = vec![Pair::stereo("a", "b"), Pair::stereo("b", "a")];
        assert!(check_fragments(&distinct).is_ok());
    }
}
