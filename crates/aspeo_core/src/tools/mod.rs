//! External command boundary.
//!
//! Every stage turns into [`ToolCommand`]s: a program, its ordered
//! arguments and the artifacts it writes. A [`CommandRunner`] decides what
//! happens to them (spawn, print, record).

mod command;
mod options;
mod runner;

pub use command::ToolCommand;
pub use options::{flag_name, value_to_arg, ToolOptions};
pub use runner::{
    CommandRunner, DryRunRunner, ProcessRunner, RecordingRunner, ToolError, ToolResult,
};
