//! One external tool invocation.

use std::fmt;
use std::path::{Path, PathBuf};

use super::options::ToolOptions;

/// Program name, ordered arguments and the artifacts the invocation writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    outputs: Vec<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument.
    pub fn path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Append rendered tool options.
    pub fn options(self, options: &ToolOptions) -> Self {
        self.args(options.to_args())
    }

    /// Declare an artifact written by this invocation.
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_shell_line() {
        let cmd = ToolCommand::new("point2dem")
            .options(&ToolOptions::new().with("t", "rpc"))
            .path(Path::new("out/STEREO/a_b/stereo-pc_aligned.tif"))
            .arg("-o")
            .path(Path::new("out/STEREO/a_b/stereo-dem.tif"));

        assert_eq!(
            cmd.to_string(),
            "point2dem -t rpc out/STEREO/a_b/stereo-pc_aligned.tif -o out/STEREO/a_b/stereo-dem.tif"
        );
    }

    #[test]
    fn display_quotes_whitespace() {
        let cmd = ToolCommand::new("mapproject").arg("my image.tif");
        assert_eq!(cmd.to_string(), "mapproject 'my image.tif'");
    }

    #[test]
    fn outputs_are_not_arguments() {
        let cmd = ToolCommand::new("corr_eval").arg("prefix").output("prefix-ncc.tif");
        assert_eq!(cmd.arg_list(), ["prefix"]);
        assert_eq!(cmd.outputs(), [PathBuf::from("prefix-ncc.tif")]);
    }
}
