//! The header-import stage.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::interop::errors::InteropError;
use crate::util::process::{find_executable, ProcessBuilder};

/// Generates bindings and native stubs from headers.
///
/// On success the tool may hand back extra arguments for the production
/// stage. `None` means it had nothing to add.
pub trait HeaderImportTool: Send + Sync {
    fn run(&self, flavor: &str, args: &[String]) -> Result<Option<Vec<String>>, InteropError>;
}

/// Runs an external header-import program. Each non-blank line the program
/// prints on stdout becomes one extra argument.
#[derive(Debug, Clone)]
pub struct ExternalHeaderImportTool {
    program: PathBuf,
}

impl ExternalHeaderImportTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ExternalHeaderImportTool {
            program: program.into(),
        }
    }

    /// Look `name` up on PATH.
    pub fn locate(name: &str) -> Option<Self> {
        find_executable(name).map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl HeaderImportTool for ExternalHeaderImportTool {
    fn run(&self, flavor: &str, args: &[String]) -> Result<Option<Vec<String>>, InteropError> {
        let tool = self.program.display().to_string();
        let process = ProcessBuilder::new(&self.program).args(args);
        debug!("running header import ({}): {}", flavor, process.display_command());

        let output = process
            .exec_and_check()
            .map_err(|e| InteropError::ToolFailed {
                tool: tool.clone(),
                message: format!("{:#}", e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let extra: Vec<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        if extra.is_empty() {
            Ok(None)
        } else {
            Ok(Some(extra))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_lines_become_arguments() {
        let tool = ExternalHeaderImportTool::new("echo");
        let extra = tool
            .run("native", &["-linker_option".to_string()])
            .unwrap();
        assert_eq!(extra, Some(vec!["-linker_option".to_string()]));
    }

    #[test]
    fn test_silent_tool_adds_nothing() {
        let tool = ExternalHeaderImportTool::new("true");
        assert_eq!(tool.run("native", &[]).unwrap(), None);
    }

    #[test]
    fn test_failing_tool() {
        let tool = ExternalHeaderImportTool::new("false");
        let err = tool.run("native", &[]).unwrap_err();
        assert!(matches!(err, InteropError::ToolFailed { .. }));
    }
}
