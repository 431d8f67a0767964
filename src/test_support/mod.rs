//! Test utilities and mocks for libgraph unit tests.
//!
//! Provides library fixtures and a mock header-import tool, so the loader
//! and the interop bridge can be tested without real artifacts or external
//! programs.

pub mod fixtures;

use std::sync::Mutex;

use crate::interop::errors::InteropError;
use crate::interop::tool::HeaderImportTool;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock header-import tool.
///
/// Records every invocation and answers with a fixed result.
#[derive(Debug, Default)]
pub struct MockHeaderImportTool {
    result: Option<Vec<String>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockHeaderImportTool {
    /// A tool that hands back `args` for the production stage.
    pub fn returning(args: Vec<String>) -> Self {
        MockHeaderImportTool {
            result: Some(args),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A tool that produces no extra arguments.
    pub fn declining() -> Self {
        MockHeaderImportTool::default()
    }

    /// `(flavor, args)` of every call so far.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl HeaderImportTool for MockHeaderImportTool {
    fn run(&self, flavor: &str, args: &[String]) -> Result<Option<Vec<String>>, InteropError> {
        self.calls
            .lock()
            .unwrap()
            .push((flavor.to_string(), args.to_vec()));
        Ok(self.result.clone())
    }
}

/// Assertion helpers for argument lists.
pub mod assertions {
    /// Assert that `flag` is immediately followed by `value`.
    pub fn assert_flag_value(args: &[String], flag: &str, value: &str) {
        let position = args.iter().position(|a| a == flag);
        match position.and_then(|i| args.get(i + 1)) {
            Some(actual) => assert_eq!(actual, value, "value of `{}`", flag),
            None => panic!("`{}` not followed by a value in {:?}", flag, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_tool_records_calls() {
        let tool = MockHeaderImportTool::returning(vec!["-lz".to_string()]);
        let result = tool.run("native", &["-o".to_string(), "z".to_string()]).unwrap();

        assert_eq!(result, Some(vec!["-lz".to_string()]));
        assert_eq!(tool.calls().len(), 1);
        assertions::assert_flag_value(&tool.calls()[0].1, "-o", "z");
    }
}
