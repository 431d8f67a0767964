//! Running an interop build from configuration and command-line arguments.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::interop::compiler::{InteropCompiler, InteropInvocation};
use crate::interop::platform::PlatformManager;
use crate::interop::tool::{ExternalHeaderImportTool, HeaderImportTool};
use crate::util::config::{Config, DEFAULT_TOOL};
use crate::util::process::ProcessBuilder;

/// Options for an interop build.
#[derive(Debug, Clone, Default)]
pub struct InteropOptions {
    /// Overrides the configured flavor.
    pub flavor: Option<String>,
    /// Overrides the configured header-import tool.
    pub tool: Option<PathBuf>,
    /// Stop after computing the production-stage arguments.
    pub print_only: bool,
    pub config: Config,
}

impl InteropOptions {
    pub fn flavor(&self) -> &str {
        self.flavor.as_deref().unwrap_or_else(|| self.config.flavor())
    }
}

/// The command-line arguments followed by a `-repo` for every configured
/// repository.
pub fn effective_args(args: &[String], config: &Config) -> Vec<String> {
    let mut effective = args.to_vec();
    for repo in &config.interop.repos {
        effective.push("-repo".to_string());
        effective.push(repo.clone());
    }
    effective
}

/// The header-import tool to run: the override, the configured program,
/// or the default program found on PATH.
pub fn header_import_tool(options: &InteropOptions) -> Result<ExternalHeaderImportTool> {
    if let Some(tool) = options.tool.as_ref().or(options.config.interop.tool.as_ref()) {
        return Ok(ExternalHeaderImportTool::new(tool));
    }
    ExternalHeaderImportTool::locate(DEFAULT_TOOL).with_context(|| {
        format!(
            "`{}` not found on PATH\n\
             help: Set `interop.tool` in .libgraph/config.toml or pass --tool",
            DEFAULT_TOOL
        )
    })
}

/// Compute both stages with `tool` and, unless printing only, run the
/// configured library-production program.
pub fn run_interop_with(
    args: &[String],
    options: &InteropOptions,
    tool: &dyn HeaderImportTool,
) -> Result<InteropInvocation> {
    let mut compiler = InteropCompiler::new(PlatformManager::new());
    if let Some(dir) = &options.config.interop.default_libs_dir {
        compiler = compiler.with_default_libs_dir(dir);
    }

    let args = effective_args(args, &options.config);
    let invocation = compiler.invoke(options.flavor(), &args, tool)?;

    if options.print_only {
        return Ok(invocation);
    }

    let Some(program) = &options.config.interop.compiler else {
        bail!(
            "no library-production program configured\n\
             help: Set `interop.compiler` in .libgraph/config.toml or use --print-only"
        );
    };

    let process = ProcessBuilder::new(program).args(&invocation.compiler_args);
    info!("running {}", process.display_command());
    let status = process.status()?;
    if !status.success() {
        bail!(
            "`{}` failed with exit code {:?}",
            program.display(),
            status.code()
        );
    }

    Ok(invocation)
}

/// [`run_interop_with`] using the external header-import tool.
pub fn run_interop(args: &[String], options: &InteropOptions) -> Result<InteropInvocation> {
    let tool = header_import_tool(options)?;
    run_interop_with(args, options, &tool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::errors::InteropError;
    use crate::test_support::MockHeaderImportTool;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_configured_repos_are_appended() {
        let mut config = Config::default();
        config.interop.repos = vec!["/opt/klib".to_string()];

        let args = effective_args(&strings(&["-o", "z"]), &config);
        assert_eq!(args, strings(&["-o", "z", "-repo", "/opt/klib"]));
    }

    #[test]
    fn test_flavor_precedence() {
        let mut options = InteropOptions::default();
        assert_eq!(options.flavor(), "native");

        options.config.interop.flavor = Some("wasm".to_string());
        assert_eq!(options.flavor(), "wasm");

        options.flavor = Some("native".to_string());
        assert_eq!(options.flavor(), "native");
    }

    #[test]
    fn test_print_only_does_not_need_a_compiler() {
        let options = InteropOptions {
            print_only: true,
            ..Default::default()
        };
        let tool = MockHeaderImportTool::declining();

        let invocation =
            run_interop_with(&strings(&["-o", "z", "-target", "linux"]), &options, &tool).unwrap();
        assert_eq!(invocation.compiler_args[1], "-produce");
        assert_eq!(tool.calls().len(), 1);
    }

    #[test]
    fn test_missing_compiler_is_reported() {
        let tool = MockHeaderImportTool::declining();
        let err = run_interop_with(&strings(&["-o", "z"]), &InteropOptions::default(), &tool)
            .unwrap_err();
        assert!(err.to_string().contains("no library-production program"));
    }

    #[test]
    fn test_interop_errors_survive_as_typed() {
        let tool = MockHeaderImportTool::declining();
        let options = InteropOptions::default();
        let err = run_interop_with(&strings(&["-target", "amiga"]), &options, &tool).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InteropError>(),
            Some(InteropError::UnresolvedTarget { .. })
        ));
        assert!(tool.calls().is_empty());
    }

    #[test]
    fn test_tool_override_wins() {
        let mut options = InteropOptions::default();
        options.config.interop.tool = Some(PathBuf::from("/opt/cinterop"));
        options.tool = Some(PathBuf::from("./cinterop"));

        let tool = header_import_tool(&options).unwrap();
        assert_eq!(tool.program(), PathBuf::from("./cinterop").as_path());
    }
}
