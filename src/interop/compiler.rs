//! Two-stage interop build: header import, then library production.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::interop::args::{path_arg, BuildLayout, InteropArgs, CSTUBS_NAME};
use crate::interop::errors::InteropError;
use crate::interop::platform::{NativeTarget, PlatformManager};
use crate::interop::resolver::{LibraryResolver, ResolvedLibrary};
use crate::interop::tool::HeaderImportTool;

/// Flavor whose stubs are always scripts.
pub const WASM_FLAVOR: &str = "wasm";

/// Everything decided for one interop build.
#[derive(Debug, Clone)]
pub struct InteropInvocation {
    pub target: NativeTarget,
    pub layout: BuildLayout,
    pub libraries: Vec<ResolvedLibrary>,
    /// Arguments the header-import tool was run with.
    pub header_import_args: Vec<String>,
    /// Arguments for the library-production stage.
    pub compiler_args: Vec<String>,
}

/// `-import <package>:<header;header>` for every library with a package.
pub fn import_directives(libraries: &[ResolvedLibrary]) -> Vec<String> {
    let mut directives = Vec::new();
    for library in libraries {
        if let Some(package) = library.package() {
            directives.push("-import".to_string());
            directives.push(format!("{}:{}", package, library.included_headers().join(";")));
        }
    }
    directives
}

/// Drives the two stages.
#[derive(Debug, Clone, Default)]
pub struct InteropCompiler {
    platforms: PlatformManager,
    default_libs_dir: Option<PathBuf>,
}

impl InteropCompiler {
    pub fn new(platforms: PlatformManager) -> Self {
        InteropCompiler {
            platforms,
            default_libs_dir: None,
        }
    }

    pub fn with_default_libs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_libs_dir = Some(dir.into());
        self
    }

    fn resolver(&self, args: &InteropArgs, target: NativeTarget) -> LibraryResolver {
        let repos = args.repos.iter().map(PathBuf::from).collect();
        let resolver = LibraryResolver::new(repos, target);
        match &self.default_libs_dir {
            Some(dir) => resolver.with_default_libs_dir(dir),
            None => resolver,
        }
    }

    /// Resolve the target and libraries, run the header-import tool and
    /// compute the production-stage arguments.
    ///
    /// Nothing is run when resolution fails.
    pub fn invoke<S: AsRef<str>>(
        &self,
        flavor: &str,
        args: &[S],
        tool: &dyn HeaderImportTool,
    ) -> Result<InteropInvocation, InteropError> {
        let args = InteropArgs::parse(args);
        let layout = args.layout();

        let target = self.platforms.target(&args.target_request)?;
        let libraries = self.resolver(&args, target).resolve_with_dependencies(
            &args.libraries,
            true,
            args.no_default_libs,
        )?;
        info!(
            "building `{}` for {} with {} libraries",
            args.output_name,
            target,
            libraries.len()
        );

        let mut header_import_args = vec![
            "-generated".to_string(),
            path_arg(&layout.generated_dir),
            "-natives".to_string(),
            path_arg(&layout.natives_dir),
            "-cstubsname".to_string(),
            CSTUBS_NAME.to_string(),
            "-manifest".to_string(),
            path_arg(&layout.manifest),
            "-flavor".to_string(),
            flavor.to_string(),
            "-temporaryFilesDir".to_string(),
            args.temporary_files_dir.clone(),
        ];
        header_import_args.extend(import_directives(&libraries));
        header_import_args.extend(args.passthrough());

        let extra = tool.run(flavor, &header_import_args)?.unwrap_or_default();
        debug!("header import returned {} compiler arguments", extra.len());

        let script_like = flavor == WASM_FLAVOR || target.is_script_like();
        let mut compiler_args = vec![
            path_arg(&layout.generated_dir),
            "-produce".to_string(),
            "library".to_string(),
            "-o".to_string(),
            args.output_name.clone(),
            "-target".to_string(),
            target.visible_name().to_string(),
            "-manifest".to_string(),
            path_arg(&layout.manifest),
            "--temporary_files_dir".to_string(),
            args.temporary_files_dir.clone(),
        ];
        compiler_args.extend(layout.native_stubs(script_like));
        compiler_args.extend(extra);
        for library in &args.libraries {
            compiler_args.push("-library".to_string());
            compiler_args.push(library.clone());
        }
        for repo in &args.repos {
            compiler_args.push("-repo".to_string());
            compiler_args.push(repo.clone());
        }
        compiler_args.extend(args.restored_flags());

        Ok(InteropInvocation {
            target,
            layout,
            libraries,
            header_import_args,
            compiler_args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::LibraryManifest;
    use crate::test_support::fixtures::write_library_dir;
    use crate::test_support::assertions::assert_flag_value;
    use crate::test_support::MockHeaderImportTool;
    use tempfile::TempDir;

    fn compiler() -> InteropCompiler {
        InteropCompiler::new(PlatformManager::with_host(NativeTarget::LinuxX64))
    }

    fn repo_with_sdl(tmp: &TempDir) -> String {
        let repo = tmp.path().join("repo");
        write_library_dir(
            &repo,
            "posix",
            LibraryManifest::new()
                .with_package("platform.posix")
                .with_included_headers(["stdio.h", "time.h"]),
        );
        write_library_dir(
            &repo,
            "sdl",
            LibraryManifest::new()
                .with_package("sdl")
                .with_included_headers(["SDL.h"])
                .with_depends(["posix"]),
        );
        repo.to_string_lossy().into_owned()
    }

    #[test]
    fn test_production_arguments() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with_sdl(&tmp);
        let tool = MockHeaderImportTool::returning(vec![
            "-linker_opts".to_string(),
            "-lSDL2".to_string(),
        ]);

        let invocation = compiler()
            .invoke(
                "native",
                &["-o", "out", "-target", "host", "-library", "sdl", "-repo", repo.as_str()],
                &tool,
            )
            .unwrap();

        let args = &invocation.compiler_args;
        assert_eq!(args[0], path_arg(&PathBuf::from("out-build").join("kotlin")));
        assert_eq!(&args[1..3], &["-produce", "library"]);
        assert_flag_value(args, "-o", "out");
        assert_flag_value(args, "-target", "linux_x64");
        assert_flag_value(args, "-library", "sdl");
        assert_flag_value(args, "-repo", &repo);
        let stubs = PathBuf::from("out-build").join("natives").join("cstubs.bc");
        assert_flag_value(args, "-nativelibrary", &path_arg(&stubs));
        assert!(args.contains(&"-lSDL2".to_string()));
        assert!(!args.contains(&"-nodefaultlibs".to_string()));
        assert!(!args.contains(&"--purge_user_libs".to_string()));
    }

    #[test]
    fn test_header_import_arguments() {
        let tmp = TempDir::new().unwrap();
        let repo = repo_with_sdl(&tmp);
        let tool = MockHeaderImportTool::declining();

        let invocation = compiler()
            .invoke(
                "native",
                &["-def", "sdl.def", "-library", "sdl", "-r", repo.as_str(), "-nodefaultlibs"],
                &tool,
            )
            .unwrap();

        let calls = tool.calls();
        assert_eq!(calls.len(), 1);
        let (flavor, args) = &calls[0];
        assert_eq!(flavor, "native");
        assert_eq!(args, &invocation.header_import_args);

        assert_flag_value(args, "-cstubsname", "cstubs");
        assert_flag_value(args, "-flavor", "native");
        assert_flag_value(args, "-temporaryFilesDir", "");
        let imports: Vec<_> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| a.as_str() == "-import")
            .map(|(i, _)| args[i + 1].as_str())
            .collect();
        assert_eq!(imports, vec!["platform.posix:stdio.h;time.h", "sdl:SDL.h"]);
        assert!(args.contains(&"-def".to_string()));
        assert!(!args.contains(&"-nodefaultlibs".to_string()));

        // Flag comes back for the production stage.
        assert_eq!(invocation.compiler_args.last().map(String::as_str), Some("-nodefaultlibs"));
    }

    #[test]
    fn test_restores_both_flags_in_order() {
        let tool = MockHeaderImportTool::declining();
        let invocation = compiler()
            .invoke("native", &["--purge_user_libs", "-nodefaultlibs"], &tool)
            .unwrap();
        let n = invocation.compiler_args.len();
        assert_eq!(&invocation.compiler_args[n - 2..], &["-nodefaultlibs", "--purge_user_libs"]);
    }

    #[test]
    fn test_script_stubs() {
        let tool = MockHeaderImportTool::declining();

        let by_flavor = compiler().invoke("wasm", &["-o", "w"], &tool).unwrap();
        assert!(by_flavor.compiler_args.contains(&"-includeBinary".to_string()));

        let by_target = compiler().invoke("native", &["-target", "wasm"], &tool).unwrap();
        assert!(by_target.compiler_args.contains(&"-includeBinary".to_string()));
        assert_flag_value(&by_target.compiler_args, "-target", "wasm32");
    }

    #[test]
    fn test_resolution_failure_runs_nothing() {
        let tool = MockHeaderImportTool::declining();

        let err = compiler()
            .invoke("native", &["-target", "amiga"], &tool)
            .unwrap_err();
        assert!(matches!(err, InteropError::UnresolvedTarget { .. }));

        let err = compiler()
            .invoke("native", &["-library", "definitely-missing-lib"], &tool)
            .unwrap_err();
        assert!(matches!(err, InteropError::UnresolvedLibrary { .. }));

        assert!(tool.calls().is_empty());
    }

    #[test]
    fn test_import_directives_skip_libraries_without_package() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        write_library_dir(&repo, "plain", LibraryManifest::new());
        let resolved = LibraryResolver::new(vec![repo], NativeTarget::LinuxX64)
            .resolve_with_dependencies(&["plain".to_string()], true, true)
            .unwrap();
        assert!(import_directives(&resolved).is_empty());
    }
}
