//! Command-line arguments of the interop bridge.

use std::path::{Path, PathBuf};

/// Drops default libraries from resolution.
pub const NODEFAULTLIBS: &str = "-nodefaultlibs";

/// Forwarded to the production stage only.
pub const PURGE_USER_LIBS: &str = "--purge_user_libs";

pub const DEFAULT_OUTPUT_NAME: &str = "nativelib";
pub const DEFAULT_TARGET: &str = "host";

/// Base name of the native stubs the header-import tool writes.
pub const CSTUBS_NAME: &str = "cstubs";

/// Flags recognized in an interop invocation. Every argument is also kept
/// verbatim for pass-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropArgs {
    pub output_name: String,
    pub target_request: String,
    pub libraries: Vec<String>,
    pub repos: Vec<String>,
    pub no_default_libs: bool,
    pub purge_user_libs: bool,
    pub temporary_files_dir: String,
    raw: Vec<String>,
}

impl InteropArgs {
    /// Scan `args` for known flags. A value flag at the very end keeps its
    /// default.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let raw: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        let mut parsed = InteropArgs {
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            target_request: DEFAULT_TARGET.to_string(),
            libraries: Vec::new(),
            repos: Vec::new(),
            no_default_libs: false,
            purge_user_libs: false,
            temporary_files_dir: String::new(),
            raw: Vec::new(),
        };

        for (i, arg) in raw.iter().enumerate() {
            let next = raw.get(i + 1);
            match arg.as_str() {
                output if output.starts_with("-o") => {
                    if let Some(value) = next {
                        parsed.output_name = value.clone();
                    }
                }
                "-target" => {
                    if let Some(value) = next {
                        parsed.target_request = value.clone();
                    }
                }
                "-library" => parsed.libraries.extend(next.cloned()),
                "-r" | "-repo" => parsed.repos.extend(next.cloned()),
                NODEFAULTLIBS => parsed.no_default_libs = true,
                PURGE_USER_LIBS => parsed.purge_user_libs = true,
                "--temporary_files_dir" => {
                    parsed.temporary_files_dir = next.cloned().unwrap_or_default();
                }
                _ => {}
            }
        }

        parsed.raw = raw;
        parsed
    }

    /// The original arguments minus the two boolean flags.
    pub fn passthrough(&self) -> Vec<String> {
        self.raw
            .iter()
            .filter(|a| a.as_str() != NODEFAULTLIBS && a.as_str() != PURGE_USER_LIBS)
            .cloned()
            .collect()
    }

    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// The boolean flags that were present, in their original spelling.
    pub fn restored_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.no_default_libs {
            flags.push(NODEFAULTLIBS.to_string());
        }
        if self.purge_user_libs {
            flags.push(PURGE_USER_LIBS.to_string());
        }
        flags
    }

    pub fn layout(&self) -> BuildLayout {
        BuildLayout::new(&self.output_name)
    }
}

/// Directories derived from the output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub build_dir: PathBuf,
    pub generated_dir: PathBuf,
    pub natives_dir: PathBuf,
    pub manifest: PathBuf,
}

impl BuildLayout {
    pub fn new(output_name: &str) -> Self {
        let build_dir = PathBuf::from(format!("{}-build", output_name));
        BuildLayout {
            generated_dir: build_dir.join("kotlin"),
            natives_dir: build_dir.join("natives"),
            manifest: build_dir.join("manifest.properties"),
            build_dir,
        }
    }

    /// Native stub reference for the production stage. Script-like builds
    /// link JavaScript stubs, everything else links bitcode.
    pub fn native_stubs(&self, script_like: bool) -> [String; 2] {
        if script_like {
            ["-includeBinary".to_string(), path_arg(&self.natives_dir.join("js_stubs.js"))]
        } else {
            [
                "-nativelibrary".to_string(),
                path_arg(&self.natives_dir.join(format!("{}.bc", CSTUBS_NAME))),
            ]
        }
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
