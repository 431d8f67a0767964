//! Known compilation targets and request aliases.

use std::fmt;

use crate::interop::errors::InteropError;

/// A compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeTarget {
    LinuxX64,
    LinuxArm32Hfp,
    MacosX64,
    IosArm64,
    IosX64,
    MingwX64,
    AndroidArm64,
    Wasm32,
}

impl NativeTarget {
    pub const ALL: [NativeTarget; 8] = [
        NativeTarget::LinuxX64,
        NativeTarget::LinuxArm32Hfp,
        NativeTarget::MacosX64,
        NativeTarget::IosArm64,
        NativeTarget::IosX64,
        NativeTarget::MingwX64,
        NativeTarget::AndroidArm64,
        NativeTarget::Wasm32,
    ];

    /// Canonical name passed to the compiler.
    pub fn visible_name(&self) -> &'static str {
        match self {
            NativeTarget::LinuxX64 => "linux_x64",
            NativeTarget::LinuxArm32Hfp => "linux_arm32_hfp",
            NativeTarget::MacosX64 => "macos_x64",
            NativeTarget::IosArm64 => "ios_arm64",
            NativeTarget::IosX64 => "ios_x64",
            NativeTarget::MingwX64 => "mingw_x64",
            NativeTarget::AndroidArm64 => "android_arm64",
            NativeTarget::Wasm32 => "wasm32",
        }
    }

    /// Targets whose stubs are scripts rather than bitcode.
    pub fn is_script_like(&self) -> bool {
        matches!(self, NativeTarget::Wasm32)
    }

    fn from_alias(alias: &str) -> Option<NativeTarget> {
        let target = match alias {
            "linux" => NativeTarget::LinuxX64,
            "raspberrypi" => NativeTarget::LinuxArm32Hfp,
            "macbook" | "imac" => NativeTarget::MacosX64,
            "iphone" => NativeTarget::IosArm64,
            "iphone_sim" => NativeTarget::IosX64,
            "mingw" => NativeTarget::MingwX64,
            "android" => NativeTarget::AndroidArm64,
            "wasm" => NativeTarget::Wasm32,
            _ => return None,
        };
        Some(target)
    }
}

impl fmt::Display for NativeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.visible_name())
    }
}

fn detect_host() -> NativeTarget {
    if cfg!(target_os = "macos") {
        NativeTarget::MacosX64
    } else if cfg!(windows) {
        NativeTarget::MingwX64
    } else {
        NativeTarget::LinuxX64
    }
}

/// Resolves target requests.
#[derive(Debug, Clone)]
pub struct PlatformManager {
    host: NativeTarget,
}

impl Default for PlatformManager {
    fn default() -> Self {
        PlatformManager::new()
    }
}

impl PlatformManager {
    /// A manager for the machine this runs on.
    pub fn new() -> Self {
        PlatformManager {
            host: detect_host(),
        }
    }

    pub fn with_host(host: NativeTarget) -> Self {
        PlatformManager { host }
    }

    pub fn host(&self) -> NativeTarget {
        self.host
    }

    /// Resolve `host`, a canonical name or an alias.
    pub fn target(&self, request: &str) -> Result<NativeTarget, InteropError> {
        let request = request.trim().to_ascii_lowercase();
        if request == "host" {
            return Ok(self.host);
        }

        NativeTarget::ALL
            .into_iter()
            .find(|t| t.visible_name() == request)
            .or_else(|| NativeTarget::from_alias(&request))
            .ok_or_else(|| InteropError::UnresolvedTarget {
                request,
                known: self.known_names(),
            })
    }

    /// Canonical names of every target.
    pub fn known_names(&self) -> Vec<String> {
        NativeTarget::ALL
            .iter()
            .map(|t| t.visible_name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_aliases() {
        let manager = PlatformManager::with_host(NativeTarget::LinuxX64);

        assert_eq!(manager.target("host").unwrap(), NativeTarget::LinuxX64);
        assert_eq!(manager.target("macbook").unwrap(), NativeTarget::MacosX64);
        assert_eq!(manager.target("iphone").unwrap(), NativeTarget::IosArm64);
        assert_eq!(manager.target("wasm").unwrap(), NativeTarget::Wasm32);
        assert_eq!(manager.target("mingw_x64").unwrap(), NativeTarget::MingwX64);
        assert_eq!(manager.target("Linux").unwrap(), NativeTarget::LinuxX64);
    }

    #[test]
    fn test_unknown_target() {
        let manager = PlatformManager::with_host(NativeTarget::LinuxX64);
        match manager.target("amiga") {
            Err(InteropError::UnresolvedTarget { request, known }) => {
                assert_eq!(request, "amiga");
                assert!(known.contains(&"wasm32".to_string()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_script_like() {
        assert!(NativeTarget::Wasm32.is_script_like());
        assert!(!NativeTarget::IosArm64.is_script_like());
    }
}
