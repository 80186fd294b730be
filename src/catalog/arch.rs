use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, ARM, ARM64, NONE, X64, X86};
use crate::error::ConfigError;

/// Code generation target. Each has its own extension catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X64,
    Arm,
    Arm64,
    /// No native backend; only the shared opcodes exist.
    None,
}

impl Arch {
    pub const ALL: [Arch; 5] = [Arch::X86, Arch::X64, Arch::Arm, Arch::Arm64, Arch::None];

    /// Lowercase name, as accepted by `LIR_TARGET_ARCH`.
    pub fn name(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::None => "none",
        }
    }

    /// Opcodes private to this target.
    pub fn extension(self) -> &'static Catalog {
        match self {
            Arch::X86 => &X86,
            Arch::X64 => &X64,
            Arch::Arm => &ARM,
            Arch::Arm64 => &ARM64,
            Arch::None => &NONE,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = ConfigError;

    /// Accepts catalog names and the common Rust target spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "i686" => Ok(Arch::X86),
            "x64" | "x86_64" => Ok(Arch::X64),
            "arm" => Ok(Arch::Arm),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "none" => Ok(Arch::None),
            _ => Err(ConfigError::UnknownArch(s.to_string())),
        }
    }
}

include!(concat!(env!("OUT_DIR"), "/active_arch.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_names_roundtrip() {
        for arch in Arch::ALL {
            assert_eq!(arch.name().parse::<Arch>(), Ok(arch));
            assert_eq!(arch.extension().name, arch.name());
        }
        assert_eq!("aarch64".parse::<Arch>(), Ok(Arch::Arm64));
        assert_eq!(" X86_64 ".parse::<Arch>(), Ok(Arch::X64));
    }

    #[test]
    fn test_unknown_arch() {
        assert_eq!("mips".parse::<Arch>(), Err(ConfigError::UnknownArch("mips".to_string())));
    }

    #[test]
    fn test_none_has_no_extension() {
        assert!(Arch::None.extension().is_empty());
        assert!(!Arch::X64.extension().is_empty());
    }
}
