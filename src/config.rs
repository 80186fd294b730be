use std::env;

use tracing::debug;

use crate::catalog::{Arch, OpcodeSpace};
use crate::error::{CatalogError, ConfigError, VerifyError};
use crate::ir::block::LBlock;
use crate::ir::verify::verify_block;

/// Runtime settings for building and checking LIR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LirConfig {
    /// Target whose opcode space tooling works with. Only [`Arch::ACTIVE`] matches
    /// [`Opcode`](crate::ir::opcode::Opcode).
    pub target: Arch,
    /// Run the verifier from [`check_block`](Self::check_block).
    pub verify_blocks: bool,
}

impl Default for LirConfig {
    fn default() -> Self {
        Self {
            target: Arch::ACTIVE,
            verify_blocks: cfg!(debug_assertions),
        }
    }
}

impl LirConfig {
    /// Overrides [`target`](Self::target).
    pub const TARGET_VAR: &'static str = "LIR_TARGET_ARCH";
    /// Overrides [`verify_blocks`](Self::verify_blocks).
    pub const VERIFY_VAR: &'static str = "LIR_VERIFY";

    /// Defaults, overridden by `LIR_TARGET_ARCH` and `LIR_VERIFY` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(target) = lookup(Self::TARGET_VAR) {
            config.target = target.parse()?;
        }
        if let Some(verify) = lookup(Self::VERIFY_VAR) {
            config.verify_blocks = parse_switch(Self::VERIFY_VAR, &verify)?;
        }
        debug!(target = %config.target, verify = config.verify_blocks, "loaded LIR configuration");
        Ok(config)
    }

    /// Returns true if `target` is the architecture compiled into `Opcode`.
    pub fn is_native_target(&self) -> bool {
        self.target == Arch::ACTIVE
    }

    /// Build the opcode space of the configured target.
    pub fn opcode_space(&self) -> Result<OpcodeSpace, CatalogError> {
        OpcodeSpace::for_arch(self.target)
    }

    /// Verify `block` if verification is enabled.
    pub fn check_block(&self, block: &LBlock) -> Result<(), VerifyError> {
        if self.verify_blocks {
            verify_block(block)
        } else {
            Ok(())
        }
    }
}

fn parse_switch(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::opcode::Opcode;
    use crate::ir::operand::VirtualRegister;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = LirConfig::default();
        assert_eq!(config.target, Arch::ACTIVE);
        assert!(config.is_native_target());
        assert_eq!(config.verify_blocks, cfg!(debug_assertions));
    }

    #[test]
    fn test_config_overrides() {
        let config = LirConfig::from_lookup(lookup_in(&[("LIR_TARGET_ARCH", "arm"), ("LIR_VERIFY", "off")])).unwrap();
        assert_eq!(config, LirConfig { target: Arch::Arm, verify_blocks: false });

        let space = config.opcode_space().unwrap();
        assert_eq!(space.extension_name(), "arm");
        assert!(space.lookup("SoftDivI").is_some());
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert_eq!(
            LirConfig::from_lookup(lookup_in(&[("LIR_TARGET_ARCH", "sparc")])),
            Err(ConfigError::UnknownArch("sparc".to_string()))
        );
        assert_eq!(
            LirConfig::from_lookup(lookup_in(&[("LIR_VERIFY", "maybe")])),
            Err(ConfigError::InvalidValue { var: "LIR_VERIFY", value: "maybe".to_string() })
        );
    }

    #[test]
    fn test_check_block_respects_switch() {
        let mut block = LBlock::new(0);
        block.emit(Opcode::Integer, []).unwrap();

        let on = LirConfig { target: Arch::ACTIVE, verify_blocks: true };
        let off = LirConfig { verify_blocks: false, ..on };
        assert!(on.check_block(&block).is_err());
        assert!(off.check_block(&block).is_ok());

        block = LBlock::new(1);
        block.define(Opcode::Integer, [], VirtualRegister(0)).unwrap();
        assert!(on.check_block(&block).is_ok());
    }
}
