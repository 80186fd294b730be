//! Opcode catalog and dispatch for a JIT's low-level IR (LIR).
//!
//! Every instruction kind the backend can emit is declared once in the catalog tables
//! under `src/catalog/`. The build script turns them into:
//!
//! - [`Opcode`](ir::opcode::Opcode): the shared opcodes plus the target's extension opcodes,
//! - one typed view per opcode ([`ir::views`]),
//! - [`LirVisitor`](ir::visitor::LirVisitor), which has one required method per opcode,
//! - [`for_each_lir_opcode!`], for consumers that generate code for every opcode.
//!
//! The target is chosen with an `arch-*` feature, the `LIR_TARGET_ARCH` environment
//! variable, or the host architecture, in that order.

// Defined first so every module below can invoke it.
include!(concat!(env!("OUT_DIR"), "/opcode_list.rs"));

pub mod catalog;
pub mod config;
pub mod error;
pub mod ir;

pub use catalog::{Arch, OpcodeId, OpcodeSpace};
pub use config::LirConfig;
pub use error::{CatalogError, ConfigError, OperandError, VerifyError};
pub use ir::block::LBlock;
pub use ir::inst::LInstruction;
pub use ir::opcode::Opcode;
pub use ir::operand::{LOperand, VirtualRegister};
pub use ir::visitor::{dispatch, LirVisitor};
