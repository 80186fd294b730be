//! Error types.
//!
//! - [`CatalogError`]: building an opcode space or a handler table.
//! - [`OperandError`]: an operand list that disagrees with the opcode's descriptor.
//! - [`VerifyError`]: a block that breaks an LIR invariant.
//! - [`ConfigError`]: bad runtime configuration.

use thiserror::Error;

use crate::catalog::space::OpcodeId;
use crate::ir::descriptor::OperandKind;
use crate::ir::opcode::Opcode;
use crate::ir::operand::VirtualRegister;

/// Catalog result type
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors from merging catalogs and building handler tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("opcode #{index} of the {catalog} catalog has an empty name")]
    EmptyName { catalog: &'static str, index: usize },

    #[error("opcode `{name}` declared twice (tags {first} and {second})")]
    DuplicateName { name: &'static str, first: OpcodeId, second: OpcodeId },

    #[error("{count} opcodes do not fit in a 16-bit tag")]
    TagOverflow { count: usize },

    #[error("no handler registered for {} opcode(s): {}", missing.len(), missing.join(", "))]
    MissingHandlers { missing: Vec<&'static str> },

    #[error("handler for `{name}` registered twice")]
    DuplicateHandler { name: &'static str },

    #[error("opcode {id} is outside a space of {len} opcodes")]
    ForeignOpcode { id: OpcodeId, len: usize },

    #[error("unknown opcode `{name}`")]
    UnknownOpcode { name: String },
}

/// Errors from constructing an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    #[error("{opcode} takes {expected} operand(s), got {found}")]
    ArityMismatch { opcode: Opcode, expected: usize, found: usize },

    #[error("{opcode} takes at least {min} operand(s), got {found}")]
    TooFewOperands { opcode: Opcode, min: usize, found: usize },

    #[error("{opcode} operand {index}: expected {expected}, got {found}")]
    KindMismatch { opcode: Opcode, index: usize, expected: OperandKind, found: OperandKind },
}

/// Block verification failures. `index` is the instruction's position in the block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("instruction {index}: {source}")]
    Operands {
        index: usize,
        #[source]
        source: OperandError,
    },

    #[error("instruction {index}: {opcode} produces a result but has no output register")]
    MissingOutput { index: usize, opcode: Opcode },

    #[error("instruction {index}: {opcode} has no result but defines {output}")]
    UnexpectedOutput { index: usize, opcode: Opcode, output: VirtualRegister },

    #[error("instruction {index}: {output} already defined by instruction {first}")]
    Redefinition { index: usize, output: VirtualRegister, first: usize },

    #[error("instruction {index}: {opcode} is marked as bailing out but cannot bail")]
    UnexpectedBailout { index: usize, opcode: Opcode },

    #[error("instruction {index}: terminator {opcode} is not the last instruction")]
    MisplacedTerminator { index: usize, opcode: Opcode },
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown target architecture `{0}`")]
    UnknownArch(String),

    #[error("invalid value `{value}` for {var}")]
    InvalidValue { var: &'static str, value: String },
}
