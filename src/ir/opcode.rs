use std::fmt;
use std::str::FromStr;

use crate::catalog::space::OpcodeId;
use crate::catalog::{Arch, CatalogEntry, SHARED};
use crate::error::CatalogError;
use crate::ir::descriptor::{Category, OpFlags, OperandDescriptor};

include!(concat!(env!("OUT_DIR"), "/opcode_enum.rs"));

impl Opcode {
    fn entry(self) -> &'static CatalogEntry {
        let tag = self as usize;
        if tag < Self::SHARED_COUNT {
            &SHARED.entries[tag]
        } else {
            &Arch::ACTIVE.extension().entries[tag - Self::SHARED_COUNT]
        }
    }

    /// Returns the catalog name of this opcode.
    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Returns the operand descriptor of this opcode.
    pub fn descriptor(self) -> &'static OperandDescriptor {
        &self.entry().descriptor
    }

    pub fn category(self) -> Category {
        self.descriptor().category
    }

    pub fn flags(self) -> OpFlags {
        self.descriptor().flags
    }

    /// Returns true if this opcode calls out of JIT code.
    pub fn is_call(self) -> bool {
        self.flags().contains(OpFlags::CALL)
    }

    /// Returns true if this opcode may bail out to a slower tier.
    pub fn can_bail(self) -> bool {
        self.flags().contains(OpFlags::CAN_BAIL)
    }

    /// Returns true if this opcode has side effects and must not be re-executed after a bailout.
    pub fn has_side_effects(self) -> bool {
        self.flags().contains(OpFlags::EFFECTFUL)
    }

    /// Returns true if this opcode ends a block.
    pub fn is_terminator(self) -> bool {
        self.flags().contains(OpFlags::TERMINATOR)
    }

    /// Returns true if this opcode comes from the target's extension catalog.
    pub fn is_extension(self) -> bool {
        self as usize >= Self::SHARED_COUNT
    }

    /// Tag of this opcode in [`OpcodeSpace::active`](crate::catalog::OpcodeSpace::active).
    pub fn id(self) -> OpcodeId {
        OpcodeId(self as u16)
    }

    pub fn from_tag(tag: u16) -> Option<Opcode> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn from_id(id: OpcodeId) -> Option<Opcode> {
        Self::from_tag(id.0)
    }

    /// All opcodes in tag order.
    pub fn iter() -> std::iter::Copied<std::slice::Iter<'static, Opcode>> {
        let all: &'static [Opcode] = &Self::ALL;
        all.iter().copied()
    }
}

impl From<Opcode> for OpcodeId {
    fn from(op: Opcode) -> Self {
        op.id()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Opcode {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::catalog::OpcodeSpace::active()
            .lookup(s)
            .and_then(Opcode::from_id)
            .ok_or_else(|| CatalogError::UnknownOpcode { name: s.to_string() })
    }
}
