//! Opcode catalogs.
//!
//! The tables live in `src/catalog/*.inc`, one opcode per line, and are compiled into the
//! statics below by the build script: [`SHARED`] for every target, plus one extension
//! catalog per architecture. Tags follow line order, so shared opcodes keep their tags
//! when opcodes are appended.

pub mod arch;
pub mod space;

pub use arch::Arch;
pub use space::{OpcodeId, OpcodeSpace};

use crate::ir::descriptor::{Category, OpFlags, OperandDescriptor, OperandKind};

/// One opcode of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub descriptor: OperandDescriptor,
}

/// An ordered list of opcodes.
#[derive(Debug)]
pub struct Catalog {
    pub name: &'static str,
    pub entries: &'static [CatalogEntry],
}

impl Catalog {
    /// Returns the number of opcodes in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in tag order.
    pub fn iter(&self) -> std::slice::Iter<'static, CatalogEntry> {
        self.entries.iter()
    }

    /// Linear search by name. Use [`OpcodeSpace::lookup`] for repeated queries.
    pub fn find(&self, name: &str) -> Option<&'static CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

include!(concat!(env!("OUT_DIR"), "/catalog_tables.rs"));
