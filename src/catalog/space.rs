use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::catalog::{Arch, Catalog, CatalogEntry, SHARED};
use crate::error::{CatalogError, Result};
use crate::ir::descriptor::OperandDescriptor;

/// Tag of an opcode within an [`OpcodeSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpcodeId(pub u16);

impl OpcodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OpcodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The shared catalog merged with one extension catalog.
///
/// Tags are dense: shared opcodes take `0..shared_len()`, extension opcodes follow.
/// Immutable once built.
#[derive(Debug)]
pub struct OpcodeSpace {
    shared: &'static Catalog,
    extension: &'static Catalog,
    by_name: HashMap<&'static str, OpcodeId>,
}

static ACTIVE: Lazy<OpcodeSpace> = Lazy::new(|| {
    OpcodeSpace::for_arch(Arch::ACTIVE)
        .unwrap_or_else(|e| panic!("built-in catalog for {} is inconsistent: {}", Arch::ACTIVE, e))
});

impl OpcodeSpace {
    /// Merge `shared` with `extension`, rejecting empty or repeated names.
    pub fn merge(shared: &'static Catalog, extension: &'static Catalog) -> Result<Self> {
        let count = shared.len() + extension.len();
        if count > u16::MAX as usize + 1 {
            return Err(CatalogError::TagOverflow { count });
        }

        let mut by_name = HashMap::with_capacity(count);
        let entries = shared.iter().enumerate().map(|(i, e)| (shared, i, e));
        let ext_entries = extension.iter().enumerate().map(|(i, e)| (extension, i, e));
        for (tag, (catalog, index, entry)) in entries.chain(ext_entries).enumerate() {
            if entry.name.is_empty() {
                return Err(CatalogError::EmptyName { catalog: catalog.name, index });
            }
            let id = OpcodeId(tag as u16);
            if let Some(first) = by_name.insert(entry.name, id) {
                return Err(CatalogError::DuplicateName { name: entry.name, first, second: id });
            }
        }

        debug!(
            shared = shared.name,
            extension = extension.name,
            shared_count = shared.len(),
            extension_count = extension.len(),
            "merged opcode space"
        );

        Ok(Self { shared, extension, by_name })
    }

    /// The shared catalog merged with `arch`'s extension catalog.
    pub fn for_arch(arch: Arch) -> Result<Self> {
        Self::merge(&SHARED, arch.extension())
    }

    /// The space of the compiled-in target, built on first use.
    pub fn active() -> &'static OpcodeSpace {
        &ACTIVE
    }

    /// Returns the number of opcodes in the space.
    pub fn len(&self) -> usize {
        self.shared.len() + self.extension.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of shared opcodes, which is also the first extension tag.
    pub fn shared_len(&self) -> usize {
        self.shared.len()
    }

    /// Returns the number of extension opcodes.
    pub fn extension_len(&self) -> usize {
        self.extension.len()
    }

    /// Returns true if this space merges the built-in shared catalog with the extension
    /// of [`Arch::ACTIVE`], so its tags agree with [`Opcode`](crate::ir::opcode::Opcode).
    pub fn is_native(&self) -> bool {
        std::ptr::eq(self.shared, &SHARED) && std::ptr::eq(self.extension, Arch::ACTIVE.extension())
    }

    /// Name of the extension catalog.
    pub fn extension_name(&self) -> &'static str {
        self.extension.name
    }

    /// All tags in order. Restartable: each call yields a fresh iterator.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = OpcodeId> + Clone {
        (0..self.len()).map(|i| OpcodeId(i as u16))
    }

    /// Returns true if `id` is a tag of this space.
    pub fn contains(&self, id: OpcodeId) -> bool {
        id.index() < self.len()
    }

    /// Returns true if `id` belongs to the extension catalog.
    pub fn is_extension(&self, id: OpcodeId) -> bool {
        self.contains(id) && id.index() >= self.shared.len()
    }

    /// Returns the catalog entry of `id`, or `None` for a foreign tag.
    pub fn get(&self, id: OpcodeId) -> Option<&'static CatalogEntry> {
        let index = id.index();
        match index.checked_sub(self.shared.len()) {
            None => self.shared.entries.get(index),
            Some(ext) => self.extension.entries.get(ext),
        }
    }

    /// Like [`get`](Self::get), but a foreign tag is an error.
    pub fn entry(&self, id: OpcodeId) -> Result<&'static CatalogEntry> {
        self.get(id)
            .ok_or(CatalogError::ForeignOpcode { id, len: self.len() })
    }

    /// Name of `id`.
    ///
    /// # Panics
    ///
    /// If `id` does not belong to this space.
    pub fn name_of(&self, id: OpcodeId) -> &'static str {
        self.expect_entry(id).name
    }

    /// Descriptor of `id`.
    ///
    /// # Panics
    ///
    /// If `id` does not belong to this space.
    pub fn descriptor(&self, id: OpcodeId) -> &'static OperandDescriptor {
        &self.expect_entry(id).descriptor
    }

    /// Returns the tag of the opcode called `name`.
    pub fn lookup(&self, name: &str) -> Option<OpcodeId> {
        self.by_name.get(name).copied()
    }

    fn expect_entry(&self, id: OpcodeId) -> &'static CatalogEntry {
        match self.get(id) {
            Some(entry) => entry,
            None => panic!("opcode {} is outside a space of {} opcodes", id, self.len()),
        }
    }
}
