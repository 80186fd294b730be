//! Handler tables keyed by opcode tag.
//!
//! The data-level counterpart of [`LirVisitor`](crate::ir::visitor::LirVisitor): handlers
//! are registered one opcode at a time into a [`HandlerSet`], and [`HandlerSet::finish`]
//! only yields a [`HandlerTable`] once every opcode of the space has exactly one.

use tracing::{debug, warn};

use crate::catalog::space::{OpcodeId, OpcodeSpace};
use crate::catalog::Arch;
use crate::error::{CatalogError, Result};
use crate::ir::inst::LInstruction;

/// Handlers being collected for one opcode space.
///
/// There is no default handler: every opcode is registered on its own.
pub struct HandlerSet<'s, H> {
    space: &'s OpcodeSpace,
    handlers: Vec<Option<H>>,
}

impl<'s, H> HandlerSet<'s, H> {
    /// Start an empty set over `space`.
    pub fn new(space: &'s OpcodeSpace) -> Self {
        let mut handlers = Vec::with_capacity(space.len());
        handlers.resize_with(space.len(), || None);
        Self { space, handlers }
    }

    /// Returns the space the handlers are keyed by.
    pub fn space(&self) -> &'s OpcodeSpace {
        self.space
    }

    /// Register `handler` for `id`. Each opcode takes exactly one handler.
    pub fn register(&mut self, id: impl Into<OpcodeId>, handler: H) -> Result<()> {
        let id = id.into();
        let name = self.space.entry(id)?.name;
        let slot = &mut self.handlers[id.index()];
        if slot.is_some() {
            return Err(CatalogError::DuplicateHandler { name });
        }
        *slot = Some(handler);
        Ok(())
    }

    /// Register `handler` for the opcode called `name`.
    pub fn on(mut self, name: &str, handler: H) -> Result<Self> {
        let id = self
            .space
            .lookup(name)
            .ok_or_else(|| CatalogError::UnknownOpcode { name: name.to_string() })?;
        self.register(id, handler)?;
        Ok(self)
    }

    /// Returns true if `id` already has a handler.
    pub fn is_registered(&self, id: OpcodeId) -> bool {
        self.handlers.get(id.index()).is_some_and(Option::is_some)
    }

    /// Names of the opcodes still without a handler, in tag order.
    pub fn missing(&self) -> Vec<&'static str> {
        self.handlers
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| self.space.name_of(OpcodeId(i as u16)))
            .collect()
    }

    /// Freeze into a dense table. Fails unless every opcode of the space has a handler.
    pub fn finish(self) -> Result<HandlerTable<H>> {
        let missing = self.missing();
        if !missing.is_empty() {
            warn!(
                extension = self.space.extension_name(),
                missing = missing.len(),
                "incomplete handler table"
            );
            return Err(CatalogError::MissingHandlers { missing });
        }

        let handlers: Box<[H]> = self.handlers.into_iter().flatten().collect();
        debug!(
            extension = self.space.extension_name(),
            handlers = handlers.len(),
            "handler table complete"
        );
        Ok(HandlerTable {
            handlers,
            extension: self.space.extension_name(),
            native: self.space.is_native(),
        })
    }
}

/// One handler per opcode, indexed by tag.
#[derive(Debug, Clone)]
pub struct HandlerTable<H> {
    handlers: Box<[H]>,
    extension: &'static str,
    native: bool,
}

impl<H> HandlerTable<H> {
    /// Returns the number of handlers, one per opcode of the space.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Name of the extension catalog the table was built for.
    pub fn extension_name(&self) -> &'static str {
        self.extension
    }

    /// Returns true if the table was built over a space whose tags match
    /// [`Opcode`](crate::ir::opcode::Opcode), see [`OpcodeSpace::is_native`].
    pub fn is_native(&self) -> bool {
        self.native
    }

    /// Returns the handler registered for `id`.
    pub fn get(&self, id: OpcodeId) -> Option<&H> {
        self.handlers.get(id.index())
    }

    /// Handlers in tag order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (OpcodeId, &H)> {
        self.handlers.iter().enumerate().map(|(i, h)| (OpcodeId(i as u16), h))
    }
}

impl<C: ?Sized, R> HandlerTable<fn(&mut C, &LInstruction) -> R> {
    /// Run the handler for `ins`'s opcode.
    ///
    /// # Panics
    ///
    /// If the table was built for another target, whose extension tags mean different opcodes.
    #[inline]
    pub fn dispatch(&self, cx: &mut C, ins: &LInstruction) -> R {
        assert!(
            self.native,
            "handler table for `{}` cannot dispatch `{}` instructions",
            self.extension,
            Arch::ACTIVE
        );
        (self.handlers[ins.opcode().id().index()])(cx, ins)
    }
}
