use std::fmt;

use bitflags::bitflags;

/// Storage class of an operand or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// General-purpose (integer) register.
    Gpr,
    /// Floating-point register.
    Fpr,
    /// 128-bit vector register.
    Simd,
    /// 64-bit integer allocation; may span two registers on 32-bit targets.
    Int64,
    /// Boxed value representation.
    Boxed,
    /// Memory or stack reference.
    Memory,
    /// Constant encoded in the instruction.
    Immediate,
    /// Register or constant.
    Any,
}

impl OperandKind {
    /// Whether an operand of kind `actual` may fill a slot of this kind.
    /// `Any` slots accept everything; otherwise kinds must match exactly.
    pub fn accepts(self, actual: OperandKind) -> bool {
        self == OperandKind::Any || self == actual
    }

    /// The catalog keyword for this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            OperandKind::Gpr => "gpr",
            OperandKind::Fpr => "fpr",
            OperandKind::Simd => "simd",
            OperandKind::Int64 => "i64",
            OperandKind::Boxed => "box",
            OperandKind::Memory => "mem",
            OperandKind::Immediate => "imm",
            OperandKind::Any => "any",
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Coarse grouping of opcodes, for consumers that act on a family at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Constant,
    Arith,
    Convert,
    Boxing,
    Simd,
    Alloc,
    Property,
    Element,
    Atomic,
    Strings,
    Call,
    Control,
    Guard,
    Runtime,
    Meta,
    Wasm,
}

impl Category {
    pub fn keyword(self) -> &'static str {
        match self {
            Category::Constant => "const",
            Category::Arith => "arith",
            Category::Convert => "convert",
            Category::Boxing => "box",
            Category::Simd => "simd",
            Category::Alloc => "alloc",
            Category::Property => "prop",
            Category::Element => "elem",
            Category::Atomic => "atomic",
            Category::Strings => "string",
            Category::Call => "call",
            Category::Control => "control",
            Category::Guard => "guard",
            Category::Runtime => "runtime",
            Category::Meta => "meta",
            Category::Wasm => "wasm",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

bitflags! {
    /// Static properties of an opcode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpFlags: u8 {
        /// Performs a call into the runtime or another function.
        const CALL       = 1 << 0;
        /// May transfer control back to a slower tier.
        const CAN_BAIL   = 1 << 1;
        /// Has effects visible outside its result; cannot be re-executed after a bailout.
        const EFFECTFUL  = 1 << 2;
        /// Ends a block.
        const TERMINATOR = 1 << 3;
    }
}

/// Operand count of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(u8),
    /// `min` leading operands, then any number of `rest` operands.
    Variable { min: u8, rest: OperandKind },
}

/// Per-opcode static metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandDescriptor {
    pub category: Category,
    /// Leading operand slots, in order.
    pub operands: &'static [OperandKind],
    /// Kind of every operand after `operands`, for variable-arity opcodes.
    pub rest: Option<OperandKind>,
    pub result: Option<OperandKind>,
    pub flags: OpFlags,
}

impl OperandDescriptor {
    /// Most leading operand slots a descriptor can declare.
    pub const MAX_OPERANDS: usize = u8::MAX as usize;

    /// # Panics
    ///
    /// If `operands` has more than [`MAX_OPERANDS`](Self::MAX_OPERANDS) slots.
    pub const fn new(category: Category, operands: &'static [OperandKind]) -> Self {
        assert!(operands.len() <= Self::MAX_OPERANDS, "too many operand slots");
        Self {
            category,
            operands,
            rest: None,
            result: None,
            flags: OpFlags::empty(),
        }
    }

    pub const fn with_result(mut self, kind: OperandKind) -> Self {
        self.result = Some(kind);
        self
    }

    pub const fn with_rest(mut self, kind: OperandKind) -> Self {
        self.rest = Some(kind);
        self
    }

    pub const fn with_flags(mut self, flags: OpFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the operand count this opcode takes.
    pub fn arity(&self) -> Arity {
        // `new` caps the slot count at `u8::MAX`.
        let min = self.operands.len() as u8;
        match self.rest {
            Some(rest) => Arity::Variable { min, rest },
            None => Arity::Fixed(min),
        }
    }

    /// Returns true for variable-arity opcodes.
    pub fn is_variadic(&self) -> bool {
        self.rest.is_some()
    }

    /// Slot kind for operand `index`, or `None` past the end of a fixed-arity list.
    pub fn operand_kind(&self, index: usize) -> Option<OperandKind> {
        self.operands.get(index).copied().or(self.rest)
    }

    /// Whether `count` operands is a valid length.
    pub fn accepts_count(&self, count: usize) -> bool {
        match self.arity() {
            Arity::Fixed(n) => count == n as usize,
            Arity::Variable { min, .. } => count >= min as usize,
        }
    }

    /// Returns true if the opcode defines an output register.
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD: OperandDescriptor = OperandDescriptor::new(Category::Arith, &[OperandKind::Gpr, OperandKind::Any])
        .with_result(OperandKind::Gpr)
        .with_flags(OpFlags::CAN_BAIL);

    const PHI: OperandDescriptor = OperandDescriptor::new(Category::Meta, &[])
        .with_rest(OperandKind::Any)
        .with_result(OperandKind::Any);

    #[test]
    fn test_kind_compatibility() {
        assert!(OperandKind::Gpr.accepts(OperandKind::Gpr));
        assert!(OperandKind::Any.accepts(OperandKind::Immediate));
        assert!(OperandKind::Any.accepts(OperandKind::Boxed));
        assert!(!OperandKind::Gpr.accepts(OperandKind::Fpr));
        assert!(!OperandKind::Gpr.accepts(OperandKind::Any));
    }

    #[test]
    fn test_fixed_arity() {
        assert_eq!(ADD.arity(), Arity::Fixed(2));
        assert!(ADD.accepts_count(2));
        assert!(!ADD.accepts_count(1));
        assert!(!ADD.accepts_count(3));
        assert_eq!(ADD.operand_kind(1), Some(OperandKind::Any));
        assert_eq!(ADD.operand_kind(2), None);
    }

    #[test]
    #[should_panic(expected = "too many operand slots")]
    fn test_descriptor_rejects_too_many_operands() {
        static WIDE: [OperandKind; 256] = [OperandKind::Any; 256];
        let _ = OperandDescriptor::new(Category::Meta, &WIDE);
    }

    #[test]
    fn test_descriptor_accepts_max_operands() {
        static FULL: [OperandKind; 255] = [OperandKind::Gpr; 255];
        let desc = OperandDescriptor::new(Category::Meta, &FULL);
        assert_eq!(desc.arity(), Arity::Fixed(255));
    }

    #[test]
    fn test_variable_arity() {
        assert_eq!(PHI.arity(), Arity::Variable { min: 0, rest: OperandKind::Any });
        assert!(PHI.accepts_count(0));
        assert!(PHI.accepts_count(17));
        assert_eq!(PHI.operand_kind(16), Some(OperandKind::Any));
    }

    #[test]
    fn test_flags() {
        let flags = OpFlags::CALL.union(OpFlags::EFFECTFUL);
        assert!(flags.contains(OpFlags::CALL));
        assert!(!flags.contains(OpFlags::CAN_BAIL));
        assert_eq!(ADD.flags, OpFlags::CAN_BAIL);
        assert_eq!(OpFlags::from_bits_truncate(0b1010), OpFlags::CAN_BAIL | OpFlags::TERMINATOR);
    }

    #[test]
    fn test_keywords_display() {
        assert_eq!(OperandKind::Int64.to_string(), "i64");
        assert_eq!(Category::Strings.to_string(), "string");
    }
}
