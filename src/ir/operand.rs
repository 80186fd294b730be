use std::fmt;

use crate::ir::descriptor::OperandKind;

/// Index into the compilation's value-numbering table.
///
/// Instructions only name registers; they never own the values behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualRegister(pub u32);

impl VirtualRegister {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VirtualRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// One operand of an LIR instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LOperand {
    /// A use of a virtual register, with the storage class the use requires.
    Use(VirtualRegister, OperandKind),
    /// A constant encoded in the instruction.
    Constant(i64),
    /// A memory location: `base + offset`.
    Memory { base: VirtualRegister, offset: i32 },
}

impl LOperand {
    /// Integer register use.
    pub fn gpr(reg: u32) -> Self {
        LOperand::Use(VirtualRegister(reg), OperandKind::Gpr)
    }

    pub fn fpr(reg: u32) -> Self {
        LOperand::Use(VirtualRegister(reg), OperandKind::Fpr)
    }

    pub fn boxed(reg: u32) -> Self {
        LOperand::Use(VirtualRegister(reg), OperandKind::Boxed)
    }

    /// Kind of this operand, as checked against descriptor slots.
    pub fn kind(&self) -> OperandKind {
        match self {
            LOperand::Use(_, kind) => *kind,
            LOperand::Constant(_) => OperandKind::Immediate,
            LOperand::Memory { .. } => OperandKind::Memory,
        }
    }

    /// Registers read by this operand. A memory operand reads its base.
    pub fn register(&self) -> Option<VirtualRegister> {
        match self {
            LOperand::Use(reg, _) => Some(*reg),
            LOperand::Memory { base, .. } => Some(*base),
            LOperand::Constant(_) => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, LOperand::Constant(_))
    }
}

impl fmt::Display for LOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LOperand::Use(reg, _) => write!(f, "{}", reg),
            LOperand::Constant(value) => write!(f, "{}", value),
            LOperand::Memory { base, offset } if *offset < 0 => write!(f, "[{} - {}]", base, offset.unsigned_abs()),
            LOperand::Memory { base, offset } => write!(f, "[{} + {}]", base, offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_kind() {
        assert_eq!(LOperand::gpr(1).kind(), OperandKind::Gpr);
        assert_eq!(LOperand::Constant(5).kind(), OperandKind::Immediate);
        let mem = LOperand::Memory { base: VirtualRegister(2), offset: 8 };
        assert_eq!(mem.kind(), OperandKind::Memory);
        assert_eq!(mem.register(), Some(VirtualRegister(2)));
        assert_eq!(LOperand::Constant(0).register(), None);
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(LOperand::gpr(3).to_string(), "v3");
        assert_eq!(LOperand::Constant(-7).to_string(), "-7");
        assert_eq!(LOperand::Memory { base: VirtualRegister(1), offset: -16 }.to_string(), "[v1 - 16]");
        assert_eq!(LOperand::Memory { base: VirtualRegister(1), offset: 16 }.to_string(), "[v1 + 16]");
    }
}
