//! Typed views over [`LInstruction`], one per opcode.
//!
//! A view is a checked handle: it can only be obtained for an instruction with the
//! matching opcode, through [`LInstruction::try_to`], [`LInstruction::to`], or by
//! [`dispatch`](crate::ir::visitor::dispatch).

use crate::ir::inst::LInstruction;
use crate::ir::opcode::Opcode;
use crate::ir::operand::{LOperand, VirtualRegister};

/// A borrowed, opcode-specific handle on an instruction.
pub trait LView<'a>: Copy + Sized {
    /// The opcode every instance of this view carries.
    const OPCODE: Opcode;

    /// Returns `None` unless `ins` has opcode [`Self::OPCODE`].
    fn new(ins: &'a LInstruction) -> Option<Self>;

    fn instruction(&self) -> &'a LInstruction;

    fn operands(&self) -> &'a [LOperand] {
        self.instruction().operands()
    }

    /// # Panics
    ///
    /// If `index` is out of range.
    fn operand(&self, index: usize) -> &'a LOperand {
        &self.operands()[index]
    }

    fn output(&self) -> Option<VirtualRegister> {
        self.instruction().output()
    }
}

macro_rules! define_views {
    ($(($op:ident, $view:ident, $visit:ident))*) => {
        $(
            #[doc = concat!("View of an instruction with opcode [`Opcode::", stringify!($op), "`].")]
            #[derive(Debug, Clone, Copy)]
            pub struct $view<'a> {
                pub(crate) ins: &'a LInstruction,
            }

            impl<'a> LView<'a> for $view<'a> {
                const OPCODE: Opcode = Opcode::$op;

                #[inline]
                fn new(ins: &'a LInstruction) -> Option<Self> {
                    (ins.opcode() == Opcode::$op).then_some(Self { ins })
                }

                #[inline]
                fn instruction(&self) -> &'a LInstruction {
                    self.ins
                }
            }
        )*
    };
}

for_each_lir_opcode!(define_views);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_reads_instruction() {
        let ins = LInstruction::new(Opcode::Phi, [LOperand::boxed(1), LOperand::boxed(2), LOperand::boxed(3)])
            .unwrap()
            .with_output(VirtualRegister(4));
        let phi = LPhi::new(&ins).unwrap();
        assert_eq!(phi.operands().len(), 3);
        assert_eq!(phi.operand(2), &LOperand::boxed(3));
        assert_eq!(phi.output(), Some(VirtualRegister(4)));
        assert!(std::ptr::eq(phi.instruction(), &ins));
    }

    #[test]
    fn test_view_opcode_constants() {
        assert_eq!(LAddI::OPCODE, Opcode::AddI);
        assert_eq!(LGoto::OPCODE, Opcode::Goto);
        assert_eq!(LWasmCallI64::OPCODE, Opcode::WasmCallI64);
        assert!(LGoto::new(&LInstruction::new(Opcode::Return, [LOperand::boxed(0)]).unwrap()).is_none());
    }
}
