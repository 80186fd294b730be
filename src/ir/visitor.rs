//! Exhaustive dispatch over opcodes.
//!
//! [`LirVisitor`] has one required method per opcode, so an implementation that misses
//! an opcode does not compile:
//!
//! ```compile_fail
//! use lir_catalog::ir::views::LAddI;
//! use lir_catalog::ir::visitor::LirVisitor;
//!
//! struct OnlyAdds;
//!
//! impl LirVisitor for OnlyAdds {
//!     type Output = ();
//!     fn visit_add_i(&mut self, _ins: LAddI<'_>) {}
//! }
//! ```
//!
//! Visitors that treat opcodes uniformly generate their methods with
//! [`for_each_lir_opcode!`](crate::for_each_lir_opcode):
//!
//! ```
//! use lir_catalog::ir::inst::LInstruction;
//! use lir_catalog::ir::opcode::Opcode;
//! use lir_catalog::ir::operand::LOperand;
//! use lir_catalog::ir::views::*;
//! use lir_catalog::ir::visitor::{dispatch, LirVisitor};
//!
//! struct OperandCounter;
//!
//! macro_rules! count_operands {
//!     ($(($op:ident, $view:ident, $visit:ident))*) => {
//!         impl LirVisitor for OperandCounter {
//!             type Output = usize;
//!             $(fn $visit(&mut self, ins: $view<'_>) -> usize { ins.operands().len() })*
//!         }
//!     };
//! }
//! lir_catalog::for_each_lir_opcode!(count_operands);
//!
//! let ins = LInstruction::new(Opcode::AddI, [LOperand::gpr(1), LOperand::Constant(2)]).unwrap();
//! assert_eq!(dispatch(&mut OperandCounter, &ins), 2);
//! ```

use crate::ir::inst::LInstruction;
use crate::ir::opcode::Opcode;
use crate::ir::views::*;

macro_rules! define_visitor {
    ($(($op:ident, $view:ident, $visit:ident))*) => {
        /// A consumer with one handler per opcode.
        pub trait LirVisitor {
            type Output;

            $(
                #[doc = concat!("Handle [`Opcode::", stringify!($op), "`].")]
                fn $visit(&mut self, ins: $view<'_>) -> Self::Output;
            )*
        }

        /// Call the one method of `visitor` that matches `ins`'s opcode.
        #[inline]
        pub fn dispatch<V: LirVisitor + ?Sized>(visitor: &mut V, ins: &LInstruction) -> V::Output {
            match ins.opcode() {
                $(Opcode::$op => visitor.$visit($view { ins }),)*
            }
        }
    };
}

for_each_lir_opcode!(define_visitor);
