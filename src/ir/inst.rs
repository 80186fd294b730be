use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::error::OperandError;
use crate::ir::descriptor::{Arity, OperandDescriptor};
use crate::ir::opcode::Opcode;
use crate::ir::operand::{LOperand, VirtualRegister};
use crate::ir::views::LView;

/// Operands stored inline before an instruction spills to the heap.
pub const INLINE_OPERANDS: usize = 4;

/// Operand storage of an instruction.
pub type Operands = SmallVec<[LOperand; INLINE_OPERANDS]>;

bitflags! {
    /// Per-instruction state shared by every opcode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstFlags: u8 {
        /// A bailout path is attached to this instruction.
        const MAY_BAIL_OUT         = 1 << 0;
        /// The result is rebuilt by the bailout handler instead of being kept alive.
        const RECOVERED_ON_BAILOUT = 1 << 1;
        /// Operands are used at the start of the instruction only.
        const AT_START             = 1 << 2;
    }
}

/// Bytecode location an instruction was lowered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceSite {
    pub script: u32,
    pub pc: u32,
}

impl fmt::Display for SourceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.script, self.pc)
    }
}

/// A single LIR instruction: an opcode, its operands, and an optional output register.
///
/// The operand list always agrees with the opcode's [`OperandDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub struct LInstruction {
    opcode: Opcode,
    operands: Operands,
    output: Option<VirtualRegister>,
    pub flags: InstFlags,
    pub site: Option<SourceSite>,
}

impl LInstruction {
    /// Create an instruction, checking operand count and kinds against the descriptor.
    pub fn new(opcode: Opcode, operands: impl IntoIterator<Item = LOperand>) -> Result<Self, OperandError> {
        let operands: Operands = operands.into_iter().collect();
        check_operands(opcode, &operands)?;
        Ok(Self {
            opcode,
            operands,
            output: None,
            flags: InstFlags::empty(),
            site: None,
        })
    }

    /// Set the register this instruction defines.
    pub fn with_output(mut self, output: VirtualRegister) -> Self {
        self.output = Some(output);
        self
    }

    /// Add `flags` to those already set.
    pub fn with_flags(mut self, flags: InstFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Record the bytecode location this instruction was lowered from.
    pub fn with_site(mut self, site: SourceSite) -> Self {
        self.site = Some(site);
        self
    }

    /// Returns the opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Returns the descriptor of this instruction's opcode.
    pub fn descriptor(&self) -> &'static OperandDescriptor {
        self.opcode.descriptor()
    }

    /// Returns all operands, in order.
    pub fn operands(&self) -> &[LOperand] {
        &self.operands
    }

    /// Returns operand `index`, if present.
    pub fn operand(&self, index: usize) -> Option<&LOperand> {
        self.operands.get(index)
    }

    /// Runtime operand count; differs between instances of variable-arity opcodes.
    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Returns the register this instruction defines, if any.
    pub fn output(&self) -> Option<VirtualRegister> {
        self.output
    }

    /// Registers read by this instruction, in operand order.
    pub fn uses(&self) -> impl Iterator<Item = VirtualRegister> + '_ {
        self.operands.iter().filter_map(LOperand::register)
    }

    /// Returns true if the operands did not fit inline.
    pub fn spilled(&self) -> bool {
        self.operands.spilled()
    }

    /// Returns true if this instruction has the opcode of view `V`.
    pub fn is<'a, V: LView<'a>>(&'a self) -> bool {
        self.opcode == V::OPCODE
    }

    /// Downcast to the view for this instruction's opcode, or `None` for any other view.
    pub fn try_to<'a, V: LView<'a>>(&'a self) -> Option<V> {
        V::new(self)
    }

    /// Downcast to a view the caller already knows matches.
    ///
    /// # Panics
    ///
    /// If this instruction's opcode is not `V::OPCODE`.
    pub fn to<'a, V: LView<'a>>(&'a self) -> V {
        match V::new(self) {
            Some(view) => view,
            None => panic!(
                "wrong instruction kind: expected {}, found {}",
                V::OPCODE,
                self.opcode
            ),
        }
    }
}

/// Check `operands` against `opcode`'s descriptor.
pub fn check_operands(opcode: Opcode, operands: &[LOperand]) -> Result<(), OperandError> {
    let desc = opcode.descriptor();
    match desc.arity() {
        Arity::Fixed(n) if operands.len() != n as usize => {
            return Err(OperandError::ArityMismatch {
                opcode,
                expected: n as usize,
                found: operands.len(),
            });
        }
        Arity::Variable { min, .. } if operands.len() < min as usize => {
            return Err(OperandError::TooFewOperands {
                opcode,
                min: min as usize,
                found: operands.len(),
            });
        }
        _ => {}
    }

    for (index, operand) in operands.iter().enumerate() {
        let Some(expected) = desc.operand_kind(index) else { continue };
        if !expected.accepts(operand.kind()) {
            return Err(OperandError::KindMismatch {
                opcode,
                index,
                expected,
                found: operand.kind(),
            });
        }
    }
    Ok(())
}

impl fmt::Display for LInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(output) = self.output {
            write!(f, "{} = ", output)?;
        }
        write!(f, "{}", self.opcode)?;
        for (i, operand) in self.operands.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, operand)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::descriptor::OperandKind;
    use crate::ir::views::{LAddI, LPhi, LSubI};

    fn sample_operand(kind: OperandKind, i: u32) -> LOperand {
        match kind {
            OperandKind::Immediate => LOperand::Constant(i as i64),
            OperandKind::Memory => LOperand::Memory { base: VirtualRegister(i), offset: 8 },
            kind => LOperand::Use(VirtualRegister(i), kind),
        }
    }

    fn sample_operands(desc: &OperandDescriptor) -> Vec<LOperand> {
        desc.operands
            .iter()
            .enumerate()
            .map(|(i, &kind)| sample_operand(kind, i as u32))
            .collect()
    }

    #[test]
    fn test_inst_creation() {
        let ins = LInstruction::new(Opcode::AddI, [LOperand::gpr(1), LOperand::Constant(5)])
            .unwrap()
            .with_output(VirtualRegister(3));
        assert_eq!(ins.opcode(), Opcode::AddI);
        assert_eq!(ins.operand_count(), 2);
        assert_eq!(ins.output(), Some(VirtualRegister(3)));
        assert_eq!(ins.uses().collect::<Vec<_>>(), vec![VirtualRegister(1)]);
        assert!(!ins.spilled());
        assert_eq!(ins.to_string(), "v3 = AddI v1, 5");
    }

    #[test]
    fn test_every_opcode_constructible() {
        for op in Opcode::iter() {
            let operands = sample_operands(op.descriptor());
            let ins = LInstruction::new(op, operands.clone())
                .unwrap_or_else(|e| panic!("{} rejected its own descriptor: {}", op, e));
            assert_eq!(ins.operands(), operands.as_slice());
        }
    }

    #[test]
    fn test_fixed_arity_mismatch() {
        let err = LInstruction::new(Opcode::AddI, [LOperand::gpr(1)]).unwrap_err();
        assert_eq!(err, OperandError::ArityMismatch { opcode: Opcode::AddI, expected: 2, found: 1 });

        for op in Opcode::iter().filter(|op| !op.descriptor().is_variadic()) {
            let mut operands = sample_operands(op.descriptor());
            operands.push(LOperand::Constant(0));
            assert!(LInstruction::new(op, operands).is_err(), "{} accepted an extra operand", op);
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let err = LInstruction::new(Opcode::AddI, [LOperand::fpr(1), LOperand::gpr(2)]).unwrap_err();
        assert_eq!(
            err,
            OperandError::KindMismatch {
                opcode: Opcode::AddI,
                index: 0,
                expected: OperandKind::Gpr,
                found: OperandKind::Fpr,
            }
        );
        assert!(LInstruction::new(Opcode::DivPowTwoI, [LOperand::gpr(1), LOperand::gpr(2)]).is_err());
    }

    #[test]
    fn test_variable_arity_records_count() {
        let inputs: Vec<LOperand> = (0..7).map(|i| LOperand::boxed(i)).collect();
        let phi = LInstruction::new(Opcode::Phi, inputs).unwrap().with_output(VirtualRegister(9));
        assert_eq!(phi.operand_count(), 7);
        assert!(phi.spilled());

        let empty = LInstruction::new(Opcode::MoveGroup, []).unwrap();
        assert_eq!(empty.operand_count(), 0);

        let err = LInstruction::new(Opcode::Hypot, [LOperand::fpr(0)]).unwrap_err();
        assert_eq!(err, OperandError::TooFewOperands { opcode: Opcode::Hypot, min: 2, found: 1 });

        let hypot = LInstruction::new(Opcode::Hypot, (0..4).map(LOperand::fpr)).unwrap();
        assert_eq!(hypot.operand_count(), 4);
        assert!(LInstruction::new(Opcode::Hypot, [LOperand::fpr(0), LOperand::fpr(1), LOperand::gpr(2)]).is_err());
    }

    #[test]
    fn test_downcast() {
        let r1 = LOperand::gpr(1);
        let r2 = LOperand::gpr(2);
        let ins = LInstruction::new(Opcode::AddI, [r1, r2]).unwrap();

        assert!(ins.is::<LAddI>());
        assert!(!ins.is::<LSubI>());

        let add = ins.try_to::<LAddI>().unwrap();
        assert_eq!(add.operands(), &[r1, r2]);
        assert!(ins.try_to::<LSubI>().is_none());
        assert!(ins.try_to::<LPhi>().is_none());

        assert_eq!(ins.to::<LAddI>().operand(1), &r2);
    }

    #[test]
    #[should_panic(expected = "wrong instruction kind")]
    fn test_downcast_to_wrong_kind_panics() {
        let ins = LInstruction::new(Opcode::AddI, [LOperand::gpr(1), LOperand::gpr(2)]).unwrap();
        let _ = ins.to::<LSubI>();
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LInstruction>();
        assert_send_sync::<crate::ir::block::LBlock>();
        assert_send_sync::<LAddI<'static>>();
    }

    #[test]
    fn test_flags_and_site() {
        let ins = LInstruction::new(Opcode::GuardShape, [LOperand::gpr(4)])
            .unwrap()
            .with_flags(InstFlags::MAY_BAIL_OUT)
            .with_site(SourceSite { script: 2, pc: 40 });
        assert!(ins.flags.contains(InstFlags::MAY_BAIL_OUT));
        assert!(!ins.flags.contains(InstFlags::AT_START));
        assert_eq!(ins.site.map(|s| s.to_string()), Some("2:40".to_string()));
    }
}
