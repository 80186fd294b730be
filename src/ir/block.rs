use std::fmt;

use crate::error::OperandError;
use crate::ir::inst::LInstruction;
use crate::ir::opcode::Opcode;
use crate::ir::operand::{LOperand, VirtualRegister};
use crate::ir::printer::LirPrinter;

/// Position of an instruction within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstRef(pub u32);

impl InstRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A straight-line sequence of LIR instructions, ending in a terminator once complete.
/// The block owns its instructions; they refer to values only through virtual registers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LBlock {
    pub id: u32,
    instructions: Vec<LInstruction>,
}

impl LBlock {
    /// Create an empty block.
    pub fn new(id: u32) -> Self {
        Self { id, instructions: Vec::new() }
    }

    /// Append an already-built instruction.
    pub fn push(&mut self, ins: LInstruction) -> InstRef {
        let idx = self.instructions.len();
        self.instructions.push(ins);
        InstRef(idx as u32)
    }

    /// Build and append an instruction with no output.
    pub fn emit(&mut self, opcode: Opcode, operands: impl IntoIterator<Item = LOperand>) -> Result<InstRef, OperandError> {
        let ins = LInstruction::new(opcode, operands)?;
        Ok(self.push(ins))
    }

    /// Build and append an instruction defining `output`.
    pub fn define(
        &mut self,
        opcode: Opcode,
        operands: impl IntoIterator<Item = LOperand>,
        output: VirtualRegister,
    ) -> Result<InstRef, OperandError> {
        let ins = LInstruction::new(opcode, operands)?.with_output(output);
        Ok(self.push(ins))
    }

    /// Returns the instruction at `r`.
    pub fn get(&self, r: InstRef) -> Option<&LInstruction> {
        self.instructions.get(r.index())
    }

    /// Returns the instruction at `r` for updating its flags or site.
    pub fn get_mut(&mut self, r: InstRef) -> Option<&mut LInstruction> {
        self.instructions.get_mut(r.index())
    }

    /// Returns the number of instructions in the block.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the instructions in program order.
    pub fn instructions(&self) -> &[LInstruction] {
        &self.instructions
    }

    /// Instructions paired with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (InstRef, &LInstruction)> {
        self.instructions
            .iter()
            .enumerate()
            .map(|(i, ins)| (InstRef(i as u32), ins))
    }

    /// The last instruction, if it ends the block.
    pub fn terminator(&self) -> Option<&LInstruction> {
        self.instructions.last().filter(|ins| ins.opcode().is_terminator())
    }

    /// Returns true if the block ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        self.terminator().is_some()
    }
}

impl fmt::Display for LBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block {}:", self.id)?;
        LirPrinter::new(f).print_block(self)
    }
}
