use std::collections::HashMap;

use tracing::{trace, warn};

use crate::error::VerifyError;
use crate::ir::block::LBlock;
use crate::ir::inst::{check_operands, InstFlags};

/// Verification pass: checks LIR block invariants.
///
/// 1. Each instruction's operands match its opcode's descriptor.
/// 2. An output register is present exactly when the opcode has a result.
/// 3. No register is defined twice.
/// 4. `MAY_BAIL_OUT` is only set on opcodes that can bail.
/// 5. A terminator can only be the last instruction.
///
/// Returns the first violation found.
pub fn verify_block(block: &LBlock) -> Result<(), VerifyError> {
    let result = check_block(block);
    if let Err(e) = &result {
        warn!(block = block.id, error = %e, "block failed verification");
    }
    result
}

fn check_block(block: &LBlock) -> Result<(), VerifyError> {
    let mut defined_at = HashMap::new();
    let last = block.len().saturating_sub(1);

    for (r, ins) in block.iter() {
        let index = r.index();
        let opcode = ins.opcode();
        trace!(block = block.id, index, %opcode, "verifying instruction");

        check_operands(opcode, ins.operands()).map_err(|source| VerifyError::Operands { index, source })?;

        match (opcode.descriptor().has_result(), ins.output()) {
            (true, None) => return Err(VerifyError::MissingOutput { index, opcode }),
            (false, Some(output)) => return Err(VerifyError::UnexpectedOutput { index, opcode, output }),
            (true, Some(output)) => {
                if let Some(first) = defined_at.insert(output, index) {
                    return Err(VerifyError::Redefinition { index, output, first });
                }
            }
            (false, None) => {}
        }

        if ins.flags.contains(InstFlags::MAY_BAIL_OUT) && !opcode.can_bail() {
            return Err(VerifyError::UnexpectedBailout { index, opcode });
        }

        if opcode.is_terminator() && index != last {
            return Err(VerifyError::MisplacedTerminator { index, opcode });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::opcode::Opcode;
    use crate::ir::operand::{LOperand, VirtualRegister};
    use pretty_assertions::assert_eq;

    fn valid_block() -> LBlock {
        let mut block = LBlock::new(0);
        block.define(Opcode::Parameter, [], VirtualRegister(0)).unwrap();
        block.define(Opcode::Unbox, [LOperand::boxed(0)], VirtualRegister(1)).unwrap();
        block
            .define(Opcode::AddI, [LOperand::gpr(1), LOperand::Constant(1)], VirtualRegister(2))
            .unwrap();
        block.define(Opcode::Box, [LOperand::gpr(2)], VirtualRegister(3)).unwrap();
        block.emit(Opcode::Return, [LOperand::boxed(3)]).unwrap();
        block
    }

    #[test]
    fn test_verification_passes_valid_block() {
        assert_eq!(verify_block(&valid_block()), Ok(()));
        assert_eq!(verify_block(&LBlock::new(1)), Ok(()));
    }

    #[test]
    fn test_verification_detects_missing_output() {
        let mut block = LBlock::new(0);
        block.emit(Opcode::Integer, []).unwrap();
        assert_eq!(
            verify_block(&block),
            Err(VerifyError::MissingOutput { index: 0, opcode: Opcode::Integer })
        );
    }

    #[test]
    fn test_verification_detects_unexpected_output() {
        let mut block = LBlock::new(0);
        block.define(Opcode::Goto, [], VirtualRegister(5)).unwrap();
        assert_eq!(
            verify_block(&block),
            Err(VerifyError::UnexpectedOutput { index: 0, opcode: Opcode::Goto, output: VirtualRegister(5) })
        );
    }

    #[test]
    fn test_verification_detects_redefinition() {
        let mut block = LBlock::new(0);
        block.define(Opcode::Integer, [], VirtualRegister(1)).unwrap();
        block.define(Opcode::Integer, [], VirtualRegister(1)).unwrap();
        assert_eq!(
            verify_block(&block),
            Err(VerifyError::Redefinition { index: 1, output: VirtualRegister(1), first: 0 })
        );
    }

    #[test]
    fn test_verification_detects_bad_bailout_flag() {
        let mut block = LBlock::new(0);
        let r = block.define(Opcode::Integer, [], VirtualRegister(1)).unwrap();
        if let Some(ins) = block.get_mut(r) {
            ins.flags |= InstFlags::MAY_BAIL_OUT;
        }
        assert_eq!(
            verify_block(&block),
            Err(VerifyError::UnexpectedBailout { index: 0, opcode: Opcode::Integer })
        );
    }

    #[test]
    fn test_verification_detects_misplaced_terminator() {
        let mut block = LBlock::new(0);
        block.emit(Opcode::Goto, []).unwrap();
        block.emit(Opcode::CheckOverRecursed, []).unwrap();
        assert_eq!(
            verify_block(&block),
            Err(VerifyError::MisplacedTerminator { index: 0, opcode: Opcode::Goto })
        );
    }
}
