use std::collections::BTreeSet;

use crate::ir::block::LBlock;
use crate::ir::opcode::Opcode;
use crate::ir::operand::VirtualRegister;

/// Local liveness facts for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockLiveness {
    /// Registers defined in the block.
    pub defs: BTreeSet<VirtualRegister>,
    /// Registers read before any definition in the block (upward-exposed uses).
    pub uses: BTreeSet<VirtualRegister>,
}

impl BlockLiveness {
    /// Registers live on entry given those live on exit: `uses ∪ (live_out − defs)`.
    pub fn live_in(&self, live_out: &BTreeSet<VirtualRegister>) -> BTreeSet<VirtualRegister> {
        let mut live = self.uses.clone();
        live.extend(live_out.difference(&self.defs).copied());
        live
    }
}

/// Compute defs and upward-exposed uses of `block` from operands alone.
///
/// Phi inputs are read on the incoming edges, not in the block, so they are not uses here.
pub fn analyze_block(block: &LBlock) -> BlockLiveness {
    let mut liveness = BlockLiveness::default();
    for (_, ins) in block.iter() {
        if ins.opcode() != Opcode::Phi {
            for reg in ins.uses() {
                if !liveness.defs.contains(&reg) {
                    liveness.uses.insert(reg);
                }
            }
        }
        if let Some(output) = ins.output() {
            liveness.defs.insert(output);
        }
    }
    liveness
}
