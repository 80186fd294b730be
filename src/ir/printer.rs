//! Plain-text dump of LIR, one instruction per line.

use std::fmt;

use crate::ir::block::LBlock;
use crate::ir::inst::{InstFlags, LInstruction};
use crate::ir::views::*;
use crate::ir::visitor::{dispatch, LirVisitor};

/// Writes instructions as `v3 = AddI v1, 5`, followed by any flags and source site.
pub struct LirPrinter<'w> {
    out: &'w mut dyn fmt::Write,
}

impl<'w> LirPrinter<'w> {
    pub fn new(out: &'w mut dyn fmt::Write) -> Self {
        Self { out }
    }

    pub fn print_block(&mut self, block: &LBlock) -> fmt::Result {
        for (r, ins) in block.iter() {
            write!(self.out, "  {}  ", r)?;
            dispatch(self, ins)?;
        }
        Ok(())
    }

    pub fn print_instruction(&mut self, ins: &LInstruction) -> fmt::Result {
        dispatch(self, ins)
    }

    fn line(&mut self, ins: &LInstruction) -> fmt::Result {
        write!(self.out, "{}", ins)?;
        for (flag, label) in [
            (InstFlags::MAY_BAIL_OUT, "bail"),
            (InstFlags::RECOVERED_ON_BAILOUT, "recovered"),
            (InstFlags::AT_START, "at-start"),
        ] {
            if ins.flags.contains(flag) {
                write!(self.out, " [{}]", label)?;
            }
        }
        if let Some(site) = ins.site {
            write!(self.out, " @{}", site)?;
        }
        writeln!(self.out)
    }
}

macro_rules! print_every_opcode {
    ($(($op:ident, $view:ident, $visit:ident))*) => {
        impl LirVisitor for LirPrinter<'_> {
            type Output = fmt::Result;
            $(
                fn $visit(&mut self, ins: $view<'_>) -> fmt::Result {
                    self.line(ins.instruction())
                }
            )*
        }
    };
}

for_each_lir_opcode!(print_every_opcode);
