//! Dispatch Benchmarks
//!
//! Compares the two ways of routing an instruction to its handler:
//!
//! - `visitor`: exhaustive `match` generated into `dispatch`
//! - `table`: indexed call through a finished `HandlerTable`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use lir_catalog::ir::dispatch::HandlerSet;
use lir_catalog::ir::views::*;
use lir_catalog::ir::visitor::{dispatch, LirVisitor};
use lir_catalog::{LBlock, LInstruction, LOperand, Opcode, OpcodeSpace, VirtualRegister};

struct OperandSum;

macro_rules! sum_operands {
    ($(($op:ident, $view:ident, $visit:ident))*) => {
        impl LirVisitor for OperandSum {
            type Output = usize;
            $(
                #[inline]
                fn $visit(&mut self, ins: $view<'_>) -> usize {
                    ins.operands().len()
                }
            )*
        }
    };
}

lir_catalog::for_each_lir_opcode!(sum_operands);

fn count_operands(_: &mut (), ins: &LInstruction) -> usize {
    ins.operand_count()
}

/// A block mixing arithmetic, boxing, guards, and a variadic phi.
fn sample_block() -> LBlock {
    let mut block = LBlock::new(0);
    block
        .define(Opcode::Phi, (0..6).map(LOperand::gpr), VirtualRegister(100))
        .unwrap();
    for i in 0..64u32 {
        block
            .define(Opcode::AddI, [LOperand::gpr(i), LOperand::Constant(1)], VirtualRegister(i + 1))
            .unwrap();
        block.emit(Opcode::GuardShape, [LOperand::gpr(i + 1)]).unwrap();
        block
            .define(Opcode::Box, [LOperand::gpr(i + 1)], VirtualRegister(200 + i))
            .unwrap();
    }
    block.emit(Opcode::Goto, []).unwrap();
    block
}

// =============================================================================
// Visitor vs Table
// =============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let block = sample_block();

    let space = OpcodeSpace::active();
    let mut handlers = HandlerSet::new(space);
    for id in space.iter() {
        handlers.register(id, count_operands as fn(&mut (), &LInstruction) -> usize).unwrap();
    }
    let table = handlers.finish().unwrap();

    let mut group = c.benchmark_group("dispatch");

    group.bench_function("visitor", |b| {
        b.iter(|| {
            let mut visitor = OperandSum;
            black_box(&block)
                .instructions()
                .iter()
                .map(|ins| dispatch(&mut visitor, ins))
                .sum::<usize>()
        })
    });

    group.bench_function("table", |b| {
        b.iter(|| {
            black_box(&block)
                .instructions()
                .iter()
                .map(|ins| table.dispatch(&mut (), ins))
                .sum::<usize>()
        })
    });

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    c.bench_function("construct_block", |b| b.iter(|| black_box(sample_block())));
}

criterion_group!(benches, bench_dispatch, bench_construction);
criterion_main!(benches);
