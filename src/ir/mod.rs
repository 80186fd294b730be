//! LIR: opcodes, instructions, blocks, and the passes that walk them.

pub mod block;
pub mod descriptor;
pub mod dispatch;
pub mod inst;
pub mod liveness;
pub mod opcode;
pub mod operand;
pub mod printer;
pub mod verify;
pub mod views;
pub mod visitor;
