use crate::assembler::Label;
use crate::bytecode::{BinaryOp, CompareOp, Value};

/// Symbolic instruction emitted by the builders. Jump targets are labels and
/// `Mark` pins a label to the position of the next real instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    LoadConst(Value),
    LoadName(String),
    StoreName(String),
    Binary(BinaryOp),
    Compare(CompareOp),
    JumpIfFalse(Label),
    Jump(Label),
    BuildString(u32),
    Call(u8),
    MakeFunction(String),
    Return,
    Pop,
    Mark(Label),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferId(usize);

/// Instruction buffers owned by in-progress builders, addressed by index.
/// Finalizing a builder moves its buffers out with [`InstrArena::take`].
#[derive(Debug, Default)]
pub struct InstrArena {
    buffers: Vec<Vec<Instr>>,
}

impl InstrArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> BufferId {
        self.buffers.push(Vec::new());
        BufferId(self.buffers.len() - 1)
    }

    pub fn alloc_with(&mut self, instrs: Vec<Instr>) -> BufferId {
        self.buffers.push(instrs);
        BufferId(self.buffers.len() - 1)
    }

    pub fn extend(&mut self, id: BufferId, instrs: impl IntoIterator<Item = Instr>) {
        self.buffers[id.0].extend(instrs);
    }

    pub fn take(&mut self, id: BufferId) -> Vec<Instr> {
        std::mem::take(&mut self.buffers[id.0])
    }
}
