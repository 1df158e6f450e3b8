use crate::assembler::{Label, LabelAllocator};

use super::ir::{BufferId, Instr, InstrArena};

/// `selama (guard) { body }`.
#[derive(Debug)]
pub struct LoopUnit {
    guard: BufferId,
    body: BufferId,
    start: Label,
    end: Label,
    pub line: u32,
}

impl LoopUnit {
    pub fn begin(
        guard: Vec<Instr>,
        line: u32,
        arena: &mut InstrArena,
        labels: &mut LabelAllocator,
    ) -> Self {
        Self {
            guard: arena.alloc_with(guard),
            body: arena.alloc(),
            start: labels.fresh(),
            end: labels.fresh(),
            line,
        }
    }

    pub fn add_content(&self, arena: &mut InstrArena, instrs: impl IntoIterator<Item = Instr>) {
        arena.extend(self.body, instrs);
    }

    /// `berhenti`
    pub fn break_instr(&self) -> Instr {
        Instr::Jump(self.end)
    }

    /// `lewati`
    pub fn continue_instr(&self) -> Instr {
        Instr::Jump(self.start)
    }

    pub fn finish(self, arena: &mut InstrArena) -> Vec<Instr> {
        let mut code = vec![Instr::Mark(self.start)];
        code.extend(arena.take(self.guard));
        code.push(Instr::JumpIfFalse(self.end));
        code.extend(arena.take(self.body));
        code.push(Instr::Jump(self.start));
        code.push(Instr::Mark(self.end));
        code
    }
}
