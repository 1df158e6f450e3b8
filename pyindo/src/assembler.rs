use std::collections::{HashMap, HashSet};

use crate::bytecode::Instruction;
use crate::compiler::ir::Instr;

/// Forward reference to an instruction offset, resolved by [`Assembler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    DuplicateLabel(Label),
    UnknownLabel(Label),
    UnusedLabel(Label),
}

impl std::fmt::Display for AssemblerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssemblerError::DuplicateLabel(label) => write!(f, "label {label} is marked twice"),
            AssemblerError::UnknownLabel(label) => {
                write!(f, "jump to label {label} which is never marked")
            }
            AssemblerError::UnusedLabel(label) => {
                write!(f, "label {label} is marked but never used as a jump target")
            }
        }
    }
}

impl std::error::Error for AssemblerError {}

struct Fixup {
    at: usize,
    label: Label,
}

/// Two-phase resolver: markers record offsets while jumps are emitted with a
/// placeholder, then every placeholder is patched in `finish`.
#[derive(Default)]
pub struct Assembler {
    code: Vec<Instruction>,
    labels: HashMap<Label, u32>,
    fixups: Vec<Fixup>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn label(&mut self, label: Label) -> Result<(), AssemblerError> {
        if self.labels.contains_key(&label) {
            return Err(AssemblerError::DuplicateLabel(label));
        }
        let pos = self.position();
        self.labels.insert(label, pos);
        Ok(())
    }

    pub fn push(&mut self, instr: Instr) -> Result<(), AssemblerError> {
        let resolved = match instr {
            Instr::Mark(label) => return self.label(label),
            Instr::JumpIfFalse(label) => {
                self.fixups.push(Fixup {
                    at: self.code.len(),
                    label,
                });
                Instruction::JumpIfFalse(u32::MAX)
            }
            Instr::Jump(label) => {
                self.fixups.push(Fixup {
                    at: self.code.len(),
                    label,
                });
                Instruction::Jump(u32::MAX)
            }
            Instr::LoadConst(value) => Instruction::LoadConst(value),
            Instr::LoadName(name) => Instruction::LoadName(name),
            Instr::StoreName(name) => Instruction::StoreName(name),
            Instr::Binary(op) => Instruction::Binary(op),
            Instr::Compare(op) => Instruction::Compare(op),
            Instr::BuildString(count) => Instruction::BuildString(count),
            Instr::Call(argc) => Instruction::Call(argc),
            Instr::MakeFunction(name) => Instruction::MakeFunction(name),
            Instr::Return => Instruction::Return,
            Instr::Pop => Instruction::Pop,
        };
        self.code.push(resolved);
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<Instruction>, AssemblerError> {
        let mut used = HashSet::new();
        for fixup in self.fixups.drain(..) {
            let target = self
                .labels
                .get(&fixup.label)
                .copied()
                .ok_or(AssemblerError::UnknownLabel(fixup.label))?;
            used.insert(fixup.label);
            match &mut self.code[fixup.at] {
                Instruction::JumpIfFalse(slot) | Instruction::Jump(slot) => *slot = target,
                _ => return Err(AssemblerError::UnknownLabel(fixup.label)),
            }
        }
        let mut unused: Vec<Label> = self
            .labels
            .keys()
            .filter(|label| !used.contains(*label))
            .copied()
            .collect();
        unused.sort_unstable();
        if let Some(label) = unused.first() {
            return Err(AssemblerError::UnusedLabel(*label));
        }
        Ok(self.code)
    }
}

pub fn assemble(instrs: Vec<Instr>) -> Result<Vec<Instruction>, AssemblerError> {
    let mut assembler = Assembler::new();
    for instr in instrs {
        assembler.push(instr)?;
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Value;

    #[test]
    fn forward_jump_is_patched() {
        let mut labels = LabelAllocator::new();
        let end = labels.fresh();
        let code = assemble(vec![
            Instr::LoadConst(Value::Bool(false)),
            Instr::JumpIfFalse(end),
            Instr::LoadConst(Value::Int(1)),
            Instr::Pop,
            Instr::Mark(end),
            Instr::Return,
        ])
        .expect("assemble should succeed");
        assert_eq!(code.len(), 5);
        assert_eq!(code[1], Instruction::JumpIfFalse(4));
        assert_eq!(code[4], Instruction::Return);
    }

    #[test]
    fn backward_jump_is_patched() {
        let mut labels = LabelAllocator::new();
        let start = labels.fresh();
        let code = assemble(vec![Instr::Mark(start), Instr::Pop, Instr::Jump(start)])
            .expect("assemble should succeed");
        assert_eq!(code, vec![Instruction::Pop, Instruction::Jump(0)]);
    }

    #[test]
    fn marking_twice_is_rejected() {
        let label = LabelAllocator::new().fresh();
        let err = assemble(vec![Instr::Jump(label), Instr::Mark(label), Instr::Mark(label)])
            .expect_err("duplicate mark should fail");
        assert_eq!(err, AssemblerError::DuplicateLabel(label));
    }

    #[test]
    fn unmarked_target_is_rejected() {
        let label = LabelAllocator::new().fresh();
        let err = assemble(vec![Instr::Jump(label)]).expect_err("unknown label should fail");
        assert_eq!(err, AssemblerError::UnknownLabel(label));
    }

    #[test]
    fn unused_label_is_rejected() {
        let label = LabelAllocator::new().fresh();
        let err = assemble(vec![Instr::Mark(label), Instr::Return])
            .expect_err("unused label should fail");
        assert_eq!(err, AssemblerError::UnusedLabel(label));
    }
}
