use tracing::debug;

use crate::assembler::LabelAllocator;

use super::CompileError;
use super::ir::{BufferId, Instr, InstrArena};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseKind {
    If,
    Elif,
    Else,
}

#[derive(Debug)]
pub struct ConditionClause {
    pub kind: ClauseKind,
    pub guard: Option<BufferId>,
    pub body: BufferId,
    pub line: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainState {
    /// Accumulating the body of the last clause.
    Open,
    /// Last clause closed and a `selainnya` follows.
    Chained,
    Resolved,
    Emitted,
}

/// One `jika` / `selainnya jika` / `selainnya` chain.
#[derive(Debug)]
pub struct ConditionChain {
    clauses: Vec<ConditionClause>,
    state: ChainState,
}

fn unexpected_else(line: u32) -> CompileError {
    CompileError::syntax("Unexpected 'selainnya'", line)
}

impl ConditionChain {
    pub fn open(guard: Vec<Instr>, line: u32, arena: &mut InstrArena) -> Self {
        Self {
            clauses: vec![ConditionClause {
                kind: ClauseKind::If,
                guard: Some(arena.alloc_with(guard)),
                body: arena.alloc(),
                line,
            }],
            state: ChainState::Open,
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn is_chained(&self) -> bool {
        self.state == ChainState::Chained
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    pub fn add_content(&self, arena: &mut InstrArena, instrs: impl IntoIterator<Item = Instr>) {
        if let Some(clause) = self.clauses.last() {
            arena.extend(clause.body, instrs);
        }
    }

    /// Closes the current clause body. The chain stays pending only when
    /// another clause can follow.
    pub fn close_clause(&mut self, else_follows: bool) -> ChainState {
        let last_is_else = self
            .clauses
            .last()
            .is_some_and(|clause| clause.kind == ClauseKind::Else);
        self.state = if else_follows && !last_is_else {
            ChainState::Chained
        } else {
            ChainState::Resolved
        };
        self.state
    }

    pub fn push_clause(
        &mut self,
        kind: ClauseKind,
        guard: Option<Vec<Instr>>,
        line: u32,
        arena: &mut InstrArena,
    ) -> Result<(), CompileError> {
        if self.state != ChainState::Chained {
            return Err(unexpected_else(line));
        }
        let guard = match (kind, guard) {
            (ClauseKind::Else, None) => None,
            (ClauseKind::Elif, Some(guard)) => Some(arena.alloc_with(guard)),
            _ => {
                return Err(CompileError::invariant(format!(
                    "Condition clause {kind:?} pushed with a mismatched guard"
                )));
            }
        };
        self.clauses.push(ConditionClause {
            kind,
            guard,
            body: arena.alloc(),
            line,
        });
        self.state = ChainState::Open;
        Ok(())
    }

    /// Folds the clauses right to left into one instruction group ending at
    /// the shared exit label.
    pub fn emit(
        &mut self,
        arena: &mut InstrArena,
        labels: &mut LabelAllocator,
    ) -> Result<Vec<Instr>, CompileError> {
        if self.state != ChainState::Resolved {
            return Err(CompileError::invariant(format!(
                "Condition chain emitted in state {:?}",
                self.state
            )));
        }
        let exit = labels.fresh();
        let clause_count = self.clauses.len();
        let mut rest: Vec<Instr> = Vec::new();
        for clause in self.clauses.drain(..).rev() {
            let body = arena.take(clause.body);
            match clause.guard {
                None => rest = body,
                Some(guard) => {
                    let next = labels.fresh();
                    let mut code = arena.take(guard);
                    code.push(Instr::JumpIfFalse(next));
                    code.extend(body);
                    code.push(Instr::Jump(exit));
                    code.push(Instr::Mark(next));
                    code.append(&mut rest);
                    rest = code;
                }
            }
        }
        rest.push(Instr::Mark(exit));
        self.state = ChainState::Emitted;
        debug!(clauses = clause_count, instructions = rest.len(), "condition chain emitted");
        Ok(rest)
    }
}
