use tracing::debug;

use crate::assembler::{Label, LabelAllocator, assemble};
use crate::bytecode::{Chunk, CompareOp, Param, Value};

use super::CompileError;
use super::ir::{BufferId, Instr, InstrArena};
use super::symbols::{SymbolKind, SymbolTable};

pub const ENTRYPOINT: &str = "utama";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Entrypoint,
    Named(String),
    /// Interpolation block compiled inline where the string is used.
    Anonymous,
}

#[derive(Debug)]
pub struct FunctionUnit {
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub locals: SymbolTable,
    pub line: u32,
    header: BufferId,
    content: BufferId,
    exit: Option<Label>,
}

impl FunctionUnit {
    pub fn begin(
        kind: FunctionKind,
        params: Vec<Param>,
        line: u32,
        arena: &mut InstrArena,
        labels: &mut LabelAllocator,
    ) -> Result<Self, CompileError> {
        let mut locals = SymbolTable::new();
        for param in &params {
            locals.declare(&param.name, SymbolKind::Parameter, param.ty, line)?;
        }

        let (header, exit) = match kind {
            FunctionKind::Entrypoint => (
                vec![
                    Instr::LoadName("__name__".to_string()),
                    Instr::LoadConst(Value::String("__main__".to_string())),
                    Instr::Compare(CompareOp::Eq),
                ],
                Some(labels.fresh()),
            ),
            FunctionKind::Named(_) | FunctionKind::Anonymous => (
                params
                    .iter()
                    .map(|param| Instr::StoreName(param.name.clone()))
                    .collect(),
                None,
            ),
        };

        Ok(Self {
            kind,
            params,
            locals,
            line,
            header: arena.alloc_with(header),
            content: arena.alloc(),
            exit,
        })
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == FunctionKind::Anonymous
    }

    pub fn add_content(&self, arena: &mut InstrArena, instrs: impl IntoIterator<Item = Instr>) {
        arena.extend(self.content, instrs);
    }

    /// Instructions to splice into the enclosing code. Named functions are
    /// assembled into a chunk registered in `chunks` and replaced by the code
    /// that binds it.
    pub fn finish(
        self,
        arena: &mut InstrArena,
        chunks: &mut Vec<Chunk>,
    ) -> Result<Vec<Instr>, CompileError> {
        let mut code = arena.take(self.header);
        let content = arena.take(self.content);
        match self.kind {
            FunctionKind::Entrypoint => {
                let exit = self.exit.ok_or_else(|| {
                    CompileError::invariant("Entrypoint finalized without an exit label")
                })?;
                code.push(Instr::JumpIfFalse(exit));
                code.extend(content);
                code.push(Instr::Mark(exit));
                debug!(instructions = code.len(), "entrypoint finalized");
                Ok(code)
            }
            FunctionKind::Anonymous => {
                code.extend(content);
                Ok(code)
            }
            FunctionKind::Named(name) => {
                code.extend(content);
                code.push(Instr::LoadConst(Value::Null));
                code.push(Instr::Return);
                let code = assemble(code)?;
                let index = chunks.len() as u32;
                debug!(
                    function = %name,
                    chunk = index,
                    instructions = code.len(),
                    "function chunk finalized"
                );
                chunks.push(Chunk {
                    name: name.clone(),
                    params: self.params,
                    code,
                    line: self.line,
                });
                Ok(vec![
                    Instr::LoadConst(Value::Chunk(index)),
                    Instr::MakeFunction(name.clone()),
                    Instr::StoreName(name),
                ])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{BinaryOp, Instruction, TypeName};

    fn param(name: &str) -> Param {
        Param {
            name: name.to_string(),
            ty: TypeName::Any,
        }
    }

    #[test]
    fn entrypoint_guards_on_module_name() {
        let mut arena = InstrArena::new();
        let mut labels = LabelAllocator::new();
        let unit =
            FunctionUnit::begin(FunctionKind::Entrypoint, vec![], 1, &mut arena, &mut labels)
                .expect("begin");
        unit.add_content(&mut arena, [Instr::LoadConst(Value::Int(1)), Instr::Pop]);
        let mut chunks = Vec::new();
        let code = unit.finish(&mut arena, &mut chunks).expect("finish");
        assert!(chunks.is_empty());
        let resolved = assemble(code).expect("assemble");
        assert_eq!(resolved[0], Instruction::LoadName("__name__".to_string()));
        assert_eq!(resolved[3], Instruction::JumpIfFalse(6));
        assert_eq!(resolved.len(), 6);
    }

    #[test]
    fn named_function_becomes_chunk() {
        let mut arena = InstrArena::new();
        let mut labels = LabelAllocator::new();
        let unit = FunctionUnit::begin(
            FunctionKind::Named("tambah".to_string()),
            vec![param("a"), param("b")],
            3,
            &mut arena,
            &mut labels,
        )
        .expect("begin");
        unit.add_content(
            &mut arena,
            [
                Instr::LoadName("a".to_string()),
                Instr::LoadName("b".to_string()),
                Instr::Binary(BinaryOp::Add),
                Instr::Return,
            ],
        );
        let mut chunks = Vec::new();
        let code = unit.finish(&mut arena, &mut chunks).expect("finish");
        assert_eq!(
            code,
            vec![
                Instr::LoadConst(Value::Chunk(0)),
                Instr::MakeFunction("tambah".to_string()),
                Instr::StoreName("tambah".to_string()),
            ]
        );
        let chunk = &chunks[0];
        assert_eq!(chunk.line, 3);
        assert_eq!(chunk.code[0], Instruction::StoreName("a".to_string()));
        assert_eq!(chunk.code[1], Instruction::StoreName("b".to_string()));
        assert_eq!(chunk.code.last(), Some(&Instruction::Return));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let mut arena = InstrArena::new();
        let mut labels = LabelAllocator::new();
        let err = FunctionUnit::begin(
            FunctionKind::Named("f".to_string()),
            vec![param("a"), param("a")],
            2,
            &mut arena,
            &mut labels,
        )
        .expect_err("duplicate param");
        assert_eq!(
            err.to_string(),
            "Error: Identifier 'a' is already declared before (on line number 2)"
        );
    }
}
