pub mod assembler;
pub mod bytecode;
pub mod compiler;
pub mod disasm;
#[cfg(feature = "cli")]
pub mod logging;
#[cfg(feature = "runtime")]
pub mod vm;

pub use assembler::{Assembler, AssemblerError, Label, LabelAllocator, assemble};
pub use bytecode::{
    BinaryOp, Builtin, Chunk, CompareOp, Instruction, Param, Program, TypeName, Value,
};
pub use compiler::{
    CompileError, Parser, SourceFileError, SyntaxError, compile_source, compile_source_file,
    parse_program,
};
pub use disasm::{DisassembleOptions, disassemble_program, disassemble_program_with_options};
#[cfg(feature = "runtime")]
pub use vm::{MAX_CALL_DEPTH, Vm, VmError, VmResult};
