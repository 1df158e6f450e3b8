#![allow(dead_code, unused_imports)]

pub use pyindo::{
    BinaryOp, Chunk, CompareOp, CompileError, Instruction, Program, Value, Vm, VmError,
    compile_source, compile_source_file, disassemble_program,
};

pub fn compile(source: &str) -> Program {
    compile_source(source).expect("compile should succeed")
}

pub fn compile_err(source: &str) -> CompileError {
    compile_source(source).expect_err("compile should fail")
}

/// Wraps statements in an entrypoint.
pub fn in_main(body: &str) -> String {
    format!("utama() {{\n{body}\n}}\n")
}

pub fn run(source: &str) -> Vec<String> {
    let mut vm = Vm::new(compile(source));
    vm.run().expect("run should succeed");
    vm.output().to_vec()
}

pub fn run_main(body: &str) -> Vec<String> {
    run(&in_main(body))
}

pub fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| line.to_string()).collect()
}

/// Whether `needle` appears as a contiguous run inside `code`.
pub fn contains_sequence(code: &[Instruction], needle: &[Instruction]) -> bool {
    code.windows(needle.len()).any(|window| window == needle)
}
