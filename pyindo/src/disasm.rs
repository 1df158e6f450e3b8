use std::fmt::Write;

use owo_colors::OwoColorize;

use crate::bytecode::{Chunk, Instruction, Program, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisassembleOptions {
    /// Color section headers.
    pub color: bool,
}

pub fn disassemble_program(program: &Program) -> String {
    disassemble_program_with_options(program, DisassembleOptions::default())
}

pub fn disassemble_program_with_options(program: &Program, options: DisassembleOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "{}",
        header(
            &format!("code ({} instructions):", program.code.len()),
            options
        )
    );
    write_code(&mut out, &program.code);

    let _ = writeln!(
        &mut out,
        "{}",
        header(&format!("chunks ({}):", program.chunks.len()), options)
    );
    for (index, chunk) in program.chunks.iter().enumerate() {
        let _ = writeln!(
            &mut out,
            "{}",
            header(&format!("  [{index:04}] {}", signature(chunk)), options)
        );
        write_code(&mut out, &chunk.code);
    }
    out
}

fn header(text: &str, options: DisassembleOptions) -> String {
    if options.color {
        format!("{}", text.bright_cyan().bold())
    } else {
        text.to_string()
    }
}

fn signature(chunk: &Chunk) -> String {
    let params = chunk
        .params
        .iter()
        .map(|param| format!("{}: {}", param.name, param.ty.keyword()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({params}) ; line {}", chunk.name, chunk.line)
}

fn write_code(out: &mut String, code: &[Instruction]) {
    for (start, instruction) in code.iter().enumerate() {
        let operand = operand(instruction);
        let mnemonic = instruction.mnemonic();
        if operand.is_empty() {
            let _ = writeln!(out, "{start:04}\t{mnemonic}");
        } else {
            let _ = writeln!(out, "{start:04}\t{mnemonic:<18}\t{operand}");
        }
    }
}

fn operand(instruction: &Instruction) -> String {
    match instruction {
        Instruction::LoadConst(value) => constant(value),
        Instruction::LoadName(name)
        | Instruction::StoreName(name)
        | Instruction::MakeFunction(name) => name.clone(),
        Instruction::Binary(op) => op.symbol().to_string(),
        Instruction::Compare(op) => op.symbol().to_string(),
        Instruction::JumpIfFalse(target) | Instruction::Jump(target) => format!("-> {target:04}"),
        Instruction::BuildString(count) => count.to_string(),
        Instruction::Call(argc) => argc.to_string(),
        Instruction::Return | Instruction::Pop => String::new(),
    }
}

fn constant(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{text:?}"),
        other => other.to_string(),
    }
}
