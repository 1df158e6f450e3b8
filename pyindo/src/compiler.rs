use std::path::Path;

use crate::assembler::AssemblerError;
use crate::bytecode::Program;

pub mod condition;
pub mod context;
pub mod expr;
pub mod function;
pub mod ir;
pub mod lexer;
pub mod loops;
pub mod parser;
pub mod symbols;
pub mod token;

pub use parser::Parser;

/// End-of-buffer sentinel the scanner stops at.
pub const EOF_SENTINEL: char = '\0';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// Absent for errors detected after the input ran out.
    pub line: Option<u32>,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error: {}", self.message)?;
        if let Some(line) = self.line {
            write!(f, " (on line number {line})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    Syntax(SyntaxError),
    /// Broken internal invariant. Not caused by the program being compiled.
    Invariant(String),
}

impl CompileError {
    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        CompileError::Syntax(SyntaxError {
            message: message.into(),
            line: Some(line),
        })
    }

    pub fn at_eof(message: impl Into<String>) -> Self {
        CompileError::Syntax(SyntaxError {
            message: message.into(),
            line: None,
        })
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CompileError::Invariant(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Syntax(err) => &err.message,
            CompileError::Invariant(message) => message,
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            CompileError::Syntax(err) => err.line,
            CompileError::Invariant(_) => None,
        }
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, CompileError::Invariant(_))
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax(err) => write!(f, "{err}"),
            CompileError::Invariant(message) => write!(
                f,
                "[!] Compiler Error: {message}\n\n--+--(Please file an issue in the github repository if you found this)\n--+--"
            ),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<AssemblerError> for CompileError {
    fn from(value: AssemblerError) -> Self {
        CompileError::Invariant(value.to_string())
    }
}

#[derive(Debug)]
pub enum SourceFileError {
    Io(std::io::Error),
    Compile(CompileError),
}

impl std::fmt::Display for SourceFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileError::Io(err) => write!(f, "{err}"),
            SourceFileError::Compile(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SourceFileError {}

impl From<std::io::Error> for SourceFileError {
    fn from(value: std::io::Error) -> Self {
        SourceFileError::Io(value)
    }
}

impl From<CompileError> for SourceFileError {
    fn from(value: CompileError) -> Self {
        SourceFileError::Compile(value)
    }
}

/// Compiles a buffer that already ends with the `\0` sentinel.
pub fn parse_program(buffer: &str) -> Result<Program, CompileError> {
    Parser::new(buffer).parse()
}

pub fn compile_source(source: &str) -> Result<Program, CompileError> {
    if source.ends_with(EOF_SENTINEL) {
        return parse_program(source);
    }
    let mut buffer = String::with_capacity(source.len() + 1);
    buffer.push_str(source);
    buffer.push(EOF_SENTINEL);
    parse_program(&buffer)
}

pub fn compile_source_file(path: impl AsRef<Path>) -> Result<Program, SourceFileError> {
    let source = std::fs::read_to_string(path)?;
    Ok(compile_source(&source)?)
}
