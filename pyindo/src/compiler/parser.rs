use tracing::trace;

use crate::assembler::{LabelAllocator, assemble};
use crate::bytecode::{Chunk, Param, Program, TypeName, Value};

use super::CompileError;
use super::condition::{ChainState, ClauseKind, ConditionChain};
use super::context::{Context, ContextStack};
use super::expr::{compile_expression, split_top_level};
use super::function::{ENTRYPOINT, FunctionKind, FunctionUnit};
use super::ir::{Instr, InstrArena};
use super::lexer::{Lexed, Lexer, Segment, quote_char};
use super::loops::LoopUnit;
use super::symbols::{FunctionTable, Scope, SymbolKind, SymbolTable};
use super::token::{Bracket, CompoundOp, Keyword, Punctuation, StringLiteral, StringPart, Token};

/// Builder that owns the code currently being emitted.
#[derive(Debug)]
enum Unit {
    Function(FunctionUnit),
    Condition(ConditionChain),
    Loop(LoopUnit),
}

#[derive(Clone, Debug, PartialEq)]
enum ParenKind {
    Definition(String),
    Entrypoint,
    Guard { kind: GuardKind },
    Call { head: bool },
    Group,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GuardKind {
    If,
    Elif,
    While,
}

#[derive(Debug)]
struct ParenFrame {
    kind: ParenKind,
    /// Index of the `(` token in the run.
    start: usize,
}

/// Tokens of the statement (or interpolation expression) being collected.
#[derive(Debug, Default)]
struct TokenRun {
    tokens: Vec<Token>,
    parens: Vec<ParenFrame>,
}

/// Header whose `)` has been read and whose `{` comes next.
#[derive(Debug)]
enum PendingBlock {
    Function { name: String, params: Vec<Param>, line: u32 },
    Entrypoint { line: u32 },
    Clause { kind: ClauseKind, guard: Vec<Instr>, line: u32 },
    Loop { guard: Vec<Instr>, line: u32 },
}

#[derive(Debug)]
struct StringInProgress {
    quote: char,
    parts: Vec<StringPart>,
    line: u32,
}

fn unsupported(keyword: Keyword, line: u32) -> CompileError {
    CompileError::syntax(
        format!(
            "'{}' statement is not supported yet",
            Token::Keyword(keyword).lexeme()
        ),
        line,
    )
}

fn illegal(token: &Token, line: u32) -> CompileError {
    CompileError::syntax(format!("Illegal token '{}'", token.lexeme()), line)
}

/// The condition chain on top of `units`, if it is waiting for a clause.
fn chained(units: &mut [Unit], line: u32) -> Result<&mut ConditionChain, CompileError> {
    match units.last_mut() {
        Some(Unit::Condition(chain)) if chain.is_chained() => Ok(chain),
        _ => Err(CompileError::syntax("Unexpected 'selainnya'", line)),
    }
}

pub struct Parser {
    lexer: Lexer,
    contexts: ContextStack,
    arena: InstrArena,
    labels: LabelAllocator,
    globals: SymbolTable,
    functions: FunctionTable,
    units: Vec<Unit>,
    pending: Option<PendingBlock>,
    runs: Vec<TokenRun>,
    strings: Vec<StringInProgress>,
    program: Vec<Instr>,
    chunks: Vec<Chunk>,
    has_entrypoint: bool,
}

impl Parser {
    pub fn new(buffer: &str) -> Self {
        Self {
            lexer: Lexer::new(buffer),
            contexts: ContextStack::new(),
            arena: InstrArena::new(),
            labels: LabelAllocator::new(),
            globals: SymbolTable::new(),
            functions: FunctionTable::new(),
            units: Vec::new(),
            pending: None,
            runs: vec![TokenRun::default()],
            strings: Vec::new(),
            program: Vec::new(),
            chunks: Vec::new(),
            has_entrypoint: false,
        }
    }

    pub fn parse(mut self) -> Result<Program, CompileError> {
        loop {
            if self.contexts.is_string_body() {
                if !self.scan_string()? {
                    break;
                }
                continue;
            }
            match self.lexer.next_token()? {
                Lexed::Token(token) => self.handle_token(token)?,
                Lexed::Eof | Lexed::Truncated => break,
            }
        }
        self.finish()
    }

    fn line(&self) -> u32 {
        self.lexer.line()
    }

    // The statement run pushed in `new` is never popped.
    fn run(&self) -> &TokenRun {
        &self.runs[self.runs.len() - 1]
    }

    fn run_mut(&mut self) -> &mut TokenRun {
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    fn handle_token(&mut self, token: Token) -> Result<(), CompileError> {
        let line = self.line();
        match &token {
            Token::Bracket(Bracket::OpenRound) => return self.open_round(),
            Token::Bracket(Bracket::CloseRound) => return self.close_round(),
            Token::Bracket(Bracket::OpenCurly) => return self.open_curly(),
            Token::Bracket(Bracket::CloseCurly) => return self.close_curly(),
            Token::Punctuation(Punctuation::Semicolon) => return self.end_statement(),
            Token::Punctuation(punct @ (Punctuation::DoubleQuote | Punctuation::SingleQuote)) => {
                return self.begin_string(*punct);
            }
            Token::Punctuation(Punctuation::TripleQuote | Punctuation::BlockCommentClose) => {
                return Err(illegal(&token, line));
            }
            Token::Keyword(Keyword::Else) => self.check_else_position(line)?,
            Token::Keyword(keyword) if keyword.requires_space() => {
                self.lexer.require_whitespace()?;
            }
            Token::Compound(op) if op.is_step() => self.lexer.search(";")?,
            _ => {}
        }
        self.run_mut().tokens.push(token);
        Ok(())
    }

    fn check_else_position(&self, line: u32) -> Result<(), CompileError> {
        let chained = matches!(self.units.last(), Some(Unit::Condition(chain)) if chain.is_chained());
        if !chained || self.runs.len() != 1 || !self.run().tokens.is_empty() {
            return Err(CompileError::syntax("Unexpected 'selainnya'", line));
        }
        Ok(())
    }

    fn open_round(&mut self) -> Result<(), CompileError> {
        let line = self.line();
        let at_statement_start = self.runs.len() == 1 && self.run().parens.is_empty();
        let tokens = &self.run().tokens;
        let kind = match tokens.as_slice() {
            [Token::Keyword(Keyword::Function), Token::Identifier(name)] if at_statement_start => {
                ParenKind::Definition(name.text.clone())
            }
            [.., Token::Keyword(keyword)] if keyword.opens_block() => {
                self.block_header(*keyword, tokens.len(), at_statement_start, line)?
            }
            [.., Token::Identifier(name)] => {
                self.functions.check_call_target(&name.text, name.line)?;
                ParenKind::Call {
                    head: at_statement_start && tokens.len() == 1,
                }
            }
            [.., Token::Keyword(Keyword::Print)] => ParenKind::Call {
                head: at_statement_start && tokens.len() == 1,
            },
            _ => ParenKind::Group,
        };

        match &kind {
            ParenKind::Definition(name) => self.functions.declare_function(name, line)?,
            ParenKind::Entrypoint => {
                self.functions.declare_function(ENTRYPOINT, line)?;
                self.has_entrypoint = true;
            }
            _ => {}
        }

        let run = self.run_mut();
        run.parens.push(ParenFrame {
            kind,
            start: run.tokens.len(),
        });
        run.tokens.push(Token::Bracket(Bracket::OpenRound));
        self.contexts.push(Context::RoundBracket);
        Ok(())
    }

    fn block_header(
        &self,
        keyword: Keyword,
        run_len: usize,
        at_statement_start: bool,
        line: u32,
    ) -> Result<ParenKind, CompileError> {
        let tokens = &self.run().tokens;
        let elif = matches!(
            tokens.as_slice(),
            [Token::Keyword(Keyword::Else), Token::Keyword(Keyword::If)]
        );
        if !at_statement_start || (run_len != 1 && !elif) {
            return Err(illegal(&Token::Keyword(keyword), line));
        }
        match keyword {
            Keyword::Main => {
                if !self.units.is_empty() {
                    return Err(CompileError::syntax(
                        "'utama' function must be declared at the top level",
                        line,
                    ));
                }
                Ok(ParenKind::Entrypoint)
            }
            Keyword::If if elif => Ok(ParenKind::Guard {
                kind: GuardKind::Elif,
            }),
            Keyword::If => Ok(ParenKind::Guard { kind: GuardKind::If }),
            Keyword::While => Ok(ParenKind::Guard {
                kind: GuardKind::While,
            }),
            Keyword::Else => Err(CompileError::syntax("Expecting '{' but got '('", line)),
            other => Err(unsupported(other, line)),
        }
    }

    fn close_round(&mut self) -> Result<(), CompileError> {
        let line = self.line();
        if self.contexts.top() != Some(Context::RoundBracket) {
            return Err(CompileError::syntax("Unexpected ')'", line));
        }
        self.contexts.pop();
        let frame = self
            .run_mut()
            .parens
            .pop()
            .ok_or_else(|| CompileError::invariant("Round bracket closed without a frame"))?;

        match frame.kind {
            ParenKind::Group | ParenKind::Call { head: false } => {
                self.run_mut().tokens.push(Token::Bracket(Bracket::CloseRound));
            }
            ParenKind::Call { head: true } => {
                self.run_mut().tokens.push(Token::Bracket(Bracket::CloseRound));
                self.lexer.search(";")?;
            }
            ParenKind::Definition(name) => {
                let inner = self.take_header(frame.start);
                let params = parse_params(&inner, line)?;
                self.lexer.search("{")?;
                self.pending = Some(PendingBlock::Function { name, params, line });
            }
            ParenKind::Entrypoint => {
                let inner = self.take_header(frame.start);
                if !inner.is_empty() {
                    return Err(CompileError::syntax(
                        "Entrypoint 'utama' does not accept parameters",
                        line,
                    ));
                }
                self.lexer.search("{")?;
                self.pending = Some(PendingBlock::Entrypoint { line });
            }
            ParenKind::Guard { kind } => {
                let inner = self.take_header(frame.start);
                let guard = self.compile_expr(&inner, line)?;
                self.lexer.search("{")?;
                self.pending = Some(match kind {
                    GuardKind::If => PendingBlock::Clause {
                        kind: ClauseKind::If,
                        guard,
                        line,
                    },
                    GuardKind::Elif => PendingBlock::Clause {
                        kind: ClauseKind::Elif,
                        guard,
                        line,
                    },
                    GuardKind::While => PendingBlock::Loop { guard, line },
                });
            }
        }
        Ok(())
    }

    /// Removes a header from the run and returns the tokens between its
    /// parentheses.
    fn take_header(&mut self, open: usize) -> Vec<Token> {
        let run = self.run_mut();
        let inner = run.tokens.split_off(open + 1);
        run.tokens.clear();
        inner
    }

    fn open_curly(&mut self) -> Result<(), CompileError> {
        let line = self.line();
        match self.pending.take() {
            Some(PendingBlock::Function { name, params, line }) => {
                let unit = FunctionUnit::begin(
                    FunctionKind::Named(name),
                    params,
                    line,
                    &mut self.arena,
                    &mut self.labels,
                )?;
                self.units.push(Unit::Function(unit));
            }
            Some(PendingBlock::Entrypoint { line }) => {
                let unit = FunctionUnit::begin(
                    FunctionKind::Entrypoint,
                    Vec::new(),
                    line,
                    &mut self.arena,
                    &mut self.labels,
                )?;
                self.units.push(Unit::Function(unit));
            }
            Some(PendingBlock::Clause {
                kind: ClauseKind::If,
                guard,
                line,
            }) => {
                let chain = ConditionChain::open(guard, line, &mut self.arena);
                self.units.push(Unit::Condition(chain));
            }
            Some(PendingBlock::Clause { kind, guard, line }) => {
                chained(&mut self.units, line)?.push_clause(
                    kind,
                    Some(guard),
                    line,
                    &mut self.arena,
                )?;
            }
            Some(PendingBlock::Loop { guard, line }) => {
                let unit = LoopUnit::begin(guard, line, &mut self.arena, &mut self.labels);
                self.units.push(Unit::Loop(unit));
            }
            None => {
                let is_else = matches!(
                    self.run().tokens.as_slice(),
                    [Token::Keyword(Keyword::Else)]
                );
                if !is_else || self.runs.len() != 1 {
                    return Err(CompileError::syntax("Unexpected '{'", line));
                }
                self.run_mut().tokens.clear();
                chained(&mut self.units, line)?.push_clause(
                    ClauseKind::Else,
                    None,
                    line,
                    &mut self.arena,
                )?;
            }
        }
        self.contexts.push(Context::CurlyBracket);
        Ok(())
    }

    fn close_curly(&mut self) -> Result<(), CompileError> {
        let line = self.line();
        if self.contexts.top() != Some(Context::CurlyBracket) {
            return Err(CompileError::syntax("Unexpected '}'", line));
        }
        if self.contexts.in_interpolation() {
            return self.finish_interpolation(line);
        }
        if !self.run().tokens.is_empty() {
            return Err(CompileError::syntax("Expecting ';' but got '}'", line));
        }
        self.contexts.pop();

        let unit = self
            .units
            .pop()
            .ok_or_else(|| CompileError::invariant("Curly bracket closed without a builder"))?;
        match unit {
            Unit::Function(function) => {
                let code = function.finish(&mut self.arena, &mut self.chunks)?;
                self.emit(code)?;
            }
            Unit::Loop(unit) => {
                let code = unit.finish(&mut self.arena);
                self.emit(code)?;
            }
            Unit::Condition(mut chain) => {
                let else_follows = self.lexer.next_word_is("selainnya");
                match chain.close_clause(else_follows) {
                    ChainState::Chained => self.units.push(Unit::Condition(chain)),
                    _ => {
                        let code = chain.emit(&mut self.arena, &mut self.labels)?;
                        self.emit(code)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Routes finished instructions to the innermost open builder, or to the
    /// top-level program when none is open.
    fn emit(&mut self, code: Vec<Instr>) -> Result<(), CompileError> {
        match self.units.last() {
            Some(Unit::Function(function)) => function.add_content(&mut self.arena, code),
            Some(Unit::Loop(unit)) => unit.add_content(&mut self.arena, code),
            Some(Unit::Condition(chain)) => {
                if chain.state() != ChainState::Open {
                    return Err(CompileError::invariant(format!(
                        "Instructions emitted into a condition chain in state {:?}",
                        chain.state()
                    )));
                }
                chain.add_content(&mut self.arena, code);
            }
            None => self.program.extend(code),
        }
        Ok(())
    }

    fn begin_string(&mut self, punct: Punctuation) -> Result<(), CompileError> {
        let quote = quote_char(punct)
            .ok_or_else(|| CompileError::invariant("String opened without a quote"))?;
        let context = Context::for_quote(quote)
            .ok_or_else(|| CompileError::invariant("String opened without a quote"))?;
        self.contexts.push(context);
        self.strings.push(StringInProgress {
            quote,
            parts: Vec::new(),
            line: self.line(),
        });
        Ok(())
    }

    /// Consumes string body text. Returns false once the input ends inside
    /// the string.
    fn scan_string(&mut self) -> Result<bool, CompileError> {
        let quote = self
            .strings
            .last()
            .map(|string| string.quote)
            .ok_or_else(|| CompileError::invariant("String body without an open string"))?;
        match self.lexer.scan_string_segment(quote) {
            Segment::Closed(text) => {
                self.contexts.pop();
                let Some(mut string) = self.strings.pop() else {
                    return Err(CompileError::invariant("String closed twice"));
                };
                if !text.is_empty() || string.parts.is_empty() {
                    string.parts.push(StringPart::Text(text));
                }
                self.run_mut().tokens.push(Token::Str(StringLiteral {
                    parts: string.parts,
                    line: string.line,
                }));
                Ok(true)
            }
            Segment::Interpolation(text) => {
                let line = self.line();
                if let Some(string) = self.strings.last_mut() {
                    string.parts.push(StringPart::Text(text));
                }
                let unit = FunctionUnit::begin(
                    FunctionKind::Anonymous,
                    Vec::new(),
                    line,
                    &mut self.arena,
                    &mut self.labels,
                )?;
                self.units.push(Unit::Function(unit));
                self.runs.push(TokenRun::default());
                self.contexts.push(Context::CurlyBracket);
                Ok(true)
            }
            Segment::Eof(_) => Ok(false),
        }
    }

    fn finish_interpolation(&mut self, line: u32) -> Result<(), CompileError> {
        let run = self
            .runs
            .pop()
            .ok_or_else(|| CompileError::invariant("Interpolation closed without a run"))?;
        let code = self.compile_expr(&run.tokens, line)?;
        let Some(Unit::Function(unit)) = self.units.pop() else {
            return Err(CompileError::invariant(
                "Interpolation closed without its anonymous function",
            ));
        };
        if !unit.is_anonymous() {
            return Err(CompileError::invariant(
                "Interpolation closed a named function",
            ));
        }
        unit.add_content(&mut self.arena, code);
        let code = unit.finish(&mut self.arena, &mut self.chunks)?;
        match self.strings.last_mut() {
            Some(string) => string.parts.push(StringPart::Interpolated(code)),
            None => return Err(CompileError::invariant("Interpolation outside a string")),
        }
        self.contexts.pop();
        Ok(())
    }

    /// Symbol table of the nearest named function or entrypoint, else the
    /// global table.
    fn scope_table(&self) -> &SymbolTable {
        self.units
            .iter()
            .rev()
            .find_map(|unit| match unit {
                Unit::Function(function) if !function.is_anonymous() => Some(&function.locals),
                _ => None,
            })
            .unwrap_or(&self.globals)
    }

    fn scope_table_mut(&mut self) -> &mut SymbolTable {
        let index = self.units.iter().rposition(
            |unit| matches!(unit, Unit::Function(function) if !function.is_anonymous()),
        );
        match index {
            Some(index) => match &mut self.units[index] {
                Unit::Function(function) => &mut function.locals,
                _ => &mut self.globals,
            },
            None => &mut self.globals,
        }
    }

    fn in_function(&self) -> bool {
        self.units
            .iter()
            .any(|unit| matches!(unit, Unit::Function(function) if !function.is_anonymous()))
    }

    fn innermost_loop(&self) -> Option<&LoopUnit> {
        for unit in self.units.iter().rev() {
            match unit {
                Unit::Loop(unit) => return Some(unit),
                Unit::Function(_) => return None,
                Unit::Condition(_) => {}
            }
        }
        None
    }

    fn compile_expr(&self, tokens: &[Token], line: u32) -> Result<Vec<Instr>, CompileError> {
        let scope = Scope {
            locals: self.scope_table(),
            functions: &self.functions,
        };
        compile_expression(tokens, line, &scope)
    }

    fn end_statement(&mut self) -> Result<(), CompileError> {
        let line = self.line();
        if self.runs.len() > 1 {
            return Err(CompileError::syntax("Expecting '}' but got ';'", line));
        }
        if !self.run().parens.is_empty() {
            return Err(CompileError::syntax("Expecting ')' but got ';'", line));
        }
        let tokens = std::mem::take(&mut self.run_mut().tokens);
        if tokens.is_empty() {
            return Ok(());
        }
        let code = self.statement(&tokens, line)?;
        self.emit(code)
    }

    fn statement(&mut self, tokens: &[Token], line: u32) -> Result<Vec<Instr>, CompileError> {
        match tokens {
            [Token::Keyword(Keyword::Variable), rest @ ..] => {
                trace!(line, "variable declaration");
                self.declaration(rest, SymbolKind::Variable, line)
            }
            [Token::Keyword(Keyword::Constant), rest @ ..] => {
                trace!(line, "constant declaration");
                self.declaration(rest, SymbolKind::Constant, line)
            }
            [Token::Keyword(Keyword::Return), rest @ ..] => {
                trace!(line, "return");
                if !self.in_function() {
                    return Err(CompileError::syntax(
                        "'hasilkan' statement is only allowed inside a function",
                        line,
                    ));
                }
                let mut code = if rest.is_empty() {
                    vec![Instr::LoadConst(Value::Null)]
                } else {
                    self.compile_expr(rest, line)?
                };
                code.push(Instr::Return);
                Ok(code)
            }
            [Token::Keyword(keyword @ (Keyword::Break | Keyword::Continue)), rest @ ..] => {
                trace!(line, ?keyword, "loop control");
                if let Some(extra) = rest.first() {
                    return Err(illegal(extra, line));
                }
                let Some(unit) = self.innermost_loop() else {
                    return Err(CompileError::syntax(
                        format!(
                            "'{}' statement is only allowed inside a loop",
                            Token::Keyword(*keyword).lexeme()
                        ),
                        line,
                    ));
                };
                Ok(vec![if *keyword == Keyword::Break {
                    unit.break_instr()
                } else {
                    unit.continue_instr()
                }])
            }
            [
                Token::Keyword(
                    keyword @ (Keyword::Switch | Keyword::For | Keyword::Delete | Keyword::Then),
                ),
                ..,
            ] => Err(unsupported(*keyword, line)),
            [Token::Keyword(Keyword::Else), ..] => {
                Err(CompileError::syntax("Unexpected 'selainnya'", line))
            }
            [Token::Identifier(name), Token::Punctuation(Punctuation::Assign), rest @ ..] => {
                trace!(line, name = %name.text, "assignment");
                self.scope_table().assignable(&name.text, name.line)?;
                let mut code = self.compile_expr(rest, line)?;
                code.push(Instr::StoreName(name.text.clone()));
                Ok(code)
            }
            [Token::Identifier(name), Token::Compound(op), rest @ ..] => {
                trace!(line, name = %name.text, ?op, "compound assignment");
                self.scope_table().assignable(&name.text, name.line)?;
                self.compound_assignment(&name.text, *op, rest, line)
            }
            _ => {
                trace!(line, "expression statement");
                let mut code = self.compile_expr(tokens, line)?;
                code.push(Instr::Pop);
                Ok(code)
            }
        }
    }

    fn compound_assignment(
        &self,
        name: &str,
        op: CompoundOp,
        rest: &[Token],
        line: u32,
    ) -> Result<Vec<Instr>, CompileError> {
        let mut code = vec![Instr::LoadName(name.to_string())];
        if op.is_step() {
            if let Some(extra) = rest.first() {
                return Err(illegal(extra, line));
            }
            code.push(Instr::LoadConst(Value::Int(1)));
        } else {
            code.extend(self.compile_expr(rest, line)?);
        }
        code.push(Instr::Binary(op.binary()));
        code.push(Instr::StoreName(name.to_string()));
        Ok(code)
    }

    fn declaration(
        &mut self,
        tokens: &[Token],
        kind: SymbolKind,
        line: u32,
    ) -> Result<Vec<Instr>, CompileError> {
        let keyword = if kind == SymbolKind::Constant {
            "konstanta"
        } else {
            "variabel"
        };
        let (name, rest) = match tokens {
            [Token::Identifier(name), rest @ ..] => (name, rest),
            [other, ..] => return Err(illegal(other, line)),
            [] => {
                return Err(CompileError::syntax(
                    format!("Expecting identifier after '{keyword}'"),
                    line,
                ));
            }
        };
        let (ty, rest) = match rest {
            [Token::Punctuation(Punctuation::Colon), Token::Keyword(Keyword::Type(ty)), rest @ ..] => {
                (*ty, rest)
            }
            [Token::Punctuation(Punctuation::Colon), other, ..] => {
                return Err(illegal(other, line));
            }
            _ => (TypeName::Any, rest),
        };
        let mut code = match rest {
            [] if kind == SymbolKind::Constant => {
                return Err(CompileError::syntax(
                    format!("Constant '{}' must be initialized", name.text),
                    line,
                ));
            }
            [] => vec![Instr::LoadConst(Value::Null)],
            [Token::Punctuation(Punctuation::Assign), value @ ..] => self.compile_expr(value, line)?,
            [other, ..] => return Err(illegal(other, line)),
        };
        self.scope_table_mut()
            .declare(&name.text, kind, ty, name.line)?;
        code.push(Instr::StoreName(name.text.clone()));
        Ok(code)
    }

    fn finish(mut self) -> Result<Program, CompileError> {
        if let Some(closer) = self.contexts.innermost_closer() {
            return Err(CompileError::syntax(
                format!("Expecting '{closer}' but have reached the End Of File"),
                self.line(),
            ));
        }
        if !self.run().tokens.is_empty() {
            return Err(CompileError::at_eof(
                "Expecting ';' but have reached the End Of File",
            ));
        }
        if self.pending.is_some() || !self.units.is_empty() {
            return Err(CompileError::at_eof(
                "Expecting '{' but have reached the End Of File",
            ));
        }
        if !self.has_entrypoint {
            return Err(CompileError::at_eof(
                "Entrypoint is not exist, you should create it first using `utama` function",
            ));
        }
        self.program.push(Instr::LoadConst(Value::Null));
        self.program.push(Instr::Return);
        let code = assemble(std::mem::take(&mut self.program))?;
        Ok(Program::new(code, self.chunks))
    }
}

fn parse_params(tokens: &[Token], line: u32) -> Result<Vec<Param>, CompileError> {
    let mut params = Vec::new();
    for part in split_top_level(tokens) {
        let param = match part {
            [Token::Identifier(name)] => Param {
                name: name.text.clone(),
                ty: TypeName::Any,
            },
            [
                Token::Identifier(name),
                Token::Punctuation(Punctuation::Colon),
                Token::Keyword(Keyword::Type(ty)),
            ] => Param {
                name: name.text.clone(),
                ty: *ty,
            },
            [
                Token::Identifier(_),
                Token::Punctuation(Punctuation::Colon),
                other,
                ..,
            ] => return Err(illegal(other, line)),
            [Token::Identifier(_), other, ..] | [other, ..] => return Err(illegal(other, line)),
            [] => {
                return Err(CompileError::syntax("Illegal token ','", line));
            }
        };
        params.push(param);
    }
    Ok(params)
}
