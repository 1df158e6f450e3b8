use crate::bytecode::Value;

use super::CompileError;
use super::ir::Instr;
use super::symbols::{NameResolver, PRINT_TARGET};
use super::token::{
    Bracket, Keyword, Operator, OperatorKind, Punctuation, StringLiteral, StringPart, Token,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(StringLiteral),
    Identifier(String),
    Call { name: String, args: Vec<Vec<Instr>> },
    Print(Vec<Vec<Instr>>),
}

impl Operand {
    pub fn compile(self) -> Result<Vec<Instr>, CompileError> {
        let code = match self {
            Operand::Integer(value) => vec![Instr::LoadConst(Value::Int(value))],
            Operand::Float(value) => vec![Instr::LoadConst(Value::Float(value))],
            Operand::Boolean(value) => vec![Instr::LoadConst(Value::Bool(value))],
            Operand::Identifier(name) => vec![Instr::LoadName(name)],
            Operand::Str(literal) => compile_string(literal),
            Operand::Call { name, args } => {
                let argc = argument_count(args.len())?;
                let mut code = vec![Instr::LoadName(name)];
                code.extend(args.into_iter().flatten());
                code.push(Instr::Call(argc));
                code
            }
            Operand::Print(args) => {
                let mut code = vec![Instr::LoadName(PRINT_TARGET.to_string())];
                code.extend(concatenate(args));
                code.push(Instr::Call(1));
                code
            }
        };
        Ok(code)
    }
}

fn argument_count(len: usize) -> Result<u8, CompileError> {
    u8::try_from(len)
        .map_err(|_| CompileError::invariant(format!("Call with {len} arguments exceeds 255")))
}

/// Pushes every group and joins them into one string value.
fn concatenate(groups: Vec<Vec<Instr>>) -> Vec<Instr> {
    let count = groups.len() as u32;
    let mut code: Vec<Instr> = groups.into_iter().flatten().collect();
    code.push(Instr::BuildString(count));
    code
}

fn compile_string(literal: StringLiteral) -> Vec<Instr> {
    let plain = literal
        .parts
        .iter()
        .all(|part| matches!(part, StringPart::Text(_)));
    if plain {
        let text: String = literal
            .parts
            .into_iter()
            .map(|part| match part {
                StringPart::Text(text) => text,
                StringPart::Interpolated(_) => String::new(),
            })
            .collect();
        return vec![Instr::LoadConst(Value::String(text))];
    }
    let groups = literal
        .parts
        .into_iter()
        .filter_map(|part| match part {
            StringPart::Text(text) if text.is_empty() => None,
            StringPart::Text(text) => Some(vec![Instr::LoadConst(Value::String(text))]),
            StringPart::Interpolated(code) => Some(code),
        })
        .collect();
    concatenate(groups)
}

#[derive(Clone, Debug, PartialEq)]
enum Item {
    Operand(Operand),
    Operator(Operator),
    Open,
    Close,
}

fn illegal(token: &Token, line: u32) -> CompileError {
    CompileError::syntax(format!("Illegal token '{}'", token.lexeme()), line)
}

/// Index of the `)` matching the `(` at `open`.
fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        match token {
            Token::Bracket(Bracket::OpenRound) => depth += 1,
            Token::Bracket(Bracket::CloseRound) => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_structural(token: &Token) -> bool {
    matches!(
        token,
        Token::Punctuation(Punctuation::DoubleQuote | Punctuation::SingleQuote | Punctuation::Dollar)
            | Token::Bracket(Bracket::OpenCurly | Bracket::CloseCurly)
    )
}

fn literal_operand(token: &Token, line: u32) -> Result<Option<Operand>, CompileError> {
    let operand = match token {
        Token::Integer(lit) => Operand::Integer(lit.text.parse().map_err(|_| {
            CompileError::syntax(format!("Integer literal '{}' is out of range", lit.text), line)
        })?),
        Token::Float(lit) => Operand::Float(lit.text.parse().map_err(|_| {
            CompileError::syntax(format!("Illegal token '{}'", lit.text), line)
        })?),
        Token::Boolean(lit) => Operand::Boolean(lit.text.eq_ignore_ascii_case("benar")),
        Token::Str(literal) => Operand::Str(literal.clone()),
        _ => return Ok(None),
    };
    Ok(Some(operand))
}

/// Validates a flat run and folds calls into single operands.
fn normalize(
    tokens: &[Token],
    line: u32,
    resolver: &dyn NameResolver,
) -> Result<Vec<Item>, CompileError> {
    let mut items: Vec<Item> = Vec::new();
    let mut depth = 0usize;
    let mut index = 0usize;
    while index < tokens.len() {
        let token = &tokens[index];
        index += 1;
        if is_structural(token) {
            continue;
        }

        let operator = match token {
            Token::Operator(Operator::BitNot) => return Err(illegal(token, line)),
            Token::Operator(op) => Some(*op),
            Token::Keyword(Keyword::Equal) => Some(Operator::Equal),
            Token::Keyword(Keyword::NotEqual) => Some(Operator::NotEqual),
            _ => None,
        };
        if let Some(op) = operator {
            if !matches!(items.last(), Some(Item::Operand(_) | Item::Close)) {
                return Err(illegal(token, line));
            }
            items.push(Item::Operator(op));
            continue;
        }

        match token {
            Token::Bracket(Bracket::OpenRound) => {
                if matches!(items.last(), Some(Item::Operand(_) | Item::Close)) {
                    return Err(illegal(token, line));
                }
                depth += 1;
                items.push(Item::Open);
                continue;
            }
            Token::Bracket(Bracket::CloseRound) => {
                if depth == 0 {
                    return Err(CompileError::syntax("Unexpected ')'", line));
                }
                if !matches!(items.last(), Some(Item::Operand(_) | Item::Close)) {
                    return Err(illegal(token, line));
                }
                depth -= 1;
                items.push(Item::Close);
                continue;
            }
            _ => {}
        }

        let operand = match token {
            Token::Identifier(lit)
                if tokens
                    .get(index)
                    .is_some_and(|next| next.is_bracket(Bracket::OpenRound)) =>
            {
                resolver.check_call_target(&lit.text, lit.line)?;
                let close = matching_close(tokens, index)
                    .ok_or_else(|| CompileError::syntax("Expecting ')'", line))?;
                let args = compile_arguments(&tokens[index + 1..close], line, resolver)?;
                index = close + 1;
                Operand::Call {
                    name: lit.text.clone(),
                    args,
                }
            }
            Token::Keyword(Keyword::Print)
                if tokens
                    .get(index)
                    .is_some_and(|next| next.is_bracket(Bracket::OpenRound)) =>
            {
                let close = matching_close(tokens, index)
                    .ok_or_else(|| CompileError::syntax("Expecting ')'", line))?;
                let args = compile_arguments(&tokens[index + 1..close], line, resolver)?;
                index = close + 1;
                Operand::Print(args)
            }
            Token::Identifier(lit) => {
                resolver.reference(&lit.text, lit.line)?;
                Operand::Identifier(lit.text.clone())
            }
            other => match literal_operand(other, line)? {
                Some(operand) => operand,
                None => return Err(illegal(other, line)),
            },
        };
        if matches!(items.last(), Some(Item::Operand(_) | Item::Close)) {
            return Err(illegal(token, line));
        }
        items.push(Item::Operand(operand));
    }

    if depth > 0 {
        return Err(CompileError::syntax("Expecting ')'", line));
    }
    if items.is_empty() {
        return Err(CompileError::syntax("Expression not found", line));
    }
    if let Some(Item::Operator(op)) = items.last() {
        let text = Token::Operator(*op).lexeme();
        return Err(CompileError::syntax(
            format!("Expecting expression after '{text}'"),
            line,
        ));
    }
    Ok(items)
}

#[derive(Debug)]
enum Postfix {
    Operand(Operand),
    Operator(Operator),
}

fn to_postfix(items: Vec<Item>) -> Vec<Postfix> {
    let mut output = Vec::with_capacity(items.len());
    let mut pending: Vec<Item> = Vec::new();
    for item in items {
        match item {
            Item::Operand(operand) => output.push(Postfix::Operand(operand)),
            Item::Open => pending.push(Item::Open),
            Item::Close => {
                while let Some(top) = pending.pop() {
                    match top {
                        Item::Operator(op) => output.push(Postfix::Operator(op)),
                        _ => break,
                    }
                }
            }
            Item::Operator(op) => {
                while let Some(Item::Operator(top)) = pending.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Postfix::Operator(*top));
                    pending.pop();
                }
                pending.push(Item::Operator(op));
            }
        }
    }
    while let Some(top) = pending.pop() {
        if let Item::Operator(op) = top {
            output.push(Postfix::Operator(op));
        }
    }
    output
}

fn operator_instr(op: Operator) -> Result<Instr, CompileError> {
    match op.kind() {
        OperatorKind::Binary(binary) => Ok(Instr::Binary(binary)),
        OperatorKind::Compare(compare) => Ok(Instr::Compare(compare)),
        OperatorKind::Unary => Err(orphan(op)),
    }
}

fn orphan(op: Operator) -> CompileError {
    CompileError::invariant(format!(
        "Orphan '{}' token without any expression in bytecode expression evaluator",
        Token::Operator(op).lexeme()
    ))
}

fn evaluate(postfix: Vec<Postfix>) -> Result<Vec<Instr>, CompileError> {
    let mut groups: Vec<Vec<Instr>> = Vec::new();
    for item in postfix {
        match item {
            Postfix::Operand(operand) => groups.push(operand.compile()?),
            Postfix::Operator(op) => {
                let (Some(rhs), Some(mut lhs)) = (groups.pop(), groups.pop()) else {
                    return Err(orphan(op));
                };
                lhs.extend(rhs);
                lhs.push(operator_instr(op)?);
                groups.push(lhs);
            }
        }
    }
    match (groups.pop(), groups.is_empty()) {
        (Some(code), true) => Ok(code),
        _ => Err(CompileError::invariant(
            "Expression evaluator left more than one value on the stack",
        )),
    }
}

/// Compiles one expression into instructions leaving a single value on the
/// stack.
pub fn compile_expression(
    tokens: &[Token],
    line: u32,
    resolver: &dyn NameResolver,
) -> Result<Vec<Instr>, CompileError> {
    let mut items = normalize(tokens, line, resolver)?;
    if items.len() == 1
        && matches!(items[0], Item::Operand(_))
        && let Some(Item::Operand(operand)) = items.pop()
    {
        return operand.compile();
    }
    evaluate(to_postfix(items))
}

/// Splits a comma separated list at the top nesting level and compiles each
/// element. An empty list yields no groups.
pub fn compile_arguments(
    tokens: &[Token],
    line: u32,
    resolver: &dyn NameResolver,
) -> Result<Vec<Vec<Instr>>, CompileError> {
    split_top_level(tokens)
        .into_iter()
        .map(|arg| compile_expression(arg, line, resolver))
        .collect()
}

pub fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::Bracket(Bracket::OpenRound) => depth += 1,
            Token::Bracket(Bracket::CloseRound) => depth = depth.saturating_sub(1),
            Token::Punctuation(Punctuation::Comma) if depth == 0 => {
                parts.push(&tokens[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}
