use crate::bytecode::{BinaryOp, CompareOp, TypeName};
use crate::compiler::ir::Instr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Function,
    Print,
    Equal,
    NotEqual,
    Then,
    Continue,
    Break,
    If,
    Else,
    Switch,
    For,
    While,
    Variable,
    Constant,
    Delete,
    Return,
    Main,
    Type(TypeName),
}

impl Keyword {
    /// Keywords whose `(` opens a block header rather than a call.
    pub fn opens_block(self) -> bool {
        matches!(
            self,
            Keyword::Main
                | Keyword::If
                | Keyword::Else
                | Keyword::Switch
                | Keyword::For
                | Keyword::While
        )
    }

    /// Keywords that must be followed by whitespace.
    pub fn requires_space(self) -> bool {
        matches!(
            self,
            Keyword::Function
                | Keyword::Then
                | Keyword::Return
                | Keyword::Variable
                | Keyword::Constant
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Power,
    Divide,
    Modulo,
    Equal,
    And,
    Or,
    Greater,
    Less,
    BitAnd,
    BitOr,
    BitNot,
    ShiftLeft,
    ShiftRight,
    GreaterEqual,
    LessEqual,
    NotEqual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorKind {
    Binary(BinaryOp),
    Compare(CompareOp),
    Unary,
}

impl Operator {
    pub fn kind(self) -> OperatorKind {
        match self {
            Operator::Plus => OperatorKind::Binary(BinaryOp::Add),
            Operator::Minus => OperatorKind::Binary(BinaryOp::Sub),
            Operator::Multiply => OperatorKind::Binary(BinaryOp::Mul),
            Operator::Power => OperatorKind::Binary(BinaryOp::Pow),
            Operator::Divide => OperatorKind::Binary(BinaryOp::Div),
            Operator::Modulo => OperatorKind::Binary(BinaryOp::Mod),
            Operator::And => OperatorKind::Binary(BinaryOp::And),
            Operator::Or => OperatorKind::Binary(BinaryOp::Or),
            Operator::BitAnd => OperatorKind::Binary(BinaryOp::BitAnd),
            Operator::BitOr => OperatorKind::Binary(BinaryOp::BitOr),
            Operator::ShiftLeft => OperatorKind::Binary(BinaryOp::Shl),
            Operator::ShiftRight => OperatorKind::Binary(BinaryOp::Shr),
            Operator::Equal => OperatorKind::Compare(CompareOp::Eq),
            Operator::NotEqual => OperatorKind::Compare(CompareOp::Ne),
            Operator::Greater => OperatorKind::Compare(CompareOp::Gt),
            Operator::Less => OperatorKind::Compare(CompareOp::Lt),
            Operator::GreaterEqual => OperatorKind::Compare(CompareOp::Ge),
            Operator::LessEqual => OperatorKind::Compare(CompareOp::Le),
            Operator::BitNot => OperatorKind::Unary,
        }
    }

    /// Binding tier, higher binds tighter. Relational and logical operators
    /// share the top tier with no distinction between them.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::BitAnd
            | Operator::BitOr
            | Operator::BitNot
            | Operator::ShiftLeft
            | Operator::ShiftRight => 0,
            Operator::Plus | Operator::Minus => 1,
            Operator::Multiply | Operator::Divide | Operator::Modulo => 2,
            Operator::Power => 3,
            Operator::Equal
            | Operator::NotEqual
            | Operator::Greater
            | Operator::Less
            | Operator::GreaterEqual
            | Operator::LessEqual
            | Operator::And
            | Operator::Or => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompoundOp {
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    Increment,
    Decrement,
    BitAndAssign,
    BitOrAssign,
    ShlAssign,
    ShrAssign,
}

impl CompoundOp {
    pub fn binary(self) -> BinaryOp {
        match self {
            CompoundOp::AddAssign | CompoundOp::Increment => BinaryOp::Add,
            CompoundOp::SubAssign | CompoundOp::Decrement => BinaryOp::Sub,
            CompoundOp::MulAssign => BinaryOp::Mul,
            CompoundOp::DivAssign => BinaryOp::Div,
            CompoundOp::ModAssign => BinaryOp::Mod,
            CompoundOp::PowAssign => BinaryOp::Pow,
            CompoundOp::BitAndAssign => BinaryOp::BitAnd,
            CompoundOp::BitOrAssign => BinaryOp::BitOr,
            CompoundOp::ShlAssign => BinaryOp::Shl,
            CompoundOp::ShrAssign => BinaryOp::Shr,
        }
    }

    pub fn is_step(self) -> bool {
        matches!(self, CompoundOp::Increment | CompoundOp::Decrement)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bracket {
    OpenRound,
    CloseRound,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punctuation {
    DoubleQuote,
    Semicolon,
    Space,
    Comma,
    Dollar,
    SingleQuote,
    TripleQuote,
    Colon,
    Assign,
    LineComment,
    BlockCommentOpen,
    BlockCommentClose,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    Keyword(Keyword),
    Operator(Operator),
    Compound(CompoundOp),
    Bracket(Bracket),
    Punctuation(Punctuation),
}

#[derive(Clone, Copy, Debug)]
pub struct Lexeme {
    pub text: &'static str,
    pub id: u16,
    pub symbol: Symbol,
}

const fn lexeme(text: &'static str, id: u16, symbol: Symbol) -> Lexeme {
    Lexeme { text, id, symbol }
}

use Symbol::{Bracket as B, Compound as C, Keyword as K, Operator as O, Punctuation as P};

pub static LEXEMES: &[Lexeme] = &[
    lexeme("fungsi", 100, K(Keyword::Function)),
    lexeme("tampilkan", 101, K(Keyword::Print)),
    lexeme("adalah", 102, K(Keyword::Equal)),
    lexeme("bukan", 103, K(Keyword::NotEqual)),
    lexeme("maka", 104, K(Keyword::Then)),
    lexeme("lewati", 105, K(Keyword::Continue)),
    lexeme("berhenti", 106, K(Keyword::Break)),
    lexeme("jika", 107, K(Keyword::If)),
    lexeme("selainnya", 108, K(Keyword::Else)),
    lexeme("cocokkan", 109, K(Keyword::Switch)),
    lexeme("untuk", 110, K(Keyword::For)),
    lexeme("selama", 111, K(Keyword::While)),
    lexeme("variabel", 112, K(Keyword::Variable)),
    lexeme("konstanta", 113, K(Keyword::Constant)),
    lexeme("hapus", 114, K(Keyword::Delete)),
    lexeme("hasilkan", 115, K(Keyword::Return)),
    lexeme("utama", 116, K(Keyword::Main)),
    lexeme("+=", 200, C(CompoundOp::AddAssign)),
    lexeme("-=", 201, C(CompoundOp::SubAssign)),
    lexeme("*=", 202, C(CompoundOp::MulAssign)),
    lexeme("/=", 203, C(CompoundOp::DivAssign)),
    lexeme("%=", 204, C(CompoundOp::ModAssign)),
    lexeme("**=", 205, C(CompoundOp::PowAssign)),
    lexeme("++", 206, C(CompoundOp::Increment)),
    lexeme("--", 207, C(CompoundOp::Decrement)),
    lexeme("&=", 208, C(CompoundOp::BitAndAssign)),
    lexeme("|=", 209, C(CompoundOp::BitOrAssign)),
    lexeme("<<=", 210, C(CompoundOp::ShlAssign)),
    lexeme(">>=", 211, C(CompoundOp::ShrAssign)),
    lexeme("+", 300, O(Operator::Plus)),
    lexeme("-", 301, O(Operator::Minus)),
    lexeme("*", 302, O(Operator::Multiply)),
    lexeme("**", 303, O(Operator::Power)),
    lexeme("/", 304, O(Operator::Divide)),
    lexeme("%", 305, O(Operator::Modulo)),
    lexeme("==", 306, O(Operator::Equal)),
    lexeme("&&", 307, O(Operator::And)),
    lexeme("||", 308, O(Operator::Or)),
    lexeme(">", 309, O(Operator::Greater)),
    lexeme("<", 310, O(Operator::Less)),
    lexeme("&", 311, O(Operator::BitAnd)),
    lexeme("|", 312, O(Operator::BitOr)),
    lexeme("!", 313, O(Operator::BitNot)),
    lexeme("<<", 314, O(Operator::ShiftLeft)),
    lexeme(">>", 315, O(Operator::ShiftRight)),
    lexeme(">=", 316, O(Operator::GreaterEqual)),
    lexeme("<=", 317, O(Operator::LessEqual)),
    lexeme("!=", 318, O(Operator::NotEqual)),
    lexeme("apapun", 400, K(Keyword::Type(TypeName::Any))),
    lexeme("campuran", 401, K(Keyword::Type(TypeName::String))),
    lexeme("himpunan", 402, K(Keyword::Type(TypeName::Array))),
    lexeme("pecahan", 403, K(Keyword::Type(TypeName::Float))),
    lexeme("desimal", 404, K(Keyword::Type(TypeName::Int))),
    lexeme("boolean", 405, K(Keyword::Type(TypeName::Boolean))),
    lexeme("karakter", 406, K(Keyword::Type(TypeName::Character))),
    lexeme("kamus", 407, K(Keyword::Type(TypeName::Dictionary))),
    lexeme("(", 500, B(Bracket::OpenRound)),
    lexeme(")", 501, B(Bracket::CloseRound)),
    lexeme("{", 502, B(Bracket::OpenCurly)),
    lexeme("}", 503, B(Bracket::CloseCurly)),
    lexeme("[", 506, B(Bracket::OpenSquare)),
    lexeme("]", 507, B(Bracket::CloseSquare)),
    lexeme("\"", 700, P(Punctuation::DoubleQuote)),
    lexeme(";", 701, P(Punctuation::Semicolon)),
    lexeme(" ", 702, P(Punctuation::Space)),
    lexeme(",", 703, P(Punctuation::Comma)),
    lexeme("$", 704, P(Punctuation::Dollar)),
    lexeme("'", 705, P(Punctuation::SingleQuote)),
    lexeme("\"\"\"", 706, P(Punctuation::TripleQuote)),
    lexeme(":", 707, P(Punctuation::Colon)),
    lexeme("=", 708, P(Punctuation::Assign)),
    lexeme("//", 709, P(Punctuation::LineComment)),
    lexeme("/*", 710, P(Punctuation::BlockCommentOpen)),
    lexeme("*/", 711, P(Punctuation::BlockCommentClose)),
    lexeme("\0", 999, P(Punctuation::Eof)),
];

pub fn lookup(text: &str) -> Option<&'static Lexeme> {
    LEXEMES.iter().find(|lexeme| lexeme.text == text)
}

pub fn by_id(id: u16) -> Option<&'static Lexeme> {
    LEXEMES.iter().find(|lexeme| lexeme.id == id)
}

pub fn keyword(text: &str) -> Option<Keyword> {
    match lookup(text)?.symbol {
        Symbol::Keyword(keyword) => Some(keyword),
        _ => None,
    }
}

/// Table entry for a symbol lexeme (anything except a word keyword),
/// matched exactly against `text`.
pub fn symbol_lexeme(text: &str) -> Option<&'static Lexeme> {
    LEXEMES
        .iter()
        .find(|lexeme| lexeme.text == text && !matches!(lexeme.symbol, Symbol::Keyword(_)))
}

/// Whether `ch` can begin a symbol lexeme, which also terminates a word.
pub fn starts_symbol(ch: char) -> bool {
    LEXEMES.iter().any(|lexeme| {
        !matches!(lexeme.symbol, Symbol::Keyword(_)) && lexeme.text.starts_with(ch)
    })
}

pub fn symbol_text(symbol: Symbol) -> &'static str {
    LEXEMES
        .iter()
        .find(|lexeme| lexeme.symbol == symbol)
        .map(|lexeme| lexeme.text)
        .unwrap_or("?")
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub text: String,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StringPart {
    Text(String),
    /// Compiled body of an `${...}` block, leaving one value on the stack.
    Interpolated(Vec<Instr>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StringLiteral {
    pub parts: Vec<StringPart>,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Operator(Operator),
    Compound(CompoundOp),
    Bracket(Bracket),
    Punctuation(Punctuation),
    Integer(Literal),
    Float(Literal),
    Boolean(Literal),
    Str(StringLiteral),
    Identifier(Literal),
}

impl Token {
    pub fn from_symbol(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Keyword(keyword) => Token::Keyword(keyword),
            Symbol::Operator(op) => Token::Operator(op),
            Symbol::Compound(op) => Token::Compound(op),
            Symbol::Bracket(bracket) => Token::Bracket(bracket),
            Symbol::Punctuation(punct) => Token::Punctuation(punct),
        }
    }

    pub fn lexeme(&self) -> String {
        match self {
            Token::Keyword(keyword) => symbol_text(Symbol::Keyword(*keyword)).to_string(),
            Token::Operator(op) => symbol_text(Symbol::Operator(*op)).to_string(),
            Token::Compound(op) => symbol_text(Symbol::Compound(*op)).to_string(),
            Token::Bracket(bracket) => symbol_text(Symbol::Bracket(*bracket)).to_string(),
            Token::Punctuation(punct) => symbol_text(Symbol::Punctuation(*punct)).to_string(),
            Token::Integer(lit) | Token::Float(lit) | Token::Boolean(lit) => lit.text.clone(),
            Token::Identifier(lit) => lit.text.clone(),
            Token::Str(string) => {
                let mut out = String::from("\"");
                for part in &string.parts {
                    match part {
                        StringPart::Text(text) => out.push_str(text),
                        StringPart::Interpolated(_) => out.push_str("${...}"),
                    }
                }
                out.push('"');
                out
            }
        }
    }

    pub fn is_bracket(&self, bracket: Bracket) -> bool {
        matches!(self, Token::Bracket(b) if *b == bracket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_bidirectional() {
        for entry in LEXEMES {
            assert_eq!(lookup(entry.text).map(|found| found.id), Some(entry.id));
            assert_eq!(by_id(entry.id).map(|found| found.text), Some(entry.text));
        }
    }

    #[test]
    fn ids_follow_lexeme_classes() {
        assert_eq!(lookup("utama").map(|l| l.id), Some(116));
        assert_eq!(lookup(">>=").map(|l| l.id), Some(211));
        assert_eq!(lookup("!=").map(|l| l.id), Some(318));
        assert_eq!(lookup("kamus").map(|l| l.id), Some(407));
        assert_eq!(lookup("}").map(|l| l.id), Some(503));
        assert_eq!(by_id(999).map(|l| l.text), Some("\0"));
    }

    #[test]
    fn angle_characters_are_comparisons() {
        assert_eq!(
            symbol_lexeme("<").map(|l| l.symbol),
            Some(Symbol::Operator(Operator::Less))
        );
        assert_eq!(
            symbol_lexeme(">").map(|l| l.symbol),
            Some(Symbol::Operator(Operator::Greater))
        );
    }

    #[test]
    fn keywords_are_not_symbol_lexemes() {
        assert!(symbol_lexeme("jika").is_none());
        assert_eq!(keyword("jika"), Some(Keyword::If));
        assert_eq!(keyword("desimal"), Some(Keyword::Type(TypeName::Int)));
        assert!(starts_symbol('$'));
        assert!(!starts_symbol('a'));
        assert!(!starts_symbol('.'));
    }

    #[test]
    fn precedence_tiers() {
        assert!(Operator::Multiply.precedence() > Operator::Plus.precedence());
        assert!(Operator::Power.precedence() > Operator::Modulo.precedence());
        assert_eq!(Operator::And.precedence(), Operator::Equal.precedence());
        assert_eq!(Operator::ShiftLeft.precedence(), 0);
    }
}
