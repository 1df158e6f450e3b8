use std::sync::OnceLock;

use regex::Regex;

use super::CompileError;
use super::token::{self, Literal, Punctuation, Symbol, Token};

static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

fn identifier_pattern() -> &'static Regex {
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern should compile")
    })
}

pub fn is_legal_identifier(text: &str) -> bool {
    identifier_pattern().is_match(text)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lexed {
    Token(Token),
    Eof,
    /// An unterminated block comment swallowed the rest of the input.
    Truncated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text up to and including the closing quote.
    Closed(String),
    /// Text up to and including `${`.
    Interpolation(String),
    Eof(String),
}

enum Trivia {
    Done,
    Truncated,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn at(&self, pos: usize) -> Option<char> {
        match self.chars.get(pos) {
            Some('\0') | None => None,
            Some(ch) => Some(*ch),
        }
    }

    fn peek(&self) -> Option<char> {
        self.at(self.pos)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn starts_with(&self, pos: usize, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(offset, expected)| self.at(pos + offset) == Some(expected))
    }

    /// Skips whitespace and comments from `pos` without touching the cursor,
    /// returning where the next lexeme starts and its line.
    fn trivia_end(&self, mut pos: usize, mut line: u32) -> (usize, u32, Trivia) {
        loop {
            match self.at(pos) {
                Some(ch) if ch.is_whitespace() => {
                    if ch == '\n' {
                        line += 1;
                    }
                    pos += 1;
                }
                Some('/') if self.starts_with(pos, "//") => {
                    while let Some(ch) = self.at(pos) {
                        pos += 1;
                        if ch == '\n' {
                            line += 1;
                            break;
                        }
                    }
                }
                Some('/') if self.starts_with(pos, "/*") => {
                    pos += 2;
                    loop {
                        if self.starts_with(pos, "*/") {
                            pos += 2;
                            break;
                        }
                        match self.at(pos) {
                            Some(ch) => {
                                if ch == '\n' {
                                    line += 1;
                                }
                                pos += 1;
                            }
                            None => return (self.chars.len(), line, Trivia::Truncated),
                        }
                    }
                }
                _ => return (pos, line, Trivia::Done),
            }
        }
    }

    fn skip_trivia(&mut self) -> Trivia {
        let (pos, line, trivia) = self.trivia_end(self.pos, self.line);
        self.pos = pos;
        self.line = line;
        trivia
    }

    /// Longest symbol lexeme starting at `pos`, trying three characters
    /// first and then two and one.
    fn symbol_at(&self, pos: usize) -> Option<(Symbol, usize)> {
        for len in (1..=3).rev() {
            let text: String = (pos..pos + len).filter_map(|index| self.at(index)).collect();
            if text.chars().count() != len {
                continue;
            }
            if let Some(lexeme) = token::symbol_lexeme(&text) {
                return Some((lexeme.symbol, len));
            }
        }
        None
    }

    fn word_end(&self, pos: usize) -> usize {
        let mut end = pos;
        while let Some(ch) = self.at(end) {
            if ch.is_whitespace() || token::starts_symbol(ch) {
                break;
            }
            end += 1;
        }
        end
    }

    pub fn next_token(&mut self) -> Result<Lexed, CompileError> {
        if let Trivia::Truncated = self.skip_trivia() {
            return Ok(Lexed::Truncated);
        }
        if self.peek().is_none() {
            return Ok(Lexed::Eof);
        }
        if let Some((symbol, len)) = self.symbol_at(self.pos) {
            self.pos += len;
            return Ok(Lexed::Token(Token::from_symbol(symbol)));
        }
        let end = self.word_end(self.pos);
        let word: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        classify_word(word, self.line).map(Lexed::Token)
    }

    fn lookahead_start(&self) -> (usize, u32) {
        let (pos, line, _) = self.trivia_end(self.pos, self.line);
        (pos, line)
    }

    fn lexeme_at(&self, pos: usize) -> Option<String> {
        self.at(pos)?;
        if let Some((_, len)) = self.symbol_at(pos) {
            return Some(self.chars[pos..pos + len].iter().collect());
        }
        Some(self.chars[pos..self.word_end(pos)].iter().collect())
    }

    /// Requires the next lexeme, ignoring whitespace and comments, to be
    /// `expected`. Nothing is consumed.
    pub fn search(&self, expected: &str) -> Result<(), CompileError> {
        let (pos, line) = self.lookahead_start();
        match self.lexeme_at(pos) {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(CompileError::syntax(
                format!("Expecting '{expected}' but got '{found}'"),
                line,
            )),
            None => Err(CompileError::at_eof(format!(
                "Expecting '{expected}' but have reached the End Of File"
            ))),
        }
    }

    /// Requires the next character to be whitespace.
    pub fn require_whitespace(&self) -> Result<(), CompileError> {
        match self.peek() {
            Some(ch) if ch.is_whitespace() => Ok(()),
            Some(_) => {
                let found = self.lexeme_at(self.pos).unwrap_or_default();
                Err(CompileError::syntax(
                    format!("Expecting ' ' but got '{found}'"),
                    self.line,
                ))
            }
            None => Err(CompileError::at_eof(
                "Expecting ' ' but have reached the End Of File",
            )),
        }
    }

    pub fn next_word_is(&self, word: &str) -> bool {
        let (pos, _) = self.lookahead_start();
        let end = self.word_end(pos);
        end > pos && self.chars[pos..end].iter().copied().eq(word.chars())
    }

    /// Reads string body text up to the closing `quote` or an `${` opener,
    /// resolving escapes.
    pub fn scan_string_segment(&mut self, quote: char) -> Segment {
        let mut text = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Segment::Eof(text);
            };
            match ch {
                _ if ch == quote => return Segment::Closed(text),
                '$' if self.peek() == Some('{') => {
                    self.bump();
                    return Segment::Interpolation(text);
                }
                '\\' => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('0') => text.push('\0'),
                    Some(escaped @ ('\\' | '"' | '\'' | '$')) => text.push(escaped),
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => {
                        text.push('\\');
                        return Segment::Eof(text);
                    }
                },
                _ => text.push(ch),
            }
        }
    }
}

fn classify_word(word: String, line: u32) -> Result<Token, CompileError> {
    let literal = |text: String| Literal { text, line };
    let lowered = word.to_ascii_lowercase();
    if lowered == "benar" || lowered == "salah" {
        return Ok(Token::Boolean(literal(word)));
    }
    if word.chars().all(|ch| ch.is_ascii_digit()) {
        return Ok(Token::Integer(literal(word)));
    }
    let dots = word.chars().filter(|ch| *ch == '.').count();
    if dots == 1
        && word.len() > 1
        && word.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
    {
        return Ok(Token::Float(literal(word)));
    }
    if let Some(keyword) = token::keyword(&word) {
        return Ok(Token::Keyword(keyword));
    }
    if !is_legal_identifier(&word) {
        return Err(CompileError::syntax(
            format!("Illegal identifier name: {word}"),
            line,
        ));
    }
    Ok(Token::Identifier(literal(word)))
}

pub fn quote_char(punct: Punctuation) -> Option<char> {
    match punct {
        Punctuation::DoubleQuote => Some('"'),
        Punctuation::SingleQuote => Some('\''),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::token::{Bracket, CompoundOp, Keyword, Operator};

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            match lexer.next_token().expect("lex should succeed") {
                Lexed::Token(token) => out.push(token),
                Lexed::Eof | Lexed::Truncated => break,
            }
        }
        out
    }

    #[test]
    fn longest_symbol_wins() {
        let toks = tokens("a **= 2 ** 3 <<= 1 << 2 <= 3");
        assert_eq!(toks[1], Token::Compound(CompoundOp::PowAssign));
        assert_eq!(toks[3], Token::Operator(Operator::Power));
        assert_eq!(toks[5], Token::Compound(CompoundOp::ShlAssign));
        assert_eq!(toks[7], Token::Operator(Operator::ShiftLeft));
        assert_eq!(toks[9], Token::Operator(Operator::LessEqual));
    }

    #[test]
    fn words_are_classified_in_order() {
        let toks = tokens("BENAR salah 42 3.14 jika nilai_1");
        assert!(matches!(&toks[0], Token::Boolean(lit) if lit.text == "BENAR"));
        assert!(matches!(&toks[1], Token::Boolean(_)));
        assert!(matches!(&toks[2], Token::Integer(lit) if lit.text == "42"));
        assert!(matches!(&toks[3], Token::Float(lit) if lit.text == "3.14"));
        assert_eq!(toks[4], Token::Keyword(Keyword::If));
        assert!(matches!(&toks[5], Token::Identifier(lit) if lit.text == "nilai_1"));
    }

    #[test]
    fn illegal_identifier_reports_line() {
        let mut lexer = Lexer::new("\n\n9lives");
        let err = lexer.next_token().expect_err("identifier should be rejected");
        assert_eq!(
            err.to_string(),
            "Error: Illegal identifier name: 9lives (on line number 3)"
        );
    }

    #[test]
    fn comments_are_skipped_and_lines_counted() {
        let mut lexer = Lexer::new("// one\n/* two\nthree */ x");
        let token = lexer.next_token().expect("lex should succeed");
        assert!(matches!(token, Lexed::Token(Token::Identifier(_))));
        assert_eq!(lexer.line(), 3);
    }

    #[test]
    fn unterminated_block_comment_truncates() {
        let mut lexer = Lexer::new("/* never closed\n x y z");
        assert_eq!(lexer.next_token().expect("lex"), Lexed::Truncated);
    }

    #[test]
    fn nul_sentinel_ends_input() {
        let mut lexer = Lexer::new("(\0 ignored");
        assert_eq!(
            lexer.next_token().expect("lex"),
            Lexed::Token(Token::Bracket(Bracket::OpenRound))
        );
        assert_eq!(lexer.next_token().expect("lex"), Lexed::Eof);
    }

    #[test]
    fn search_is_read_only() {
        let lexer = Lexer::new("  /* c */\n {");
        lexer.search("{").expect("curly should be found");
        assert_eq!(lexer.position(), 0);
        let err = lexer.search(";").expect_err("semicolon is not next");
        assert_eq!(err.to_string(), "Error: Expecting ';' but got '{' (on line number 2)");
    }

    #[test]
    fn search_at_end_has_no_line() {
        let lexer = Lexer::new("   ");
        let err = lexer.search("{").expect_err("nothing follows");
        assert_eq!(
            err.to_string(),
            "Error: Expecting '{' but have reached the End Of File"
        );
    }

    #[test]
    fn else_lookahead_skips_comments() {
        let lexer = Lexer::new(" // trailing\n selainnya {");
        assert!(lexer.next_word_is("selainnya"));
        let lexer = Lexer::new(" selainnyaX {");
        assert!(!lexer.next_word_is("selainnya"));
    }

    #[test]
    fn string_segments_split_on_interpolation() {
        let mut lexer = Lexer::new("Nilai: ${x}\\t$5\"");
        assert_eq!(
            lexer.scan_string_segment('"'),
            Segment::Interpolation("Nilai: ".to_string())
        );
        assert!(matches!(
            lexer.next_token().expect("lex"),
            Lexed::Token(Token::Identifier(_))
        ));
        assert_eq!(
            lexer.next_token().expect("lex"),
            Lexed::Token(Token::Bracket(Bracket::CloseCurly))
        );
        assert_eq!(
            lexer.scan_string_segment('"'),
            Segment::Closed("\t$5".to_string())
        );
    }
}
