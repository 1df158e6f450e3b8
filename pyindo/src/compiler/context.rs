#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    RoundBracket,
    CurlyBracket,
    DoubleQuote,
    SingleQuote,
}

impl Context {
    pub fn closer(self) -> char {
        match self {
            Context::RoundBracket => ')',
            Context::CurlyBracket => '}',
            Context::DoubleQuote => '"',
            Context::SingleQuote => '\'',
        }
    }

    pub fn is_quote(self) -> bool {
        matches!(self, Context::DoubleQuote | Context::SingleQuote)
    }

    pub fn for_quote(quote: char) -> Option<Self> {
        match quote {
            '"' => Some(Context::DoubleQuote),
            '\'' => Some(Context::SingleQuote),
            _ => None,
        }
    }
}

/// Stack of open delimiters. A curly bracket pushed directly on top of a
/// quote context is an interpolation block.
#[derive(Debug, Default)]
pub struct ContextStack {
    stack: Vec<Context>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, context: Context) {
        self.stack.push(context);
    }

    pub fn pop(&mut self) -> Option<Context> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<Context> {
        self.stack.last().copied()
    }

    pub fn is_string_body(&self) -> bool {
        self.top().is_some_and(Context::is_quote)
    }

    /// Whether the top curly bracket was opened inside a string.
    pub fn in_interpolation(&self) -> bool {
        let len = self.stack.len();
        len >= 2
            && self.stack[len - 1] == Context::CurlyBracket
            && self.stack[len - 2].is_quote()
    }

    pub fn innermost_closer(&self) -> Option<char> {
        self.top().map(Context::closer)
    }
}
