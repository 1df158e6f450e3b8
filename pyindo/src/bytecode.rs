use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Index into `Program::chunks`.
    Chunk(u32),
    #[serde(skip)]
    Function { chunk: u32, name: String },
    #[serde(skip)]
    Builtin(Builtin),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    Print,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "tampilkan",
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "kosong",
            Value::Int(_) => "desimal",
            Value::Float(_) => "pecahan",
            Value::Bool(_) => "boolean",
            Value::String(_) => "campuran",
            Value::Chunk(_) => "chunk",
            Value::Function { .. } | Value::Builtin(_) => "fungsi",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "kosong"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => {
                if value.is_finite() && value.fract() == 0.0 {
                    write!(f, "{value:.1}")
                } else {
                    write!(f, "{value}")
                }
            }
            Value::Bool(true) => write!(f, "benar"),
            Value::Bool(false) => write!(f, "salah"),
            Value::String(text) => write!(f, "{text}"),
            Value::Chunk(index) => write!(f, "<chunk {index}>"),
            Value::Function { name, .. } => write!(f, "<fungsi {name}>"),
            Value::Builtin(builtin) => write!(f, "<fungsi bawaan {}>", builtin.name()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    Shl,
    Shr,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

/// Resolved instruction. Jump operands are absolute offsets into the
/// instruction list that contains them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    LoadConst(Value),
    LoadName(String),
    StoreName(String),
    Binary(BinaryOp),
    Compare(CompareOp),
    JumpIfFalse(u32),
    Jump(u32),
    BuildString(u32),
    Call(u8),
    MakeFunction(String),
    Return,
    Pop,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::LoadConst(_) => "load_const",
            Instruction::LoadName(_) => "load_name",
            Instruction::StoreName(_) => "store_name",
            Instruction::Binary(_) => "binary_op",
            Instruction::Compare(_) => "compare_op",
            Instruction::JumpIfFalse(_) => "pop_jump_if_false",
            Instruction::Jump(_) => "jump",
            Instruction::BuildString(_) => "build_string",
            Instruction::Call(_) => "call",
            Instruction::MakeFunction(_) => "make_function",
            Instruction::Return => "return",
            Instruction::Pop => "pop",
        }
    }

    pub fn jump_target(&self) -> Option<u32> {
        match self {
            Instruction::JumpIfFalse(target) | Instruction::Jump(target) => Some(*target),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Any,
    String,
    Array,
    Float,
    Int,
    Boolean,
    Character,
    Dictionary,
}

impl TypeName {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeName::Any => "apapun",
            TypeName::String => "campuran",
            TypeName::Array => "himpunan",
            TypeName::Float => "pecahan",
            TypeName::Int => "desimal",
            TypeName::Boolean => "boolean",
            TypeName::Character => "karakter",
            TypeName::Dictionary => "kamus",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeName,
}

/// Independently invocable code produced for one named function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub name: String,
    pub params: Vec<Param>,
    pub code: Vec<Instruction>,
    pub line: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<Instruction>,
    pub chunks: Vec<Chunk>,
}

impl Program {
    pub fn new(code: Vec<Instruction>, chunks: Vec<Chunk>) -> Self {
        Self { code, chunks }
    }

    pub fn chunk(&self, index: u32) -> Option<&Chunk> {
        self.chunks.get(index as usize)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
