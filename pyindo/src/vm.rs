use std::collections::HashMap;

use tracing::trace;

use crate::bytecode::{BinaryOp, Builtin, CompareOp, Instruction, Program, Value};

pub const MAX_CALL_DEPTH: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq)]
enum NumericValue {
    Int(i64),
    Float(f64),
}

impl NumericValue {
    fn as_f64(self) -> f64 {
        match self {
            NumericValue::Int(value) => value as f64,
            NumericValue::Float(value) => value,
        }
    }
}

impl Value {
    fn as_int(&self) -> Result<i64, VmError> {
        match self {
            Value::Int(value) => Ok(*value),
            _ => Err(VmError::TypeMismatch("desimal")),
        }
    }

    fn as_numeric(&self) -> Result<NumericValue, VmError> {
        match self {
            Value::Int(value) => Ok(NumericValue::Int(*value)),
            Value::Float(value) => Ok(NumericValue::Float(*value)),
            _ => Err(VmError::TypeMismatch("number")),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Int(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Bool(value) => *value,
            Value::String(text) => !text.is_empty(),
            Value::Chunk(_) | Value::Function { .. } | Value::Builtin(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    StackUnderflow,
    TypeMismatch(&'static str),
    DivisionByZero,
    IntegerOverflow,
    InvalidShift(i64),
    UnboundName(String),
    InvalidChunk(u32),
    NotCallable(&'static str),
    InvalidCallArity {
        function: String,
        expected: usize,
        got: usize,
    },
    CallDepthExceeded,
    BytecodeBounds(u32),
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmError::StackUnderflow => write!(f, "stack underflow"),
            VmError::TypeMismatch(expected) => write!(f, "type mismatch: expected {expected}"),
            VmError::DivisionByZero => write!(f, "division by zero"),
            VmError::IntegerOverflow => write!(f, "integer overflow"),
            VmError::InvalidShift(value) => {
                write!(f, "invalid shift amount {value}, expected 0..63")
            }
            VmError::UnboundName(name) => write!(f, "name '{name}' is not defined"),
            VmError::InvalidChunk(index) => write!(f, "invalid chunk {index}"),
            VmError::NotCallable(kind) => write!(f, "'{kind}' value is not callable"),
            VmError::InvalidCallArity {
                function,
                expected,
                got,
            } => write!(
                f,
                "invalid call arity for '{function}': expected {expected}, got {got}",
            ),
            VmError::CallDepthExceeded => {
                write!(f, "call depth exceeded the limit of {MAX_CALL_DEPTH}")
            }
            VmError::BytecodeBounds(target) => write!(f, "jump target {target} out of bounds"),
        }
    }
}

impl std::error::Error for VmError {}

pub type VmResult<T> = Result<T, VmError>;

#[derive(Debug)]
struct Frame {
    /// `None` for the top-level code.
    chunk: Option<u32>,
    ip: usize,
    locals: HashMap<String, Value>,
    stack_base: usize,
}

impl Frame {
    fn new(chunk: Option<u32>, stack_base: usize) -> Self {
        Self {
            chunk,
            ip: 0,
            locals: HashMap::new(),
            stack_base,
        }
    }
}

/// Executes a compiled program. Names resolve against the current frame,
/// then the module frame, then the builtins.
pub struct Vm {
    program: Program,
    stack: Vec<Value>,
    frames: Vec<Frame>,
    output: Vec<String>,
    echo: bool,
}

impl Vm {
    pub fn new(program: Program) -> Self {
        let mut module = Frame::new(None, 0);
        module.locals.insert(
            "__name__".to_string(),
            Value::String("__main__".to_string()),
        );
        Self {
            program,
            stack: Vec::new(),
            frames: vec![module],
            output: Vec::new(),
            echo: false,
        }
    }

    /// Also writes `tampilkan` output to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Lines printed by `tampilkan` so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.frames.first().and_then(|frame| frame.locals.get(name))
    }

    /// Runs until the top-level code returns and yields its return value.
    pub fn run(&mut self) -> VmResult<Value> {
        loop {
            let Some(instruction) = self.fetch()? else {
                // Falling off the end of a code block returns null.
                if let Some(value) = self.return_from_frame(Value::Null)? {
                    return Ok(value);
                }
                continue;
            };
            trace!(op = instruction.mnemonic(), depth = self.frames.len(), "execute");
            match instruction {
                Instruction::LoadConst(value) => self.stack.push(value),
                Instruction::LoadName(name) => {
                    let value = self.load_name(&name)?;
                    self.stack.push(value);
                }
                Instruction::StoreName(name) => {
                    let value = self.pop_value()?;
                    self.current_frame_mut()?.locals.insert(name, value);
                }
                Instruction::Binary(op) => self.binary(op)?,
                Instruction::Compare(op) => self.compare(op)?,
                Instruction::JumpIfFalse(target) => {
                    if !self.pop_value()?.is_truthy() {
                        self.jump(target)?;
                    }
                }
                Instruction::Jump(target) => self.jump(target)?,
                Instruction::BuildString(count) => {
                    let parts = self.pop_many(count as usize)?;
                    let text = parts.iter().map(Value::to_string).collect::<String>();
                    self.stack.push(Value::String(text));
                }
                Instruction::Call(argc) => self.call(argc as usize)?,
                Instruction::MakeFunction(name) => match self.pop_value()? {
                    Value::Chunk(chunk) => {
                        if self.program.chunk(chunk).is_none() {
                            return Err(VmError::InvalidChunk(chunk));
                        }
                        self.stack.push(Value::Function { chunk, name });
                    }
                    _ => return Err(VmError::TypeMismatch("chunk")),
                },
                Instruction::Return => {
                    let value = self.pop_value()?;
                    if let Some(value) = self.return_from_frame(value)? {
                        return Ok(value);
                    }
                }
                Instruction::Pop => {
                    self.pop_value()?;
                }
            }
        }
    }

    fn code(&self, chunk: Option<u32>) -> VmResult<&[Instruction]> {
        match chunk {
            None => Ok(&self.program.code),
            Some(index) => self
                .program
                .chunk(index)
                .map(|chunk| chunk.code.as_slice())
                .ok_or(VmError::InvalidChunk(index)),
        }
    }

    fn fetch(&mut self) -> VmResult<Option<Instruction>> {
        let frame = self.frames.last().ok_or(VmError::StackUnderflow)?;
        let (chunk, ip) = (frame.chunk, frame.ip);
        let instruction = self.code(chunk)?.get(ip).cloned();
        if instruction.is_some() {
            self.current_frame_mut()?.ip += 1;
        }
        Ok(instruction)
    }

    fn jump(&mut self, target: u32) -> VmResult<()> {
        let chunk = self.frames.last().ok_or(VmError::StackUnderflow)?.chunk;
        if target as usize > self.code(chunk)?.len() {
            return Err(VmError::BytecodeBounds(target));
        }
        self.current_frame_mut()?.ip = target as usize;
        Ok(())
    }

    fn current_frame_mut(&mut self) -> VmResult<&mut Frame> {
        self.frames.last_mut().ok_or(VmError::StackUnderflow)
    }

    /// Pops the current frame. Returns the final value once the module frame
    /// itself returns.
    fn return_from_frame(&mut self, value: Value) -> VmResult<Option<Value>> {
        if self.frames.len() == 1 {
            return Ok(Some(value));
        }
        let frame = self.frames.pop().ok_or(VmError::StackUnderflow)?;
        self.stack.truncate(frame.stack_base);
        self.stack.push(value);
        Ok(None)
    }

    fn load_name(&self, name: &str) -> VmResult<Value> {
        let local = self.frames.last().and_then(|frame| frame.locals.get(name));
        let global = || self.frames.first().and_then(|frame| frame.locals.get(name));
        if let Some(value) = local.or_else(global) {
            return Ok(value.clone());
        }
        if name == Builtin::Print.name() {
            return Ok(Value::Builtin(Builtin::Print));
        }
        Err(VmError::UnboundName(name.to_string()))
    }

    fn call(&mut self, argc: usize) -> VmResult<()> {
        let args = self.pop_many(argc)?;
        let callee = self.pop_value()?;
        match callee {
            Value::Builtin(Builtin::Print) => {
                let line = args
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                if self.echo {
                    println!("{line}");
                }
                self.output.push(line);
                self.stack.push(Value::Null);
                Ok(())
            }
            Value::Function { chunk, name } => {
                let expected = self
                    .program
                    .chunk(chunk)
                    .ok_or(VmError::InvalidChunk(chunk))?
                    .params
                    .len();
                if expected != argc {
                    return Err(VmError::InvalidCallArity {
                        function: name,
                        expected,
                        got: argc,
                    });
                }
                if self.frames.len() >= MAX_CALL_DEPTH {
                    return Err(VmError::CallDepthExceeded);
                }
                trace!(function = %name, argc, "call");
                let base = self.stack.len();
                // The chunk header stores parameters in declared order, so the
                // first argument goes on top.
                self.stack.extend(args.into_iter().rev());
                let mut frame = Frame::new(Some(chunk), base);
                // Functions declared inside another function are bound in the
                // enclosing frame only, so each call sees its own name.
                frame
                    .locals
                    .insert(name.clone(), Value::Function { chunk, name });
                self.frames.push(frame);
                Ok(())
            }
            other => Err(VmError::NotCallable(other.type_name())),
        }
    }

    fn pop_value(&mut self) -> VmResult<Value> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    /// Pops `count` values and returns them in push order.
    fn pop_many(&mut self, count: usize) -> VmResult<Vec<Value>> {
        if self.stack.len() < count {
            return Err(VmError::StackUnderflow);
        }
        let at = self.stack.len() - count;
        Ok(self.stack.split_off(at))
    }

    fn pop_numeric(&mut self) -> VmResult<NumericValue> {
        self.pop_value()?.as_numeric()
    }

    fn pop_int(&mut self) -> VmResult<i64> {
        self.pop_value()?.as_int()
    }

    fn pop_shift_amount(&mut self) -> VmResult<u32> {
        let value = self.pop_int()?;
        if !(0..=63).contains(&value) {
            return Err(VmError::InvalidShift(value));
        }
        Ok(value as u32)
    }

    fn binary(&mut self, op: BinaryOp) -> VmResult<()> {
        match op {
            BinaryOp::Add => {
                if matches!(self.stack.last(), Some(Value::String(_))) {
                    let rhs = self.pop_value()?;
                    let lhs = self.pop_value()?;
                    return match (lhs, rhs) {
                        (Value::String(mut lhs), Value::String(rhs)) => {
                            lhs.push_str(&rhs);
                            self.stack.push(Value::String(lhs));
                            Ok(())
                        }
                        _ => Err(VmError::TypeMismatch("campuran")),
                    };
                }
                self.binary_numeric_op(
                    |lhs, rhs| lhs.checked_add(rhs).ok_or(VmError::IntegerOverflow),
                    |lhs, rhs| Ok(lhs + rhs),
                )
            }
            BinaryOp::Sub => self.binary_numeric_op(
                |lhs, rhs| lhs.checked_sub(rhs).ok_or(VmError::IntegerOverflow),
                |lhs, rhs| Ok(lhs - rhs),
            ),
            BinaryOp::Mul => self.binary_numeric_op(
                |lhs, rhs| lhs.checked_mul(rhs).ok_or(VmError::IntegerOverflow),
                |lhs, rhs| Ok(lhs * rhs),
            ),
            BinaryOp::Div => {
                let rhs = self.pop_numeric()?.as_f64();
                let lhs = self.pop_numeric()?.as_f64();
                if rhs == 0.0 {
                    return Err(VmError::DivisionByZero);
                }
                self.stack.push(Value::Float(lhs / rhs));
                Ok(())
            }
            BinaryOp::Mod => self.binary_numeric_op(
                |lhs, rhs| {
                    if rhs == 0 {
                        return Err(VmError::DivisionByZero);
                    }
                    let rem = lhs.checked_rem(rhs).ok_or(VmError::IntegerOverflow)?;
                    // Result takes the sign of the divisor.
                    Ok(if rem != 0 && (rem < 0) != (rhs < 0) {
                        rem + rhs
                    } else {
                        rem
                    })
                },
                |lhs, rhs| {
                    if rhs == 0.0 {
                        return Err(VmError::DivisionByZero);
                    }
                    let rem = lhs % rhs;
                    Ok(if rem != 0.0 && (rem < 0.0) != (rhs < 0.0) {
                        rem + rhs
                    } else {
                        rem
                    })
                },
            ),
            BinaryOp::Pow => {
                let rhs = self.pop_numeric()?;
                let lhs = self.pop_numeric()?;
                let result = match (lhs, rhs) {
                    (NumericValue::Int(base), NumericValue::Int(exp)) if exp >= 0 => {
                        let exp = u32::try_from(exp).map_err(|_| VmError::IntegerOverflow)?;
                        Value::Int(base.checked_pow(exp).ok_or(VmError::IntegerOverflow)?)
                    }
                    (lhs, rhs) => Value::Float(lhs.as_f64().powf(rhs.as_f64())),
                };
                self.stack.push(result);
                Ok(())
            }
            BinaryOp::BitAnd => {
                let rhs = self.pop_int()?;
                let lhs = self.pop_int()?;
                self.stack.push(Value::Int(lhs & rhs));
                Ok(())
            }
            BinaryOp::BitOr => {
                let rhs = self.pop_int()?;
                let lhs = self.pop_int()?;
                self.stack.push(Value::Int(lhs | rhs));
                Ok(())
            }
            BinaryOp::Shl => {
                let amount = self.pop_shift_amount()?;
                let value = self.pop_int()?;
                self.stack.push(Value::Int(value.wrapping_shl(amount)));
                Ok(())
            }
            BinaryOp::Shr => {
                let amount = self.pop_shift_amount()?;
                let value = self.pop_int()?;
                self.stack.push(Value::Int(value.wrapping_shr(amount)));
                Ok(())
            }
            BinaryOp::And | BinaryOp::Or => {
                let rhs = self.pop_value()?;
                let lhs = self.pop_value()?;
                let pick_lhs = if op == BinaryOp::And {
                    !lhs.is_truthy()
                } else {
                    lhs.is_truthy()
                };
                self.stack.push(if pick_lhs { lhs } else { rhs });
                Ok(())
            }
        }
    }

    fn binary_numeric_op(
        &mut self,
        int_op: impl FnOnce(i64, i64) -> VmResult<i64>,
        float_op: impl FnOnce(f64, f64) -> VmResult<f64>,
    ) -> VmResult<()> {
        let rhs = self.pop_numeric()?;
        let lhs = self.pop_numeric()?;
        match (lhs, rhs) {
            (NumericValue::Int(lhs), NumericValue::Int(rhs)) => {
                self.stack.push(Value::Int(int_op(lhs, rhs)?));
            }
            (lhs, rhs) => {
                self.stack
                    .push(Value::Float(float_op(lhs.as_f64(), rhs.as_f64())?));
            }
        }
        Ok(())
    }

    fn compare(&mut self, op: CompareOp) -> VmResult<()> {
        let rhs = self.pop_value()?;
        let lhs = self.pop_value()?;
        let ordering = match (&lhs, &rhs) {
            (Value::String(lhs), Value::String(rhs)) => Some(lhs.cmp(rhs)),
            (Value::Bool(lhs), Value::Bool(rhs)) => Some(lhs.cmp(rhs)),
            _ => match (lhs.as_numeric(), rhs.as_numeric()) {
                (Ok(NumericValue::Int(lhs)), Ok(NumericValue::Int(rhs))) => Some(lhs.cmp(&rhs)),
                (Ok(lhs), Ok(rhs)) => lhs.as_f64().partial_cmp(&rhs.as_f64()),
                _ => None,
            },
        };
        let result = match op {
            CompareOp::Eq => match ordering {
                Some(ordering) => ordering.is_eq(),
                None => lhs == rhs,
            },
            CompareOp::Ne => match ordering {
                Some(ordering) => ordering.is_ne(),
                None => lhs != rhs,
            },
            CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge => {
                let ordering = ordering.ok_or(VmError::TypeMismatch("comparable values"))?;
                match op {
                    CompareOp::Lt => ordering.is_lt(),
                    CompareOp::Gt => ordering.is_gt(),
                    CompareOp::Le => ordering.is_le(),
                    _ => ordering.is_ge(),
                }
            }
        };
        self.stack.push(Value::Bool(result));
        Ok(())
    }
}
