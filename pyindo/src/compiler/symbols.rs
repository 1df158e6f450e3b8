use std::collections::HashMap;

use crate::bytecode::TypeName;

use super::CompileError;

/// Name of the builtin print target, always callable.
pub const PRINT_TARGET: &str = "tampilkan";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolInfo {
    pub kind: SymbolKind,
    pub ty: TypeName,
    pub line: u32,
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        name: &str,
        kind: SymbolKind,
        ty: TypeName,
        line: u32,
    ) -> Result<(), CompileError> {
        if self.entries.contains_key(name) {
            return Err(CompileError::syntax(
                format!("Identifier '{name}' is already declared before"),
                line,
            ));
        }
        self.entries
            .insert(name.to_string(), SymbolInfo { kind, ty, line });
        Ok(())
    }

    pub fn reference(&self, name: &str, line: u32) -> Result<&SymbolInfo, CompileError> {
        self.entries.get(name).ok_or_else(|| {
            CompileError::syntax(format!("Identifier '{name}' has not declared yet"), line)
        })
    }

    /// Checks that `name` exists and is not a constant.
    pub fn assignable(&self, name: &str, line: u32) -> Result<(), CompileError> {
        let info = self.reference(name, line)?;
        if info.kind == SymbolKind::Constant {
            return Err(CompileError::syntax(
                format!("Identifier '{name}' is a constant and cannot be reassigned"),
                line,
            ));
        }
        Ok(())
    }
}

/// Declared call targets, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct FunctionTable {
    declared: Vec<String>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_function(&mut self, name: &str, line: u32) -> Result<(), CompileError> {
        if self.is_declared(name) {
            return Err(CompileError::syntax(
                format!("'{name}' function is already declared before"),
                line,
            ));
        }
        self.declared.push(name.to_string());
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.iter().any(|declared| declared == name)
    }

    pub fn check_call_target(&self, name: &str, line: u32) -> Result<(), CompileError> {
        if name == PRINT_TARGET || self.is_declared(name) {
            return Ok(());
        }
        Err(CompileError::syntax(
            format!("'{name}' function is not declared anywhere"),
            line,
        ))
    }
}

/// Name checks the expression compiler needs from the enclosing scope.
pub trait NameResolver {
    fn reference(&self, name: &str, line: u32) -> Result<(), CompileError>;
    fn check_call_target(&self, name: &str, line: u32) -> Result<(), CompileError>;
}

pub struct Scope<'a> {
    pub locals: &'a SymbolTable,
    pub functions: &'a FunctionTable,
}

impl NameResolver for Scope<'_> {
    fn reference(&self, name: &str, line: u32) -> Result<(), CompileError> {
        self.locals.reference(name, line).map(|_| ())
    }

    fn check_call_target(&self, name: &str, line: u32) -> Result<(), CompileError> {
        self.functions.check_call_target(name, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaration_is_rejected() {
        let mut table = SymbolTable::new();
        table
            .declare("x", SymbolKind::Variable, TypeName::Any, 1)
            .expect("first declaration");
        let err = table
            .declare("x", SymbolKind::Variable, TypeName::Any, 2)
            .expect_err("second declaration");
        assert_eq!(
            err.to_string(),
            "Error: Identifier 'x' is already declared before (on line number 2)"
        );
    }

    #[test]
    fn constants_are_not_assignable() {
        let mut table = SymbolTable::new();
        table
            .declare("PI", SymbolKind::Constant, TypeName::Float, 1)
            .expect("declare");
        let err = table.assignable("PI", 4).expect_err("constant");
        assert_eq!(
            err.to_string(),
            "Error: Identifier 'PI' is a constant and cannot be reassigned (on line number 4)"
        );
        assert!(table.assignable("nope", 4).is_err());
    }

    #[test]
    fn print_is_always_a_call_target() {
        let mut functions = FunctionTable::new();
        functions
            .check_call_target(PRINT_TARGET, 1)
            .expect("builtin target");
        let err = functions.check_call_target("bar", 3).expect_err("undeclared");
        assert_eq!(
            err.to_string(),
            "Error: 'bar' function is not declared anywhere (on line number 3)"
        );
        functions.declare_function("foo", 1).expect("declare");
        let err = functions.declare_function("foo", 5).expect_err("duplicate");
        assert_eq!(
            err.to_string(),
            "Error: 'foo' function is already declared before (on line number 5)"
        );
    }
}
