//! Function resolution pass.
//!
//! Collects the signature of every `fn` declaration in the program (at any nesting depth), then checks that
//! every call names a declared function with the right number of arguments. Declarations are program-wide,
//! so a function can be called before it is declared and can call itself.

use std::collections::HashMap;

use nob_parser::ast::{Expr, Program, Stmt, Term};
use nob_parser::visitor::{walk_expr, walk_stmt, Visitor};
use nob_source::{CompileError, CompileResult};

/// Represents a declared function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub arity: usize,
    /// Line of the declaration.
    pub line: usize,
}

/// All function signatures of a program, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionTable {
    functions: HashMap<String, Signature>,
}

impl FunctionTable {
    /// Runs the pass over `program`.
    pub fn resolve(program: &Program) -> CompileResult<Self> {
        let mut collector = Collector {
            table: FunctionTable::default(),
            error: None,
        };
        for stmt in &program.stmts {
            collector.visit_stmt(stmt);
        }
        if let Some(error) = collector.error {
            return Err(error);
        }

        let mut checker = CallChecker {
            table: &collector.table,
            error: None,
        };
        for stmt in &program.stmts {
            checker.visit_stmt(stmt);
        }
        match checker.error {
            Some(error) => Err(error),
            None => Ok(collector.table),
        }
    }

    pub fn get(&self, ident: &str) -> Option<&Signature> {
        self.functions.get(ident)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Records declarations. Only the first error is kept.
struct Collector {
    table: FunctionTable,
    error: Option<CompileError>,
}

impl<'a> Visitor<'a> for Collector {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if self.error.is_some() {
            return;
        }

        if let Stmt::FnDeclaration {
            ident,
            params,
            line,
            ..
        } = stmt
        {
            if let Some(previous) = self.table.functions.get(ident) {
                self.error = Some(CompileError::semantic(
                    format!(
                        "Function `{}` already declared at line {}",
                        ident, previous.line
                    ),
                    *line,
                ));
                return;
            }
            self.table.functions.insert(
                ident.clone(),
                Signature {
                    arity: params.len(),
                    line: *line,
                },
            );
        }

        walk_stmt(self, stmt);
    }
}

/// Verifies every call against the collected [`FunctionTable`]. Only the first error is kept.
struct CallChecker<'t> {
    table: &'t FunctionTable,
    error: Option<CompileError>,
}

impl<'t> CallChecker<'t> {
    fn check_call(&mut self, ident: &str, arg_count: usize, line: usize) {
        if self.error.is_some() {
            return;
        }

        self.error = match self.table.get(ident) {
            None => Some(CompileError::semantic(
                format!("Function `{}` not declared", ident),
                line,
            )),
            Some(signature) if signature.arity != arg_count => Some(CompileError::semantic(
                format!(
                    "Function `{}` expects {} argument(s), received {}",
                    ident, signature.arity, arg_count
                ),
                line,
            )),
            Some(_) => None,
        };
    }
}

impl<'a, 't> Visitor<'a> for CallChecker<'t> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);

        if let Expr::Term(Term::Call { ident, args, line }) = expr {
            self.check_call(ident, args.len(), *line);
        }
    }

    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        walk_stmt(self, stmt);

        if let Stmt::Call { ident, args, line } = stmt {
            self.check_call(ident, args.len(), *line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nob_source::{ErrorKind, Source};

    fn resolve(source: &str) -> CompileResult<FunctionTable> {
        let source = Source::new(source);
        let program = nob_parser::parse(&source)?;
        FunctionTable::resolve(&program)
    }

    #[test]
    fn collects_signatures() {
        let table = resolve(
            r#"
            fn add(a, b) { return a + b; }
            {
                fn nested() { return 1; }
            }
            exit(add(nested(), 2));"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("add").map(|sig| sig.arity), Some(2));
        assert_eq!(table.get("nested").map(|sig| sig.arity), Some(0));
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn call_before_declaration_and_recursion() {
        let table = resolve(
            r#"
            exit(fact(5));
            fn fact(n) {
                if (n <= 1) return 1;
                return n * fact(n - 1);
            }"#,
        )
        .unwrap();
        assert_eq!(table.get("fact").map(|sig| sig.line), Some(3));
    }

    #[test]
    fn duplicate_declaration() {
        let err = resolve("fn f() return 1;\nfn f(a) return a;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "Function `f` already declared at line 1");
    }

    #[test]
    fn undeclared_function() {
        let err = resolve("let x = 1;\nexit(g(x));").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "Function `g` not declared");
    }

    #[test]
    fn wrong_arity() {
        let err = resolve("fn f(a, b) return a;\nf(1);").unwrap_err();
        assert_eq!(err.message, "Function `f` expects 2 argument(s), received 1");

        let err = resolve("fn f(a) return a;\nprint(f(1, 2));").unwrap_err();
        assert_eq!(err.message, "Function `f` expects 1 argument(s), received 2");
    }
}
