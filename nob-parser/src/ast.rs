//! Abstract syntax tree. Every node is owned by its parent and never mutated after parsing.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Term(Term),
    /// A binary expression (e.g. `1+1`).
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    IntLit(i64),
    /// An identifier (e.g. `foo`).
    Identifier { ident: String, line: usize },
    Paren(Box<Expr>),
    /// A function call (e.g. `add(1, 2)`).
    Call {
        ident: String,
        args: Vec<Expr>,
        line: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `==`
    Eq,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

/// How a [`Check`] combines with the check before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// The right hand side of a two-sided [`Check`].
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub comparator: Comparator,
    pub rhs: Expr,
}

/// One comparison, or a truthiness test when `comparison` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub lhs: Expr,
    pub comparison: Option<Comparison>,
    /// Ignored for the first check of a [`Chain`].
    pub connector: Connector,
}

/// A non-empty list of checks folded left to right. `&&` and `||` have equal precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub checks: Vec<Check>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrintSegment {
    Str(String),
    Expr(Expr),
}

/// The `else` part of an `if` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ElseArm {
    ElseIf {
        chain: Chain,
        then: Box<Stmt>,
        otherwise: Option<Box<ElseArm>>,
    },
    Else(Box<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Exit(Option<Expr>),
    Let {
        ident: String,
        initializer: Expr,
        line: usize,
    },
    Assign {
        ident: String,
        value: Expr,
        line: usize,
    },
    Block(Vec<Stmt>),
    Print(Vec<PrintSegment>),
    If {
        chain: Chain,
        then: Box<Stmt>,
        otherwise: Option<Box<ElseArm>>,
    },
    While {
        chain: Chain,
        body: Box<Stmt>,
    },
    For {
        init: Box<Stmt>,
        chain: Chain,
        step: Box<Stmt>,
        body: Box<Stmt>,
    },
    FnDeclaration {
        ident: String,
        params: Vec<String>,
        body: Box<Stmt>,
        line: usize,
    },
    Return {
        expr: Option<Expr>,
        in_function: bool,
        line: usize,
    },
    /// A function call whose result is discarded.
    Call {
        ident: String,
        args: Vec<Expr>,
        line: usize,
    },
    Break { line: usize },
    Continue { line: usize },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/* S-expression rendering, used by tests and debug output */

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for item in items {
        write!(f, " {}", item)?;
    }
    Ok(())
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(term) => write!(f, "{}", term),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", op, lhs, rhs),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::IntLit(val) => write!(f, "{}", val),
            Term::Identifier { ident, .. } => write!(f, "{}", ident),
            Term::Paren(expr) => write!(f, "{}", expr),
            Term::Call { ident, args, .. } => {
                write!(f, "(call {}", ident)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparator::Eq => "==",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
        })
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comparison {
            Some(Comparison { comparator, rhs }) => {
                write!(f, "({} {} {})", comparator, self.lhs, rhs)
            }
            None => write!(f, "{}", self.lhs),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, check) in self.checks.iter().enumerate() {
            if i > 0 {
                match check.connector {
                    Connector::And => write!(f, " && ")?,
                    Connector::Or => write!(f, " || ")?,
                }
            }
            write!(f, "{}", check)?;
        }
        Ok(())
    }
}

impl fmt::Display for PrintSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintSegment::Str(string) => write!(f, "{:?}", string),
            PrintSegment::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for ElseArm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElseArm::ElseIf {
                chain,
                then,
                otherwise,
            } => {
                write!(f, "(elif [{}] {}", chain, then)?;
                if let Some(otherwise) = otherwise {
                    write!(f, " {}", otherwise)?;
                }
                write!(f, ")")
            }
            ElseArm::Else(stmt) => write!(f, "(else {})", stmt),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Exit(Some(expr)) => write!(f, "(exit {})", expr),
            Stmt::Exit(None) => write!(f, "(exit)"),
            Stmt::Let {
                ident, initializer, ..
            } => write!(f, "(let {} {})", ident, initializer),
            Stmt::Assign { ident, value, .. } => write!(f, "(= {} {})", ident, value),
            Stmt::Block(body) => {
                write!(f, "(block")?;
                write_list(f, body)?;
                write!(f, ")")
            }
            Stmt::Print(segments) => {
                write!(f, "(print")?;
                write_list(f, segments)?;
                write!(f, ")")
            }
            Stmt::If {
                chain,
                then,
                otherwise,
            } => {
                write!(f, "(if [{}] {}", chain, then)?;
                if let Some(otherwise) = otherwise {
                    write!(f, " {}", otherwise)?;
                }
                write!(f, ")")
            }
            Stmt::While { chain, body } => write!(f, "(while [{}] {})", chain, body),
            Stmt::For {
                init,
                chain,
                step,
                body,
            } => write!(f, "(for {} [{}] {} {})", init, chain, step, body),
            Stmt::FnDeclaration {
                ident,
                params,
                body,
                ..
            } => write!(f, "(fn {} ({}) {})", ident, params.join(" "), body),
            Stmt::Return {
                expr, in_function, ..
            } => {
                let keyword = if *in_function { "return" } else { "return!" };
                match expr {
                    Some(expr) => write!(f, "({} {})", keyword, expr),
                    None => write!(f, "({})", keyword),
                }
            }
            Stmt::Call { ident, args, .. } => {
                write!(f, "(call {}", ident)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Stmt::Break { .. } => write!(f, "(break)"),
            Stmt::Continue { .. } => write!(f, "(continue)"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stmt) in self.stmts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
