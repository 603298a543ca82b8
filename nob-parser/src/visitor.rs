//! Visitor pattern for AST nodes.

use crate::ast::{ElseArm, Expr, PrintSegment, Stmt, Term};

pub trait Visitor<'ast>: Sized {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }
}

pub fn walk_expr<'ast>(visitor: &mut impl Visitor<'ast>, expr: &'ast Expr) {
    match expr {
        Expr::Term(term) => match term {
            Term::IntLit(_) => {}
            Term::Identifier { .. } => {}
            Term::Paren(inner) => visitor.visit_expr(inner),
            Term::Call { args, .. } => {
                for arg in args {
                    visitor.visit_expr(arg);
                }
            }
        },
        Expr::Binary { op: _, lhs, rhs } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
    }
}

pub fn walk_stmt<'ast>(visitor: &mut impl Visitor<'ast>, stmt: &'ast Stmt) {
    /// Visit every expression of a condition chain.
    macro_rules! visit_chain {
        ($visitor: expr, $chain: expr) => {
            for check in &$chain.checks {
                Visitor::visit_expr($visitor, &check.lhs);
                if let Some(comparison) = &check.comparison {
                    Visitor::visit_expr($visitor, &comparison.rhs);
                }
            }
        };
    }

    match stmt {
        Stmt::Exit(expr) => {
            if let Some(expr) = expr {
                visitor.visit_expr(expr);
            }
        }
        Stmt::Let { initializer, .. } => visitor.visit_expr(initializer),
        Stmt::Assign { value, .. } => visitor.visit_expr(value),
        Stmt::Block(body) => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        Stmt::Print(segments) => {
            for segment in segments {
                if let PrintSegment::Expr(expr) = segment {
                    visitor.visit_expr(expr);
                }
            }
        }
        Stmt::If {
            chain,
            then,
            otherwise,
        } => {
            visit_chain!(visitor, chain);
            visitor.visit_stmt(then);
            let mut arm = otherwise.as_deref();
            while let Some(current) = arm {
                match current {
                    ElseArm::ElseIf {
                        chain,
                        then,
                        otherwise,
                    } => {
                        visit_chain!(visitor, chain);
                        visitor.visit_stmt(then);
                        arm = otherwise.as_deref();
                    }
                    ElseArm::Else(stmt) => {
                        visitor.visit_stmt(stmt);
                        arm = None;
                    }
                }
            }
        }
        Stmt::While { chain, body } => {
            visit_chain!(visitor, chain);
            visitor.visit_stmt(body);
        }
        Stmt::For {
            init,
            chain,
            step,
            body,
        } => {
            visitor.visit_stmt(init);
            visit_chain!(visitor, chain);
            visitor.visit_stmt(step);
            visitor.visit_stmt(body);
        }
        Stmt::FnDeclaration { body, .. } => visitor.visit_stmt(body),
        Stmt::Return { expr, .. } => {
            if let Some(expr) = expr {
                visitor.visit_expr(expr);
            }
        }
        Stmt::Call { args, .. } => {
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
    }
}
