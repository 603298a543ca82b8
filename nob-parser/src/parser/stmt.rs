use super::*;

impl Parser {
    /// Parses a statement.
    pub fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        let kind = match self.peek_kind(0) {
            Some(kind) => kind,
            None => return Err(self.unexpected("statement")),
        };

        match kind {
            TokenKind::Exit => self.parse_exit_stmt(),
            TokenKind::Let => self.parse_let_stmt(),
            TokenKind::OpenCurly => self.parse_block_stmt(),
            TokenKind::CloseCurly => Err(CompileError::syntax(
                "Unmatched closing curly brace",
                self.line(),
            )),
            TokenKind::Print => self.parse_print_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::Else => Err(CompileError::syntax(
                "There is an `else` with no `if` attached to it",
                self.line(),
            )),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Fn => self.parse_fn_declaration(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => {
                let line = self.expect(TokenKind::Break)?.line;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Break { line })
            }
            TokenKind::Continue => {
                let line = self.expect(TokenKind::Continue)?.line;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Continue { line })
            }
            TokenKind::Ident | TokenKind::FnName => {
                let stmt = self.parse_assignment()?;
                self.expect(TokenKind::Semi)?;
                Ok(stmt)
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    pub fn parse_block_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::OpenCurly)?;
        if self.at(TokenKind::CloseCurly) {
            return Err(CompileError::syntax("Empty scope", self.line()));
        }

        let mut body = Vec::new();
        while self.eat(TokenKind::CloseCurly).is_none() {
            if self.at_end() {
                return Err(self.unexpected(format!("`{}`", TokenKind::CloseCurly)));
            }
            body.push(self.parse_stmt()?);
        }

        Ok(Stmt::Block(body))
    }

    fn parse_exit_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::Exit)?;
        self.expect(TokenKind::OpenParen)?;
        let expr = if self.at(TokenKind::CloseParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::Exit(expr))
    }

    fn parse_let_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::Let)?;
        let (ident, line) = self.expect_literal(TokenKind::Ident)?;
        self.expect(TokenKind::Eq)?;
        let start = self.index;
        let initializer = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        self.reject_self_reference(&ident, start)?;
        Ok(Stmt::Let {
            ident,
            initializer,
            line,
        })
    }

    /// Fails if `ident` appears in the tokens consumed since `start`, e.g. `let x = x + 1;`.
    fn reject_self_reference(&self, ident: &str, start: usize) -> CompileResult<()> {
        let offending = self.tokens[start..self.index]
            .iter()
            .find(|token| token.kind == TokenKind::Ident && token.literal.as_deref() == Some(ident));

        match offending {
            Some(token) => Err(CompileError::semantic(
                format!("Identifier `{}` has a circular definition", ident),
                token.line,
            )),
            None => Ok(()),
        }
    }

    /// Parses `id = expr`, `id += [expr]`, `id -= [expr]` or a call, without the trailing `;`.
    fn parse_assignment(&mut self) -> CompileResult<Stmt> {
        if self.at(TokenKind::FnName) {
            let (ident, line) = self.expect_literal(TokenKind::FnName)?;
            let args = self.parse_call_args()?;
            return Ok(Stmt::Call { ident, args, line });
        }

        let (ident, line) = self.expect_literal(TokenKind::Ident)?;
        match (self.peek_kind(0), self.peek_kind(1)) {
            (Some(TokenKind::Eq), _) => {
                self.next();
                let value = self.parse_expr()?;
                Ok(Stmt::Assign { ident, value, line })
            }
            (Some(kind @ TokenKind::Plus), Some(TokenKind::Eq))
            | (Some(kind @ TokenKind::Minus), Some(TokenKind::Eq)) => {
                self.next();
                self.next();
                // `x += ;` means `x = x + 1`
                let amount = match self.peek_kind(0) {
                    Some(TokenKind::Semi) | Some(TokenKind::CloseParen) | None => {
                        Expr::Term(Term::IntLit(1))
                    }
                    _ => self.parse_expr()?,
                };
                let op = if kind == TokenKind::Plus {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                let value = Expr::Binary {
                    op,
                    lhs: Box::new(Expr::Term(Term::Identifier {
                        ident: ident.clone(),
                        line,
                    })),
                    rhs: Box::new(amount),
                };
                Ok(Stmt::Assign { ident, value, line })
            }
            _ => Err(self.unexpected(format!("`=` after `{}`", ident))),
        }
    }

    fn parse_print_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::Print)?;
        self.expect(TokenKind::OpenParen)?;

        let mut segments = Vec::new();
        if !self.at(TokenKind::CloseParen) {
            loop {
                let segment = match self.eat(TokenKind::StringLit) {
                    Some(token) => PrintSegment::Str(token.literal.unwrap_or_default()),
                    None => PrintSegment::Expr(self.parse_expr()?),
                };
                segments.push(segment);

                if self.eat(TokenKind::Plus).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen)?;
        self.expect(TokenKind::Semi)?;

        match segments.last_mut() {
            Some(PrintSegment::Str(last)) => last.push('\n'),
            _ => segments.push(PrintSegment::Str("\n".to_string())),
        }
        Ok(Stmt::Print(segments))
    }

    fn parse_if_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::If)?;
        let chain = self.parse_paren_chain()?;
        let then = Box::new(self.parse_stmt()?);
        let otherwise = self.parse_else_arm()?;
        Ok(Stmt::If {
            chain,
            then,
            otherwise,
        })
    }

    fn parse_else_arm(&mut self) -> CompileResult<Option<Box<ElseArm>>> {
        if self.eat(TokenKind::Else).is_none() {
            return Ok(None);
        }

        let arm = if self.eat(TokenKind::If).is_some() {
            let chain = self.parse_paren_chain()?;
            let then = Box::new(self.parse_stmt()?);
            let otherwise = self.parse_else_arm()?;
            ElseArm::ElseIf {
                chain,
                then,
                otherwise,
            }
        } else {
            ElseArm::Else(Box::new(self.parse_stmt()?))
        };
        Ok(Some(Box::new(arm)))
    }

    fn parse_while_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::While)?;
        let chain = self.parse_paren_chain()?;
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While { chain, body })
    }

    fn parse_for_stmt(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::OpenParen)?;

        let init = if self.at(TokenKind::Let) {
            self.parse_let_stmt()?
        } else if self.at(TokenKind::Ident) {
            let stmt = self.parse_assignment()?;
            self.expect(TokenKind::Semi)?;
            stmt
        } else {
            return Err(self.unexpected("`let` or assignment"));
        };

        let chain = self.parse_chain()?;
        self.expect(TokenKind::Semi)?;
        let step = self.parse_assignment()?;
        self.eat(TokenKind::Semi);
        self.expect(TokenKind::CloseParen)?;
        let body = self.parse_stmt()?;

        Ok(Stmt::For {
            init: Box::new(init),
            chain,
            step: Box::new(step),
            body: Box::new(body),
        })
    }

    fn parse_fn_declaration(&mut self) -> CompileResult<Stmt> {
        self.expect(TokenKind::Fn)?;
        let (ident, line) = self.expect_literal(TokenKind::FnName)?;
        self.expect(TokenKind::OpenParen)?;

        let mut params: Vec<String> = Vec::new();
        if self.eat(TokenKind::CloseParen).is_none() {
            loop {
                let (param, param_line) = self.expect_literal(TokenKind::Ident)?;
                if params.contains(&param) {
                    return Err(CompileError::semantic(
                        format!("Parameter `{}` declared twice in `{}`", param, ident),
                        param_line,
                    ));
                }
                params.push(param);

                if self.eat(TokenKind::CloseParen).is_some() {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }

        self.fn_depth += 1;
        let body = self.parse_stmt();
        self.fn_depth -= 1;

        Ok(Stmt::FnDeclaration {
            ident,
            params,
            body: Box::new(body?),
            line,
        })
    }

    fn parse_return_stmt(&mut self) -> CompileResult<Stmt> {
        let line = self.expect(TokenKind::Return)?.line;
        let expr = if self.at(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::Return {
            expr,
            in_function: self.fn_depth > 0,
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use insta::assert_snapshot;
    use nob_source::ErrorKind;

    fn stmt(source: &str) -> String {
        let source = source.into();
        let tokens = tokenize(&source).unwrap();
        let mut parser = Parser::new(tokens);
        let stmt = parser.parse_stmt().unwrap();
        assert!(parser.at_end());
        stmt.to_string()
    }

    fn stmt_err(source: &str) -> CompileError {
        let source = source.into();
        let tokens = tokenize(&source).unwrap();
        Parser::new(tokens).parse_program().unwrap_err()
    }

    #[test]
    fn test_exit() {
        assert_snapshot!(stmt("exit(1 + 2);"), @"(exit (+ 1 2))");
        assert_snapshot!(stmt("exit();"), @"(exit)");
    }

    #[test]
    fn test_let_and_assign() {
        assert_snapshot!(stmt("let x = 1 * 2;"), @"(let x (* 1 2))");
        assert_snapshot!(stmt("x = y;"), @"(= x y)");
        assert_snapshot!(stmt("x += ;"), @"(= x (+ x 1))");
        assert_snapshot!(stmt("x -= ;"), @"(= x (- x 1))");
        assert_snapshot!(stmt("x += 2 * y;"), @"(= x (+ x (* 2 y)))");
    }

    #[test]
    fn test_self_referential_let() {
        let err = stmt_err("let x = x + 1;");
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.message, "Identifier `x` has a circular definition");

        // a later statement may use the name freely
        assert_snapshot!(stmt("{ let x = 1; x = x + 1; }"), @"(block (let x 1) (= x (+ x 1)))");
    }

    #[test]
    fn test_let_missing_semi() {
        let err = stmt_err("let x = 1\nexit(x);");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.line, 2);
        assert_eq!(err.message, "Expected `semi`, found `exit`");
    }

    #[test]
    fn test_block() {
        assert_snapshot!(stmt("{ let a = 1; { exit(a); } }"), @"(block (let a 1) (block (exit a)))");
        assert_eq!(stmt_err("{ }").message, "Empty scope");
        assert_eq!(stmt_err("exit(1); }").message, "Unmatched closing curly brace");
        assert_eq!(
            stmt_err("{ exit(1);").message,
            "Expected `close_curly`, found end of input"
        );
    }

    #[test]
    fn test_print() {
        assert_snapshot!(stmt(r#"print("hello");"#), @r#"(print "hello\n")"#);
        assert_snapshot!(stmt(r#"print("x = " + x + 1 + "!");"#), @r#"(print "x = " (+ x 1) "!\n")"#);
        assert_snapshot!(stmt("print(x * 2);"), @r#"(print (* x 2) "\n")"#);
        assert_snapshot!(stmt("print();"), @r#"(print "\n")"#);
    }

    #[test]
    fn test_if() {
        assert_snapshot!(stmt("if (x) exit(1);"), @"(if [x] (exit 1))");
        assert_snapshot!(
            stmt("if (1 < 2 && 3 > 4) exit(1); else exit(2);"),
            @"(if [(< 1 2) && (> 3 4)] (exit 1) (else (exit 2)))"
        );
        assert_snapshot!(
            stmt("if (x == 1) exit(1); else if (x == 2) exit(2); else exit(3);"),
            @"(if [(== x 1)] (exit 1) (elif [(== x 2)] (exit 2) (else (exit 3))))"
        );
        assert_eq!(
            stmt_err("else exit(1);").message,
            "There is an `else` with no `if` attached to it"
        );
    }

    #[test]
    fn test_loops() {
        assert_snapshot!(
            stmt("while (i < 3) { i = i + 1; }"),
            @"(while [(< i 3)] (block (= i (+ i 1))))"
        );
        assert_snapshot!(
            stmt("for (let i = 0; i < 3; i += ) { print(i); }"),
            @r#"(for (let i 0) [(< i 3)] (= i (+ i 1)) (block (print i "\n")))"#
        );
        assert_snapshot!(
            stmt("for (i = 0; i < 3; i = i + 2;) break;"),
            @"(for (= i 0) [(< i 3)] (= i (+ i 2)) (break))"
        );
        assert_snapshot!(stmt("while (1) continue;"), @"(while [1] (continue))");
    }

    #[test]
    fn test_functions() {
        assert_snapshot!(
            stmt("fn add(a, b) { return a + b; }"),
            @"(fn add (a b) (block (return (+ a b))))"
        );
        assert_snapshot!(stmt("fn nothing() return;"), @"(fn nothing () (return))");
        assert_snapshot!(stmt("log(1, x);"), @"(call log 1 x)");
        assert_snapshot!(stmt("return 1;"), @"(return! 1)"); // outside of a function

        let err = stmt_err("fn f(a, a) return a;");
        assert_eq!(err.message, "Parameter `a` declared twice in `f`");
        let err = stmt_err("fn f (a) return a;");
        assert_eq!(err.message, "Expected `fname`, found `ident`");
    }

    #[test]
    fn test_invalid_statements() {
        assert_eq!(stmt_err("1 + 2;").message, "Expected statement, found `int_lit`");
        assert_eq!(stmt_err("string s;").message, "Expected statement, found `string`");
        assert_eq!(stmt_err("x 1;").message, "Expected `=` after `x`, found `int_lit`");
    }
}
