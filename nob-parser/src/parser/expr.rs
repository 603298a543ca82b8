use super::*;

impl Parser {
    /* Expressions */
    /// Parses any expression.
    /// This is equivalent to calling [`Self::parse_expr_prec`] with `min_prec = 0`.
    pub fn parse_expr(&mut self) -> CompileResult<Expr> {
        self.parse_expr_prec(0) // 0 to accept any expression
    }

    /// Parses an expression with the specified `min_prec` (precedence climbing).
    fn parse_expr_prec(&mut self, min_prec: u8) -> CompileResult<Expr> {
        let mut lhs = Expr::Term(self.parse_term()?);

        loop {
            let kind = match self.peek_kind(0) {
                Some(kind) => kind,
                None => break,
            };
            let prec = match kind.bin_prec() {
                Some(prec) => prec,
                None => break, // not a valid binop, stop parsing
            };
            if prec < min_prec {
                break; // less than the min_prec, stop parsing
            }
            // `+ "text"` continues a print argument list, not this expression
            if self.peek_kind(1) == Some(TokenKind::StringLit) {
                break;
            }

            self.next();
            let rhs = self.parse_expr_prec(prec + 1)?;

            lhs = Expr::Binary {
                op: binary_op(kind),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    /// Parses a term.
    fn parse_term(&mut self) -> CompileResult<Term> {
        // NOTE: prefix `-` is handled here
        match self.peek_kind(0) {
            Some(TokenKind::IntLit) => self.parse_int_lit(),
            Some(TokenKind::Ident) => {
                let (ident, line) = self.expect_literal(TokenKind::Ident)?;
                Ok(Term::Identifier { ident, line })
            }
            Some(TokenKind::FnName) => {
                let (ident, line) = self.expect_literal(TokenKind::FnName)?;
                let args = self.parse_call_args()?;
                Ok(Term::Call { ident, args, line })
            }
            Some(TokenKind::OpenParen) => {
                self.next();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::CloseParen)?;
                Ok(Term::Paren(Box::new(expr)))
            }
            Some(TokenKind::Minus) => {
                self.next();
                let term = self.parse_term()?;
                // -x is desugared into x * (-1)
                Ok(Term::Paren(Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(Expr::Term(term)),
                    rhs: Box::new(Expr::Term(Term::IntLit(-1))),
                })))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_int_lit(&mut self) -> CompileResult<Term> {
        let (literal, line) = self.expect_literal(TokenKind::IntLit)?;
        match literal.parse::<i64>() {
            Ok(val) => Ok(Term::IntLit(val)),
            Err(_) => Err(CompileError::syntax(
                format!("Integer literal `{}` is out of range", literal),
                line,
            )),
        }
    }

    /// Parses a parenthesized, comma separated argument list.
    pub(super) fn parse_call_args(&mut self) -> CompileResult<Vec<Expr>> {
        self.expect(TokenKind::OpenParen)?;

        let mut args = Vec::new();
        if self.eat(TokenKind::CloseParen).is_none() {
            loop {
                args.push(self.parse_expr()?);

                if self.eat(TokenKind::CloseParen).is_some() {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }

        Ok(args)
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::FSlash => BinaryOp::Div,
        _ => unreachable!("not a binary operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use insta::assert_snapshot;

    fn expr(source: &str) -> String {
        let source = source.into();
        let tokens = tokenize(&source).unwrap();
        let mut parser = Parser::new(tokens);
        let ast = parser.parse_expr().unwrap();
        assert!(parser.at_end());
        ast.to_string()
    }

    fn expr_err(source: &str) -> CompileError {
        let source = source.into();
        let tokens = tokenize(&source).unwrap();
        Parser::new(tokens).parse_expr().unwrap_err()
    }

    #[test]
    fn test_literal() {
        assert_snapshot!(expr("1"), @"1");
        assert_snapshot!(expr("9223372036854775807"), @"9223372036854775807");
    }

    #[test]
    fn test_binary_expr() {
        assert_snapshot!(expr("1 + 2 * 3"), @"(+ 1 (* 2 3))");
        assert_snapshot!(expr("(1 + 2) * 3"), @"(* (+ 1 2) 3)");
        assert_snapshot!(expr("2 * 2 * 2"), @"(* (* 2 2) 2)"); // left associative
        assert_snapshot!(expr("8 - 4 - 2"), @"(- (- 8 4) 2)");
        assert_snapshot!(expr("1 - 6 / 3 + 2"), @"(+ (- 1 (/ 6 3)) 2)");
    }

    #[test]
    fn test_unary_minus() {
        assert_snapshot!(expr("-x"), @"(* x -1)");
        assert_snapshot!(expr("-2 + 3"), @"(+ (* 2 -1) 3)");
        assert_snapshot!(expr("4 * -(1 + 1)"), @"(* 4 (* (+ 1 1) -1))");
    }

    #[test]
    fn test_fn_call() {
        assert_snapshot!(expr("foo()"), @"(call foo)");
        assert_snapshot!(expr("foo(1, bar)"), @"(call foo 1 bar)");
        assert_snapshot!(expr("foo(1, bar, baz(2 * 3))"), @"(call foo 1 bar (call baz (* 2 3)))");
    }

    #[test]
    fn test_errors() {
        assert_eq!(expr_err("1 +").message, "Expected expression, found end of input");
        assert_eq!(expr_err("(1 + 2").message, "Expected `close_paren`, found end of input");
        assert_eq!(expr_err("foo(1 2)").message, "Expected `comma`, found `int_lit`");
        assert_eq!(
            expr_err("99999999999999999999").message,
            "Integer literal `99999999999999999999` is out of range"
        );
    }
}
