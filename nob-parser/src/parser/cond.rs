use super::*;

impl Parser {
    /// Parses a chain of checks joined by `&&` and `||`.
    /// The result is a flat list: both connectors have the same precedence.
    pub fn parse_chain(&mut self) -> CompileResult<Chain> {
        let mut checks = vec![self.parse_check(Connector::And)?];

        loop {
            let connector = if self.eat(TokenKind::And).is_some() {
                Connector::And
            } else if self.eat(TokenKind::Or).is_some() {
                Connector::Or
            } else {
                break;
            };
            checks.push(self.parse_check(connector)?);
        }

        Ok(Chain { checks })
    }

    /// Parses a chain wrapped in parentheses, as found after `if` and `while`.
    pub(super) fn parse_paren_chain(&mut self) -> CompileResult<Chain> {
        self.expect(TokenKind::OpenParen)?;
        let chain = self.parse_chain()?;
        self.expect(TokenKind::CloseParen)?;
        Ok(chain)
    }

    fn parse_check(&mut self, connector: Connector) -> CompileResult<Check> {
        let lhs = self.parse_expr()?;
        let comparison = match self.parse_comparator()? {
            Some(comparator) => Some(Comparison {
                comparator,
                rhs: self.parse_expr()?,
            }),
            None => None, // truthiness check
        };

        Ok(Check {
            lhs,
            comparison,
            connector,
        })
    }

    /// Parses one or two adjacent relational tokens.
    fn parse_comparator(&mut self) -> CompileResult<Option<Comparator>> {
        let first = match self.peek_kind(0) {
            Some(kind @ TokenKind::Eq) | Some(kind @ TokenKind::Gt) | Some(kind @ TokenKind::Lt) => {
                kind
            }
            _ => return Ok(None),
        };
        let line = self.line();
        self.next();
        let followed_by_eq = self.eat(TokenKind::Eq).is_some();

        let comparator = match (first, followed_by_eq) {
            (TokenKind::Eq, true) => Comparator::Eq,
            (TokenKind::Gt, true) => Comparator::Ge,
            (TokenKind::Lt, true) => Comparator::Le,
            (TokenKind::Gt, false) => Comparator::Gt,
            (TokenKind::Lt, false) => Comparator::Lt,
            _ => {
                return Err(CompileError::syntax(
                    "Expected `==` in condition, found a single `=`",
                    line,
                ))
            }
        };
        Ok(Some(comparator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use insta::assert_snapshot;

    fn chain(source: &str) -> String {
        let source = source.into();
        let tokens = tokenize(&source).unwrap();
        let mut parser = Parser::new(tokens);
        let chain = parser.parse_chain().unwrap();
        assert!(parser.at_end());
        chain.to_string()
    }

    #[test]
    fn test_comparators() {
        assert_snapshot!(chain("a == 1"), @"(== a 1)");
        assert_snapshot!(chain("a >= 1"), @"(>= a 1)");
        assert_snapshot!(chain("a <= 1"), @"(<= a 1)");
        assert_snapshot!(chain("a < 1 + 2"), @"(< a (+ 1 2))");
        assert_snapshot!(chain("a * 2 > 1"), @"(> (* a 2) 1)");
    }

    #[test]
    fn test_truthiness() {
        assert_snapshot!(chain("x"), @"x");
        assert_snapshot!(chain("x - 1"), @"(- x 1)");
    }

    #[test]
    fn test_left_to_right_fold() {
        assert_snapshot!(chain("1 < 2 && 3 > 4"), @"(< 1 2) && (> 3 4)");
        assert_snapshot!(chain("a || b && c == 1"), @"a || b && (== c 1)");

        let source = "a || b && c".into();
        let tokens = tokenize(&source).unwrap();
        let chain = Parser::new(tokens).parse_chain().unwrap();
        let connectors: Vec<_> = chain.checks.iter().map(|check| check.connector).collect();
        assert_eq!(
            connectors,
            vec![Connector::And, Connector::Or, Connector::And]
        );
    }

    #[test]
    fn test_single_eq_is_rejected() {
        let source = "a = 1".into();
        let tokens = tokenize(&source).unwrap();
        let err = Parser::new(tokens).parse_chain().unwrap_err();
        assert_eq!(err.message, "Expected `==` in condition, found a single `=`");
    }
}
