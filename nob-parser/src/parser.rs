use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use nob_source::{CompileError, CompileResult};

mod cond;
mod expr;
mod stmt;

/// Recursive descent parser. Stops at the first error.
pub struct Parser {
    tokens: Vec<Token>,
    /// Index of the current token.
    index: usize,
    /// Number of enclosing function bodies.
    fn_depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            fn_depth: 0,
        }
    }
}

impl Parser {
    pub fn parse_program(&mut self) -> CompileResult<Program> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }
}

/// Parse utilities
impl Parser {
    fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.peek(offset).map(|token| token.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind(0) == Some(kind)
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Eats the current token if it is of the specified `kind`.
    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            self.next()
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(format!("`{}`", kind))),
        }
    }

    /// Expects an identifier-like token and returns its text and line.
    fn expect_literal(&mut self, kind: TokenKind) -> CompileResult<(String, usize)> {
        let token = self.expect(kind)?;
        let line = token.line;
        match token.literal {
            Some(literal) => Ok((literal, line)),
            None => Err(CompileError::internal(
                format!("`{}` token without text", kind),
                line,
            )),
        }
    }

    /// Line of the current token, or of the last token at end of input.
    fn line(&self) -> usize {
        self.peek(0)
            .or_else(|| self.tokens.last())
            .map(|token| token.line)
            .unwrap_or(1)
    }

    /// Creates an unexpected token error.
    fn unexpected(&self, expected: impl AsRef<str>) -> CompileError {
        match self.peek(0) {
            Some(token) => CompileError::syntax(
                format!("Expected {}, found `{}`", expected.as_ref(), token.kind),
                token.line,
            ),
            None => CompileError::syntax(
                format!("Expected {}, found end of input", expected.as_ref()),
                self.line(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use insta::assert_snapshot;
    use nob_source::ErrorKind;

    fn program(source: &str) -> CompileResult<Program> {
        let source = source.into();
        let tokens = tokenize(&source)?;
        Parser::new(tokens).parse_program()
    }

    #[test]
    fn test_program() {
        let ast = program("let x = 1;\nexit(x);").unwrap();
        assert_eq!(ast.stmts.len(), 2);
        assert_snapshot!(ast.stmts[0].to_string(), @"(let x 1)");
        assert_snapshot!(ast.stmts[1].to_string(), @"(exit x)");
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(program("").unwrap(), Program::default());
        assert_eq!(program("// nothing here").unwrap(), Program::default());
    }

    #[test]
    fn test_error_line() {
        let err = program("let x = 1;\nlet y = 2\nexit(y);").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.line, 3);
        assert_eq!(err.message, "Expected `semi`, found `exit`");
    }

    #[test]
    fn test_error_at_end_of_input() {
        let err = program("exit(1)").unwrap_err();
        assert_eq!(err.message, "Expected `semi`, found end of input");
        assert_eq!(err.line, 1);
    }
}
