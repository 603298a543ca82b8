use logos::Logos;
use nob_source::{CompileError, CompileResult, Source};
use std::fmt;

#[derive(Debug, Logos, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // keywords
    #[token("exit")]
    Exit,
    #[token("print")]
    Print,
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("fn")]
    Fn,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    /// Reserved.
    #[token("string")]
    String,

    // literals
    #[regex("[0-9]+")]
    IntLit,
    #[regex(r#""[^"]*""#)]
    StringLit,

    // identifiers
    /// A plain identifier. Rewritten to [`TokenKind::FnName`] by [`tokenize`] when directly followed by `(`.
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
    FnName,

    // punctuation
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenCurly,
    #[token("}")]
    CloseCurly,

    // operators
    #[token("=")]
    Eq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    FSlash,
    #[token("&&")]
    And,
    #[token("||")]
    Or,

    /// Start of a block comment. The body is skipped by [`tokenize`].
    #[token("/*")]
    BlockComment,

    // misc
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)] // single line comments
    #[error]
    Error,
}

impl TokenKind {
    /// Returns the binary precedence or `None` if invalid binop token.
    /// Multiplicative operators bind tighter than additive ones.
    pub fn bin_prec(self) -> Option<u8> {
        match self {
            TokenKind::Plus | TokenKind::Minus => Some(0),
            TokenKind::Star | TokenKind::FSlash => Some(1),
            _ => None,
        }
    }

    /// The stable name of the token kind, as used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Exit => "exit",
            TokenKind::Print => "print",
            TokenKind::Let => "let",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Fn => "fn",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::String => "string",
            TokenKind::IntLit => "int_lit",
            TokenKind::StringLit => "string_lit",
            TokenKind::Ident => "ident",
            TokenKind::FnName => "fname",
            TokenKind::Semi => "semi",
            TokenKind::Comma => "comma",
            TokenKind::Dot => "dot",
            TokenKind::OpenParen => "open_paren",
            TokenKind::CloseParen => "close_paren",
            TokenKind::OpenCurly => "open_curly",
            TokenKind::CloseCurly => "close_curly",
            TokenKind::Eq => "eq",
            TokenKind::Gt => "gt",
            TokenKind::Lt => "lt",
            TokenKind::Plus => "plus",
            TokenKind::Minus => "minus",
            TokenKind::Star => "star",
            TokenKind::FSlash => "fslash",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::BlockComment => "block_comment",
            TokenKind::Error => "error",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lexed token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Text payload for literals and identifiers. String literals are stored without quotes.
    pub literal: Option<String>,
    /// 1-based source line.
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: Option<String>, line: usize) -> Self {
        Self {
            kind,
            literal,
            line,
        }
    }
}

/// Converts byte offsets into 1-based line numbers. Queries must be made with non-decreasing offsets.
struct LineCounter<'a> {
    content: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        debug_assert!(offset >= self.offset);
        self.line += self.content[self.offset..offset].matches('\n').count();
        self.offset = offset;
        self.line
    }
}

/// Splits `source` into tokens.
///
/// Unknown characters are skipped and reported as warnings on `source.errors`.
/// The only fatal lexical error is an unterminated block comment.
pub fn tokenize(source: &Source) -> CompileResult<Vec<Token>> {
    let mut lexer = TokenKind::lexer(source.content);
    let mut lines = LineCounter::new(source.content);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        let line = lines.line_at(span.start);

        match kind {
            TokenKind::BlockComment => match lexer.remainder().find("*/") {
                Some(end) => lexer.bump(end + 2),
                None => {
                    return Err(CompileError::lexical(
                        "Unterminated comment (add */ at the end)",
                        line,
                    ))
                }
            },
            TokenKind::Error => {
                source
                    .errors
                    .add_warning(format!("Unknown character `{}`", lexer.slice()), line);
            }
            TokenKind::IntLit => {
                tokens.push(Token::new(kind, Some(lexer.slice().to_string()), line));
            }
            TokenKind::StringLit => {
                let slice = lexer.slice();
                let literal = slice[1..slice.len() - 1].to_string();
                // the line of a string literal is the line of its closing quote
                let line = lines.line_at(span.end - 1);
                tokens.push(Token::new(kind, Some(literal), line));
            }
            TokenKind::Ident => {
                let kind = if lexer.remainder().starts_with('(') {
                    TokenKind::FnName
                } else {
                    TokenKind::Ident
                };
                tokens.push(Token::new(kind, Some(lexer.slice().to_string()), line));
            }
            _ => tokens.push(Token::new(kind, None, line)),
        }
    }

    Ok(tokens)
}
