//! Source code representation and error management.

use std::{cell::RefCell, error, fmt};

/// Represents source code.
pub struct Source<'a> {
    /// Original source code.
    pub content: &'a str,
    /// Accumulated diagnostics.
    pub errors: ErrorReporter,
}

impl<'a> Source<'a> {
    /// Create a new `Source` with the specified `content`.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            errors: ErrorReporter::new(),
        }
    }

    /// Returns `true` if `Source` has no accumulated errors. Returns `false` otherwise.
    /// Warnings are not counted.
    pub fn has_no_errors(&self) -> bool {
        !self.errors.has_errors()
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(content: &'a str) -> Self {
        Source::new(content)
    }
}

/// The stage of the pipeline that rejected the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input text (e.g. an unterminated block comment).
    Lexical,
    /// Unexpected or missing token.
    Syntax,
    /// Well-formed program that breaks a scoping or declaration rule.
    Semantic,
    /// The generator met a tree shape it cannot lower.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// A fatal compile time error. The first one raised aborts the compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based source line.
    pub line: usize,
}

impl CompileError {
    /// Create a new error with the specified `kind`, `message` and `line`.
    pub fn new(kind: ErrorKind, message: impl ToString, line: usize) -> Self {
        Self {
            kind,
            message: message.to_string(),
            line,
        }
    }

    pub fn lexical(message: impl ToString, line: usize) -> Self {
        Self::new(ErrorKind::Lexical, message, line)
    }

    pub fn syntax(message: impl ToString, line: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, line)
    }

    pub fn semantic(message: impl ToString, line: usize) -> Self {
        Self::new(ErrorKind::Semantic, message, line)
    }

    pub fn internal(message: impl ToString, line: usize) -> Self {
        Self::new(ErrorKind::Internal, message, line)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}: {}", self.kind, self.line, self.message)
    }
}

impl error::Error for CompileError {}

/// Result type shared by every stage of the pipeline.
pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single reported message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: usize,
}

/// Manages all the diagnostics.
pub struct ErrorReporter {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl ErrorReporter {
    /// Create an empty `ErrorReporter`.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Adds a non-fatal diagnostic.
    pub fn add_warning(&self, message: impl ToString, line: usize) {
        self.add(Diagnostic {
            severity: Severity::Warning,
            message: message.to_string(),
            line,
        });
    }

    /// Records a fatal error.
    pub fn add_error(&self, error: &CompileError) {
        self.add(Diagnostic {
            severity: Severity::Error,
            message: format!("{}: {}", error.kind, error.message),
            line: error.line,
        });
    }

    /// This method uses the interior mutability pattern. This does not require mutability for ergonomics.
    fn add(&self, diagnostic: Diagnostic) {
        // This should be the only place where self.diagnostics is borrowed mutably.
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Returns a copy of every diagnostic reported so far, in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let diagnostics = self.diagnostics.borrow();
        for diagnostic in diagnostics.iter() {
            let tag = match diagnostic.severity {
                Severity::Warning => "WARNING",
                Severity::Error => "ERROR",
            };
            writeln!(
                f,
                "{tag}: {message} at line {line}",
                tag = tag,
                message = diagnostic.message,
                line = diagnostic.line
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_not_errors() {
        let source = Source::new("let x = 1;");
        source.errors.add_warning("Unknown character `$`", 1);
        assert!(source.has_no_errors());
        assert!(!source.errors.is_empty());

        source
            .errors
            .add_error(&CompileError::syntax("Expected `semi`", 2));
        assert!(!source.has_no_errors());
    }

    #[test]
    fn reporter_display() {
        let reporter = ErrorReporter::new();
        reporter.add_warning("Unknown character `@`", 3);
        reporter.add_error(&CompileError::semantic("Identifier `x` not declared", 4));
        assert_eq!(
            reporter.to_string(),
            "WARNING: Unknown character `@` at line 3\n\
             ERROR: semantic error: Identifier `x` not declared at line 4\n"
        );
    }

    #[test]
    fn compile_error_display() {
        let error = CompileError::syntax("Expected `close_paren`", 7);
        assert_eq!(
            error.to_string(),
            "syntax error at line 7: Expected `close_paren`"
        );
    }
}
