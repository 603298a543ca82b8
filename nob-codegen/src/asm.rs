//! Assembly text writer.
//!
//! [`Assembly`] owns the emitted text together with the operand stack height, so every `push`/`pop` that
//! reaches the output also updates the height used to address variables.

use std::fmt;

use nob_source::{CompileError, CompileResult};

/// Size of a machine word in bytes.
pub const WORD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Rax,
    Rbx,
    Rdi,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Register::Rax => "rax",
            Register::Rbx => "rbx",
            Register::Rdi => "rdi",
        })
    }
}

/// Jump mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Jmp,
    Je,
    Jne,
    Jl,
    Jle,
    Jg,
    Jge,
    Jz,
    Jnz,
}

impl Jump {
    /// Returns the jump taken exactly when `self` is not.
    /// # Panics
    /// Panics on [`Jump::Jmp`], which has no negation.
    pub fn negate(self) -> Jump {
        match self {
            Jump::Je => Jump::Jne,
            Jump::Jne => Jump::Je,
            Jump::Jl => Jump::Jge,
            Jump::Jge => Jump::Jl,
            Jump::Jg => Jump::Jle,
            Jump::Jle => Jump::Jg,
            Jump::Jz => Jump::Jnz,
            Jump::Jnz => Jump::Jz,
            Jump::Jmp => panic!("unconditional jump has no negation"),
        }
    }
}

impl fmt::Display for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Jump::Jmp => "jmp",
            Jump::Je => "je",
            Jump::Jne => "jne",
            Jump::Jl => "jl",
            Jump::Jle => "jle",
            Jump::Jg => "jg",
            Jump::Jge => "jge",
            Jump::Jz => "jz",
            Jump::Jnz => "jnz",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(String);

impl Label {
    pub fn named(name: impl ToString) -> Self {
        Label(name.to_string())
    }

    /// The entry label of a user defined function.
    pub fn function(ident: &str) -> Self {
        Label(format!("fn_{}", ident))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Emitted assembly plus the operand stack height in words.
pub struct Assembly {
    text: String,
    height: usize,
    label_count: usize,
}

impl Assembly {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            height: 0,
            label_count: 0,
        }
    }

    /// Number of words pushed since the start of the current frame.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Starts a new frame (a function body) at height `0`. Returns the height of the previous frame.
    pub fn begin_frame(&mut self) -> usize {
        std::mem::replace(&mut self.height, 0)
    }

    /// Restores the height saved by [`Assembly::begin_frame`].
    pub fn end_frame(&mut self, height: usize) {
        self.height = height;
    }

    /// Writes an unindented line, such as a directive.
    pub fn directive(&mut self, directive: impl fmt::Display) {
        self.text.push_str(&format!("{}\n", directive));
    }

    /// Writes an instruction.
    pub fn instr(&mut self, instr: impl fmt::Display) {
        self.text.push_str(&format!("    {}\n", instr));
    }

    /// Writes verbatim text. The text must leave the stack balanced.
    pub fn raw(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push(&mut self, operand: impl fmt::Display) {
        self.instr(format_args!("push {}", operand));
        self.height += 1;
    }

    pub fn pop(&mut self, reg: Register) -> CompileResult<()> {
        self.shrink(1)?;
        self.instr(format_args!("pop {}", reg));
        Ok(())
    }

    /// Discards the top `words` words of the stack.
    pub fn release(&mut self, words: usize) -> CompileResult<()> {
        self.shrink(words)?;
        self.unwind(words);
        Ok(())
    }

    fn shrink(&mut self, words: usize) -> CompileResult<()> {
        self.height = self.height.checked_sub(words).ok_or_else(|| {
            CompileError::internal(
                format!(
                    "Operand stack underflow: removing {} word(s) at height {}",
                    words, self.height
                ),
                0,
            )
        })?;
        Ok(())
    }

    /// Moves the stack pointer past `words` words without changing the tracked height.
    /// Used on paths that jump away (`break`, `continue`, `return`), where the code that follows
    /// still runs at the current height.
    pub fn unwind(&mut self, words: usize) {
        if words > 0 {
            self.instr(format_args!("add rsp, {}", words * WORD_SIZE));
        }
    }

    /// Returns a fresh, unique label.
    pub fn new_label(&mut self) -> Label {
        let label = Label(format!("label{}", self.label_count));
        self.label_count += 1;
        label
    }

    pub fn label(&mut self, label: &Label) {
        self.text.push_str(&format!("{}:\n", label));
    }

    pub fn jump(&mut self, jump: Jump, label: &Label) {
        self.instr(format_args!("{} {}", jump, label));
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes `self` and returns the generated text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl Default for Assembly {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_pop_track_height() {
        let mut asm = Assembly::new();
        asm.push(Register::Rax);
        asm.push("QWORD [rsp + 8]");
        assert_eq!(asm.height(), 2);
        asm.pop(Register::Rbx).unwrap();
        assert_eq!(asm.height(), 1);
        asm.release(1).unwrap();
        assert_eq!(asm.height(), 0);
        assert_eq!(
            asm.as_str(),
            "    push rax\n    push QWORD [rsp + 8]\n    pop rbx\n    add rsp, 8\n"
        );
    }

    #[test]
    fn underflow_is_an_error() {
        let mut asm = Assembly::new();
        asm.push(Register::Rax);
        let err = asm.release(2).unwrap_err();
        assert_eq!(err.kind, nob_source::ErrorKind::Internal);
        assert_eq!(asm.height(), 1);
        asm.pop(Register::Rdi).unwrap();
        assert!(asm.pop(Register::Rdi).is_err());
        // nothing is emitted for a rejected pop
        assert_eq!(asm.as_str(), "    push rax\n    pop rdi\n");
    }

    #[test]
    fn unwind_keeps_height() {
        let mut asm = Assembly::new();
        asm.push(Register::Rax);
        asm.push(Register::Rax);
        asm.unwind(2);
        assert_eq!(asm.height(), 2);
        asm.unwind(0);
        assert_eq!(asm.as_str().lines().count(), 3);
    }

    #[test]
    fn frames() {
        let mut asm = Assembly::new();
        asm.push(Register::Rax);
        let outer = asm.begin_frame();
        assert_eq!((outer, asm.height()), (1, 0));
        asm.end_frame(outer);
        assert_eq!(asm.height(), 1);
    }

    #[test]
    fn labels_are_unique() {
        let mut asm = Assembly::new();
        let a = asm.new_label();
        let b = asm.new_label();
        assert_ne!(a, b);
        asm.jump(Jump::Jge, &b);
        asm.label(&b);
        assert_eq!(asm.as_str(), "    jge label1\nlabel1:\n");
        assert_eq!(Label::function("add").to_string(), "fn_add");
    }

    #[test]
    fn negated_jumps() {
        for jump in [Jump::Je, Jump::Jl, Jump::Jg, Jump::Jz].iter() {
            assert_eq!(jump.negate().negate(), *jump);
        }
        assert_eq!(Jump::Jle.negate(), Jump::Jg);
    }
}
