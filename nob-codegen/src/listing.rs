//! Human readable listing of generated assembly, printed by `nob --dump`.

use console::style;
use std::fmt;

/// Numbered, highlighted view over generated assembly text.
pub struct Listing<'a> {
    name: &'a str,
    text: &'a str,
}

impl<'a> Listing<'a> {
    pub fn new(name: &'a str, text: &'a str) -> Self {
        Self { name, text }
    }

    fn line(&self, f: &mut fmt::Formatter<'_>, number: usize, line: &str) -> fmt::Result {
        write!(f, "{:04} ", style(number).black().bright())?;

        let trimmed = line.trim_start();
        if trimmed.len() == line.len() {
            // labels and directives start at column 0
            return if trimmed.ends_with(':') {
                writeln!(f, "{}", style(trimmed).bold())
            } else {
                writeln!(f, "{}", style(trimmed).color256(29)) // dark green
            };
        }

        match trimmed.split_once(' ') {
            Some((mnemonic, operands)) => {
                writeln!(f, "    {:<8}{}", style(mnemonic).cyan(), operands)
            }
            None => writeln!(f, "    {}", style(trimmed).cyan()),
        }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.name)?;

        for (i, line) in self.text.lines().enumerate() {
            self.line(f, i + 1, line)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing() {
        console::set_colors_enabled(false);

        let text = "global _start\n_start:\n    mov rax, 60\n    syscall\n";
        let listing = Listing::new("exit.nob", text).to_string();
        assert_eq!(
            listing.lines().collect::<Vec<_>>(),
            [
                "== exit.nob ==",
                "0001 global _start",
                "0002 _start:",
                "0003     mov     rax, 60",
                "0004     syscall",
            ]
        );
    }
}
