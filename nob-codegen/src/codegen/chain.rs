//! Short-circuit evaluation of condition chains.
//!
//! `&&` and `||` have the same precedence and fold left to right: `a || b && c` is `(a || b) && c`. The
//! checks between two `||` form a segment. When a check fails, control moves to the next segment. When a
//! whole segment passes, control skips the check that opens the next segment and resumes right after it.

use nob_parser::ast::{Chain, Check, Comparator, Connector};
use nob_source::{CompileError, CompileResult};

use super::Codegen;
use crate::asm::{Jump, Label, Register};

/// Jump taken when `comparator` does not hold for `cmp lhs, rhs`.
fn jump_if_false(comparator: Comparator) -> Jump {
    match comparator {
        Comparator::Eq => Jump::Jne,
        Comparator::Ge => Jump::Jl,
        Comparator::Le => Jump::Jg,
        Comparator::Lt => Jump::Jge,
        Comparator::Gt => Jump::Jle,
    }
}

impl<'a> Codegen<'a> {
    /// Evaluates `chain`. With `when_true` unset, jumps to `target` when the chain is false and falls through
    /// otherwise. With `when_true` set, jumps to `target` when the chain is true and falls through otherwise.
    pub(super) fn gen_chain(
        &mut self,
        chain: &'a Chain,
        target: &Label,
        when_true: bool,
    ) -> CompileResult<()> {
        let checks = &chain.checks;
        if checks.is_empty() {
            return Err(CompileError::internal("Empty condition chain", 0));
        }
        let last = checks.len() - 1;

        let final_false = if when_true {
            self.asm.new_label()
        } else {
            target.clone()
        };
        let segments = 1 + checks[1..]
            .iter()
            .filter(|check| check.connector == Connector::Or)
            .count();

        let mut segment = 0;
        let mut false_label = self.segment_false_label(segment, segments, &final_false);

        for (i, check) in checks.iter().enumerate() {
            let jumps_to_target = when_true && i == last;

            if i > 0 && check.connector == Connector::Or {
                // the previous segment passed
                let resume = if jumps_to_target {
                    self.asm.jump(Jump::Jmp, target);
                    None
                } else {
                    let resume = self.asm.new_label();
                    self.asm.jump(Jump::Jmp, &resume);
                    Some(resume)
                };

                self.asm.label(&false_label);
                segment += 1;
                false_label = self.segment_false_label(segment, segments, &final_false);

                if jumps_to_target {
                    self.gen_check(check, true, target)?;
                } else {
                    self.gen_check(check, false, &false_label)?;
                }
                if let Some(resume) = resume {
                    self.asm.label(&resume);
                }
            } else if jumps_to_target {
                self.gen_check(check, true, target)?;
            } else {
                self.gen_check(check, false, &false_label)?;
            }
        }

        if when_true {
            self.asm.label(&final_false);
        }
        Ok(())
    }

    /// Where a failing check of `segment` jumps to.
    fn segment_false_label(&mut self, segment: usize, segments: usize, final_false: &Label) -> Label {
        if segment + 1 == segments {
            final_false.clone()
        } else {
            self.asm.new_label()
        }
    }

    /// Evaluates a single check and jumps to `label` when its outcome is `jump_on`.
    fn gen_check(&mut self, check: &'a Check, jump_on: bool, label: &Label) -> CompileResult<()> {
        self.gen_expr(&check.lhs)?;

        let jump = match &check.comparison {
            Some(comparison) => {
                self.gen_expr(&comparison.rhs)?;
                self.asm.pop(Register::Rbx)?;
                self.asm.pop(Register::Rax)?;
                self.asm.instr("cmp rax, rbx");
                jump_if_false(comparison.comparator)
            }
            None => {
                self.asm.pop(Register::Rax)?;
                self.asm.instr("test rax, rax");
                Jump::Jz
            }
        };

        let jump = if jump_on { jump.negate() } else { jump };
        self.asm.jump(jump, label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::Codegen;
    use nob_passes::functions::FunctionTable;
    use nob_source::Source;

    /// Conditional jumps and labels emitted for `chain`, with the comparisons left out.
    fn jumps(chain: &str, when_true: bool) -> Vec<String> {
        let text = format!("if {} exit(0);", chain);
        let source = Source::new(&text);
        let program = nob_parser::parse(&source).unwrap();
        let chain = match &program.stmts[0] {
            nob_parser::ast::Stmt::If { chain, .. } => chain,
            _ => unreachable!(),
        };
        let functions = FunctionTable::default();
        let mut codegen = Codegen::new(&functions);
        let target = codegen.asm.new_label();
        codegen.gen_chain(chain, &target, when_true).unwrap();
        assert_eq!(codegen.asm.height(), 0);

        codegen
            .asm
            .as_str()
            .lines()
            .filter(|line| line.starts_with("    j") || line.ends_with(':'))
            .map(|line| line.trim().to_string())
            .collect()
    }

    #[test]
    fn single_check() {
        assert_eq!(jumps("(1)", false), ["jz label0"]);
        assert_eq!(jumps("(1 >= 2)", false), ["jl label0"]);
        assert_eq!(jumps("(1 >= 2)", true), ["jge label0", "label1:"]);
    }

    #[test]
    fn and_chain() {
        assert_eq!(jumps("(1 == 2 && 3 < 4)", false), ["jne label0", "jge label0"]);
        assert_eq!(
            jumps("(1 == 2 && 3 < 4)", true),
            ["jne label1", "jl label0", "label1:"]
        );
    }

    #[test]
    fn or_chain() {
        assert_eq!(
            jumps("(1 > 2 || 5 == 5)", false),
            ["jle label1", "jmp label2", "label1:", "jne label0", "label2:"]
        );
        assert_eq!(
            jumps("(1 > 2 || 5 == 5)", true),
            ["jle label2", "jmp label0", "label2:", "je label0", "label1:"]
        );
    }

    #[test]
    fn folds_left_to_right() {
        // (1 || 0) && 0: a passing first check skips to the last one
        assert_eq!(
            jumps("(1 || 0 && 0)", false),
            ["jz label1", "jmp label2", "label1:", "jz label0", "label2:", "jz label0"]
        );
    }
}
