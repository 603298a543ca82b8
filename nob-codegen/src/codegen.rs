//! Lowers the AST into x86-64 assembly (NASM syntax) for Linux.
//!
//! Every expression leaves exactly one word on the stack. Variables live in stack slots and are addressed
//! relative to `rsp`, using the operand stack height tracked by [`Assembly`] at the point of access.

use std::mem;

use nob_parser::ast::{BinaryOp, ElseArm, Expr, PrintSegment, Program, Stmt, Term};
use nob_passes::functions::FunctionTable;
use nob_source::{CompileError, CompileResult};

use crate::asm::{Assembly, Jump, Label, Register, WORD_SIZE};
use crate::strings::{immediate, pack_words};

mod chain;

const SYS_WRITE: u32 = 1;
const SYS_EXIT: u32 = 60;
const STDOUT: u32 = 1;

/// Writes the signed integer in `rax` to stdout in decimal.
const PRINT_INT_ROUTINE: &str = "\
print_int:
    sub rsp, 32
    lea rsi, [rsp + 32]
    mov rcx, 10
    xor r8, r8
    test rax, rax
    jns .digits
    neg rax
    mov r8, 1
.digits:
    xor rdx, rdx
    div rcx
    add dl, '0'
    dec rsi
    mov [rsi], dl
    test rax, rax
    jnz .digits
    test r8, r8
    jz .write
    dec rsi
    mov byte [rsi], '-'
.write:
    mov rax, 1
    mov rdi, 1
    lea rdx, [rsp + 32]
    sub rdx, rsi
    syscall
    add rsp, 32
    ret
";

/// A variable that is currently in scope.
#[derive(Debug, Clone, PartialEq)]
struct Var {
    ident: String,
    /// Stack slot. Parameters have negative slots, below the return address.
    slot: i64,
}

/// Recorded when a scope is entered.
#[derive(Debug, Clone, Copy)]
struct ScopeMark {
    vars: usize,
    height: usize,
}

#[derive(Debug, Clone)]
struct LoopLabels {
    break_label: Label,
    continue_label: Label,
    /// Operand stack height when the loop body is entered.
    height: usize,
}

/// Generation state of the main program or of one function body.
#[derive(Debug, Default)]
struct Frame {
    vars: Vec<Var>,
    scopes: Vec<ScopeMark>,
    loops: Vec<LoopLabels>,
    in_function: bool,
}

/// Generate assembly from an abstract syntax tree.
pub struct Codegen<'a> {
    asm: Assembly,
    functions: &'a FunctionTable,
    frame: Frame,
    /// Declarations are emitted after the main program, in the order they were met.
    pending_functions: Vec<&'a Stmt>,
    uses_print_int: bool,
}

impl<'a> Codegen<'a> {
    pub fn new(functions: &'a FunctionTable) -> Self {
        Self {
            asm: Assembly::new(),
            functions,
            frame: Frame::default(),
            pending_functions: Vec::new(),
            uses_print_int: false,
        }
    }

    /// Consumes `self` and returns the assembly for `program`.
    pub fn generate(mut self, program: &'a Program) -> CompileResult<String> {
        self.asm.directive("global _start");
        self.asm.directive("section .text");
        self.asm.label(&Label::named("_start"));

        for stmt in &program.stmts {
            self.gen_stmt(stmt)?;
        }
        if !matches!(program.stmts.last(), Some(Stmt::Exit(_))) {
            self.gen_exit(None)?;
        }

        // function bodies may declare more functions
        let mut next = 0;
        while next < self.pending_functions.len() {
            let func = self.pending_functions[next];
            self.gen_function(func)?;
            next += 1;
        }

        if self.uses_print_int {
            self.asm.raw(PRINT_INT_ROUTINE);
        }

        Ok(self.asm.into_string())
    }

    /* Scopes */

    fn begin_scope(&mut self) {
        self.frame.scopes.push(ScopeMark {
            vars: self.frame.vars.len(),
            height: self.asm.height(),
        });
    }

    /// Discards every variable declared since the matching [`Self::begin_scope`].
    fn end_scope(&mut self) -> CompileResult<()> {
        let mark = self
            .frame
            .scopes
            .pop()
            .ok_or_else(|| CompileError::internal("Scope stack underflow", 0))?;

        let count = self.frame.vars.len() - mark.vars;
        self.frame.vars.truncate(mark.vars);
        self.asm.release(count)?;

        if self.asm.height() != mark.height {
            return Err(CompileError::internal(
                format!(
                    "Operand stack height {} does not match {} at scope exit",
                    self.asm.height(),
                    mark.height
                ),
                0,
            ));
        }
        Ok(())
    }

    /// Generates `stmt` in its own scope, so that a declaration in a branch or loop body cannot outlive it.
    fn gen_scoped(&mut self, stmt: &'a Stmt) -> CompileResult<()> {
        self.begin_scope();
        self.gen_stmt(stmt)?;
        self.end_scope()
    }

    fn lookup(&self, ident: &str) -> Option<&Var> {
        self.frame.vars.iter().rev().find(|var| var.ident == ident)
    }

    /// Returns the `rsp` relative address of `ident` at the current stack height.
    fn address_of(&self, ident: &str, line: usize) -> CompileResult<String> {
        match self.lookup(ident) {
            Some(var) => {
                let words = self.asm.height() as i64 - var.slot - 1;
                Ok(format!("QWORD [rsp + {}]", words * WORD_SIZE as i64))
            }
            None => Err(CompileError::semantic(
                format!("Identifier `{}` not declared", ident),
                line,
            )),
        }
    }

    /* Statements */

    fn gen_stmt(&mut self, stmt: &'a Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Exit(expr) => self.gen_exit(expr.as_ref()),
            Stmt::Let {
                ident,
                initializer,
                line,
            } => {
                let scope_start = self.frame.scopes.last().map_or(0, |mark| mark.vars);
                if self.frame.vars[scope_start..]
                    .iter()
                    .any(|var| var.ident == *ident)
                {
                    return Err(CompileError::semantic(
                        format!("Identifier `{}` already declared", ident),
                        *line,
                    ));
                }

                self.gen_expr(initializer)?; // the value stays on the stack as the variable's slot
                self.frame.vars.push(Var {
                    ident: ident.clone(),
                    slot: self.asm.height() as i64 - 1,
                });
                Ok(())
            }
            Stmt::Assign { ident, value, line } => {
                // fail before emitting anything for an undeclared target
                self.address_of(ident, *line)?;
                self.gen_expr(value)?;
                self.asm.pop(Register::Rax)?;
                let address = self.address_of(ident, *line)?;
                self.asm.instr(format_args!("mov {}, rax", address));
                Ok(())
            }
            Stmt::Block(body) => {
                self.begin_scope();
                for stmt in body {
                    self.gen_stmt(stmt)?;
                }
                self.end_scope()
            }
            Stmt::Print(segments) => {
                for segment in segments {
                    match segment {
                        PrintSegment::Str(string) => self.gen_write_str(string)?,
                        PrintSegment::Expr(expr) => {
                            self.gen_expr(expr)?;
                            self.asm.pop(Register::Rax)?;
                            self.asm.instr("call print_int");
                            self.uses_print_int = true;
                        }
                    }
                }
                Ok(())
            }
            Stmt::If {
                chain,
                then,
                otherwise,
            } => {
                let skip = self.asm.new_label();
                self.gen_chain(chain, &skip, false)?;
                self.gen_scoped(then)?;
                match otherwise {
                    Some(arm) => {
                        let end = self.asm.new_label();
                        self.asm.jump(Jump::Jmp, &end);
                        self.asm.label(&skip);
                        self.gen_else_arm(arm, &end)?;
                        self.asm.label(&end);
                    }
                    None => self.asm.label(&skip),
                }
                Ok(())
            }
            Stmt::While { chain, body } => {
                let exit = self.asm.new_label();
                let head = self.asm.new_label();
                let next = self.asm.new_label();

                self.gen_chain(chain, &exit, false)?;
                self.asm.label(&head);
                self.gen_loop_body(body, &exit, &next)?;
                self.asm.label(&next);
                self.gen_chain(chain, &head, true)?;
                self.asm.label(&exit);
                Ok(())
            }
            Stmt::For {
                init,
                chain,
                step,
                body,
            } => {
                // the loop variable lives until the loop exits
                self.begin_scope();
                self.gen_stmt(init)?;

                let exit = self.asm.new_label();
                let head = self.asm.new_label();
                let next = self.asm.new_label();

                self.gen_chain(chain, &exit, false)?;
                self.asm.label(&head);
                self.gen_loop_body(body, &exit, &next)?;
                self.asm.label(&next);
                self.gen_scoped(step)?;
                self.gen_chain(chain, &head, true)?;
                self.asm.label(&exit);

                self.end_scope()
            }
            Stmt::FnDeclaration { ident, line, .. } => {
                if self.lookup(ident).is_some() {
                    return Err(CompileError::semantic(
                        format!(
                            "Function `{}` collides with a variable of the same name",
                            ident
                        ),
                        *line,
                    ));
                }
                self.pending_functions.push(stmt);
                Ok(())
            }
            Stmt::Return {
                expr,
                in_function,
                line,
            } => {
                if !*in_function || !self.frame.in_function {
                    return Err(CompileError::semantic(
                        "`return` outside of a function",
                        *line,
                    ));
                }

                match expr {
                    Some(expr) => {
                        self.gen_expr(expr)?;
                        self.asm.pop(Register::Rax)?;
                    }
                    None => self.asm.instr("mov rax, 0"),
                }
                self.asm.unwind(self.asm.height());
                self.asm.instr("ret");
                Ok(())
            }
            Stmt::Call { ident, args, line } => self.gen_call(ident, args, *line),
            Stmt::Break { line } => {
                let target = self.innermost_loop("break", *line)?;
                self.asm.unwind(self.asm.height() - target.height);
                self.asm.jump(Jump::Jmp, &target.break_label);
                Ok(())
            }
            Stmt::Continue { line } => {
                let target = self.innermost_loop("continue", *line)?;
                self.asm.unwind(self.asm.height() - target.height);
                self.asm.jump(Jump::Jmp, &target.continue_label);
                Ok(())
            }
        }
    }

    fn gen_else_arm(&mut self, arm: &'a ElseArm, end: &Label) -> CompileResult<()> {
        match arm {
            ElseArm::ElseIf {
                chain,
                then,
                otherwise,
            } => {
                let skip = self.asm.new_label();
                self.gen_chain(chain, &skip, false)?;
                self.gen_scoped(then)?;
                match otherwise {
                    Some(arm) => {
                        self.asm.jump(Jump::Jmp, end);
                        self.asm.label(&skip);
                        self.gen_else_arm(arm, end)
                    }
                    None => {
                        self.asm.label(&skip);
                        Ok(())
                    }
                }
            }
            ElseArm::Else(stmt) => self.gen_scoped(stmt),
        }
    }

    fn gen_loop_body(
        &mut self,
        body: &'a Stmt,
        break_label: &Label,
        continue_label: &Label,
    ) -> CompileResult<()> {
        self.frame.loops.push(LoopLabels {
            break_label: break_label.clone(),
            continue_label: continue_label.clone(),
            height: self.asm.height(),
        });
        let result = self.gen_scoped(body);
        self.frame.loops.pop();
        result
    }

    fn innermost_loop(&self, keyword: &str, line: usize) -> CompileResult<LoopLabels> {
        self.frame.loops.last().cloned().ok_or_else(|| {
            CompileError::semantic(format!("`{}` outside of a loop", keyword), line)
        })
    }

    fn gen_exit(&mut self, expr: Option<&'a Expr>) -> CompileResult<()> {
        match expr {
            Some(expr) => {
                self.gen_expr(expr)?;
                self.asm.pop(Register::Rdi)?;
                self.asm.instr(format_args!("mov rax, {}", SYS_EXIT));
            }
            None => {
                self.asm.instr(format_args!("mov rax, {}", SYS_EXIT));
                self.asm.instr("mov rdi, 0");
            }
        }
        self.asm.instr("syscall");
        Ok(())
    }

    /// Writes `string` to stdout with a single `write` system call.
    fn gen_write_str(&mut self, string: &str) -> CompileResult<()> {
        let bytes = string.as_bytes();
        if bytes.is_empty() {
            return Ok(());
        }

        let words = pack_words(bytes);
        for word in words.iter().rev() {
            self.asm
                .instr(format_args!("mov rax, {}", immediate(*word)));
            self.asm.push(Register::Rax);
        }
        self.asm.instr(format_args!("mov rax, {}", SYS_WRITE));
        self.asm.instr(format_args!("mov rdi, {}", STDOUT));
        self.asm.instr("mov rsi, rsp");
        self.asm.instr(format_args!("mov rdx, {}", bytes.len()));
        self.asm.instr("syscall");
        self.asm.release(words.len())
    }

    /* Functions */

    /// Pushes the arguments left to right, calls `ident` and discards the arguments. The result is in `rax`.
    fn gen_call(&mut self, ident: &str, args: &'a [Expr], line: usize) -> CompileResult<()> {
        // calls are checked by the function pass, so a mismatch here means the table is stale
        if self.functions.get(ident).map(|signature| signature.arity) != Some(args.len()) {
            return Err(CompileError::internal(
                format!("Call to `{}` does not match the function table", ident),
                line,
            ));
        }

        for arg in args {
            self.gen_expr(arg)?;
        }
        self.asm
            .instr(format_args!("call {}", Label::function(ident)));
        self.asm.release(args.len())?;
        Ok(())
    }

    fn gen_function(&mut self, func: &'a Stmt) -> CompileResult<()> {
        let (ident, params, body) = match func {
            Stmt::FnDeclaration {
                ident,
                params,
                body,
                ..
            } => (ident, params, body),
            _ => {
                return Err(CompileError::internal(
                    "Buffered statement is not a function declaration",
                    0,
                ))
            }
        };

        let outer_frame = mem::replace(
            &mut self.frame,
            Frame {
                in_function: true,
                ..Frame::default()
            },
        );
        let outer_height = self.asm.begin_frame();

        // [rsp] is the return address, the last argument is right above it
        let arity = params.len() as i64;
        for (i, param) in params.iter().enumerate() {
            self.frame.vars.push(Var {
                ident: param.clone(),
                slot: i as i64 - arity - 1,
            });
        }

        self.asm.label(&Label::function(ident));
        self.gen_scoped(body)?;
        // falling off the end returns 0
        self.asm.instr("mov rax, 0");
        self.asm.instr("ret");

        self.asm.end_frame(outer_height);
        self.frame = outer_frame;
        Ok(())
    }

    /* Expressions */

    /// Leaves the value of `expr` on top of the stack.
    fn gen_expr(&mut self, expr: &'a Expr) -> CompileResult<()> {
        match expr {
            Expr::Term(term) => self.gen_term(term),
            Expr::Binary { op, lhs, rhs } => {
                self.gen_expr(rhs)?;
                self.gen_expr(lhs)?;
                self.asm.pop(Register::Rax)?;
                self.asm.pop(Register::Rbx)?;
                match op {
                    BinaryOp::Add => self.asm.instr("add rax, rbx"),
                    BinaryOp::Sub => self.asm.instr("sub rax, rbx"),
                    BinaryOp::Mul => self.asm.instr("imul rax, rbx"),
                    BinaryOp::Div => {
                        self.asm.instr("cqo");
                        self.asm.instr("idiv rbx");
                    }
                }
                self.asm.push(Register::Rax);
                Ok(())
            }
        }
    }

    fn gen_term(&mut self, term: &'a Term) -> CompileResult<()> {
        match term {
            Term::IntLit(val) => {
                self.asm.instr(format_args!("mov rax, {}", val));
                self.asm.push(Register::Rax);
            }
            Term::Identifier { ident, line } => {
                let address = self.address_of(ident, *line)?;
                self.asm.instr(format_args!("mov rax, {}", address));
                self.asm.push(Register::Rax);
            }
            Term::Paren(expr) => self.gen_expr(expr)?,
            Term::Call { ident, args, line } => {
                self.gen_call(ident, args, *line)?;
                self.asm.push(Register::Rax);
            }
        }
        Ok(())
    }
}
