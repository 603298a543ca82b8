//! x86-64 assembly generation for Linux.

pub mod asm;
pub mod codegen;
pub mod listing;
pub mod strings;
