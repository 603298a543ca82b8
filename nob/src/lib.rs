//! Compiles nob programs to x86-64 Linux assembly (NASM syntax).

use nob_codegen::codegen::Codegen;
use nob_codegen::listing::Listing;
use nob_passes::functions::FunctionTable;
use nob_source::{CompileResult, Source};

/// Options for [`compile`].
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Write a listing of the generated assembly to stderr.
    pub dump_listing: bool,
}

/// Runs the whole pipeline over `source` and returns the assembly text.
///
/// A failure is also recorded in `source.errors`, next to any warning raised on the way.
pub fn compile(source: &Source, options: &CompileOptions) -> CompileResult<String> {
    let result = run_pipeline(source);

    match &result {
        Ok(asm) if options.dump_listing => eprintln!("{}", Listing::new("<program>", asm)),
        Ok(_) => {}
        Err(err) => source.errors.add_error(err),
    }
    result
}

fn run_pipeline(source: &Source) -> CompileResult<String> {
    let program = nob_parser::parse(source)?;
    let functions = FunctionTable::resolve(&program)?;
    Codegen::new(&functions).generate(&program)
}
