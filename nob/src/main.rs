use console::style;
use nob::{compile, CompileOptions};
use nob_source::{Severity, Source};
use std::{env, fs, process};

const USAGE: &str = "Usage: nob <input.nob> [-o <output.asm>] [--dump]";

struct Args {
    input: String,
    output: String,
    options: CompileOptions,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut input = None;
    let mut output = None;
    let mut options = CompileOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" => match args.next() {
                Some(path) => output = Some(path),
                None => return Err("missing path after `-o`".to_string()),
            },
            "--dump" => options.dump_listing = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option `{}`", flag)),
            _ if input.is_some() => return Err(format!("unexpected argument `{}`", arg)),
            _ => input = Some(arg),
        }
    }

    Ok(Args {
        input: input.ok_or_else(|| "missing input file".to_string())?,
        output: output.unwrap_or_else(|| "out.asm".to_string()),
        options,
    })
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("error:").red().bold(), message);
    process::exit(1);
}

fn main() {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            process::exit(1);
        }
    };

    let content = match fs::read_to_string(&args.input) {
        Ok(content) => content,
        Err(err) => fail(format!("could not read `{}`: {}", args.input, err)),
    };

    let source = Source::new(&content);
    let result = compile(&source, &args.options);

    for diagnostic in source.errors.diagnostics() {
        let tag = match diagnostic.severity {
            Severity::Warning => style("WARNING:").yellow().bold(),
            Severity::Error => style("ERROR:").red().bold(),
        };
        eprintln!(
            "{} {} at {}:{}",
            tag, diagnostic.message, args.input, diagnostic.line
        );
    }

    match result {
        Ok(asm) => {
            if let Err(err) = fs::write(&args.output, asm) {
                fail(format!("could not write `{}`: {}", args.output, err));
            }
        }
        Err(_) => process::exit(1),
    }
}
