//! ALC command line compiler
//!
//! Reads one rule (argument, `--file`, or stdin) and prints the generated
//! validation procedure. Logging goes to stderr and is controlled by
//! `ALC_LOG` (default `warn`).

use alc::{CompileError, Compiler, GeneratorConfig, JsonSink};
use clap::Parser;
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ALC_LOG";

/// Compile tax register validation rules into procedure text.
#[derive(Parser, Debug)]
#[command(name = "alc", version, about)]
struct Args {
    /// Rule source. Read from stdin when neither this nor --file is given.
    #[arg(conflicts_with = "file")]
    rule: Option<String>,

    /// Read the rule from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Name of the generated procedure
    #[arg(long, default_value = "Validate")]
    procedure_name: String,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Write tokens, syntax tree and rule description to stderr as JSON lines
    #[arg(long)]
    trace: bool,

    /// Print the result or error as a JSON object
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON written by --trace and --json
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_procedure_name(self.procedure_name.as_str())
            .with_indent_width(self.indent)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn read_source(args: &Args) -> io::Result<String> {
    if let Some(rule) = &args.rule {
        return Ok(rule.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path);
    }
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;
    Ok(source)
}

fn compile(args: &Args, source: &str) -> Result<String, CompileError> {
    let compiler = Compiler::with_config(args.generator_config());
    if args.trace {
        let mut sink = JsonSink::new(io::stderr()).pretty(args.pretty);
        compiler.compile_with_trace(source, &mut sink)
    } else {
        compiler.compile(source)
    }
}

fn render_result(result: &Result<String, CompileError>, args: &Args) -> String {
    if !args.json {
        return match result {
            Ok(code) => code.clone(),
            Err(e) => format!("error: {}\n", e),
        };
    }

    let document = match result {
        Ok(code) => json!({ "ok": true, "code": code }),
        Err(e) => json!({ "ok": false, "error": e }),
    };
    if args.pretty {
        format!("{:#}\n", document)
    } else {
        format!("{}\n", document)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let source = match read_source(&args) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "failed to read rule source");
            return ExitCode::from(2);
        }
    };

    let result = compile(&args, &source);
    let output = render_result(&result, &args);
    match (&result, args.json) {
        (Err(_), false) => eprint!("{}", output),
        _ => print!("{}", output),
    }

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
