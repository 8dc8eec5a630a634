use anyhow::{Context, Result};
use clap::Parser;
use dmc_backend::Target;
use dmc_driver::{compile, DriverOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dmc", version, about = "Dormouse compiler")]
struct Args {
    /// Entry .dor source file
    input: PathBuf,

    /// Target architecture (x86_64 or aarch64)
    #[arg(short, long, default_value = "x86_64")]
    arch: Target,

    /// Name of the linked executable (defaults to the input stem)
    #[arg(short, long)]
    output: Option<String>,

    /// Root directory for generated assembly and executables
    #[arg(long, default_value = "out", value_name = "DIR")]
    out_dir: PathBuf,

    /// Directory holding the dor.* standard library
    #[arg(long, default_value = "builtin", value_name = "DIR")]
    stdlib: PathBuf,

    /// Stop after writing the concatenated assembly
    #[arg(short = 'S', long)]
    no_link: bool,

    /// Print each parsed file as JSON
    #[arg(long)]
    emit_ast: bool,

    /// Program used to assemble and link
    #[arg(long, default_value = "gcc")]
    linker: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Trace every lowering step
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn log_level(&self) -> &'static str {
        if self.debug {
            "trace"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    fn into_options(self) -> DriverOptions {
        DriverOptions {
            input: self.input,
            target: self.arch,
            output: self.output,
            out_dir: self.out_dir,
            stdlib_dir: self.stdlib,
            no_link: self.no_link,
            emit_ast: self.emit_ast,
            linker: self.linker,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level())).init();

    let options = args.into_options();
    let outcome = compile(&options).with_context(|| format!("failed to compile {}", options.input.display()))?;

    match &outcome.binary {
        Some(binary) => println!("Executable written to: {}", binary.display()),
        None => println!("Assembly written to: {}", outcome.concatenated.display()),
    }
    Ok(())
}
