use std::fs::File;
use std::io;

use clap::Parser;
use color_print::ceprintln;
use log::info;

use mcc::{printer, CancelToken, Error, Format, Source};

#[derive(Debug, clap::Parser)]
#[clap(author, version, about = "Microcode compiler: source text to control words")]
struct Args {
    /// Input microcode source file
    input: Vec<String>,

    /// Output file (standard output if omitted)
    #[clap(short, long)]
    output: Option<String>,

    /// Output encoding
    #[clap(short, long, value_enum, default_value_t = Format::Hex)]
    format: Format,

    /// Dump a listing of the compiled control words to stderr
    #[clap(short, long)]
    dump: bool,

    /// Enable verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.input.is_empty() {
        println!("file name required");
        return;
    }
    if args.input.len() > 1 {
        println!("only one file name can be provided");
        return;
    }
    let path = &args.input[0];

    info!("reading {path}");
    let source = match Source::open(path) {
        Ok(source) => source,
        Err(err) => fail_with(&err),
    };

    let cancel = CancelToken::new();
    let program = match mcc::compile_with_cancel(&source, &cancel) {
        Ok(program) => program,
        Err(err) => {
            err.diag(&source);
            std::process::exit(1);
        }
    };
    info!(
        "compiled {} instruction(s) into {}-bit control words",
        program.len(),
        program.width
    );

    if args.dump {
        eprint!("{}", printer::listing(&program, &source));
    }

    let written = match &args.output {
        Some(out) => {
            info!("writing {out}");
            File::create(out)
                .map_err(Error::SinkWrite)
                .and_then(|mut file| {
                    printer::write_program(&program, &mut file, args.format, &cancel)
                })
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            printer::write_program(&program, &mut lock, args.format, &cancel)
        }
    };
    if let Err(err) = written {
        fail_with(&err);
    }
}

/// Print an error (and its cause, if any) without source context.
fn fail_with(err: &Error) -> ! {
    ceprintln!("<red,bold>error</>: {}", err);
    if let Some(cause) = std::error::Error::source(err) {
        ceprintln!("     <blue>caused by</>: {}", cause);
    }
    std::process::exit(1);
}
