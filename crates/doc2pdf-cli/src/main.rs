mod interactive;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use doc2pdf::config::{ConvertOptions, EnginePreference, FileKind, PdfInputPolicy};
use doc2pdf::office::{self, OfficeEngine};
use doc2pdf::session::formats_report;
use doc2pdf::{Outcome, Session};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "doc2pdf",
    version,
    about = "Convert Word-family documents and images to PDF"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one file to PDF
    Convert {
        /// Document or image to convert
        input: PathBuf,

        /// Directory to write <name>.pdf into (default: the input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },
    /// List the supported input formats and the engine documents would use
    Formats {
        /// Office engine to look for: auto, word, wps, libreoffice
        #[arg(long, default_value = "auto", value_parser = EnginePreference::parse)]
        engine: EnginePreference,
    },
    /// Show which office engines are installed
    Engines,
    /// Pick files and convert them one at a time
    Interactive {
        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct OptionArgs {
    /// Office engine for documents: auto, word, wps, libreoffice
    #[arg(long, default_value = "auto", value_parser = EnginePreference::parse)]
    engine: EnginePreference,

    /// Image resolution in DPI, used to size image pages
    #[arg(long, default_value_t = 100.0)]
    resolution: f32,

    /// JPEG quality for image pages (1-100, 100 stores pixels losslessly)
    #[arg(long, default_value_t = 95)]
    quality: u8,

    /// What to do with PDF input: pass-through or reject
    #[arg(long = "pdf-input", default_value = "pass-through", value_parser = PdfInputPolicy::parse)]
    pdf_input: PdfInputPolicy,
}

impl From<OptionArgs> for ConvertOptions {
    fn from(args: OptionArgs) -> Self {
        ConvertOptions {
            resolution: args.resolution,
            jpeg_quality: args.quality,
            engine: args.engine,
            pdf_input: args.pdf_input,
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Convert {
            input,
            output_dir,
            options,
        } => convert(&input, output_dir, options.into()),
        Command::Formats { engine } => {
            print!("{}", formats_text(office::detect(engine).as_deref()));
            Ok(())
        }
        Command::Engines => {
            list_engines();
            Ok(())
        }
        Command::Interactive { options } => interactive::run(Session::new(options.into())),
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

fn convert(input: &Path, output_dir: Option<PathBuf>, options: ConvertOptions) -> Result<()> {
    options.validate()?;
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => default_output_dir(input),
    };
    debug!(output_dir = %output_dir.display(), "resolved output directory");

    // Images never need an engine, so skip detecting one.
    let mut session = match FileKind::of_path(input) {
        FileKind::Image => Session::with_engine(None, options),
        FileKind::Document => Session::new(options),
    };
    session
        .select_file(input)
        .with_context(|| format!("selecting {}", input.display()))?;
    session.select_output_dir(&output_dir)?;

    let result = session.convert();
    let outcome = Outcome::from_result(&result);
    let done = result.with_context(|| format!("converting {}", input.display()))?;

    for warning in &done.warnings {
        eprintln!("Warning: {warning}");
    }
    println!("{}", outcome.message);
    println!("Converted: {} -> {}", input.display(), done.output.display());
    Ok(())
}

/// The input's own directory, or `.` for a bare file name.
pub(crate) fn default_output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn formats_text(engine: Option<&dyn OfficeEngine>) -> String {
    formats_report(engine.map(|e| e.kind()))
}

fn list_engines() {
    let mut found = false;
    for engine in office::candidates(EnginePreference::Auto) {
        let available = engine.is_available();
        found |= available;
        println!(
            "{:<16} {}",
            engine.kind().name(),
            if available { "available" } else { "not found" }
        );
    }
    if !found {
        println!("No office engine found; only images can be converted.");
    }
}
