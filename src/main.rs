use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use kpimport::{ImportConfig, Importer, Result};
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "kpimport",
    version,
    about = "Convert CSV rows from stdin into KeePass XML entries on stdout"
)]
struct Cli {
    /// Comma-separated list of columns; pass it empty to use the CSV header row
    #[arg(long, value_name = "LIST", num_args = 0..=1, default_missing_value = "")]
    columns: Option<String>,

    /// KeePass XML file to append to
    #[arg(long, value_name = "PATH")]
    append: Option<PathBuf>,

    /// Group to append entries to [default: Imported]
    #[arg(long, value_name = "NAME")]
    group: Option<String>,

    /// Column to determine each entry's sub-group from
    #[arg(long = "entry-group", value_name = "COLUMN")]
    entry_group: Option<String>,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ImportConfig::from_flags(
        cli.columns.as_deref(),
        cli.append,
        cli.group.as_deref(),
        cli.entry_group.as_deref(),
    )?;

    let mut importer = Importer::new(config)?;
    importer.import_csv(io::stdin().lock())?;

    let mut out = io::stdout().lock();
    importer.write_to(&mut out)?;
    out.flush()?;
    Ok(())
}

/// Diagnostics go to stderr; stdout carries only the XML document.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match verbose {
        0 => "kpimport=info",
        1 => "kpimport=debug",
        _ => "kpimport=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
