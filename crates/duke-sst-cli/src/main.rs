//! Duke SST CLI - shared strings inspection tool

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use duke_sst::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "duke-sst")]
#[command(author, version, about = "Inspect and extract XLSX shared strings tables")]
struct Cli {
    #[command(flatten)]
    table: TableArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options for the table the package is loaded into
#[derive(Args)]
struct TableArgs {
    /// Keep formatting runs (slower)
    #[arg(long, global = true)]
    full: bool,

    /// Storage backend: embedded or file-backed
    #[arg(long, global = true, default_value = "embedded", value_parser = parse_backend)]
    backend: Backend,

    /// Number of decoded entries kept in memory
    #[arg(long, global = true, default_value_t = 100)]
    cache: usize,

    /// Encrypt scratch files
    #[arg(long, global = true)]
    encrypt: bool,
}

impl TableArgs {
    fn options(&self) -> TableOptions {
        TableOptions {
            backend: self.backend,
            cache_capacity: self.cache,
            full_format: self.full,
            encrypt_temp_files: self.encrypt,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show entry counts of the shared strings table
    Info {
        /// Input XLSX file
        input: PathBuf,
    },

    /// Print entries as index<TAB>text
    Dump {
        /// Input XLSX file
        input: PathBuf,

        /// Stop after this many entries
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Write the shared strings part as XML to stdout or a file
    Extract {
        /// Input XLSX file
        input: PathBuf,

        /// Output XML file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let options = cli.table.options();

    match cli.command {
        Commands::Info { input } => show_info(&input, options),
        Commands::Dump { input, limit } => dump(&input, options, limit),
        Commands::Extract { input, output } => extract(&input, options, output.as_deref()),
    }
}

fn open(input: &Path, options: TableOptions) -> Result<SharedStringsTable> {
    log::debug!(
        "Opening '{}' with the {} backend",
        input.display(),
        options.backend
    );
    SharedStringsTable::open_package(input, options)
        .with_context(|| format!("Failed to read shared strings from '{}'", input.display()))
}

fn show_info(input: &Path, options: TableOptions) -> Result<()> {
    let mut table = open(input, options)?;

    println!("File: {}", input.display());
    println!("Count: {}", table.count());
    println!("Unique count: {}", table.unique_count());

    table.close().context("Failed to clean up scratch files")?;
    Ok(())
}

fn dump(input: &Path, options: TableOptions, limit: Option<u32>) -> Result<()> {
    let mut table = open(input, options)?;
    let end = limit.map_or(table.unique_count(), |l| l.min(table.unique_count()));

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for index in 0..end {
        let entry = table
            .get_at(index)
            .with_context(|| format!("Failed to read entry {}", index))?;
        writeln!(out, "{}\t{}", index, display_text(&entry.string()))
            .context("Failed to write to stdout")?;
    }
    out.flush().context("Failed to write to stdout")?;

    table.close().context("Failed to clean up scratch files")?;
    Ok(())
}

fn extract(input: &Path, options: TableOptions, output: Option<&Path>) -> Result<()> {
    let mut table = open(input, options)?;

    if let Some(output_path) = output {
        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create '{}'", output_path.display()))?;
        table
            .write_to(&mut file)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} shared strings to '{}'",
            table.unique_count(),
            output_path.display()
        );
    } else {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        table
            .write_to(&mut lock)
            .context("Failed to write to stdout")?;
        writeln!(lock).context("Failed to write to stdout")?;
    }

    table.close().context("Failed to clean up scratch files")?;
    Ok(())
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse().map_err(|e: SstError| e.to_string())
}

/// Keep one entry per line
fn display_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
