//! Command-line driver: pack text files into an archive, list it, unpack it.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use mizip::{Algorithm, Archive, Result};

#[derive(Parser, Debug)]
#[clap(name = "mizip", version, about = "Huffman / LZ77 / LZ78 text archiver")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[clap(short, long, global = true, parse(from_occurrences))]
    verbose: u64,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress text files into a new archive
    Compress {
        /// Algorithm: huffman, lz77 or lz78
        #[clap(short, long, default_value = "huffman")]
        algorithm: Algorithm,
        /// Archive to create
        #[clap(short, long, default_value = "archive.myzip")]
        output: PathBuf,
        /// Text files to add
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Decompress every entry of an archive
    Extract {
        archive: PathBuf,
        /// Output directory, defaults to the archive's directory
        #[clap(short = 'd', long)]
        out_dir: Option<PathBuf>,
    },
    /// Show the entries of an archive
    List { archive: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        eprintln!("mizip: logger already initialised");
    }

    let result = match cli.command {
        Command::Compress {
            algorithm,
            output,
            files,
        } => compress(algorithm, &output, &files),
        Command::Extract { archive, out_dir } => extract(&archive, out_dir.as_deref()),
        Command::List { archive } => list(&archive),
    };

    match result {
        Ok(true) => {}
        Ok(false) => exit(2),
        Err(e) => {
            error!("{}", e);
            eprintln!("mizip: {}", e);
            exit(1);
        }
    }
}

fn compress(algorithm: Algorithm, output: &Path, files: &[PathBuf]) -> Result<bool> {
    let mut archive = Archive::new(algorithm);
    for path in files {
        let text = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let entry = archive.compress_entry(name, &text)?;
        info!(
            "{}: {} -> {} bytes",
            entry.name(),
            entry.original_size(),
            entry.data().len()
        );
    }
    archive.save(output)?;
    info!(
        "wrote {} ({} entries, {})",
        output.display(),
        archive.len(),
        algorithm
    );
    Ok(true)
}

fn extract(path: &Path, out_dir: Option<&Path>) -> Result<bool> {
    let archive = Archive::load(path)?;
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let mut all_ok = true;
    for extracted in archive.extract() {
        match extracted.text {
            Ok(text) => {
                let target = dir.join(extracted.entry.extracted_file_name());
                fs::write(&target, text)?;
                info!("{} -> {}", extracted.entry.name(), target.display());
            }
            Err(e) => {
                error!("{}: {}", extracted.entry.name(), e);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn list(path: &Path) -> Result<bool> {
    let archive = Archive::load(path)?;
    println!(
        "{} (algorithm {}, id {}, {} entries)",
        path.display(),
        archive.algorithm(),
        archive.algorithm().id(),
        archive.len()
    );
    for entry in archive.entries() {
        let ratio = entry
            .compression_ratio()
            .map_or_else(|| "-".to_string(), |r| format!("{:.2}:1", r));
        println!(
            "{:>12} {:>12} {:>8}  {}",
            entry.original_size(),
            entry.data().len(),
            ratio,
            entry.name()
        );
    }
    Ok(true)
}
