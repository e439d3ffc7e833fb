// fmultidigest — compute every supported digest of each FILE in one pass
//
// Prints a JSON object of algorithm name -> hex digest plus "size".
// With several FILEs the objects are nested under each file name.

use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;

use clap::Parser;

use multidigest_rs::common::{io_error_msg, reset_sigpipe};
use multidigest_rs::multidigest::{self, MultiDigest, MultiDigestError, Snapshot};

const TOOL_NAME: &str = "fmultidigest";

#[derive(Parser)]
#[command(
    name = "fmultidigest",
    version,
    about = "Compute Adler-32, CRC-32, MD5, RIPEMD-160, SHA-1, SHA-2 and SHA3 digests in one pass"
)]
struct Cli {
    /// Print JSON on a single line
    #[arg(long = "compact")]
    compact: bool,

    /// Fail any input longer than N bytes
    #[arg(long = "max-bytes", value_name = "N")]
    max_bytes: Option<u64>,

    /// Files to process ("-" reads standard input)
    files: Vec<String>,
}

fn error_msg(e: &MultiDigestError) -> String {
    match e {
        MultiDigestError::Io(e) => io_error_msg(e),
        MultiDigestError::Absorb(fault) => fault.to_string(),
    }
}

fn digest_one(filename: &str, max_bytes: Option<u64>) -> multidigest::Result<Snapshot> {
    let mut multi = match max_bytes {
        Some(limit) => MultiDigest::with_limit(limit),
        None => MultiDigest::new(),
    };
    if filename == "-" {
        multidigest::digest_reader_with(&mut multi, io::stdin().lock())?;
    } else {
        multidigest::digest_file_with(&mut multi, Path::new(filename))?;
    }
    Ok(multi.finalize())
}

fn render<T: serde::Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let files = if cli.files.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.files.clone()
    };

    let mut had_error = false;
    let mut results: BTreeMap<&str, Snapshot> = BTreeMap::new();
    for filename in &files {
        // A repeated name would re-read a drained stdin; keep the first result.
        if results.contains_key(filename.as_str()) {
            continue;
        }
        match digest_one(filename, cli.max_bytes) {
            Ok(snapshot) => {
                results.insert(filename.as_str(), snapshot);
            }
            Err(e) => {
                eprintln!("{}: {}: {}", TOOL_NAME, filename, error_msg(&e));
                had_error = true;
            }
        }
    }

    if results.is_empty() {
        return Ok(had_error);
    }
    let json = if files.len() == 1 {
        match results.into_values().next() {
            Some(snapshot) => render(&snapshot, cli.compact)?,
            None => return Ok(had_error),
        }
    } else {
        render(&results, cli.compact)?
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "{}", json)?;
    out.flush()?;
    Ok(had_error)
}

fn main() {
    reset_sigpipe();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(false) => {}
        Ok(true) => process::exit(1),
        Err(e) => {
            eprintln!("{}: {:#}", TOOL_NAME, e);
            process::exit(1);
        }
    }
}
