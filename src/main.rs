use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use mulseq::io as cache_io;
use mulseq::{format_sequence, sequence_to_string, Error, MultSearch, DEFAULT_PROFILE};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DumpFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Parser)]
#[command(
    name = "mulseq",
    version,
    about = "Find minimum-cost shift/add/subtract sequences for multiplication by a constant"
)]
struct Cli {
    /// Multipliers to search
    #[arg(value_name = "MULTIPLIER", allow_negative_numbers = true)]
    multipliers: Vec<i64>,
    /// Dump the multiplication cache after the run
    #[arg(short = 'S', long)]
    showcache: bool,
    /// Trace the search
    #[arg(short, long)]
    debug: bool,
    /// Use the binary method only; no alpha-beta searching
    #[arg(short, long)]
    binary_method: bool,
    /// Also search every multiplier from 2 up to N
    #[arg(long, value_name = "N")]
    to: Option<i64>,
    /// Cache dump format
    #[arg(long, value_enum, default_value = "text")]
    fmt: DumpFormat,
    /// Print each sequence on one compact line instead of the table
    #[arg(long)]
    compact: bool,
    /// Write the cache dump to PATH instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let mut multipliers = cli.multipliers.clone();
    if let Some(n) = cli.to {
        multipliers.extend(2..=n);
    }
    if multipliers.is_empty() {
        eprintln!("error: no multipliers given; pass them as arguments or use --to N");
        process::exit(1);
    }

    let mut engine = MultSearch::new(DEFAULT_PROFILE);
    engine.debug = cli.debug;

    for n in multipliers {
        let result = if cli.binary_method {
            engine.binary_sequence(n)
        } else {
            engine.find_sequence(n)
        };
        let (cost, instrs) = match result {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        };
        if cli.compact {
            println!("{:4}: cost: {:2}; {}", n, cost, sequence_to_string(&instrs));
        } else {
            print!("{}", format_sequence(&instrs, Some(n), Some(cost)));
        }
    }

    if cli.showcache {
        if let Err(e) = show_cache(&engine, cli.fmt, cli.output.as_deref()) {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn show_cache(
    engine: &MultSearch,
    fmt: DumpFormat,
    output: Option<&std::path::Path>,
) -> Result<(), Error> {
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout()),
    };
    match fmt {
        DumpFormat::Text => cache_io::dump(&engine.cache, &mut out),
        DumpFormat::Json => cache_io::dump_json(&engine.cache, &mut out),
        DumpFormat::Yaml => cache_io::dump_yaml(&engine.cache, &mut out),
    }
}
