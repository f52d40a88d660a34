use std::path::PathBuf;
use std::process::ExitCode;

use champsim_cut::splitter::DEFAULT_LEVEL;
use champsim_cut::{Error, SplitConfig, Splitter};
use clap::Parser;

#[derive(Parser)]
#[command(name = "champsim-cut")]
#[command(about = "Split a ChampSim .out.gz trace into segments of <cutpoint> instructions")]
#[command(after_help = "Example: champsim-cut mytrace.out.gz 150000000")]
struct Cli {
    /// Input trace (must end in .out.gz)
    trace_file: PathBuf,

    /// Instructions per output segment
    #[arg(allow_negative_numbers = true)]
    cutpoint: i64,

    /// Gzip level for output segments (0-9)
    #[arg(long, default_value_t = DEFAULT_LEVEL)]
    level: u32,

    /// Write segments here instead of next to the input
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<Error>() {
                Some(Error::Io {
                    incomplete_segment: Some(segment),
                    ..
                }) => eprintln!("incomplete segment left at {}", segment.display()),
                Some(err) if err.is_usage() => {
                    eprintln!("Usage: champsim-cut <trace_file.out.gz> <cutpoint>")
                }
                _ => {}
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = SplitConfig::new(cli.cutpoint)?;
    config.level = cli.level;
    config.output_dir = cli.output_dir;

    let stats = Splitter::new(config).split(&cli.trace_file)?;

    println!(
        "Done. Total instructions: {}. Files created: {}",
        stats.records, stats.segments
    );
    Ok(())
}
