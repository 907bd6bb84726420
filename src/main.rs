use anyhow::Result;
use clap::{Parser, Subcommand};

use iseq::search::{self, LibraryMeta, ProfileKind, ProfileLibrary, ScanOpt, DEFAULT_EPSILON};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "iseq", author, version, about = "Profile HMM homology search (Plan7 local Viterbi, codon-aware frame variant)", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build profiles from a HMMER3 file and save them as a library (.isq)
    Press {
        /// HMMER3 text profile file
        profiles: String,
        /// Output prefix for the library file
        #[arg(short, long)]
        output: Option<String>,
        /// Build frame (nucleotide query) profiles
        #[arg(long)]
        frame: bool,
        /// Frame indel probability
        #[arg(long, default_value_t = DEFAULT_EPSILON)]
        epsilon: f64,
    },
    /// Decode target sequences against every profile and report fragments (TSV)
    Scan {
        /// HMMER3 file or pressed library (.isq)
        profiles: String,
        /// Target FASTA file
        targets: String,
        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Targets are nucleotide sequences
        #[arg(long)]
        frame: bool,
        /// Frame indel probability (defaults to 0.01, or the value a library was pressed with)
        #[arg(long)]
        epsilon: Option<f64>,
        /// Disable multiple hits per target
        #[arg(long = "uni-hit")]
        uni_hit: bool,
        /// Only report pairs scoring at least this log-odds
        #[arg(long = "min-score")]
        min_score: Option<f64>,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Press { profiles, output, frame, epsilon } => {
            let output = output.unwrap_or_else(|| default_prefix(&profiles));
            run_press(&profiles, &output, frame, epsilon)
        }
        Commands::Scan {
            profiles,
            targets,
            out,
            frame,
            epsilon,
            uni_hit,
            min_score,
            threads,
        } => {
            let opt = ScanOpt {
                multiple_hits: !uni_hit,
                frame,
                epsilon,
                threads,
                min_score,
            };
            search::scan_with_opt(&profiles, &targets, out.as_deref(), opt)
        }
    }
}

/// 去掉 .hmm 扩展名作为默认输出前缀
fn default_prefix(profiles: &str) -> String {
    profiles.strip_suffix(".hmm").unwrap_or(profiles).to_string()
}

fn run_press(profiles: &str, output: &str, frame: bool, epsilon: f64) -> Result<()> {
    let kind = if frame { ProfileKind::Frame } else { ProfileKind::Standard };
    let mut lib = ProfileLibrary::from_hmmer(profiles, kind, epsilon)?;
    lib.set_meta(LibraryMeta {
        source_file: Some(profiles.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });

    let out_path = format!("{}.{}", output, search::library::LIBRARY_EXT);
    lib.save_to_file(&out_path)
        .map_err(|e| anyhow::anyhow!("cannot write profile library to '{}': {}", out_path, e))?;
    log::info!("profile library saved: {} ({} profiles)", out_path, lib.len());
    Ok(())
}
