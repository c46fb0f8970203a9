//! Zenome CLI
//!
//! Usage:
//!   zenome --text "your query here"          # Single query
//!   zenome --interactive                     # Interactive session
//!   zenome --serve                           # HTTP API server
//!   zenome --text "query" --json             # JSON output
//!   zenome --offline --interactive           # No network: hash embeddings, no insight

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use zenome::core::{render_heatmap, render_table, render_trends, run_server, QueryPipeline, Session, SubmitOptions};
use zenome::types::{ChannelOverlay, Submission, TokenizerKind, ZenomeConfig, ZenomeResult};
use zenome::VERSION;

/// Heatmap width in terminal columns
const HEATMAP_COLS: usize = 40;

#[derive(Parser, Debug)]
#[command(
    name = "zenome",
    version = VERSION,
    about = "Zenome - Expectation-to-Outcome Mapper",
    long_about = "Zenome maps a natural-language query to three coherence metrics\n\
                  and a synthetic field surface.\n\n\
                  Metrics:\n  \
                  μ (Zeno)  - Alignment, sigmoid of the embedding norm's fractional part\n  \
                  Entropy   - Normalized Shannon entropy of the query's tokens\n  \
                  Variance  - Spread of the embedding components\n\n\
                  Modes:\n  \
                  --text         Single query\n  \
                  --interactive  Session with scoreboard (:table, :trend)\n  \
                  --serve        HTTP API server mode"
)]
struct Args {
    /// Query to evaluate (single mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Interactive session - read queries from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file
    #[arg(short, long)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Use deterministic offline embeddings and skip the insight call
    #[arg(long)]
    offline: bool,

    /// Skip the insight call
    #[arg(long)]
    no_narrative: bool,

    /// Do not overlay the entropy channel into the field
    #[arg(long)]
    no_entropy: bool,

    /// Do not overlay the variance channel into the field
    #[arg(long)]
    no_variance: bool,

    /// Hash regex pre-token pieces instead of running the BPE encoder
    #[arg(long)]
    hashing_tokenizer: bool,

    /// Field samples per axis
    #[arg(long)]
    grid_size: Option<usize>,

    /// Print a shaded top-down view of the field
    #[arg(long)]
    heatmap: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging (reads RUST_LOG env var)
    let default_level = if args.serve { log::LevelFilter::Info } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    let pipeline = match build_pipeline(&args) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(2);
        }
    };
    log::debug!("pipeline: {:?}", pipeline);

    if args.serve {
        run_serve(&args, pipeline).await;
    } else if let Some(ref text) = args.text {
        run_single(text, &args, &pipeline).await;
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args, &pipeline).await;
    }
}

/// Resolve config: defaults → file → env → flags
fn build_pipeline(args: &Args) -> ZenomeResult<QueryPipeline> {
    let mut config = match &args.config {
        Some(path) => ZenomeConfig::from_file(path)?,
        None => ZenomeConfig::default(),
    }
    .with_env();

    if let Some(grid_size) = args.grid_size {
        config.grid_size = grid_size;
    }
    if args.hashing_tokenizer {
        config.tokenizer = TokenizerKind::Hashing;
    }
    if args.no_narrative {
        config.narrative_enabled = false;
    }
    config.overlay = ChannelOverlay {
        entropy: config.overlay.entropy && !args.no_entropy,
        variance: config.overlay.variance && !args.no_variance,
    };

    if args.offline {
        QueryPipeline::offline(config)
    } else {
        if config.api_key.is_none() {
            log::warn!("no API key set; embedding calls will fail (use --offline to run without one)");
        }
        QueryPipeline::from_config(config)
    }
}

/// Run single query
async fn run_single(text: &str, args: &Args, pipeline: &QueryPipeline) {
    let mut session = Session::new();
    match session.submit(pipeline, text, SubmitOptions::default()).await {
        Ok(Some(sub)) => print_submission(&sub, args),
        Ok(None) => eprintln!("Nothing to do: empty query."),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Run interactive session
async fn run_interactive(args: &Args, pipeline: &QueryPipeline) {
    let mut session = Session::new();

    print_header("Interactive Session", args.no_color);
    println!("Type a query and press Enter. Commands: :table, :trend, quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("[{}] > ", session.log().len());
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended. Queries: {}", session.log().len());
            break;
        }
        match line {
            "" => continue,
            ":table" => {
                print!("{}", render_table(session.log()));
                continue;
            }
            ":trend" => {
                print!("{}", render_trends(&session.log().trends()));
                continue;
            }
            _ => {}
        }

        match session.submit(pipeline, line, SubmitOptions::default()).await {
            Ok(Some(sub)) => print_submission(&sub, args),
            Ok(None) => {}
            // Abort this query only; the session continues
            Err(e) => eprintln!("{} {} (query not logged)", "error:".red().bold(), e),
        }
    }
}

/// Run HTTP API server
async fn run_serve(args: &Args, pipeline: Arc<QueryPipeline>) {
    println!();
    println!("{}", format!("🧠 Zenome API Server v{}", VERSION).bold());
    println!();

    if let Err(e) = run_server(&args.addr, pipeline).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn print_submission(sub: &Submission, args: &Args) {
    if args.json {
        match serde_json::to_string(sub) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
        }
        return;
    }
    if args.no_color {
        println!("{}", sub.to_parseable_string());
    } else {
        println!("{}", sub.to_terminal_string());
    }
    if args.heatmap {
        print!("{}", render_heatmap(&sub.field, HEATMAP_COLS));
    }
}

fn print_header(mode: &str, no_color: bool) {
    let title = format!("Zenome v{} - {}", VERSION, mode);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", "════════════════════════════════════════".bold());
        println!("  {}", title.bold());
        println!("{}", "════════════════════════════════════════".bold());
    }
    println!();
}
