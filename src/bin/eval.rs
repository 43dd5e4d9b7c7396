use ai_2048_lab::agent::AgentConfig;
use ai_2048_lab::eval::{evaluate_agent_par_with, evaluate_agent_with, EvalConfig, GameRecord, DEFAULT_SEED_BASE};
use ai_2048_lab::report::{default_output_path, format_summary, write_json};
use ai_2048_lab::rng::RngKind;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AgentArg {
    Random,
    Expectimax,
}

#[derive(Debug, Parser)]
#[command(name = "eval", about = "Evaluate an agent over many seeded games")]
struct Args {
    /// Agent to evaluate
    #[arg(long, value_enum, default_value_t = AgentArg::Expectimax)]
    agent: AgentArg,
    /// Number of games
    #[arg(long, default_value_t = 500)]
    games: u32,
    /// Seed of game 0; game i uses seed + i
    #[arg(long, default_value_t = DEFAULT_SEED_BASE)]
    seed: u32,
    /// Expectimax depth
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Probability of a 2 assumed by the expectimax chance nodes
    #[arg(long, default_value_t = 0.9)]
    p2: f64,
    /// Per-game generator (mulberry32 | std)
    #[arg(long, default_value_t = RngKind::Mulberry32)]
    rng: RngKind,
    /// Play games on the rayon pool
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Output JSON path (default: artifacts/eval/<agent>-g<games>-seed<seed>-<ts>.json)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let agent_config = match args.agent {
        AgentArg::Random => AgentConfig::Random,
        AgentArg::Expectimax => AgentConfig::Expectimax { depth: args.depth, p2: args.p2 },
    };
    let cfg = EvalConfig::new(args.games, args.seed, agent_config);
    let factory = agent_config.factory()?;
    let kind = args.rng;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:40}] {pos}/{len} games | {msg}")?
                .progress_chars("=> "),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let on_game = |_i: u32, rec: &GameRecord| {
        pb.set_message(format!("last score: {} tile: {}", rec.score, rec.max_tile));
        pb.inc(1);
    };
    let result = if args.parallel {
        evaluate_agent_par_with(&cfg, |s| kind.seeded(s), || factory.make(), on_game)?
    } else {
        evaluate_agent_with(&cfg, |s| kind.seeded(s), || factory.make(), on_game)?
    };
    pb.finish_and_clear();
    log::info!("evaluated {} games in {:.1}s", result.games, start.elapsed().as_secs_f64());

    let out = match args.out {
        Some(p) => p,
        None => {
            let ts = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
            default_output_path("artifacts/eval", &result, &ts.to_string())
        }
    };
    write_json(&out, &result)?;

    println!("{}", format_summary(&result));
    println!("Wrote {}", out.display());
    Ok(())
}
