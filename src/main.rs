use ai_2048_lab::agent::{Agent, ChooseMoveInput, ExpectimaxAgent};
use ai_2048_lab::engine::{apply_move, new_game, SpawnConfig};
use ai_2048_lab::expectimax::ExpectimaxConfig;
use ai_2048_lab::rng::Mulberry32;
use clap::Parser;

/// Play a single expectimax game, printing the board after every move.
#[derive(Debug, Parser)]
#[command(name = "ai-2048-lab", about = "Watch the expectimax agent play one game")]
struct Args {
    /// RNG seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u32>,
    /// Search depth in plies
    #[arg(long, default_value_t = 3)]
    depth: u32,
    /// Probability a spawned tile is a 2
    #[arg(long, default_value_t = 0.9)]
    p2: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0)
    });
    let mut agent = ExpectimaxAgent::new(ExpectimaxConfig { depth: args.depth, p2: args.p2, ..Default::default() })?;
    let spawn = SpawnConfig::default();
    let mut rng = Mulberry32::new(seed);
    let mut state = new_game(&mut rng, &spawn);
    println!("{}", state.grid);
    let mut move_count = 0u64;
    let mut total_nodes = 0u64;
    let mut peak_nodes = 0u64;
    while !state.is_game_over {
        let input = ChooseMoveInput { grid: state.grid, score: state.score };
        let Some(direction) = agent.choose_move(&input, &mut rng).direction else { break };
        let stats = agent.search().last_stats();
        total_nodes += stats.nodes;
        peak_nodes = peak_nodes.max(stats.nodes);
        let res = apply_move(&state, direction, &mut rng, &spawn);
        if !res.moved {
            anyhow::bail!("agent chose non-moving direction {direction}");
        }
        state = res.next;
        move_count += 1;
        println!("{}", state.grid);
    }
    println!(
        "Seed: {}, Moves made: {}, Score: {}, Highest tile: {}, States considered: {}, Max states considered for a move: {}",
        seed,
        move_count,
        state.score,
        state.grid.highest_tile(),
        total_nodes,
        peak_nodes
    );
    Ok(())
}
