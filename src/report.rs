//! Persisting and printing evaluation results.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::agent::AgentConfig;
use crate::eval::EvalResult;

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `<dir>/<agent>-g<games>-seed<seed>-<timestamp>.json`
pub fn default_output_path<P: AsRef<Path>>(dir: P, result: &EvalResult, timestamp: &str) -> PathBuf {
    dir.as_ref().join(format!(
        "{}-g{}-seed{}-{}.json",
        result.agent, result.games, result.seed_base, timestamp
    ))
}

/// Write `result` as pretty JSON, creating parent directories as needed.
pub fn write_json<P: AsRef<Path>>(path: P, result: &EvalResult) -> Result<(), ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<EvalResult, ReportError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Human-readable summary block.
pub fn format_summary(result: &EvalResult) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "=== EVAL SUMMARY ({}) ===", result.agent);
    let _ = writeln!(s, "Games: {}", result.games);
    let _ = writeln!(s, "Seed base: {}", result.seed_base);
    if let AgentConfig::Expectimax { depth, p2 } = result.agent_config {
        let _ = writeln!(s, "Config: depth={depth} p2={p2}");
    }
    let _ = writeln!(s, "Mean score:   {:.1}", result.mean_score);
    let _ = writeln!(s, "Median score: {:.1}", result.median_score);
    let _ = writeln!(s, "Std score:    {:.1}", result.std_score);
    let _ = writeln!(s, "Mean steps:   {:.1}", result.mean_steps);
    let _ = writeln!(s, "Median steps: {:.1}", result.median_steps);
    let _ = writeln!(
        s,
        "Max tile: min={} max={}",
        result.samples.min_max_tile, result.samples.max_max_tile
    );
    if result.abnormal_terminations > 0 {
        let _ = writeln!(s, "Abnormal terminations: {}", result.abnormal_terminations);
    }
    let probs: Vec<String> = result.p_at_least.iter().map(|(t, p)| format!("{t}: {p:.3}")).collect();
    let _ = write!(s, "P(tile >= T): {{ {} }}", probs.join(", "));
    s
}
