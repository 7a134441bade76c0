use std::fmt::Write as _;
use std::path::Path;

use ndarray::Array2;
use serde::Serialize;

use crate::env::{FrozenLake, Move, State, Tile};
use crate::error::{LakeError, Result};
use crate::qtable::QTable;
use crate::trainer::{Evaluation, TrainingSummary};

/// Most square `(rows, cols)` with `rows * cols == len` and `rows <= cols`.
pub fn path_shape(len: usize) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let mut rows = 1;
    let mut r = 1;
    while r * r <= len {
        if len % r == 0 {
            rows = r;
        }
        r += 1;
    }
    (rows, len / rows)
}

/// Lay a path out row by row as a `rows x cols` grid.
pub fn reshape_path(path: &[State], rows: usize, cols: usize) -> Result<Array2<State>> {
    if rows.checked_mul(cols) != Some(path.len()) {
        return Err(LakeError::ReshapeMismatch { len: path.len(), rows, cols });
    }
    Array2::from_shape_vec((rows, cols), path.to_vec())
        .map_err(|_| LakeError::ReshapeMismatch { len: path.len(), rows, cols })
}

/// Fatal error line printed on stderr whatever the log level.
pub fn format_error(e: &LakeError) -> String {
    format!("Error: {}\n", e)
}

pub fn format_summary(summary: &TrainingSummary) -> String {
    format!(
        "Score over time: {:.4}\nSuccessful episodes: {} / {}\n",
        summary.average_return(),
        summary.successes,
        summary.episode_returns.len()
    )
}

pub fn format_evaluation(evaluation: &Evaluation) -> String {
    format!(
        "Greedy policy: {} / {} episodes reached the goal (average return {:.4})\n",
        evaluation.successes, evaluation.episodes, evaluation.average_return
    )
}

/// Q-table with one row per state and one column per action.
pub fn format_q_table(q: &QTable) -> String {
    let mut out = String::new();
    let _ = write!(out, "  state |");
    for a in 0..q.n_actions() {
        match Move::from_index(a) {
            Some(m) => { let _ = write!(out, "{:>9}", m); }
            None => { let _ = write!(out, "{:>9}", a); }
        }
    }
    out.push('\n');
    for (s, row) in q.values().rows().into_iter().enumerate() {
        let _ = write!(out, "{:>7} | ", s);
        for q_sa in row.iter() {
            let _ = write!(out, "{:8.4} ", q_sa);
        }
        out.push('\n');
    }
    out
}

/// Path as a grid whose shape divides its length.
pub fn format_path(path: &[State]) -> Result<String> {
    let (rows, cols) = path_shape(path.len());
    let grid = reshape_path(path, rows, cols)?;
    let mut out = String::new();
    for row in grid.rows() {
        let cells: Vec<String> = row.iter().map(|s| format!("{:>3}", s)).collect();
        let _ = writeln!(out, "{}", cells.join(""));
    }
    Ok(out)
}

/// Greedy action arrow for every safe cell of the lake.
pub fn format_policy(q: &QTable, lake: &FrozenLake) -> String {
    let mut out = String::new();
    for row in 0..lake.nrow() {
        for col in 0..lake.ncol() {
            let s = row * lake.ncol() + col;
            let c = match lake.tile(s) {
                Tile::Hole | Tile::Goal => lake.tile(s).symbol(),
                Tile::Start | Tile::Frozen => Move::from_index(q.greedy_action(s))
                    .map(|m| m.arrow())
                    .unwrap_or('?'),
            };
            let _ = write!(out, " {} ", c);
        }
        out.push('\n');
    }
    out
}


#[derive(Serialize)]
struct ReturnRecord {
    episode: usize,
    #[serde(rename = "return")]
    total_return: f64,
}

/// Write per-episode returns as `episode,return` rows.
pub fn write_returns_csv(path: &Path, returns: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (episode, &total_return) in returns.iter().enumerate() {
        writer.serialize(ReturnRecord { episode, total_return })?;
    }
    writer.flush()?;
    Ok(())
}
