use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Grid cell index in [0, state_count).
pub type State = usize;
/// Movement index in [0, action_count).
pub type Action = usize;

/// Outcome of a single environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub next_state: State,
    pub reward: f64,
    pub done: bool,
}

/// Discrete episodic environment queried by the trainer.
///
/// `state_count` and `action_count` must stay fixed for the lifetime of the
/// environment. The trainer checks every returned state and reward.
pub trait Environment {
    fn state_count(&self) -> usize;

    fn action_count(&self) -> usize;

    fn reset(&mut self) -> State;

    fn step(&mut self, action: Action) -> Transition;
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Start,
    Frozen,
    Hole,
    Goal,
}

impl Tile {
    fn from_char(c: char) -> Tile {
        match c {
            'S' => Tile::Start,
            'H' => Tile::Hole,
            'G' => Tile::Goal,
            _ => Tile::Frozen,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Tile::Start => 'S',
            Tile::Frozen => 'F',
            Tile::Hole => 'H',
            Tile::Goal => 'G',
        }
    }

    /// Holes and the goal end the episode.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Tile::Hole | Tile::Goal)
    }
}


/// Lake actions, in gym's index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left = 0,
    Down = 1,
    Right = 2,
    Up = 3,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Left, Move::Down, Move::Right, Move::Up];

    pub fn from_index(a: Action) -> Option<Move> {
        Move::ALL.get(a).copied()
    }

    pub fn arrow(&self) -> char {
        match self {
            Move::Left => '←',
            Move::Down => '↓',
            Move::Right => '→',
            Move::Up => '↑',
        }
    }

    /// The two directions at right angles to this one.
    fn perpendicular(&self) -> [Move; 2] {
        match self {
            Move::Left | Move::Right => [Move::Up, Move::Down],
            Move::Up | Move::Down => [Move::Left, Move::Right],
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Move::Left => "L",
            Move::Down => "D",
            Move::Right => "R",
            Move::Up => "U",
        };
        f.pad(name)
    }
}


pub const LAKE_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

/// The 4x4 FrozenLake grid world.
///
/// Entering the goal pays 1.0, everything else pays nothing. When slippery,
/// the agent moves in the chosen direction with probability 1/3 and slides to
/// either perpendicular direction with probability 1/3 each.
pub struct FrozenLake {
    tiles: Vec<Tile>,
    nrow: usize,
    ncol: usize,
    pos: State,
    slippery: bool,
    rng: StdRng,
}

impl FrozenLake {
    pub fn new(slippery: bool, rng: StdRng) -> FrozenLake {
        let tiles = LAKE_4X4
            .iter()
            .flat_map(|row| row.chars().map(Tile::from_char))
            .collect();
        FrozenLake {
            tiles,
            nrow: LAKE_4X4.len(),
            ncol: LAKE_4X4[0].len(),
            pos: 0,
            slippery,
            rng,
        }
    }

    pub fn seeded(slippery: bool, seed: u64) -> FrozenLake {
        FrozenLake::new(slippery, StdRng::seed_from_u64(seed))
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn tile(&self, s: State) -> Tile {
        self.tiles[s]
    }

    pub fn position(&self) -> State {
        self.pos
    }

    fn start(&self) -> State {
        self.tiles
            .iter()
            .position(|t| *t == Tile::Start)
            .unwrap_or(0)
    }

    /// Cell reached by moving from `s`. Walls keep the agent in place.
    fn neighbor(&self, s: State, m: Move) -> State {
        let (row, col) = (s / self.ncol, s % self.ncol);
        let (row, col) = match m {
            Move::Left => (row, col.saturating_sub(1)),
            Move::Down => ((row + 1).min(self.nrow - 1), col),
            Move::Right => (row, (col + 1).min(self.ncol - 1)),
            Move::Up => (row.saturating_sub(1), col),
        };
        row * self.ncol + col
    }

    /// Map with the agent's cell bracketed.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..self.nrow {
            for col in 0..self.ncol {
                let s = row * self.ncol + col;
                let c = self.tiles[s].symbol();
                if s == self.pos {
                    out.push_str(&format!("[{}]", c));
                } else {
                    out.push_str(&format!(" {} ", c));
                }
            }
            out.push('\n');
        }
        out
    }
}

impl Environment for FrozenLake {
    fn state_count(&self) -> usize {
        self.tiles.len()
    }

    fn action_count(&self) -> usize {
        Move::ALL.len()
    }

    fn reset(&mut self) -> State {
        self.pos = self.start();
        self.pos
    }

    fn step(&mut self, action: Action) -> Transition {
        let Some(intended) = Move::from_index(action) else {
            // Unknown action: stay put, the trainer rejects these upfront.
            return Transition { next_state: self.pos, reward: 0.0, done: false };
        };
        let m = if self.slippery {
            let [a, b] = intended.perpendicular();
            match self.rng.gen_range(0..3) {
                0 => intended,
                1 => a,
                _ => b,
            }
        } else {
            intended
        };
        self.pos = self.neighbor(self.pos, m);
        let tile = self.tiles[self.pos];
        Transition {
            next_state: self.pos,
            reward: if tile == Tile::Goal { 1.0 } else { 0.0 },
            done: tile.is_terminal(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn lake() -> FrozenLake {
        FrozenLake::seeded(false, 0)
    }

    #[test]
    fn lake_dimensions() {
        let env = lake();
        assert_eq!(env.state_count(), 16);
        assert_eq!(env.action_count(), 4);
        assert_eq!(env.tile(0), Tile::Start);
        assert_eq!(env.tile(5), Tile::Hole);
        assert_eq!(env.tile(15), Tile::Goal);
    }

    #[test_case(0, Move::Left, 0; "Left wall")]
    #[test_case(0, Move::Up, 0; "Top wall")]
    #[test_case(0, Move::Right, 1; "Right from start")]
    #[test_case(0, Move::Down, 4; "Down from start")]
    #[test_case(15, Move::Down, 15; "Bottom wall")]
    #[test_case(7, Move::Right, 7; "Right wall")]
    #[test_case(10, Move::Up, 6; "Up from middle")]
    fn test_neighbor(s: State, m: Move, expected: State) {
        assert_eq!(lake().neighbor(s, m), expected);
    }

    #[test]
    fn reaching_goal_pays_one() {
        // Arrange
        let mut env = lake();
        env.reset();
        // Act: S -> 4 -> 8 -> 9 -> 13 -> 14 -> 15
        let moves = [Move::Down, Move::Down, Move::Right, Move::Down, Move::Right, Move::Right];
        let mut last = None;
        for m in moves {
            last = Some(env.step(m as Action));
        }
        // Assert
        let t = last.unwrap();
        assert_eq!(t.next_state, 15);
        assert_eq!(t.reward, 1.0);
        assert!(t.done);
    }

    #[test]
    fn falling_in_hole_ends_episode() {
        let mut env = lake();
        env.reset();
        let t1 = env.step(Move::Right as Action);
        assert_eq!(t1, Transition { next_state: 1, reward: 0.0, done: false });
        let t2 = env.step(Move::Down as Action);
        assert_eq!(t2, Transition { next_state: 5, reward: 0.0, done: true });
    }

    #[test]
    fn reset_returns_to_start() {
        let mut env = lake();
        env.reset();
        env.step(Move::Right as Action);
        assert_eq!(env.reset(), 0);
        assert_eq!(env.position(), 0);
    }

    #[test]
    fn slippery_moves_never_go_backwards() {
        // Arrange
        let mut env = FrozenLake::seeded(true, 11);
        let mut seen = std::collections::HashSet::new();
        // Act: from state 6 moving right can reach 7, 2 or 10, never 5.
        for _ in 0..300 {
            env.reset();
            env.pos = 6;
            seen.insert(env.step(Move::Right as Action).next_state);
        }
        // Assert
        assert!(!seen.contains(&5));
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn render_marks_agent() {
        let mut env = lake();
        env.reset();
        let map = env.render();
        assert!(map.starts_with("[S] F  F  F"));
        assert_eq!(map.lines().count(), 4);
    }
}
