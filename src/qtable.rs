use ndarray::{Array2, ArrayView1};

use crate::env::{Action, State};

/// One application of the Bellman update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    pub state: State,
    pub action: Action,
    pub reward: f64,
    pub next_state: State,
    /// max(Q[next_state, :]) at the time of the update.
    pub next_max: f64,
    pub old_value: f64,
    pub new_value: f64,
}

impl Update {
    /// False when the update overflowed and was not written to the table.
    pub fn is_finite(&self) -> bool {
        self.new_value.is_finite()
    }
}

/// Dense action-value table.
///
/// Rows are states and columns are actions. Every entry starts at zero and
/// is only changed through [`QTable::bellman_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array2<f64>,
}

impl QTable {
    pub fn new(n_states: usize, n_actions: usize) -> QTable {
        QTable {
            values: Array2::<f64>::zeros((n_states, n_actions)),
        }
    }

    pub fn n_states(&self) -> usize {
        self.values.dim().0
    }

    pub fn n_actions(&self) -> usize {
        self.values.dim().1
    }

    pub fn get(&self, s: State, a: Action) -> f64 {
        self.values[[s, a]]
    }

    pub fn row(&self, s: State) -> ArrayView1<'_, f64> {
        self.values.row(s)
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Best action value available from `s`.
    pub fn max_value(&self, s: State) -> f64 {
        self.row(s).fold(f64::NEG_INFINITY, |acc, &q| acc.max(q))
    }

    /// Highest-valued action in `s`. Ties go to the lowest index.
    pub fn greedy_action(&self, s: State) -> Action {
        argmax(self.row(s).iter().copied())
    }

    /// Greedy action for every state.
    pub fn greedy_policy(&self) -> Vec<Action> {
        (0..self.n_states()).map(|s| self.greedy_action(s)).collect()
    }

    /// Q[s,a] <- Q[s,a] + alpha * (r + gamma * max(Q[s1,:]) - Q[s,a])
    ///
    /// A non-finite result is returned but not stored, so the table only ever
    /// holds finite values. Check [`Update::is_finite`].
    pub fn bellman_update(
        &mut self, s: State, a: Action, r: f64, s1: State, alpha: f64, gamma: f64,
    ) -> Update {
        let old_value = self.values[[s, a]];
        let next_max = self.max_value(s1);
        let target = r + gamma * next_max;
        let new_value = old_value + alpha * (target - old_value);
        if new_value.is_finite() {
            self.values[[s, a]] = new_value;
        }
        Update {
            state: s,
            action: a,
            reward: r,
            next_state: s1,
            next_max,
            old_value,
            new_value,
        }
    }
}

/// Index of the first maximum. NaN entries never win.
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
