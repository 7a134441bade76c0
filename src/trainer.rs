use tracing::{debug, info, trace, warn};

use crate::config::TrainConfig;
use crate::env::{Action, Environment, State, Transition};
use crate::error::{LakeError, Result};
use crate::exploration::Explorer;
use crate::qtable::{QTable, Update};

/// How an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// The environment reported `done`.
    TerminatedByEnv,
    /// `max_steps_per_episode` was reached first.
    TerminatedByStepLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub total_return: f64,
    pub steps: usize,
    pub outcome: EpisodeOutcome,
    /// States entered, in order. The start state is not included.
    pub path: Vec<State>,
}

impl EpisodeSummary {
    pub fn succeeded(&self) -> bool {
        self.outcome == EpisodeOutcome::TerminatedByEnv && self.total_return > 0.0
    }
}

/// Result of a complete training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// One cumulative return per episode.
    pub episode_returns: Vec<f64>,
    pub outcomes: Vec<EpisodeOutcome>,
    pub successes: usize,
    pub q_table: QTable,
    /// Path of the most recent episode.
    pub last_path: Vec<State>,
}

impl TrainingSummary {
    pub fn average_return(&self) -> f64 {
        self.episode_returns.iter().sum::<f64>() / self.episode_returns.len() as f64
    }

    pub fn success_rate(&self) -> f64 {
        self.successes as f64 / self.episode_returns.len() as f64
    }
}

/// Greedy-policy evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub episodes: usize,
    pub successes: usize,
    pub average_return: f64,
}

impl Evaluation {
    pub fn success_rate(&self) -> f64 {
        self.successes as f64 / self.episodes as f64
    }
}


/// Hooks into a training run. Every method defaults to doing nothing.
pub trait TrainingObserver {
    fn on_update(&mut self, _episode: usize, _step: usize, _update: &Update) {}

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) {}
}

impl TrainingObserver for () {}


/// Tabular Q-learning driver.
///
/// Owns the Q-table and the exploration source. Nothing is shared between
/// trainers, so several can run side by side.
pub struct QLearningTrainer<X: Explorer> {
    config: TrainConfig,
    q_table: QTable,
    explorer: X,
}

impl<X: Explorer> QLearningTrainer<X> {
    /// Build a trainer with a zeroed table sized for `env`.
    pub fn new<E: Environment>(config: TrainConfig, env: &E, explorer: X) -> Result<Self> {
        config.validate()?;
        let (n_s, n_a) = (env.state_count(), env.action_count());
        if n_s == 0 || n_a == 0 {
            return Err(LakeError::contract(
                0,
                0,
                format!("state and action counts must be positive, got {}x{}", n_s, n_a),
            ));
        }
        Ok(QLearningTrainer {
            config,
            q_table: QTable::new(n_s, n_a),
            explorer,
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Run `num_episodes` episodes and collect their statistics.
    pub fn train<E, O>(&mut self, env: &mut E, observer: &mut O) -> Result<TrainingSummary>
    where
        E: Environment,
        O: TrainingObserver,
    {
        info!(
            episodes = self.config.num_episodes,
            max_steps = self.config.max_steps_per_episode,
            alpha = self.config.learning_rate,
            gamma = self.config.gamma,
            "Starting Q-learning"
        );
        let n = self.config.num_episodes;
        let mut episode_returns = Vec::with_capacity(n);
        let mut outcomes = Vec::with_capacity(n);
        let mut successes = 0;
        let mut last_path = Vec::new();

        for episode in 0..n {
            let summary = self.run_episode(env, episode, observer)?;
            observer.on_episode_end(&summary);
            episode_returns.push(summary.total_return);
            outcomes.push(summary.outcome);
            if summary.succeeded() {
                successes += 1;
            }
            last_path = summary.path;
        }

        let summary = TrainingSummary {
            episode_returns,
            outcomes,
            successes,
            q_table: self.q_table.clone(),
            last_path,
        };
        info!(
            average_return = summary.average_return(),
            success_rate = summary.success_rate(),
            "Training finished"
        );
        Ok(summary)
    }

    /// One episode: reset, then select/step/update until done or out of steps.
    pub fn run_episode<E, O>(
        &mut self, env: &mut E, episode: usize, observer: &mut O,
    ) -> Result<EpisodeSummary>
    where
        E: Environment,
        O: TrainingObserver,
    {
        let alpha = self.config.learning_rate;
        let gamma = self.config.gamma;
        let mut s = env.reset();
        self.check_state(s, episode, 0)?;

        let mut total_return = 0.0;
        let mut steps = 0;
        let mut path = Vec::new();
        let mut outcome = EpisodeOutcome::TerminatedByStepLimit;

        while steps < self.config.max_steps_per_episode {
            steps += 1;
            let a = self.explorer.select(self.q_table.row(s), episode);
            self.check_action(a, episode, steps)?;

            let t = env.step(a);
            self.check_transition(&t, episode, steps)?;

            let update = self.q_table.bellman_update(s, a, t.reward, t.next_state, alpha, gamma);
            if !update.is_finite() {
                warn!(episode, step = steps, ?update, "Non-finite Q update");
                return Err(LakeError::contract(
                    episode,
                    steps,
                    format!(
                        "update of Q[{}, {}] to {} is not finite (reward {})",
                        s, a, update.new_value, t.reward
                    ),
                ));
            }
            trace!(episode, step = steps, ?update, "Q update");
            observer.on_update(episode, steps, &update);

            total_return += t.reward;
            s = t.next_state;
            path.push(s);

            if t.done {
                outcome = EpisodeOutcome::TerminatedByEnv;
                break;
            }
        }

        debug!(episode, steps, total_return, ?outcome, "Episode finished");
        Ok(EpisodeSummary { episode, total_return, steps, outcome, path })
    }

    /// Play `episodes` episodes with the greedy policy, leaving the table untouched.
    pub fn evaluate<E: Environment>(&self, env: &mut E, episodes: usize) -> Result<Evaluation> {
        if episodes == 0 {
            return Err(LakeError::configuration("evaluation needs at least one episode"));
        }
        let mut successes = 0;
        let mut total = 0.0;
        for episode in 0..episodes {
            let mut s = env.reset();
            self.check_state(s, episode, 0).map_err(LakeError::in_evaluation)?;
            let mut ret = 0.0;
            let mut done = false;
            for step in 1..=self.config.max_steps_per_episode {
                let t = env.step(self.q_table.greedy_action(s));
                self.check_transition(&t, episode, step)
                    .map_err(LakeError::in_evaluation)?;
                ret += t.reward;
                s = t.next_state;
                if t.done {
                    done = true;
                    break;
                }
            }
            if done && ret > 0.0 {
                successes += 1;
            }
            total += ret;
        }
        let evaluation = Evaluation {
            episodes,
            successes,
            average_return: total / episodes as f64,
        };
        info!(
            episodes,
            success_rate = evaluation.success_rate(),
            "Greedy evaluation finished"
        );
        Ok(evaluation)
    }

    fn check_state(&self, s: State, episode: usize, step: usize) -> Result<()> {
        if s >= self.q_table.n_states() {
            warn!(episode, step, state = s, "State out of range");
            return Err(LakeError::contract(
                episode,
                step,
                format!("state {} outside [0, {})", s, self.q_table.n_states()),
            ));
        }
        Ok(())
    }

    fn check_action(&self, a: Action, episode: usize, step: usize) -> Result<()> {
        if a >= self.q_table.n_actions() {
            warn!(episode, step, action = a, "Action out of range");
            return Err(LakeError::contract(
                episode,
                step,
                format!("action {} outside [0, {})", a, self.q_table.n_actions()),
            ));
        }
        Ok(())
    }

    fn check_transition(&self, t: &Transition, episode: usize, step: usize) -> Result<()> {
        self.check_state(t.next_state, episode, step)?;
        if !t.reward.is_finite() {
            warn!(episode, step, reward = t.reward, "Non-finite reward");
            return Err(LakeError::contract(
                episode,
                step,
                format!("reward {} is not finite", t.reward),
            ));
        }
        Ok(())
    }
}
