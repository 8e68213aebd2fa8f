use crate::board::{Board, Marks, SIDE};
use crate::config::AgentConfig;
use crate::error::Error;
use crate::q_table::{q_table_from_disk, q_table_to_disk, QTable, StateKey};
use itertools::Itertools;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: StateKey,
    pub action: usize,
    pub reward: f32,
}

/// One agent's plays in the current episode, in order of play.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    /// Appends a step, or overwrites the reward of an already recorded
    /// (state, action) pair in place.
    pub fn record(&mut self, state: StateKey, action: usize, reward: f32) {
        match self
            .steps
            .iter_mut()
            .find(|step| step.state == state && step.action == action)
        {
            Some(step) => step.reward = reward,
            None => self.steps.push(Step {
                state,
                action,
                reward,
            }),
        }
    }
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

/// Tabular agent that learns action values for normalized boards and plays
/// epsilon-greedily against them.
#[derive(Debug)]
pub struct ValueAgent {
    pub name: String,
    gamma: f32,
    alpha: f32,
    epsilon: f32,
    q_table: QTable,
    trajectory: Trajectory,
    rng: StdRng,
}

impl ValueAgent {
    pub fn new(gamma: f32, alpha: f32, epsilon: f32, name: &str) -> Self {
        ValueAgent {
            name: name.to_owned(),
            gamma,
            alpha,
            epsilon,
            q_table: QTable::new(),
            trajectory: Trajectory::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_config(config: &AgentConfig, name: &str) -> Self {
        Self::new(config.gamma, config.alpha, config.epsilon, name)
    }

    /// Replaces the entropy-seeded generator so runs can be reproduced.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon;
    }
    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
    /// Forgets the current episode without learning from it.
    pub fn discard_trajectory(&mut self) {
        self.trajectory.clear();
    }

    fn pick(&mut self, candidates: &[usize], state: StateKey) -> Result<usize, Error> {
        candidates
            .choose(&mut self.rng)
            .copied()
            .ok_or(Error::InvalidState(state))
    }

    /// Epsilon-greedy choice among the empty cells of `board` as seen by
    /// `mark`. Ties between equally valued cells are broken uniformly.
    pub fn select_action(&mut self, board: &Board, mark: Marks) -> Result<(usize, usize), Error> {
        let state = board.normalize(mark);
        let legal = state.legal_actions();
        if legal.is_empty() {
            return Err(Error::InvalidState(state));
        }
        let action = if self.rng.gen::<f32>() < self.epsilon {
            self.pick(&legal, state)?
        } else {
            let values = self.q_table.values(&state);
            let best = legal
                .iter()
                .copied()
                .max_set_by(|&action1, &action2| values[action1].total_cmp(&values[action2]));
            self.pick(&best, state)?
        };
        Ok((action / SIDE, action % SIDE))
    }

    pub fn save_state(&mut self, board: &Board, action: (usize, usize), reward: f32, mark: Marks) {
        let state = board.normalize(mark);
        self.trajectory.record(state, action.0 * SIDE + action.1, reward);
    }

    /// Monte-Carlo backward pass over this episode's trajectory, then clears it.
    ///
    /// The last step moves toward its reward. Every earlier step moves toward
    /// `reward + gamma * max Q(next)`, where `next` is the state this agent
    /// faced on its following turn; the opponent's reply in between is not
    /// part of the trajectory and is not modelled.
    pub fn update(&mut self) {
        let mut next_state: Option<StateKey> = None;
        for step in self.trajectory.steps.iter().rev() {
            let target = match next_state {
                None => step.reward,
                Some(next) => step.reward + self.gamma * self.q_table.max_value(&next),
            };
            let value = &mut self.q_table.values_mut(step.state)[step.action];
            *value = (1.0 - self.alpha) * *value + self.alpha * target;
            next_state = Some(step.state);
        }
        log::trace!("{} updated {} steps", self.name, self.trajectory.len());
        self.trajectory.clear();
    }

    /// Merges the table stored at `path` into this agent's table.
    pub fn read_table(&mut self, path: &Path) -> Result<(), Error> {
        let loaded = q_table_from_disk(path)?;
        log::info!("{:<16}{:<16}{} states from {}", "loading", self.name, loaded.len(), path.display());
        self.q_table.merge(loaded);
        Ok(())
    }

    pub fn write_table(&self, path: &Path) -> Result<(), Error> {
        log::info!("{:<16}{:<16}{} states to {}", "saving", self.name, self.q_table.len(), path.display());
        q_table_to_disk(path, &self.q_table)
    }
}
