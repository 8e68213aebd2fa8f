use crate::agent::ValueAgent;
use crate::board::{Board, IsGameOver, Marks};
use crate::config::AppConfig;
use crate::environment::{EpisodeOutcome, Environment};
use crate::error::Error;
use crate::players::{HumanPlayer, Player};
use crate::q_table::{snapshot_path, table_path};
use std::io::{BufRead, Write};
use std::mem;

pub mod agent;
pub mod board;
pub mod config;
pub mod environment;
pub mod error;
pub mod players;
pub mod q_table;

pub const AGENT_NAMES: [&str; 2] = ["a1", "a2"];

/// A game between two arbitrary players, used for human play.
pub struct Game<'a> {
    pub board: Board,
    pub current_player: &'a mut dyn Player,
    pub other_player: &'a mut dyn Player,
    current_mark: Marks,
}

impl<'a> Game<'a> {
    /// `first` plays `NOUGHT` and opens the game.
    pub fn new(first: &'a mut dyn Player, second: &'a mut dyn Player) -> Self {
        Game {
            board: Board::new(),
            current_player: first,
            other_player: second,
            current_mark: Marks::NOUGHT,
        }
    }
    pub fn swap_players(&mut self) {
        mem::swap(&mut self.current_player, &mut self.other_player);
        self.current_mark = self.current_mark.other();
    }
    /// Plays until someone wins or the board fills up, returning the winning mark.
    pub fn play(&mut self) -> Result<Option<Marks>, Error> {
        loop {
            let mv = self.current_player.choose_move(&self.board, self.current_mark)?;
            self.board.place(self.current_mark, mv)?;
            log::debug!("{} played {:?}", self.current_player.get_name(), mv);
            match self.board.is_game_over(self.current_mark) {
                IsGameOver::InPlay => self.swap_players(),
                IsGameOver::Drawn => return Ok(None),
                IsGameOver::Win => return Ok(Some(self.current_mark)),
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub wins_a: usize,
    pub wins_b: usize,
    pub draws: usize,
}

impl TrainingSummary {
    fn record(&mut self, outcome: &EpisodeOutcome) {
        self.episodes += 1;
        match outcome.winner {
            Some(Marks::NOUGHT) => self.wins_a += 1,
            Some(Marks::CROSS) => self.wins_b += 1,
            None => self.draws += 1,
        }
    }
}

/// Runs `episodes` self-play games between the two agents.
pub fn run_training(
    agent_a: &mut ValueAgent,
    agent_b: &mut ValueAgent,
    episodes: usize,
    log_every: usize,
) -> Result<TrainingSummary, Error> {
    let log_every = log_every.max(1);
    let mut summary = TrainingSummary::default();
    let mut env = Environment::new(agent_a, agent_b);
    for episode in 0..episodes {
        if episode % log_every == 0 {
            log::info!(
                "ep {:<10}a1 wins {:<10}a2 wins {:<10}draws {}",
                episode,
                summary.wins_a,
                summary.wins_b,
                summary.draws
            );
        }
        let outcome = env.run_self_play_episode()?;
        summary.record(&outcome);
    }
    Ok(summary)
}

/// Loads both tables (unless training fresh), trains, and writes them back.
pub fn train_agents(config: &AppConfig) -> Result<TrainingSummary, Error> {
    config.validate()?;
    let training = &config.training;
    let mut agents = AGENT_NAMES.map(|name| ValueAgent::from_config(&config.agent, name));
    if let Some(seed) = training.seed {
        agents = agents.map(|agent| {
            let offset = if agent.get_name() == AGENT_NAMES[0] { 0 } else { 1 };
            agent.with_seed(seed.wrapping_add(offset))
        });
    }
    if !training.fresh {
        for agent in agents.iter_mut() {
            let path = table_path(&training.table_dir, agent.get_name());
            agent.read_table(&path)?;
        }
    }
    let [agent_a, agent_b] = &mut agents;
    let summary = run_training(agent_a, agent_b, training.episodes, training.log_every())?;
    log::info!(
        "trained {} episodes: a1 wins {}, a2 wins {}, draws {}",
        summary.episodes,
        summary.wins_a,
        summary.wins_b,
        summary.draws
    );
    for agent in agents.iter() {
        agent.write_table(&table_path(&training.table_dir, agent.get_name()))?;
        if training.snapshot {
            agent.write_table(&snapshot_path(&training.table_dir, agent.get_name()))?;
        }
    }
    Ok(summary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanOutcome {
    Won,
    Lost,
    Drawn,
}

/// One game between a person reading from `input` and a trained agent that
/// always plays its best known move.
pub fn play_human_vs_agent<R: BufRead, W: Write>(
    config: &AppConfig,
    agent_name: &str,
    input: R,
    output: W,
) -> Result<HumanOutcome, Error> {
    let mut agent = ValueAgent::from_config(&config.agent, agent_name);
    if let Some(seed) = config.training.seed {
        agent = agent.with_seed(seed);
    }
    agent.read_table(&table_path(&config.training.table_dir, agent_name))?;
    agent.set_epsilon(0.0);
    let mut human = HumanPlayer::new("you", input, output);
    let human_first = human.choose_first()?;
    let human_mark = if human_first { Marks::NOUGHT } else { Marks::CROSS };
    let (winner, board) = {
        let mut game = if human_first {
            Game::new(&mut human, &mut agent)
        } else {
            Game::new(&mut agent, &mut human)
        };
        let winner = game.play()?;
        (winner, game.board)
    };
    let outcome = match winner {
        Some(mark) if mark == human_mark => HumanOutcome::Won,
        Some(_) => HumanOutcome::Lost,
        None => HumanOutcome::Drawn,
    };
    human.tell(&board.to_string())?;
    human.tell(match outcome {
        HumanOutcome::Won => "Congratulations, you have won!",
        HumanOutcome::Lost => "Really sorry, you have lost.",
        HumanOutcome::Drawn => "The game ended in a draw.",
    })?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        moves: Vec<(usize, usize)>,
    }

    impl Player for Scripted {
        fn get_name(&self) -> &str {
            "scripted"
        }
        fn choose_move(&mut self, _board: &Board, _mark: Marks) -> Result<(usize, usize), Error> {
            Ok(self.moves.remove(0))
        }
    }

    #[test]
    fn is_game_working() {
        let mut first = Scripted {
            moves: vec![(0, 0), (0, 1), (0, 2)],
        };
        let mut second = Scripted {
            moves: vec![(1, 0), (1, 1)],
        };
        let mut game = Game::new(&mut first, &mut second);
        assert_eq!(game.play().unwrap(), Some(Marks::NOUGHT));
        assert_eq!(game.board.iter().filter(|&&value| value == board::EMPTY).count(), 4);
    }

    #[test]
    fn is_game_rejecting_occupied_cell() {
        let mut first = Scripted { moves: vec![(1, 1)] };
        let mut second = Scripted { moves: vec![(1, 1)] };
        let mut game = Game::new(&mut first, &mut second);
        assert!(matches!(game.play(), Err(Error::OccupiedCell { row: 1, col: 1 })));
    }

    #[test]
    fn is_training_summary_working() {
        let mut a1 = ValueAgent::new(0.9, 0.5, 0.3, "a1").with_seed(21);
        let mut a2 = ValueAgent::new(0.9, 0.5, 0.3, "a2").with_seed(22);
        let summary = run_training(&mut a1, &mut a2, 40, 0).unwrap();
        assert_eq!(summary.episodes, 40);
        assert_eq!(summary.wins_a + summary.wins_b + summary.draws, 40);
        assert!(!a1.q_table().is_empty());
        assert!(!a2.q_table().is_empty());
    }
}
