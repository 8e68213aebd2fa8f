use crate::agent::ValueAgent;
use crate::board::{Board, IsGameOver, Marks};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeOutcome {
    pub winner: Option<Marks>,
    pub plies: usize,
}

#[derive(Debug, Clone)]
struct Ply {
    board: Board,
    action: (usize, usize),
}

fn seat(mark: Marks) -> usize {
    match mark {
        Marks::NOUGHT => 0,
        Marks::CROSS => 1,
    }
}

/// Self-play between two value agents. `agent_a` always plays `NOUGHT` and
/// moves first, `agent_b` plays `CROSS`.
pub struct Environment<'a> {
    agent_a: &'a mut ValueAgent,
    agent_b: &'a mut ValueAgent,
    pub board: Board,
}

impl<'a> Environment<'a> {
    pub fn new(agent_a: &'a mut ValueAgent, agent_b: &'a mut ValueAgent) -> Self {
        Environment {
            agent_a,
            agent_b,
            board: Board::new(),
        }
    }

    /// Plays one game to the end on a fresh board, records both trajectories
    /// and runs each agent's update once.
    ///
    /// A ply is recorded with reward 0 only once it is known not to have ended
    /// the game. At the end the mover's last ply gets +1 for a win, and the
    /// waiting agent's last ply is recorded again with -1 (or 0 on a draw).
    pub fn run_self_play_episode(&mut self) -> Result<EpisodeOutcome, Error> {
        self.board.reset();
        self.play_from(Marks::NOUGHT)
    }

    /// Plays out the current board with `mark` to move. If the game cannot be
    /// finished, both trajectories are dropped without an update.
    fn play_from(&mut self, mark: Marks) -> Result<EpisodeOutcome, Error> {
        let result = self.play_out(mark);
        if let Err(error) = &result {
            log::warn!("episode abandoned: {}", error);
            self.agent_a.discard_trajectory();
            self.agent_b.discard_trajectory();
        }
        result
    }

    fn play_out(&mut self, mut mark: Marks) -> Result<EpisodeOutcome, Error> {
        let mut last_ply: [Option<Ply>; 2] = [None, None];
        let mut plies = 0_usize;
        loop {
            let (mover, waiting) = match mark {
                Marks::NOUGHT => (&mut *self.agent_a, &mut *self.agent_b),
                Marks::CROSS => (&mut *self.agent_b, &mut *self.agent_a),
            };
            let snapshot = self.board.clone();
            let action = mover.select_action(&snapshot, mark)?;
            self.board.place(mark, action)?;
            plies += 1;
            let (mover_reward, waiting_reward) = match self.board.is_game_over(mark) {
                IsGameOver::InPlay => {
                    mover.save_state(&snapshot, action, 0.0, mark);
                    last_ply[seat(mark)] = Some(Ply {
                        board: snapshot,
                        action,
                    });
                    mark = mark.other();
                    continue;
                }
                IsGameOver::Win => (1.0, -1.0),
                IsGameOver::Drawn => (0.0, 0.0),
            };
            mover.save_state(&snapshot, action, mover_reward, mark);
            if let Some(ply) = &last_ply[seat(mark.other())] {
                waiting.save_state(&ply.board, ply.action, waiting_reward, mark.other());
            }
            mover.update();
            waiting.update();
            let winner = self.board.winner();
            log::debug!(
                "episode over after {} plies, winner {:?}",
                plies,
                winner.map(|mark| mark.as_char())
            );
            return Ok(EpisodeOutcome { winner, plies });
        }
    }
}
