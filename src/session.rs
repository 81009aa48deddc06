use crate::matcher::{match_input, TypedWord};
use crate::persist::ScoreGateway;
use crate::scoring::{reduce, GameData, Rules, ScoreEvent};
use crate::timer::{TaskKind, TaskSet, Tick};
use crate::words::WordSource;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum SessionState {
    #[default]
    Idle,
    Playing,
    GameOver,
}

/// What happened to a piece of player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// not playing; input dropped
    Ignored,
    /// letter states refreshed, word still open
    Updated,
    /// word attempt finished and scored; a new word is up
    WordCompleted,
    /// a fresh game began
    Started,
}

/// Something for the session to do at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    /// the whole input line after an edit
    Submit(&'a str),
    /// a high score reported by the remote service
    ObserveHighScore(u64),
    /// nothing but the passage of time
    Advance,
}

/// One player's game, from the title screen through any number of
/// restarts.
///
/// All mutation happens synchronously inside `start`, `submit_input`,
/// `on_tick` and `observe_high_score`, so a tick never sees a half applied
/// input and vice versa.
pub struct Session<W: WordSource, G: ScoreGateway> {
    state: SessionState,
    data: GameData,
    typed: TypedWord,
    tasks: TaskSet,
    rules: Rules,
    words: W,
    gateway: G,
}

impl<W: WordSource, G: ScoreGateway> Session<W, G> {
    /// New idle session. Reads the local high score and asks the remote
    /// service for its best in the background.
    pub fn new(words: W, gateway: G, rules: Rules) -> Self {
        let rules = match rules.validate() {
            Ok(()) => rules,
            Err(e) => {
                log::warn!("{e}, playing with the default rules");
                Rules::default()
            }
        };
        let high_score = gateway.load_local_high_score();
        gateway.fetch_remote_high_score();

        Self {
            state: SessionState::Idle,
            data: GameData::fresh(String::new(), high_score, &rules),
            typed: TypedWord::new(""),
            tasks: TaskSet::new(),
            rules,
            words,
            gateway,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn typed(&self) -> &TypedWord {
        &self.typed
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn generation(&self) -> u64 {
        self.tasks.generation()
    }

    pub fn is_ticking(&self) -> bool {
        self.tasks.is_running()
    }

    /// When the next periodic task is due, if any are running
    pub fn next_deadline(&self) -> Option<Duration> {
        self.tasks.next_deadline()
    }

    /// Begin a fresh game from Idle or GameOver. Ignored while playing.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.state == SessionState::Playing {
            return false;
        }

        self.tasks.cancel();

        let word = self.words.next_word();
        self.data = GameData::fresh(word, self.data.high_score, &self.rules);
        self.typed = TypedWord::new(&self.data.current_word);
        self.state = SessionState::Playing;

        let generation = self.tasks.schedule(
            now,
            &[
                (TaskKind::Decay, self.rules.decay_period()),
                (TaskKind::Difficulty, self.rules.difficulty_period()),
            ],
        );
        log::info!(
            "game started (generation {generation}, first word {:?})",
            self.data.current_word
        );

        true
    }

    /// Match the whole input line against the current word. A line as long
    /// as the word finishes the attempt, right or wrong.
    pub fn submit_input(&mut self, raw: &str) -> InputOutcome {
        if self.state != SessionState::Playing {
            return InputOutcome::Ignored;
        }

        self.typed = match_input(&self.data.current_word, raw);
        if !self.typed.is_complete() {
            return InputOutcome::Updated;
        }

        let data = std::mem::take(&mut self.data);
        let mut data = reduce(
            data,
            ScoreEvent::WordCompleted {
                typed: &self.typed.typed_text,
                target: &self.typed.target_word,
            },
            &self.rules,
        );
        log::debug!(
            "word {:?} typed as {:?}, score now {}",
            self.typed.target_word,
            self.typed.typed_text,
            data.current_score
        );

        data.current_word = self.words.next_word();
        self.typed = TypedWord::new(&data.current_word);
        self.data = data;

        InputOutcome::WordCompleted
    }

    /// Run the ticks due at `now`, then the command. A decay that empties
    /// the meter at `now` therefore ends the game before input arriving at
    /// the same instant is looked at.
    pub fn handle(&mut self, now: Duration, command: Command<'_>) -> InputOutcome {
        self.advance_to(now);

        match command {
            Command::Start => {
                if self.start(now) {
                    InputOutcome::Started
                } else {
                    InputOutcome::Ignored
                }
            }
            Command::Submit(raw) => self.submit_input(raw),
            Command::ObserveHighScore(score) => {
                if self.observe_high_score(score) {
                    InputOutcome::Updated
                } else {
                    InputOutcome::Ignored
                }
            }
            Command::Advance => InputOutcome::Ignored,
        }
    }

    /// Run every periodic task that is due at `now`, in order. Returns how
    /// many ticks were applied.
    pub fn advance_to(&mut self, now: Duration) -> usize {
        let mut applied = 0;
        while let Some(tick) = self.tasks.pop_due(now) {
            if self.on_tick(tick) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one tick. Ticks from an earlier generation, or arriving when
    /// not playing, change nothing.
    pub fn on_tick(&mut self, tick: Tick) -> bool {
        if tick.generation != self.tasks.generation() || self.state != SessionState::Playing {
            log::trace!("dropping stale {:?} tick", tick.kind);
            return false;
        }

        let data = std::mem::take(&mut self.data);
        match tick.kind {
            TaskKind::Decay => {
                self.data = reduce(data, ScoreEvent::Decay, &self.rules);
                if self.data.is_exhausted() {
                    self.end();
                }
            }
            TaskKind::Difficulty => {
                let level = data.level;
                self.data = reduce(data, ScoreEvent::Elapse, &self.rules);
                if self.data.level > level {
                    log::debug!(
                        "level {} at {}s, decay rate {}",
                        self.data.level,
                        self.data.elapsed_seconds,
                        self.data.decrease_rate
                    );
                }
            }
        }

        true
    }

    /// The ghost caught up: freeze the clock and settle the high score
    fn end(&mut self) {
        self.tasks.cancel();
        self.data.final_score = self.data.current_score;
        self.state = SessionState::GameOver;

        log::info!(
            "game over after {}s at level {}, score {}",
            self.data.elapsed_seconds,
            self.data.level,
            self.data.final_score
        );

        let score = self.data.final_score;
        if self.data.raise_high_score(score) {
            log::info!("new high score {score}");
            self.gateway.save_local_high_score(score);
            self.gateway.submit_remote_high_score(score);
        }
    }

    /// Fold in a high score seen elsewhere (remote fetch or submit reply).
    /// Never lowers the current value.
    pub fn observe_high_score(&mut self, score: u64) -> bool {
        let raised = self.data.raise_high_score(score);
        if raised {
            log::info!("high score raised to {score} by the remote service");
            self.gateway.save_local_high_score(score);
        }
        raised
    }

    /// Stop all periodic work, whatever state the session is in
    pub fn teardown(&mut self) {
        self.tasks.cancel();
    }
}
