use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use spectype::persist::{Gateway, MemoryScoreStore, RemoteScores, Result as PersistResult};
use spectype::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use spectype::scoring::Rules;
use spectype::session::{Command, InputOutcome, Session, SessionState};
use spectype::timer::{Clock, ManualClock};
use spectype::words::ScriptedWords;

// Headless integration using the runtime + Session without a TTY. Each step
// moves a manual clock forward and hands whatever event the runner produced
// to `Session::handle`, which runs due ticks before the event.

type TestSession = Session<ScriptedWords, Gateway>;

struct Harness {
    session: TestSession,
    runner: Runner<TestEventSource, FixedTicker>,
    clock: ManualClock,
    input: String,
}

impl Harness {
    fn new(words: &[&str], high_score: u64, remote: Option<Arc<dyn RemoteScores>>) -> Self {
        Self::with_rules(words, high_score, remote, Rules::default())
    }

    fn with_rules(
        words: &[&str],
        high_score: u64,
        remote: Option<Arc<dyn RemoteScores>>,
        rules: Rules,
    ) -> Self {
        let runner = Runner::new(
            TestEventSource::new(),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let gateway = Gateway::new(
            Box::new(MemoryScoreStore::with_score(high_score)),
            remote,
            runner.sender(),
        );
        let session = Session::new(
            ScriptedWords::new(words.iter().copied()),
            gateway,
            rules,
        );

        Self {
            session,
            runner,
            clock: ManualClock::new(),
            input: String::new(),
        }
    }

    fn send_keys(&self, s: &str) {
        let tx = self.runner.sender();
        for c in s.chars() {
            tx.send(AppEvent::Key(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )))
            .unwrap();
        }
    }

    fn step(&mut self, by: Duration) {
        let event = self.runner.step(Some(Duration::ZERO));
        self.clock.advance(by);
        let now = self.clock.now();

        match event {
            AppEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    self.input.push(c);
                    match self.session.handle(now, Command::Submit(&self.input)) {
                        InputOutcome::Updated | InputOutcome::Started => {}
                        InputOutcome::WordCompleted | InputOutcome::Ignored => self.input.clear(),
                    }
                }
            }
            AppEvent::HighScore(score) => {
                self.session.handle(now, Command::ObserveHighScore(score));
            }
            AppEvent::Resize | AppEvent::Tick => {
                self.session.handle(now, Command::Advance);
            }
        }
    }

    /// Step until the game is over, bounded
    fn run_out(&mut self) {
        for _ in 0..20_000u32 {
            if self.session.state() == SessionState::GameOver {
                return;
            }
            self.step(Duration::from_millis(100));
        }
        panic!("game never ended");
    }
}

#[test]
fn headless_game_ends_and_keeps_high_score() {
    let mut h = Harness::new(&["boo", "fog"], 1, None);
    h.session.start(h.clock.now());

    h.send_keys("boo");
    h.run_out();

    let data = h.session.data();
    assert_eq!(data.final_score, 3);
    assert_eq!(data.high_score, 3);
    assert_eq!(data.progress, 0.0);
    assert!(data.elapsed_seconds > 0);
    assert!(!h.session.is_ticking());
}

#[test]
fn headless_game_over_without_typing() {
    let mut h = Harness::new(&["phantom"], 40, None);
    h.session.start(h.clock.now());
    h.run_out();

    let data = h.session.data();
    assert_eq!(data.final_score, 0);
    assert_eq!(data.high_score, 40);

    // 2 points a second for the first 20s, 3 a second after that
    assert_eq!(data.level, 2);
    assert!((35..=41).contains(&data.elapsed_seconds));
}

#[test]
fn headless_restart_after_game_over() {
    let mut h = Harness::new(&["boo"], 0, None);
    h.session.start(h.clock.now());
    h.run_out();
    let first_generation = h.session.generation();

    assert!(h.session.start(h.clock.now()));
    assert_eq!(h.session.state(), SessionState::Playing);
    assert!(h.session.generation() > first_generation);
    assert_eq!(h.session.data().progress, 100.0);
    assert_eq!(h.session.data().current_score, 0);

    h.step(Duration::from_millis(100));
    assert!(h.session.data().progress < 100.0);
}

#[test]
fn headless_keys_before_start_are_dropped() {
    let mut h = Harness::new(&["boo"], 0, None);

    h.send_keys("boo");
    for _ in 0..3 {
        h.step(Duration::from_millis(100));
    }

    assert_eq!(h.session.state(), SessionState::Idle);
    assert_eq!(h.session.data().current_score, 0);
}

struct FixedRemote(u64);

impl RemoteScores for FixedRemote {
    fn fetch(&self) -> PersistResult<u64> {
        Ok(self.0)
    }

    fn submit(&self, score: u64) -> PersistResult<u64> {
        Ok(score.max(self.0))
    }
}

#[test]
fn headless_remote_high_score_arrives_as_event() {
    let remote: Arc<dyn RemoteScores> = Arc::new(FixedRemote(77));
    let mut h = Harness::new(&["boo"], 5, Some(remote));
    assert_eq!(h.session.data().high_score, 5);

    // the fetch runs on its own thread; its reply comes through the runner
    for _ in 0..200u32 {
        if h.session.data().high_score == 77 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
        h.step(Duration::ZERO);
    }

    assert_eq!(h.session.data().high_score, 77);
    assert_eq!(h.session.state(), SessionState::Idle);
}

#[test]
fn headless_lower_remote_score_never_lowers() {
    let mut h = Harness::new(&["boo"], 50, None);

    h.runner.sender().send(AppEvent::HighScore(12)).unwrap();
    h.step(Duration::ZERO);

    assert_eq!(h.session.data().high_score, 50);
}

#[test]
fn headless_key_on_the_decay_deadline_is_too_late() {
    // a single decay tick empties the meter
    let rules = Rules {
        base_decrease_rate: 500.0,
        ..Rules::default()
    };
    let mut h = Harness::with_rules(&["b"], 0, None, rules);
    h.session.handle(h.clock.now(), Command::Start);
    let deadline = h.session.next_deadline().unwrap();

    // the key is already queued when the clock reaches the deadline
    h.send_keys("b");
    h.step(deadline);

    assert_eq!(h.session.state(), SessionState::GameOver);
    assert_eq!(h.session.data().final_score, 0);
    assert_eq!(h.input, "");
}

#[test]
fn headless_key_just_before_the_deadline_counts() {
    let rules = Rules {
        base_decrease_rate: 500.0,
        ..Rules::default()
    };
    let mut h = Harness::with_rules(&["b"], 0, None, rules);
    h.session.handle(h.clock.now(), Command::Start);
    let deadline = h.session.next_deadline().unwrap();

    h.send_keys("b");
    h.step(deadline - Duration::from_millis(1));

    assert_eq!(h.session.data().current_score, 1);
    h.step(Duration::from_millis(1));
    assert_eq!(h.session.state(), SessionState::GameOver);
    assert_eq!(h.session.data().final_score, 1);
}
