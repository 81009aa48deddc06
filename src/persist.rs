//! High score persistence: a durable local store, the remote high-score
//! service, and the gateway the game session talks to.
//!
//! Game logic never sees a persistence error. Local reads fall back to 0,
//! and remote calls run on a detached thread whose only visible effect is an
//! [`AppEvent::HighScore`] posted back into the event loop on success.

use crate::runtime::AppEvent;
use chrono::Local;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("score database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("high score service unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("high score service answered {0}")]
    Status(u16),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("score {0} is too large to store")]
    ScoreTooLarge(u64),
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// Wire shape of every successful high score response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreBody {
    pub high_score: u64,
}

/// Wire shape of a high score submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub score: u64,
}

/// Somewhere a best score is kept
pub trait ScoreStore {
    fn high_score(&self) -> Result<u64>;
    /// Keep `score` if it beats the stored one; returns the best score after
    /// the call
    fn record(&self, score: u64) -> Result<u64>;
}

/// Scores kept in a sqlite file, one row per new record
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
}

impl SqliteScoreStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS high_scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                score INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }
}

impl ScoreStore for SqliteScoreStore {
    fn high_score(&self) -> Result<u64> {
        let best: Option<i64> =
            self.conn
                .query_row("SELECT MAX(score) FROM high_scores", [], |row| row.get(0))?;
        Ok(best.map_or(0, |s| s.max(0) as u64))
    }

    fn record(&self, score: u64) -> Result<u64> {
        let score = i64::try_from(score).map_err(|_| PersistError::ScoreTooLarge(score))?;
        // single statement, so the compare and the insert cannot interleave
        self.conn.execute(
            r#"
            INSERT INTO high_scores (score, recorded_at)
            SELECT ?1, ?2
            WHERE ?1 > COALESCE((SELECT MAX(score) FROM high_scores), 0)
            "#,
            params![score, Local::now().to_rfc3339()],
        )?;

        self.high_score()
    }
}

/// Process-local store, mostly for tests and throwaway servers
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    best: AtomicU64,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u64) -> Self {
        Self {
            best: AtomicU64::new(score),
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn high_score(&self) -> Result<u64> {
        Ok(self.best.load(Ordering::SeqCst))
    }

    fn record(&self, score: u64) -> Result<u64> {
        let previous = self.best.fetch_max(score, Ordering::SeqCst);
        Ok(previous.max(score))
    }
}

/// The remote high-score service. Calls block; the gateway keeps them off
/// the game loop.
pub trait RemoteScores: Send + Sync {
    fn fetch(&self) -> Result<u64>;
    fn submit(&self, score: u64) -> Result<u64>;
}

pub struct HttpRemoteScores {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpRemoteScores {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:5000`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            endpoint: format!("{}/api/highscore", base_url.trim_end_matches('/')),
            client,
        })
    }

    fn read(response: reqwest::blocking::Response) -> Result<u64> {
        let status = response.status();
        if !status.is_success() {
            return Err(PersistError::Status(status.as_u16()));
        }

        Ok(response.json::<HighScoreBody>()?.high_score)
    }
}

impl RemoteScores for HttpRemoteScores {
    fn fetch(&self) -> Result<u64> {
        Self::read(self.client.get(&self.endpoint).send()?)
    }

    fn submit(&self, score: u64) -> Result<u64> {
        Self::read(
            self.client
                .post(&self.endpoint)
                .json(&ScoreSubmission { score })
                .send()?,
        )
    }
}

/// What the game session needs from persistence. None of these report
/// failure to the caller.
pub trait ScoreGateway {
    fn load_local_high_score(&self) -> u64;
    fn save_local_high_score(&self, score: u64);
    /// Fire and forget; a reply, if any, arrives later as an event
    fn fetch_remote_high_score(&self);
    /// Fire and forget; a reply, if any, arrives later as an event
    fn submit_remote_high_score(&self, score: u64);
}

pub struct Gateway {
    local: Box<dyn ScoreStore>,
    remote: Option<Arc<dyn RemoteScores>>,
    events: Sender<AppEvent>,
}

impl Gateway {
    pub fn new(
        local: Box<dyn ScoreStore>,
        remote: Option<Arc<dyn RemoteScores>>,
        events: Sender<AppEvent>,
    ) -> Self {
        Self {
            local,
            remote,
            events,
        }
    }

    /// Local store only; remote calls become no-ops
    pub fn offline(local: Box<dyn ScoreStore>, events: Sender<AppEvent>) -> Self {
        Self::new(local, None, events)
    }

    fn detach<F>(&self, what: &'static str, call: F)
    where
        F: FnOnce(&dyn RemoteScores) -> Result<u64> + Send + 'static,
    {
        let Some(remote) = self.remote.clone() else {
            return;
        };
        let events = self.events.clone();

        std::thread::spawn(move || match call(remote.as_ref()) {
            Ok(high_score) => {
                log::debug!("{what} high score: remote reports {high_score}");
                // loop may already be gone at shutdown
                let _ = events.send(AppEvent::HighScore(high_score));
            }
            Err(e) => log::warn!("failed to {what} high score: {e}"),
        });
    }
}

impl ScoreGateway for Gateway {
    fn load_local_high_score(&self) -> u64 {
        self.local.high_score().unwrap_or_else(|e| {
            log::warn!("could not read local high score: {e}");
            0
        })
    }

    fn save_local_high_score(&self, score: u64) {
        if let Err(e) = self.local.record(score) {
            log::warn!("could not save local high score {score}: {e}");
        }
    }

    fn fetch_remote_high_score(&self) {
        self.detach("fetch", |remote| remote.fetch());
    }

    fn submit_remote_high_score(&self, score: u64) {
        self.detach("submit", move |remote| remote.submit(score));
    }
}
