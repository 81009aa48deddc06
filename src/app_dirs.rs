use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("spectype"),
            )
        } else {
            ProjectDirs::from("", "", "spectype")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    /// The player's own best score
    pub fn high_score_db_path() -> PathBuf {
        Self::in_state_dir("highscore.db")
    }

    /// Scores kept by `spectype-server`
    pub fn server_db_path() -> PathBuf {
        Self::in_state_dir("server.db")
    }

    pub fn log_path() -> PathBuf {
        Self::in_state_dir("spectype.log")
    }

    fn in_state_dir(file: &str) -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join(file))
            .unwrap_or_else(|| PathBuf::from(format!("spectype_{file}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_share_one_directory() {
        let db = AppDirs::high_score_db_path();
        let log = AppDirs::log_path();

        assert_eq!(db.parent(), log.parent());
        assert!(db.ends_with("highscore.db"));
        assert_ne!(AppDirs::server_db_path(), db);
    }
}
