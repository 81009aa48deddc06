use clap::Parser;
use spectype::{
    app_dirs::AppDirs,
    persist::SqliteScoreStore,
    server::{router, AppState},
};
use std::{error::Error, path::PathBuf};
use tokio::net::TcpListener;

/// HTTP high score service for spectype
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// address to listen on
    #[clap(short, long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// sqlite database holding the scores
    #[clap(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let db = cli.db.unwrap_or_else(AppDirs::server_db_path);

    let store = SqliteScoreStore::open(&db)?;
    log::info!("scores kept in {}", db.display());

    let listener = TcpListener::bind(&cli.bind).await?;
    log::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(Box::new(store)))).await?;

    Ok(())
}
