// Runs the high score service on an ephemeral port and talks to it the way
// the game does, through the blocking HTTP client.

use serde_json::{json, Value};
use spectype::persist::{
    HttpRemoteScores, MemoryScoreStore, PersistError, RemoteScores, ScoreStore, SqliteScoreStore,
};
use spectype::server::{router, AppState};

fn spawn_server(store: Box<dyn ScoreStore + Send>) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router(AppState::new(store)))
                .await
                .unwrap();
        });
    });

    format!("http://{addr}")
}

#[test]
fn fetch_reports_stored_high_score() {
    let url = spawn_server(Box::new(MemoryScoreStore::with_score(12)));
    let client = HttpRemoteScores::new(&url).unwrap();

    assert_eq!(client.fetch().unwrap(), 12);
}

#[test]
fn submit_keeps_the_best_score() {
    let url = spawn_server(Box::new(SqliteScoreStore::in_memory().unwrap()));
    let client = HttpRemoteScores::new(&url).unwrap();

    assert_eq!(client.fetch().unwrap(), 0);
    assert_eq!(client.submit(42).unwrap(), 42);
    assert_eq!(client.submit(17).unwrap(), 42);
    assert_eq!(client.fetch().unwrap(), 42);
}

#[test]
fn trailing_slash_in_base_url_is_fine() {
    let url = spawn_server(Box::new(MemoryScoreStore::with_score(3)));
    let client = HttpRemoteScores::new(&format!("{url}/")).unwrap();

    assert_eq!(client.fetch().unwrap(), 3);
}

#[test]
fn negative_score_is_rejected() {
    let url = spawn_server(Box::new(MemoryScoreStore::with_score(9)));
    let http = reqwest::blocking::Client::new();

    let response = http
        .post(format!("{url}/api/highscore"))
        .json(&json!({ "score": -1 }))
        .send()
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().unwrap();
    assert_eq!(body["message"], "Invalid score");

    let client = HttpRemoteScores::new(&url).unwrap();
    assert_eq!(client.fetch().unwrap(), 9);
}

#[test]
fn malformed_body_is_rejected() {
    let url = spawn_server(Box::new(MemoryScoreStore::new()));
    let http = reqwest::blocking::Client::new();

    let response = http
        .post(format!("{url}/api/highscore"))
        .header("content-type", "application/json")
        .body("{ score: ")
        .send()
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = http
        .post(format!("{url}/api/highscore"))
        .json(&json!({ "points": 5 }))
        .send()
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[test]
fn camel_case_response_body() {
    let url = spawn_server(Box::new(MemoryScoreStore::with_score(21)));

    let body: Value = reqwest::blocking::get(format!("{url}/api/highscore"))
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(body, json!({ "highScore": 21 }));
}

#[test]
fn unreachable_server_is_an_http_error() {
    // bind then drop, so nothing is listening on the port
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = HttpRemoteScores::new(&format!("http://{addr}")).unwrap();

    assert!(matches!(client.fetch(), Err(PersistError::Http(_))));
}
