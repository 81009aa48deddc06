// Library surface shared by both binaries and the integration tests.
// Terminal rendering stays in main.rs; everything here runs headless.
pub mod app_dirs;
pub mod config;
pub mod matcher;
pub mod persist;
pub mod runtime;
pub mod scoring;
pub mod server;
pub mod session;
pub mod timer;
pub mod words;
