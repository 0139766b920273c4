//! Draftroom Gateway - authenticating edge in front of the studio

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod middleware;
pub mod proxy;
pub mod session_store;
pub mod state;

pub use state::AppState;
