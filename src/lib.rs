//! Pig-farming chat game backend: daily growth, duels, and leaderboards,
//! served to a transport gateway over a small JSON API.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod texts;
