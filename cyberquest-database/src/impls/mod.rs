pub mod leaderboard;
pub mod levels;
pub mod progress;
pub mod questions;
pub mod users;
