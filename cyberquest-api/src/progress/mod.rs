pub mod leaderboard;
pub mod levels;
pub mod stats;
