//! Scoring, leveling, streaks and question selection for the quiz loop.

pub mod leveling;
pub mod policy;
pub mod selection;
pub mod streak;
pub mod submission;

pub use leveling::{LevelSync, persist_level, sync_level};
pub use policy::XpPolicy;
pub use submission::{SubmissionOutcome, submit_answer};
