pub mod level;
pub mod progress;
pub mod question;
pub mod user;
