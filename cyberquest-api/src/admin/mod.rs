//! Admin-only question and user management.

pub mod questions;
pub mod users;
