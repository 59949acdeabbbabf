/// Display helpers for stats and progress views.
pub mod formatting;
/// Pure parser helpers for query strings, CSV cells and env values.
pub mod parse;
/// Shared time helpers.
pub mod time;
