pub mod hint;
pub mod next;
pub mod submit;
