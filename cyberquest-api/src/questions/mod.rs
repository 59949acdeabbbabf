pub mod create;
pub mod generate;
pub mod get;
pub mod upload;
