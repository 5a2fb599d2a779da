//! Command-line front end.

mod args;
pub mod build;
pub mod inspect;

pub use args::{Cli, Commands};
