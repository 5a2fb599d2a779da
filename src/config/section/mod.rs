//! `freeze.toml` sections.

mod build;
mod freeze;
mod grammar;

pub use build::{BuildConfig, TECHNOLOGIES};
pub use freeze::FreezeSectionConfig;
pub use grammar::GrammarConfig;
