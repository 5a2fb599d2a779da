//! Content-addressed asset freezing.
//!
//! Source files are tokenized, references found in them are resolved
//! against the project, and every referenced file is rewritten into a
//! freeze directory under a name derived from its checksum. References
//! to other markup files are built recursively before they are frozen.
//!
//! ```text
//! page.xsl ──► grammar ──► tech matchers ──► freezer ──► freeze/<digest>.css
//!                                              │
//!                                              └─► recurse into included .xsl
//! ```

pub mod cli;
pub mod config;
pub mod digest;
pub mod freeze;
pub mod fs;
pub mod grammar;
pub mod logger;
pub mod scheduler;
pub mod tech;
