pub use context::{Paths, ShellContext};
pub use error::Error;

pub mod context;
pub mod error;

/// Maximum number of jobs the shell keeps track of at the same time.
pub const MAX_JOBS: usize = 16;

/// Number of input lines kept in the per-user history.
pub const HISTORY_LEN: usize = 10;

pub const PROMPT: &str = "tsh> ";
