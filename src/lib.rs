#[macro_use]
mod macros;
pub(crate) mod auth;
pub(crate) mod cli;
pub(crate) mod common;
pub(crate) mod cutils;
pub(crate) mod history;
pub(crate) mod jobs;
pub(crate) mod log;
pub(crate) mod procfs;
pub(crate) mod system;

mod shell;

pub use shell::main as tsh_main;
