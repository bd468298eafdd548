use stack_filter::ConfigError;
use stack_prt::{OptionsError, PrtError};
use std::io;
use thiserror::Error;

/// Errors that stop a command of the session from completing.
#[derive(Debug, Error)]
pub enum Error {
    /// A filter pipeline could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A potential response tree could not be loaded.
    #[error(transparent)]
    Prt(#[from] PrtError),

    /// A question option could not be set.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// Filter settings were not valid JSON.
    #[error("invalid filter settings: {0}")]
    Settings(#[from] serde_json::Error),

    /// A file could not be read.
    #[error("could not read `{path}`: {source}")]
    Io { path: String, source: io::Error },

    /// The command is missing an argument.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// No command has the given name.
    #[error("unknown command `:{0}`, try `:help`")]
    UnknownCommand(String),

    /// `:eval` was used before a tree was loaded.
    #[error("no potential response tree loaded, use `:load <file>`")]
    NoPrt,
}
