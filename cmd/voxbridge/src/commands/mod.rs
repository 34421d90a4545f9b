//! CLI commands module.

mod config;
mod inspect;
mod stream;
mod util;

pub use config::ConfigCommand;
pub use inspect::InspectCommand;
pub use stream::StreamCommand;

pub(crate) use util::*;
