//! Command line layer: argument parsing, backend wiring and terminal rendering.
//!
//! - [`setup`]: clap definitions
//! - `commands`: dispatch from parsed arguments to [`robopedia::api::RobopediaApi`]
//! - `render`: plain-text views of records and messages
//! - `styles`: the console styles used by `render`

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
