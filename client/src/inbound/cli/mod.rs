//! Command-line inbound adapter.
//!
//! Each command maps onto a page route and is refused when that route would
//! be. Output goes to the writer handed to [`CliApp::run`]; notifications go
//! to a [`TerminalNotifier`].

mod app;
mod args;
mod files;
mod notifier;
mod render;

pub use app::{AppOptions, Backend, CliApp};
pub use args::{Cli, Command, FavoriteAction, LoginArgs, ProfileAction, RoleArg, SortArg};
pub use notifier::TerminalNotifier;
