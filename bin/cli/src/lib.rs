//! Command line client for the mon ledger.
//!
//! `moncli login` stores the identity token handed out by the server's login
//! callback; every other command calls the ledger API with it as a bearer
//! token.

pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod table;
pub mod token;

pub use cli::Cli;
pub use commands::run;
pub use error::CliError;
