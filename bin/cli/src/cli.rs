//! Command line arguments.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use mon_ledger::Currency;
use std::path::PathBuf;

/// Command line client for the mon ledger.
#[derive(Parser, Debug)]
#[command(name = "moncli", version, about = "Manage mon ledger accounts and balances")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the mon server
    #[arg(long, global = true, env = "MON_SERVER_URL", default_value = "")]
    pub server_url: String,

    /// File holding the token saved by `moncli login`
    #[arg(long, global = true, env = "MON_AUTH_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in through the auth server and save the token
    Login {
        /// Base URL of the server exposing /loginurl
        #[arg(long, env = "MON_AUTH_SERVER_URL")]
        auth_server_url: String,
    },

    /// List accounts
    Accounts(AccountsArgs),

    /// Show, add or delete an account
    #[command(subcommand)]
    Account(AccountCommands),

    /// List an account's balances
    Balances {
        /// Account ID
        account_id: String,
    },

    /// Show, add or delete a balance
    #[command(subcommand)]
    Balance(BalanceCommands),
}

#[derive(Args, Debug, Default)]
pub struct AccountsArgs {
    /// Show only accounts open at the date
    #[arg(long)]
    pub open: bool,

    /// Print only account IDs
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Date to filter and show balances at (YYYY-MM-DD), today if unset
    #[arg(long)]
    pub at_date: Option<NaiveDate>,

    /// Show each account's balance at the date
    #[arg(long, short = 'b')]
    pub balances: bool,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Show an account
    Show {
        /// Account ID
        id: String,
    },

    /// Add an account
    Add {
        /// Account name
        #[arg(long)]
        name: String,

        /// Three letter currency code, e.g. GBP
        #[arg(long)]
        currency: Currency,

        /// Opening date (YYYY-MM-DD), today if unset
        #[arg(long)]
        opened: Option<NaiveDate>,

        /// Closing date (YYYY-MM-DD)
        #[arg(long)]
        closed: Option<NaiveDate>,
    },

    /// Delete an account and its balances
    Delete {
        /// Account ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BalanceCommands {
    /// Show a balance
    Show {
        /// Balance ID
        id: String,
    },

    /// Record a balance against an account
    Add {
        /// Account ID
        account_id: String,

        /// Amount in minor units, e.g. pence
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,

        /// Date of the balance (YYYY-MM-DD), today if unset
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free text note
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Delete a balance
    Delete {
        /// Balance ID
        id: String,
    },
}
