//! Command implementations.

use crate::cli::{AccountCommands, AccountsArgs, BalanceCommands, Cli, Commands};
use crate::client::{MonClient, fetch_login_url};
use crate::error::CliError;
use crate::table;
use crate::token::{StoredToken, default_token_file};
use chrono::{Local, NaiveDate};
use mon_core::{AccountId, BalanceId};
use mon_ledger::{Account, AccountDetails, Balance, BalanceDetails, balance_at, sort_balances};
use rootcause::prelude::{Report, ResultExt};
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Runs the parsed command, writing results to `out`.
///
/// # Errors
///
/// Returns a report describing the first step that failed.
pub async fn run(
    cli: Cli,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Report<CliError>> {
    let token_file = match cli.token_file {
        Some(path) => path,
        None => default_token_file().ok_or(CliError::MissingSetting {
            setting: "token file",
        })?,
    };

    match cli.command {
        Commands::Login { auth_server_url } => {
            login(&auth_server_url, &token_file, input, out).await
        }
        Commands::Accounts(args) => {
            let client = connect(&cli.server_url, &token_file)?;
            accounts(&client, &args, today(), out).await
        }
        Commands::Account(command) => {
            account(&connect(&cli.server_url, &token_file)?, command, out).await
        }
        Commands::Balances { account_id } => {
            let client = connect(&cli.server_url, &token_file)?;
            let mut balances = client.balances(parse_id(&account_id)?).await?;
            sort_balances(&mut balances);
            print(out, table::balances(&balances))
        }
        Commands::Balance(command) => {
            balance(&connect(&cli.server_url, &token_file)?, command, out).await
        }
    }
}

fn connect(server_url: &str, token_file: &Path) -> Result<MonClient, Report<CliError>> {
    let token = StoredToken::read(token_file)?.map(|stored| stored.token);
    if token.is_none() {
        info!(path = %token_file.display(), "no stored token, sending requests without one");
    }
    MonClient::new(server_url, token)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_id<T>(id: &str) -> Result<T, Report<CliError>>
where
    T: FromStr<Err = mon_core::ParseIdError>,
{
    T::from_str(id).context(CliError::InvalidArgument { name: "id" })
}

fn print(out: &mut impl Write, value: impl std::fmt::Display) -> Result<(), Report<CliError>> {
    writeln!(out, "{value}").context(CliError::Output)
}

/// Fetches a login URL, then stores the token the user pastes back.
pub async fn login(
    auth_server_url: &str,
    token_file: &Path,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Report<CliError>> {
    if auth_server_url.trim().is_empty() {
        return Err(CliError::MissingSetting {
            setting: "auth server url",
        }
        .into());
    }

    let login_url = fetch_login_url(auth_server_url).await?;
    print(
        out,
        format!(
            "Go to the following url in your browser to authenticate:\n{login_url}\n\
             If login is successful, paste the output here..."
        ),
    )?;
    out.flush().context(CliError::Output)?;

    let mut pasted = String::new();
    input.read_line(&mut pasted).context(CliError::Input)?;

    let stored = StoredToken::parse(&pasted)?;
    stored.write(token_file)?;
    print(out, format!("Token saved to {}", token_file.display()))
}

/// Lists accounts that existed at the date, optionally with their balance
/// at that date and per-currency totals.
pub async fn accounts(
    client: &MonClient,
    args: &AccountsArgs,
    today: NaiveDate,
    out: &mut impl Write,
) -> Result<(), Report<CliError>> {
    let at = args.at_date.unwrap_or(today);
    let accounts: Vec<Account> = client
        .accounts()
        .await?
        .into_iter()
        .filter(|a| a.details.existed_at(at))
        .filter(|a| !args.open || a.details.open_at(at))
        .collect();

    if args.quiet {
        for account in &accounts {
            print(out, account.id)?;
        }
        return Ok(());
    }

    if !args.balances {
        return print(out, table::accounts(&accounts));
    }

    let mut held: Vec<(Account, Balance)> = Vec::new();
    for account in accounts {
        let mut balances = client.balances(account.id).await?;
        if balances.is_empty() {
            warn!(account_id = %account.id, "no balances for account");
            continue;
        }
        sort_balances(&mut balances);
        match balance_at(&balances, at) {
            Some(balance) => {
                let balance = balance.clone();
                held.push((account, balance));
            }
            None => warn!(account_id = %account.id, date = %at, "no balance at date"),
        }
    }

    let rows: Vec<(&Account, &Balance)> = held.iter().map(|(a, b)| (a, b)).collect();
    print(out, table::accounts_with_balance(&rows))?;
    if let Some(totals) = table::currency_totals(&rows) {
        print(out, totals)?;
    }
    Ok(())
}

async fn account(
    client: &MonClient,
    command: AccountCommands,
    out: &mut impl Write,
) -> Result<(), Report<CliError>> {
    match command {
        AccountCommands::Show { id } => {
            let account = client.account(parse_id::<AccountId>(&id)?).await?;
            print(out, table::accounts(&[account]))
        }
        AccountCommands::Add {
            name,
            currency,
            opened,
            closed,
        } => {
            let details = AccountDetails {
                name,
                currency,
                opened: opened.unwrap_or_else(today),
                closed,
            };
            let account = client.create_account(&details).await?;
            print(out, table::accounts(&[account]))
        }
        AccountCommands::Delete { id } => {
            let id = parse_id::<AccountId>(&id)?;
            client.delete_account(id).await?;
            print(out, format!("Deleted account {id}"))
        }
    }
}

async fn balance(
    client: &MonClient,
    command: BalanceCommands,
    out: &mut impl Write,
) -> Result<(), Report<CliError>> {
    match command {
        BalanceCommands::Show { id } => {
            let balance = client.balance(parse_id::<BalanceId>(&id)?).await?;
            print(out, table::balances(&[balance]))
        }
        BalanceCommands::Add {
            account_id,
            amount,
            date,
            note,
        } => {
            let details =
                BalanceDetails::new(date.unwrap_or_else(today), amount).with_note(note);
            let balance = client
                .add_balance(parse_id::<AccountId>(&account_id)?, &details)
                .await?;
            print(out, table::balances(&[balance]))
        }
        BalanceCommands::Delete { id } => {
            let id = parse_id::<BalanceId>(&id)?;
            client.delete_balance(id).await?;
            print(out, format!("Deleted balance {id}"))
        }
    }
}
