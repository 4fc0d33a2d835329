//! Table output.

use comfy_table::{Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use mon_ledger::{Account, Balance};
use std::collections::BTreeMap;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

fn date_or_blank(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

pub fn accounts(accounts: &[Account]) -> Table {
    let mut table = table(vec!["ID", "Name", "Currency", "Opened", "Closed"]);
    for account in accounts {
        table.add_row(vec![
            account.id.to_string(),
            account.details.name.clone(),
            account.details.currency.to_string(),
            account.details.opened.to_string(),
            date_or_blank(account.details.closed),
        ]);
    }
    table
}

/// Accounts paired with the balance they held at some date.
pub fn accounts_with_balance(rows: &[(&Account, &Balance)]) -> Table {
    let mut table = table(vec!["ID", "Name", "Currency", "Date", "Amount"]);
    for (account, balance) in rows {
        table.add_row(vec![
            account.id.to_string(),
            account.details.name.clone(),
            account.details.currency.to_string(),
            balance.details.date.to_string(),
            balance.details.amount.to_string(),
        ]);
    }
    table
}

/// Per-currency sums of the given balances, ordered by currency code.
pub fn currency_totals(rows: &[(&Account, &Balance)]) -> Option<Table> {
    if rows.is_empty() {
        return None;
    }
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for (account, balance) in rows {
        *totals.entry(account.details.currency.as_str()).or_default() += balance.details.amount;
    }

    let mut table = table(vec!["Currency", "Amount"]);
    for (currency, amount) in totals {
        table.add_row(vec![currency.to_string(), amount.to_string()]);
    }
    Some(table)
}

pub fn balances(balances: &[Balance]) -> Table {
    let mut table = table(vec!["ID", "Date", "Amount", "Note"]);
    for balance in balances {
        table.add_row(vec![
            balance.id.to_string(),
            balance.details.date.to_string(),
            balance.details.amount.to_string(),
            balance.details.note.clone(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mon_core::{AccountId, BalanceId};
    use mon_ledger::{AccountDetails, BalanceDetails};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn account(name: &str, currency: &str) -> Account {
        Account::new(
            AccountId::new(),
            AccountDetails::new(name, currency.parse().expect("currency"), date(2020, 1, 1)),
        )
    }

    fn balance(account: &Account, amount: i64) -> Balance {
        Balance::new(
            BalanceId::new(),
            account.id,
            BalanceDetails::new(date(2020, 6, 1), amount),
        )
    }

    #[test]
    fn totals_are_summed_per_currency() {
        let current = account("Current", "GBP");
        let savings = account("Savings", "GBP");
        let travel = account("Travel", "EUR");
        let b1 = balance(&current, 1_000);
        let b2 = balance(&savings, 2_500);
        let b3 = balance(&travel, 300);

        let table = currency_totals(&[(&current, &b1), (&savings, &b2), (&travel, &b3)])
            .expect("totals")
            .to_string();

        let eur = table.find("EUR").expect("EUR row");
        let gbp = table.find("GBP").expect("GBP row");
        assert!(eur < gbp);
        assert!(table.contains("3500"));
        assert!(table.contains("300"));
    }

    #[test]
    fn no_totals_without_balances() {
        assert!(currency_totals(&[]).is_none());
    }

    #[test]
    fn accounts_table_lists_every_account() {
        let rendered = accounts(&[account("Current", "GBP"), account("Travel", "EUR")]).to_string();
        assert!(rendered.contains("Current"));
        assert!(rendered.contains("Travel"));
    }
}
