//! PostgreSQL storage for accounts and balances.

use async_trait::async_trait;
use chrono::NaiveDate;
use mon_core::{AccountId, BalanceId, Result};
use mon_ledger::{Account, AccountDetails, Balance, BalanceDetails, Currency, LedgerError, LedgerStore};
use rootcause::prelude::Report;
use sqlx::{FromRow, PgConnection, PgPool, postgres::PgExecutor};
use std::str::FromStr;
use tracing::instrument;

/// Row type for account queries.
#[derive(FromRow)]
struct AccountRow {
    id: String,
    name: String,
    currency: String,
    opened: NaiveDate,
    closed: Option<NaiveDate>,
}

impl AccountRow {
    fn try_into_account(self) -> std::result::Result<Account, sqlx::Error> {
        let id = AccountId::from_str(&self.id).map_err(|e| decode_error(&self.id, e))?;
        let currency = Currency::from_str(&self.currency).map_err(|e| decode_error(&self.id, e))?;
        Ok(Account {
            id,
            details: AccountDetails {
                name: self.name,
                currency,
                opened: self.opened,
                closed: self.closed,
            },
        })
    }
}

/// Row type for balance queries.
#[derive(FromRow)]
struct BalanceRow {
    id: String,
    account_id: String,
    date: NaiveDate,
    amount: i64,
    note: String,
}

impl BalanceRow {
    fn try_into_balance(self) -> std::result::Result<Balance, sqlx::Error> {
        let id = BalanceId::from_str(&self.id).map_err(|e| decode_error(&self.id, e))?;
        let account_id =
            AccountId::from_str(&self.account_id).map_err(|e| decode_error(&self.id, e))?;
        Ok(Balance::new(
            id,
            account_id,
            BalanceDetails::new(self.date, self.amount).with_note(self.note),
        ))
    }
}

fn decode_error(row_id: &str, err: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid row '{row_id}': {err}"),
    )))
}

fn storage_error(err: sqlx::Error) -> Report<LedgerError> {
    LedgerError::Storage {
        details: err.to_string(),
    }
    .into()
}

/// Writes that check an account's open window lock the account row first:
/// `FOR UPDATE` when changing the window, `FOR SHARE` when adding a balance.
const LOCK_ACCOUNT_FOR_UPDATE: &str = r#"
    SELECT id, name, currency, opened, closed
    FROM accounts
    WHERE id = $1
    FOR UPDATE
"#;
const LOCK_ACCOUNT_FOR_SHARE: &str = r#"
    SELECT id, name, currency, opened, closed
    FROM accounts
    WHERE id = $1
    FOR SHARE
"#;

async fn lock_account(
    conn: &mut PgConnection,
    id: AccountId,
    query: &'static str,
) -> Result<Account, LedgerError> {
    let row: Option<AccountRow> = sqlx::query_as(query)
        .bind(id.to_string())
        .fetch_optional(conn)
        .await
        .map_err(storage_error)?;

    match row {
        Some(row) => row.try_into_account().map_err(storage_error),
        None => Err(LedgerError::AccountNotFound { id }.into()),
    }
}

async fn fetch_account_balances<'e>(
    executor: impl PgExecutor<'e>,
    account_id: AccountId,
) -> Result<Vec<Balance>, LedgerError> {
    let rows: Vec<BalanceRow> = sqlx::query_as(
        r#"
        SELECT id, account_id, date, amount, note
        FROM balances
        WHERE account_id = $1
        ORDER BY date, id
        "#,
    )
    .bind(account_id.to_string())
    .fetch_all(executor)
    .await
    .map_err(storage_error)?;

    rows.into_iter()
        .map(BalanceRow::try_into_balance)
        .collect::<std::result::Result<_, _>>()
        .map_err(storage_error)
}

/// [`LedgerStore`] backed by PostgreSQL.
///
/// Ids are stored in their prefixed text form, so ordering by id orders by
/// creation time.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Creates a new ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    #[instrument(skip_all)]
    async fn insert_account(&self, details: AccountDetails) -> Result<Account, LedgerError> {
        let id = AccountId::new();
        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, currency, opened, closed)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.to_string())
        .bind(&details.name)
        .bind(details.currency.as_str())
        .bind(details.opened)
        .bind(details.closed)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Account { id, details })
    }

    async fn select_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, name, currency, opened, closed
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(AccountRow::try_into_account)
            .transpose()
            .map_err(storage_error)
    }

    async fn select_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, name, currency, opened, closed
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(AccountRow::try_into_account)
            .collect::<std::result::Result<_, _>>()
            .map_err(storage_error)
    }

    #[instrument(skip(self, details))]
    async fn update_account(
        &self,
        id: AccountId,
        details: AccountDetails,
    ) -> Result<Account, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        lock_account(&mut tx, id, LOCK_ACCOUNT_FOR_UPDATE).await?;
        let balances = fetch_account_balances(&mut *tx, id).await?;
        details.validate_balances(&balances)?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2, currency = $3, opened = $4, closed = $5
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(&details.name)
        .bind(details.currency.as_str())
        .bind(details.opened)
        .bind(details.closed)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(Account { id, details })
    }

    #[instrument(skip(self))]
    async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        // Balances go with the account through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::AccountNotFound { id }.into());
        }
        Ok(())
    }

    #[instrument(skip(self, details))]
    async fn insert_balance(
        &self,
        account_id: AccountId,
        details: BalanceDetails,
    ) -> Result<Balance, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        // The shared lock keeps the window fixed and the account alive until
        // the balance is committed.
        let account = lock_account(&mut tx, account_id, LOCK_ACCOUNT_FOR_SHARE).await?;
        account.details.validate_balance_date(details.date)?;

        let id = BalanceId::new();
        sqlx::query(
            r#"
            INSERT INTO balances (id, account_id, date, amount, note)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.to_string())
        .bind(account_id.to_string())
        .bind(details.date)
        .bind(details.amount)
        .bind(&details.note)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(Balance::new(id, account_id, details))
    }

    async fn select_balance(&self, id: BalanceId) -> Result<Option<Balance>, LedgerError> {
        let row: Option<BalanceRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, date, amount, note
            FROM balances
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(BalanceRow::try_into_balance)
            .transpose()
            .map_err(storage_error)
    }

    async fn select_account_balances(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Balance>, LedgerError> {
        fetch_account_balances(&self.pool, account_id).await
    }

    #[instrument(skip(self))]
    async fn delete_balance(&self, id: BalanceId) -> Result<(), LedgerError> {
        let result = sqlx::query("DELETE FROM balances WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::BalanceNotFound { id }.into());
        }
        Ok(())
    }
}
