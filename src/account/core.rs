use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    db::{QueryFilter, is_unique_violation},
    money::round_to_cents,
    pagination::{Page, PageRequest, SortSpec, fetch_page},
    validation::{validate_money, validate_name},
};

/// The type of bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Investment,
    Cash,
    Other,
}

impl AccountKind {
    fn as_str(self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
            AccountKind::Investment => "investment",
            AccountKind::Cash => "cash",
            AccountKind::Other => "other",
        }
    }
}

impl Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checking" => Ok(AccountKind::Checking),
            "savings" => Ok(AccountKind::Savings),
            "investment" => Ok(AccountKind::Investment),
            "cash" => Ok(AccountKind::Cash),
            "other" => Ok(AccountKind::Other),
            _ => Err(format!("unknown account kind \"{s}\"")),
        }
    }
}

impl ToSql for AccountKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for AccountKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// The fields for creating or replacing a bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    /// The display name, unique per user.
    pub name: String,
    /// The type of account.
    pub kind: AccountKind,
    /// The balance before any recorded transactions, may be negative.
    #[serde(default)]
    pub initial_balance: f64,
}

impl AccountData {
    fn validated(&self) -> Result<Self, Error> {
        Ok(Self {
            name: validate_name(&self.name)?,
            kind: self.kind,
            initial_balance: validate_money("initial_balance", self.initial_balance)?,
        })
    }
}

/// A bank account or wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: DatabaseId,
    /// The display name, unique per user.
    pub name: String,
    /// The type of account.
    pub kind: AccountKind,
    /// The balance before any recorded transactions.
    pub initial_balance: f64,
    /// The initial balance plus paid income minus paid expenses.
    pub current_balance: f64,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL COLLATE NOCASE,
            kind TEXT NOT NULL,
            initial_balance REAL NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    Ok(())
}

const ACCOUNT_COLUMNS: &str = "a.id, a.name, a.kind, a.initial_balance, a.created_at, \
    a.initial_balance + COALESCE((
        SELECT SUM(CASE WHEN t.kind = 'income' THEN t.amount ELSE -t.amount END)
        FROM \"transaction\" t
        WHERE t.account_id = a.id AND t.paid = 1
    ), 0)";

pub(crate) const ACCOUNT_SORT: SortSpec = SortSpec {
    fields: &[
        ("id", "a.id"),
        ("name", "a.name"),
        ("kind", "a.kind"),
        ("initial_balance", "a.initial_balance"),
        ("created_at", "a.created_at"),
    ],
    default_field: "id",
    id_column: "a.id",
};

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let current_balance: f64 = row.get(5)?;

    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        initial_balance: row.get(3)?,
        created_at: row.get(4)?,
        current_balance: round_to_cents(current_balance),
    })
}

fn map_name_error(name: &str) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |error| {
        if is_unique_violation(&error) {
            Error::DuplicateName(name.to_owned())
        } else {
            error.into()
        }
    }
}

/// Create a new account for `user_id`.
///
/// # Errors
/// Returns an [Error::InvalidField] if `data` fails validation,
/// [Error::DuplicateName] if the user already has an account with the same
/// name, or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    user_id: UserID,
    data: &AccountData,
    connection: &Connection,
) -> Result<Account, Error> {
    let data = data.validated()?;

    let id: DatabaseId = connection
        .query_row(
            "INSERT INTO account (user_id, name, kind, initial_balance, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id",
            (
                user_id.as_i64(),
                &data.name,
                data.kind,
                data.initial_balance,
                OffsetDateTime::now_utc(),
            ),
            |row| row.get(0),
        )
        .map_err(map_name_error(&data.name))?;

    get_account(id, user_id, connection)
}

/// Get the account `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn get_account(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account a WHERE a.id = ?1 AND a.user_id = ?2"),
            (id, user_id.as_i64()),
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get every account belonging to `user_id`, ordered by name.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account a WHERE a.user_id = ?1 ORDER BY a.name, a.id"
        ))?
        .query_map([user_id.as_i64()], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get a page of the accounts belonging to `user_id`, searching by name.
pub fn get_accounts_page(
    user_id: UserID,
    request: &PageRequest,
    connection: &Connection,
) -> Result<Page<Account>, Error> {
    let mut filter = QueryFilter::for_user("a.user_id", user_id);
    if let Some(pattern) = request.search_pattern() {
        filter.push("a.name LIKE ? ESCAPE '\\'", pattern);
    }

    fetch_page(
        connection,
        ACCOUNT_COLUMNS,
        "FROM account a",
        &filter,
        request,
        map_row_to_account,
    )
}

/// Replace the fields of the account `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user, and the same validation errors as [create_account].
pub fn update_account(
    id: DatabaseId,
    user_id: UserID,
    data: &AccountData,
    connection: &Connection,
) -> Result<Account, Error> {
    let data = data.validated()?;

    let rows_affected = connection
        .execute(
            "UPDATE account SET name = ?1, kind = ?2, initial_balance = ?3
            WHERE id = ?4 AND user_id = ?5",
            (
                &data.name,
                data.kind,
                data.initial_balance,
                id,
                user_id.as_i64(),
            ),
        )
        .map_err(map_name_error(&data.name))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_account(id, user_id, connection)
}

/// Delete the account `id` belonging to `user_id`.
///
/// Transactions that referred to the account are kept without an account.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn delete_account(id: DatabaseId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}
