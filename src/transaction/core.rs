//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    category::get_referenced_category_kind,
    database_id::DatabaseId,
    db::{OwnedTable, ensure_owned, is_unique_violation},
    validation::{validate_amount, validate_description},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// `amount` with a positive sign for income and a negative sign for expenses.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [TransactionBuilder].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money, always positive.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The competence date, i.e. when the transaction economically happened.
    pub date: Date,
    /// When the transaction is due to be paid.
    pub due_date: Date,
    /// Whether the transaction has been paid.
    pub paid: bool,
    /// When the transaction was paid, set if and only if `paid` is true.
    pub paid_at: Option<Date>,
    /// The bank account the money moved through.
    pub account_id: Option<DatabaseId>,
    /// The credit card the expense was charged to.
    pub credit_card_id: Option<DatabaseId>,
    /// The category of the transaction.
    pub category_id: Option<DatabaseId>,
    /// The recurring transaction this transaction was generated from.
    pub recurring_id: Option<DatabaseId>,
}

/// A builder for creating or replacing [Transaction] records.
///
/// This is also the request body for the create and update endpoints. Fields
/// that are not set fall back to sensible defaults when the transaction is
/// saved: the due date defaults to `date`, and a paid transaction without a
/// payment date is treated as paid on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBuilder {
    /// Whether money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money, must be positive with at most two decimal places.
    pub amount: f64,
    /// A text description of at most 255 characters.
    #[serde(default)]
    pub description: String,
    /// The competence date.
    pub date: Date,
    /// When the transaction is due to be paid.
    pub due_date: Option<Date>,
    /// Whether the transaction has been paid.
    #[serde(default)]
    pub paid: bool,
    /// When the transaction was paid.
    pub paid_at: Option<Date>,
    /// The bank account the money moved through.
    pub account_id: Option<DatabaseId>,
    /// The credit card the expense was charged to.
    pub credit_card_id: Option<DatabaseId>,
    /// The category of the transaction, its kind must match `kind`.
    pub category_id: Option<DatabaseId>,
    /// Only set for transactions generated from a recurring transaction.
    #[serde(skip)]
    pub recurring_id: Option<DatabaseId>,
}

impl TransactionBuilder {
    /// Start building an unpaid transaction without a description.
    pub fn new(kind: TransactionKind, amount: f64, date: Date) -> Self {
        Self {
            kind,
            amount,
            description: String::new(),
            date,
            due_date: None,
            paid: false,
            paid_at: None,
            account_id: None,
            credit_card_id: None,
            category_id: None,
            recurring_id: None,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }

    /// Set the due date.
    pub fn due_date(mut self, due_date: Date) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Mark the transaction as paid on `paid_at`.
    pub fn paid_at(mut self, paid_at: Date) -> Self {
        self.paid = true;
        self.paid_at = Some(paid_at);
        self
    }

    /// Set the bank account.
    pub fn account(mut self, account_id: DatabaseId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Set the credit card.
    pub fn credit_card(mut self, credit_card_id: DatabaseId) -> Self {
        self.credit_card_id = Some(credit_card_id);
        self
    }

    /// Set the category.
    pub fn category(mut self, category_id: DatabaseId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Link the transaction to the recurring transaction it was generated from.
    pub fn recurring(mut self, recurring_id: DatabaseId) -> Self {
        self.recurring_id = Some(recurring_id);
        self
    }

    /// Check the fields and references of the builder and fill in defaults.
    fn validate(mut self, user_id: UserID, connection: &Connection) -> Result<Self, Error> {
        self.amount = validate_amount(self.amount)?;
        self.description = validate_description(&self.description)?;
        self.due_date = Some(self.due_date.unwrap_or(self.date));

        self.paid_at = match (self.paid, self.paid_at) {
            (true, paid_at) => Some(paid_at.unwrap_or(self.date)),
            (false, None) => None,
            (false, Some(_)) => {
                return Err(Error::InvalidField {
                    field: "paid_at",
                    reason: "must be empty when the transaction is not paid".to_owned(),
                });
            }
        };

        validate_references(
            user_id,
            self.kind,
            self.account_id,
            self.credit_card_id,
            self.category_id,
            connection,
        )?;

        Ok(self)
    }
}

/// Check that the account, credit card and category referred to by a
/// transaction (or recurring transaction) belong to `user_id`.
///
/// # Errors
/// Returns an [Error::InvalidField] if both an account and a credit card are
/// given or the category kind does not match `kind`, or an
/// [Error::InvalidReference] if a referenced record does not exist.
pub(crate) fn validate_references(
    user_id: UserID,
    kind: TransactionKind,
    account_id: Option<DatabaseId>,
    credit_card_id: Option<DatabaseId>,
    category_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<(), Error> {
    if account_id.is_some() && credit_card_id.is_some() {
        return Err(Error::InvalidField {
            field: "credit_card_id",
            reason: "cannot be set together with account_id".to_owned(),
        });
    }

    if let Some(account_id) = account_id {
        ensure_owned(OwnedTable::Account, account_id, user_id, connection)?;
    }

    if let Some(credit_card_id) = credit_card_id {
        ensure_owned(OwnedTable::CreditCard, credit_card_id, user_id, connection)?;
    }

    if let Some(category_id) = category_id {
        let category_kind = get_referenced_category_kind(category_id, user_id, connection)?;

        if category_kind != kind {
            return Err(Error::InvalidField {
                field: "category_id",
                reason: format!("a {category_kind} category cannot be used for {kind}"),
            });
        }
    }

    Ok(())
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0,
            paid_at TEXT,
            account_id INTEGER REFERENCES account(id) ON DELETE SET NULL,
            credit_card_id INTEGER REFERENCES credit_card(id) ON DELETE SET NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            recurring_id INTEGER REFERENCES recurring_transaction(id) ON DELETE SET NULL,
            UNIQUE(recurring_id, date)
        )",
        (),
    )?;

    // Improve performance of the date range queries used by reports.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

pub(crate) const TRANSACTION_COLUMNS: &str = "t.id, t.kind, t.amount, t.description, t.date, \
    t.due_date, t.paid, t.paid_at, t.account_id, t.credit_card_id, t.category_id, t.recurring_id";

// RETURNING clauses cannot use the table alias.
const RETURNING_COLUMNS: &str = "id, kind, amount, description, date, due_date, paid, paid_at, \
    account_id, credit_card_id, category_id, recurring_id";

/// Map a database row selected with [TRANSACTION_COLUMNS] to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        kind: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        due_date: row.get(5)?,
        paid: row.get(6)?,
        paid_at: row.get(7)?,
        account_id: row.get(8)?,
        credit_card_id: row.get(9)?,
        category_id: row.get(10)?,
        recurring_id: row.get(11)?,
    })
}

fn map_duplicate_date(error: rusqlite::Error) -> Error {
    if is_unique_violation(&error) {
        Error::InvalidField {
            field: "date",
            reason: "the recurring transaction already has a transaction on this date".to_owned(),
        }
    } else {
        error.into()
    }
}

/// Create a new transaction for `user_id` from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidField] if a field fails validation,
/// - [Error::InvalidReference] if the account, credit card or category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate(user_id, connection)?;

    connection
        .query_row(
            &format!(
                "INSERT INTO \"transaction\" (user_id, kind, amount, description, date,
                    due_date, paid, paid_at, account_id, credit_card_id, category_id, recurring_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                RETURNING {RETURNING_COLUMNS}"
            ),
            (
                user_id.as_i64(),
                builder.kind,
                builder.amount,
                &builder.description,
                builder.date,
                builder.due_date,
                builder.paid,
                builder.paid_at,
                builder.account_id,
                builder.credit_card_id,
                builder.category_id,
                builder.recurring_id,
            ),
            map_transaction_row,
        )
        .map_err(map_duplicate_date)
}

/// Retrieve the transaction `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t
                WHERE t.id = ?1 AND t.user_id = ?2"
            ),
            (id, user_id.as_i64()),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Replace the fields of the transaction `id` belonging to `user_id`.
///
/// The link to a recurring transaction is kept.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist, and the same
/// validation errors as [create_transaction].
pub fn update_transaction(
    id: DatabaseId,
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(id, user_id, connection)?;
    let builder = TransactionBuilder {
        recurring_id: existing.recurring_id,
        ..builder
    }
    .validate(user_id, connection)?;

    connection
        .query_row(
            &format!(
                "UPDATE \"transaction\" SET kind = ?1, amount = ?2, description = ?3,
                    date = ?4, due_date = ?5, paid = ?6, paid_at = ?7, account_id = ?8,
                    credit_card_id = ?9, category_id = ?10
                WHERE id = ?11 AND user_id = ?12
                RETURNING {RETURNING_COLUMNS}"
            ),
            (
                builder.kind,
                builder.amount,
                &builder.description,
                builder.date,
                builder.due_date,
                builder.paid,
                builder.paid_at,
                builder.account_id,
                builder.credit_card_id,
                builder.category_id,
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .map_err(map_duplicate_date)
}

/// Delete the transaction `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist.
pub fn delete_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        Err(Error::NotFound)
    } else {
        Ok(())
    }
}

/// Mark the transaction `id` as paid on `paid_at`, or on its date if `paid_at` is `None`.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist.
pub fn pay_transaction(
    id: DatabaseId,
    user_id: UserID,
    paid_at: Option<Date>,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE \"transaction\" SET paid = 1, paid_at = COALESCE(?1, date)
                WHERE id = ?2 AND user_id = ?3
                RETURNING {RETURNING_COLUMNS}"
            ),
            (paid_at, id, user_id.as_i64()),
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Mark the transaction `id` as unpaid and clear its payment date.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist.
pub fn unpay_transaction(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE \"transaction\" SET paid = 0, paid_at = NULL
                WHERE id = ?1 AND user_id = ?2
                RETURNING {RETURNING_COLUMNS}"
            ),
            (id, user_id.as_i64()),
            map_transaction_row,
        )
        .map_err(Error::from)
}
