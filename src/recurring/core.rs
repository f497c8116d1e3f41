//! Recurring transaction templates and generating their pending transactions.

use std::collections::HashSet;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    db::QueryFilter,
    pagination::{Page, PageRequest, SortSpec, fetch_page},
    transaction::{
        Transaction, TransactionBuilder, TransactionKind, create_transaction, validate_references,
    },
    validation::{validate_amount, validate_description},
};

use super::schedule::{Frequency, occurrences};

/// The fields for creating or replacing a recurring transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringData {
    pub kind: TransactionKind,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: Date,
    /// The last date an occurrence may fall on. Recurs indefinitely if `None`.
    pub end_date: Option<Date>,
    pub account_id: Option<DatabaseId>,
    pub credit_card_id: Option<DatabaseId>,
    pub category_id: Option<DatabaseId>,
}

impl RecurringData {
    fn validated(&self, user_id: UserID, connection: &Connection) -> Result<Self, Error> {
        if let Some(end_date) = self.end_date
            && end_date <= self.start_date
        {
            return Err(Error::InvalidField {
                field: "end_date",
                reason: "must be after start_date".to_owned(),
            });
        }

        validate_references(
            user_id,
            self.kind,
            self.account_id,
            self.credit_card_id,
            self.category_id,
            connection,
        )?;

        Ok(Self {
            amount: validate_amount(self.amount)?,
            description: validate_description(&self.description)?,
            ..self.clone()
        })
    }
}

/// A template for a transaction that repeats on a regular basis, e.g. wages or rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: DatabaseId,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub account_id: Option<DatabaseId>,
    pub credit_card_id: Option<DatabaseId>,
    pub category_id: Option<DatabaseId>,
}

pub fn create_recurring_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            kind TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            description TEXT NOT NULL,
            frequency TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            account_id INTEGER REFERENCES account(id) ON DELETE SET NULL,
            credit_card_id INTEGER REFERENCES credit_card(id) ON DELETE SET NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL
        )",
        (),
    )?;

    Ok(())
}

const RECURRING_COLUMNS: &str = "id, kind, amount, description, frequency, start_date, end_date, \
    account_id, credit_card_id, category_id";

pub(crate) const RECURRING_SORT: SortSpec = SortSpec {
    fields: &[
        ("id", "id"),
        ("start_date", "start_date"),
        ("end_date", "end_date"),
        ("amount", "amount"),
        ("description", "description"),
        ("frequency", "frequency"),
    ],
    default_field: "id",
    id_column: "id",
};

fn map_recurring_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    Ok(RecurringTransaction {
        id: row.get(0)?,
        kind: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        frequency: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        account_id: row.get(7)?,
        credit_card_id: row.get(8)?,
        category_id: row.get(9)?,
    })
}

/// Create a new recurring transaction for `user_id`.
///
/// No transactions are generated until [generate_transactions] is called.
///
/// # Errors
/// Returns an [Error::InvalidField] if a field fails validation, an
/// [Error::InvalidReference] if a referenced record does not exist, or
/// [Error::SqlError] if there is some other SQL error.
pub fn create_recurring(
    user_id: UserID,
    data: &RecurringData,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    let data = data.validated(user_id, connection)?;

    connection
        .query_row(
            &format!(
                "INSERT INTO recurring_transaction (user_id, kind, amount, description, frequency,
                    start_date, end_date, account_id, credit_card_id, category_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                RETURNING {RECURRING_COLUMNS}"
            ),
            (
                user_id.as_i64(),
                data.kind,
                data.amount,
                &data.description,
                data.frequency,
                data.start_date,
                data.end_date,
                data.account_id,
                data.credit_card_id,
                data.category_id,
            ),
            map_recurring_row,
        )
        .map_err(Error::from)
}

/// Get the recurring transaction `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if it does not exist or belongs to another user.
pub fn get_recurring(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {RECURRING_COLUMNS} FROM recurring_transaction
                WHERE id = ?1 AND user_id = ?2"
            ),
            (id, user_id.as_i64()),
            map_recurring_row,
        )
        .map_err(Error::from)
}

/// Get a page of the recurring transactions belonging to `user_id`, searching by description.
pub fn get_recurring_page(
    user_id: UserID,
    request: &PageRequest,
    connection: &Connection,
) -> Result<Page<RecurringTransaction>, Error> {
    let mut filter = QueryFilter::for_user("user_id", user_id);
    if let Some(pattern) = request.search_pattern() {
        filter.push("description LIKE ? ESCAPE '\\'", pattern);
    }

    fetch_page(
        connection,
        RECURRING_COLUMNS,
        "FROM recurring_transaction",
        &filter,
        request,
        map_recurring_row,
    )
}

/// Replace the fields of the recurring transaction `id` belonging to `user_id`.
///
/// Transactions that were already generated are left as they are.
pub fn update_recurring(
    id: DatabaseId,
    user_id: UserID,
    data: &RecurringData,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    get_recurring(id, user_id, connection)?;
    let data = data.validated(user_id, connection)?;

    connection
        .query_row(
            &format!(
                "UPDATE recurring_transaction SET kind = ?1, amount = ?2, description = ?3,
                    frequency = ?4, start_date = ?5, end_date = ?6, account_id = ?7,
                    credit_card_id = ?8, category_id = ?9
                WHERE id = ?10 AND user_id = ?11
                RETURNING {RECURRING_COLUMNS}"
            ),
            (
                data.kind,
                data.amount,
                &data.description,
                data.frequency,
                data.start_date,
                data.end_date,
                data.account_id,
                data.credit_card_id,
                data.category_id,
                id,
                user_id.as_i64(),
            ),
            map_recurring_row,
        )
        .map_err(Error::from)
}

/// Delete the recurring transaction `id`, keeping the transactions generated from it.
pub fn delete_recurring(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match connection.execute(
        "DELETE FROM recurring_transaction WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )? {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the pending transactions for every occurrence of the recurring
/// transaction `id` up to `until` (or its end date, if earlier) that has not
/// been generated yet.
///
/// Returns the newly created transactions in date order. Running this twice
/// with the same `until` creates nothing the second time.
///
/// # Errors
/// Returns [Error::NotFound] if the recurring transaction does not exist, an
/// [Error::InvalidField] if too many transactions would be created, or
/// [Error::SqlError] if there is some other SQL error. No transactions are
/// created if an error occurs.
pub fn generate_transactions(
    id: DatabaseId,
    user_id: UserID,
    until: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let recurring = get_recurring(id, user_id, connection)?;
    let last = match recurring.end_date {
        Some(end_date) if end_date < until => end_date,
        _ => until,
    };

    let existing_dates: HashSet<Date> = connection
        .prepare("SELECT date FROM \"transaction\" WHERE recurring_id = ?1")?
        .query_map([id], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let due_dates = occurrences(
        recurring.frequency,
        recurring.start_date,
        last,
        &existing_dates,
    )?;

    let transaction = connection.unchecked_transaction()?;
    let mut created = Vec::with_capacity(due_dates.len());

    for date in due_dates {
        let mut builder = TransactionBuilder::new(recurring.kind, recurring.amount, date)
            .description(&recurring.description)
            .recurring(recurring.id);
        builder.account_id = recurring.account_id;
        builder.credit_card_id = recurring.credit_card_id;
        builder.category_id = recurring.category_id;

        created.push(create_transaction(user_id, builder, &transaction)?);
    }

    transaction.commit()?;
    tracing::debug!(
        "Generated {} transactions for recurring transaction {id}",
        created.len()
    );

    Ok(created)
}
