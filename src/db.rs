/*! Database initialization and helpers shared by the query functions of each resource. */

use rusqlite::{Connection, types::Value};

use crate::{
    Error,
    account::create_account_table,
    auth::{UserID, create_user_table},
    category::create_category_table,
    credit_card::create_credit_card_table,
    database_id::DatabaseId,
    recurring::create_recurring_table,
    transaction::create_transaction_table,
};

/// Create the application's tables if they do not exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, otherwise it is silently ignored.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_credit_card_table(&transaction)?;
    create_category_table(&transaction)?;
    create_recurring_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// The tables that transactions may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnedTable {
    Account,
    CreditCard,
    Category,
    Recurring,
}

impl OwnedTable {
    fn table_name(self) -> &'static str {
        match self {
            OwnedTable::Account => "account",
            OwnedTable::CreditCard => "credit_card",
            OwnedTable::Category => "category",
            OwnedTable::Recurring => "recurring_transaction",
        }
    }

    fn label(self) -> &'static str {
        match self {
            OwnedTable::Account => "account",
            OwnedTable::CreditCard => "credit card",
            OwnedTable::Category => "category",
            OwnedTable::Recurring => "recurring transaction",
        }
    }
}

/// Check that the row `id` in `table` exists and belongs to `user_id`.
///
/// # Errors
/// Returns [Error::InvalidReference] if the row does not exist or belongs to
/// another user, or [Error::SqlError] if there is some other SQL error.
pub(crate) fn ensure_owned(
    table: OwnedTable,
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let query = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1 AND user_id = ?2)",
        table.table_name()
    );
    let exists: bool = connection.query_row(&query, (id, user_id.as_i64()), |row| row.get(0))?;

    if exists {
        Ok(())
    } else {
        Err(Error::InvalidReference(format!("{} {id}", table.label())))
    }
}

/// Whether an SQL error is a violation of a UNIQUE constraint.
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )
    )
}

/// An SQL `WHERE` clause built from conditions with positional parameters.
///
/// Each condition is joined with `AND` and must use `?` placeholders for its
/// parameters, which are bound in the order they were pushed.
#[derive(Debug, Default, Clone)]
pub(crate) struct QueryFilter {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl QueryFilter {
    /// Create a filter that matches rows belonging to `user_id` in the
    /// column `user_column`.
    pub(crate) fn for_user(user_column: &str, user_id: UserID) -> Self {
        let mut filter = Self::default();
        filter.push(format!("{user_column} = ?"), user_id.as_i64());
        filter
    }

    /// Add a condition with a single parameter.
    pub(crate) fn push(&mut self, condition: impl Into<String>, param: impl Into<Value>) {
        self.conditions.push(condition.into());
        self.params.push(param.into());
    }

    /// Add a condition that takes no parameters.
    pub(crate) fn push_condition(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    /// Add a condition that `column` is one of `ids`.
    pub(crate) fn push_in(&mut self, column: &str, ids: &[DatabaseId]) {
        if ids.is_empty() {
            self.conditions.push("0".to_owned());
            return;
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        self.conditions.push(format!("{column} IN ({placeholders})"));
        self.params.extend(ids.iter().map(|&id| Value::Integer(id)));
    }

    /// The conditions joined with `AND`, or `1` if there are none.
    pub(crate) fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "1".to_owned()
        } else {
            self.conditions.join(" AND ")
        }
    }

    /// The parameters in the order of their placeholders.
    pub(crate) fn params(&self) -> &[Value] {
        &self.params
    }
}
