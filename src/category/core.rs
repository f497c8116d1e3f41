use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    db::{QueryFilter, is_unique_violation},
    pagination::{Page, PageRequest, SortSpec, fetch_page},
    transaction::TransactionKind,
    validation::validate_name,
};

/// The fields for creating or replacing a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    /// The display name, unique per user and kind.
    pub name: String,
    /// Whether the category groups income or expenses.
    pub kind: TransactionKind,
}

/// A label grouping income or expense transactions, e.g. "Salary" or "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The display name.
    pub name: String,
    /// Whether the category groups income or expenses.
    pub kind: TransactionKind,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL COLLATE NOCASE,
            kind TEXT NOT NULL,
            UNIQUE(user_id, name, kind)
        )",
        (),
    )?;

    Ok(())
}

pub(crate) const CATEGORY_SORT: SortSpec = SortSpec {
    fields: &[("id", "id"), ("name", "name"), ("kind", "kind")],
    default_field: "id",
    id_column: "id",
};

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

fn map_write_error(name: &str, error: rusqlite::Error) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName(name.to_owned())
    } else {
        error.into()
    }
}

/// Create a new category for `user_id`.
///
/// # Errors
/// Returns an [Error::InvalidField] if the name is blank or too long,
/// [Error::DuplicateName] if the user already has a category with the same
/// name and kind, or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    user_id: UserID,
    data: &CategoryData,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = validate_name(&data.name)?;

    connection
        .query_row(
            "INSERT INTO category (user_id, name, kind) VALUES (?1, ?2, ?3)
            RETURNING id, name, kind",
            (user_id.as_i64(), &name, data.kind),
            map_row_to_category,
        )
        .map_err(|error| map_write_error(&name, error))
}

/// Get the category `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .query_row(
            "SELECT id, name, kind FROM category WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
            map_row_to_category,
        )
        .map_err(Error::from)
}

/// Get the kind of the category `id` for validating a transaction that refers to it.
///
/// # Errors
/// Returns [Error::InvalidReference] if the category does not exist or
/// belongs to another user.
pub(crate) fn get_referenced_category_kind(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<TransactionKind, Error> {
    match get_category(id, user_id, connection) {
        Ok(category) => Ok(category.kind),
        Err(Error::NotFound) => Err(Error::InvalidReference(format!("category {id}"))),
        Err(error) => Err(error),
    }
}

/// Get a page of the categories belonging to `user_id`, searching by name.
pub fn get_categories_page(
    user_id: UserID,
    request: &PageRequest,
    connection: &Connection,
) -> Result<Page<Category>, Error> {
    let mut filter = QueryFilter::for_user("user_id", user_id);
    if let Some(pattern) = request.search_pattern() {
        filter.push("name LIKE ? ESCAPE '\\'", pattern);
    }

    fetch_page(
        connection,
        "id, name, kind",
        "FROM category",
        &filter,
        request,
        map_row_to_category,
    )
}

/// Replace the name and kind of the category `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user, [Error::InvalidField] if the kind would no longer match the
/// transactions in the category, and the same errors as [create_category].
pub fn update_category(
    id: DatabaseId,
    user_id: UserID,
    data: &CategoryData,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = validate_name(&data.name)?;
    let current = get_category(id, user_id, connection)?;

    if current.kind != data.kind && is_category_in_use(id, connection)? {
        return Err(Error::InvalidField {
            field: "kind",
            reason: "cannot change the kind of a category that has transactions".to_owned(),
        });
    }

    connection
        .query_row(
            "UPDATE category SET name = ?1, kind = ?2 WHERE id = ?3 AND user_id = ?4
            RETURNING id, name, kind",
            (&name, data.kind, id, user_id.as_i64()),
            map_row_to_category,
        )
        .map_err(|error| map_write_error(&name, error))
}

fn is_category_in_use(id: DatabaseId, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE category_id = ?1)
                OR EXISTS(SELECT 1 FROM recurring_transaction WHERE category_id = ?1)",
            [id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Delete the category `id` belonging to `user_id`, keeping its transactions uncategorized.
pub fn delete_category(id: DatabaseId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    match connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )? {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}
