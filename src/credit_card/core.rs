use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    db::{QueryFilter, is_unique_violation},
    money::round_to_cents,
    pagination::{Page, PageRequest, SortSpec, fetch_page},
    validation::{validate_money, validate_name},
};

/// The fields for creating or replacing a credit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardData {
    /// The display name, unique per user.
    pub name: String,
    /// The credit limit, must not be negative.
    pub limit: f64,
    /// The day of the month the statement closes on.
    pub closing_day: u8,
    /// The day of the month the statement is due on.
    pub due_day: u8,
}

fn validate_day(field: &'static str, day: u8) -> Result<u8, Error> {
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(Error::InvalidField {
            field,
            reason: "must be between 1 and 31".to_owned(),
        })
    }
}

impl CreditCardData {
    fn validated(&self) -> Result<Self, Error> {
        let limit = validate_money("limit", self.limit)?;
        if limit < 0.0 {
            return Err(Error::InvalidField {
                field: "limit",
                reason: "must not be negative".to_owned(),
            });
        }

        Ok(Self {
            name: validate_name(&self.name)?,
            limit,
            closing_day: validate_day("closing_day", self.closing_day)?,
            due_day: validate_day("due_day", self.due_day)?,
        })
    }
}

/// A credit card and how much of its limit is in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    /// The ID of the credit card.
    pub id: DatabaseId,
    /// The display name, unique per user.
    pub name: String,
    /// The credit limit.
    pub limit: f64,
    /// The day of the month the statement closes on.
    pub closing_day: u8,
    /// The day of the month the statement is due on.
    pub due_day: u8,
    /// The sum of the unpaid expenses charged to the card.
    pub used_limit: f64,
    /// The limit minus the used limit. Negative when the card is over its limit.
    pub available_limit: f64,
}

pub fn create_credit_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS credit_card (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL COLLATE NOCASE,
            credit_limit REAL NOT NULL CHECK (credit_limit >= 0),
            closing_day INTEGER NOT NULL CHECK (closing_day BETWEEN 1 AND 31),
            due_day INTEGER NOT NULL CHECK (due_day BETWEEN 1 AND 31),
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    Ok(())
}

const CREDIT_CARD_COLUMNS: &str = "c.id, c.name, c.credit_limit, c.closing_day, c.due_day, \
    COALESCE((
        SELECT SUM(t.amount)
        FROM \"transaction\" t
        WHERE t.credit_card_id = c.id AND t.kind = 'expense' AND t.paid = 0
    ), 0)";

pub(crate) const CREDIT_CARD_SORT: SortSpec = SortSpec {
    fields: &[
        ("id", "c.id"),
        ("name", "c.name"),
        ("limit", "c.credit_limit"),
        ("closing_day", "c.closing_day"),
        ("due_day", "c.due_day"),
    ],
    default_field: "id",
    id_column: "c.id",
};

fn map_row_to_credit_card(row: &Row) -> Result<CreditCard, rusqlite::Error> {
    let limit: f64 = row.get(2)?;
    let used_limit: f64 = row.get(5)?;

    Ok(CreditCard {
        id: row.get(0)?,
        name: row.get(1)?,
        limit,
        closing_day: row.get(3)?,
        due_day: row.get(4)?,
        used_limit: round_to_cents(used_limit),
        available_limit: round_to_cents(limit - used_limit),
    })
}

fn map_write_error(name: &str, error: rusqlite::Error) -> Error {
    if is_unique_violation(&error) {
        Error::DuplicateName(name.to_owned())
    } else {
        error.into()
    }
}

/// Create a new credit card for `user_id`.
///
/// # Errors
/// Returns an [Error::InvalidField] if the name is blank, the limit is
/// negative or a day is outside 1 to 31, [Error::DuplicateName] if the user
/// already has a card with the same name, or [Error::SqlError] if there is
/// some other SQL error.
pub fn create_credit_card(
    user_id: UserID,
    data: &CreditCardData,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    let data = data.validated()?;

    let id: DatabaseId = connection
        .query_row(
            "INSERT INTO credit_card (user_id, name, credit_limit, closing_day, due_day)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id",
            (
                user_id.as_i64(),
                &data.name,
                data.limit,
                data.closing_day,
                data.due_day,
            ),
            |row| row.get(0),
        )
        .map_err(|error| map_write_error(&data.name, error))?;

    get_credit_card(id, user_id, connection)
}

/// Get the credit card `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the card does not exist or belongs to another user.
pub fn get_credit_card(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {CREDIT_CARD_COLUMNS} FROM credit_card c WHERE c.id = ?1 AND c.user_id = ?2"
            ),
            (id, user_id.as_i64()),
            map_row_to_credit_card,
        )
        .map_err(Error::from)
}

/// Get a page of the credit cards belonging to `user_id`, searching by name.
pub fn get_credit_cards_page(
    user_id: UserID,
    request: &PageRequest,
    connection: &Connection,
) -> Result<Page<CreditCard>, Error> {
    let mut filter = QueryFilter::for_user("c.user_id", user_id);
    if let Some(pattern) = request.search_pattern() {
        filter.push("c.name LIKE ? ESCAPE '\\'", pattern);
    }

    fetch_page(
        connection,
        CREDIT_CARD_COLUMNS,
        "FROM credit_card c",
        &filter,
        request,
        map_row_to_credit_card,
    )
}

/// Replace the fields of the credit card `id` belonging to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the card does not exist or belongs to another
/// user, and the same validation errors as [create_credit_card].
pub fn update_credit_card(
    id: DatabaseId,
    user_id: UserID,
    data: &CreditCardData,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    let data = data.validated()?;

    let rows_affected = connection
        .execute(
            "UPDATE credit_card SET name = ?1, credit_limit = ?2, closing_day = ?3, due_day = ?4
            WHERE id = ?5 AND user_id = ?6",
            (
                &data.name,
                data.limit,
                data.closing_day,
                data.due_day,
                id,
                user_id.as_i64(),
            ),
        )
        .map_err(|error| map_write_error(&data.name, error))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_credit_card(id, user_id, connection)
}

/// Delete the credit card `id` belonging to `user_id`, keeping its transactions.
pub fn delete_credit_card(
    id: DatabaseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    match connection.execute(
        "DELETE FROM credit_card WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )? {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{create_test_user, get_test_connection},
        transaction::{TransactionBuilder, TransactionKind, create_transaction},
    };

    use super::{
        CreditCardData, create_credit_card, delete_credit_card, get_credit_card,
        update_credit_card,
    };

    fn card_data(limit: f64) -> CreditCardData {
        CreditCardData {
            name: "Visa".to_owned(),
            limit,
            closing_day: 25,
            due_day: 5,
        }
    }

    #[test]
    fn create_credit_card_rejects_negative_limit() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);

        let result = create_credit_card(user_id, &card_data(-1.0), &conn);

        assert!(matches!(
            result,
            Err(Error::InvalidField { field: "limit", .. })
        ));
    }

    #[test]
    fn create_credit_card_rejects_invalid_days() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);

        for (closing_day, due_day) in [(0, 5), (32, 5), (25, 0), (25, 32)] {
            let data = CreditCardData {
                closing_day,
                due_day,
                ..card_data(1000.0)
            };

            assert!(create_credit_card(user_id, &data, &conn).is_err());
        }
    }

    #[test]
    fn used_limit_is_the_sum_of_unpaid_expenses() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        let card = create_credit_card(user_id, &card_data(1000.0), &conn).unwrap();
        let date = date!(2026 - 02 - 03);
        for builder in [
            TransactionBuilder::new(TransactionKind::Expense, 120.5, date).credit_card(card.id),
            TransactionBuilder::new(TransactionKind::Expense, 79.5, date).credit_card(card.id),
            TransactionBuilder::new(TransactionKind::Expense, 300.0, date)
                .credit_card(card.id)
                .paid_at(date),
            TransactionBuilder::new(TransactionKind::Income, 50.0, date).credit_card(card.id),
        ] {
            create_transaction(user_id, builder, &conn).unwrap();
        }

        let card = get_credit_card(card.id, user_id, &conn).unwrap();

        assert_eq!(card.used_limit, 200.0);
        assert_eq!(card.available_limit, 800.0);
    }

    #[test]
    fn update_credit_card_checks_owner() {
        let conn = get_test_connection();
        let owner = create_test_user("owner@bar.baz", &conn);
        let other = create_test_user("other@bar.baz", &conn);
        let card = create_credit_card(owner, &card_data(1000.0), &conn).unwrap();

        assert_eq!(
            update_credit_card(card.id, other, &card_data(5.0), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_credit_card(card.id, owner, &card_data(5.0), &conn)
                .unwrap()
                .limit,
            5.0
        );
    }

    #[test]
    fn delete_credit_card_removes_card() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        let card = create_credit_card(user_id, &card_data(1000.0), &conn).unwrap();

        delete_credit_card(card.id, user_id, &conn).unwrap();

        assert_eq!(get_credit_card(card.id, user_id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_credit_card(card.id, user_id, &conn),
            Err(Error::NotFound)
        );
    }
}
