//! Loading the transactions that a report aggregates.

use rusqlite::{Connection, Row, params_from_iter};
use time::Date;

use crate::{
    Error, auth::UserID, database_id::DatabaseId, db::QueryFilter, money::round_to_cents,
    transaction::TransactionKind,
};

use super::filter::{Regime, ReportFilter};

/// A transaction reduced to the fields the reports need.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub transaction_id: DatabaseId,
    pub kind: TransactionKind,
    pub amount: f64,
    /// The date the transaction counts on under the report's regime.
    pub reference_date: Date,
    pub category_id: Option<DatabaseId>,
    pub category_name: Option<String>,
    pub account_id: Option<DatabaseId>,
}

impl Regime {
    /// The SQL expression for the date a transaction counts on.
    fn reference_date_sql(self) -> &'static str {
        match self {
            Regime::Accrual => "t.date",
            Regime::Cash => {
                "(CASE WHEN t.paid = 1 THEN COALESCE(t.paid_at, t.date) ELSE t.due_date END)"
            }
        }
    }
}

/// The conditions shared by every report query, except the date range.
fn scope(filter: &ReportFilter, user_id: UserID) -> QueryFilter {
    let mut query_filter = QueryFilter::for_user("t.user_id", user_id);

    if !filter.include_unpaid {
        query_filter.push_condition("t.paid = 1");
    }

    if let Some(category_ids) = &filter.category_ids {
        query_filter.push_in("t.category_id", category_ids);
    }

    if let Some(account_ids) = &filter.account_ids {
        query_filter.push_in("t.account_id", account_ids);
    }

    query_filter
}

fn map_report_row(row: &Row) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        transaction_id: row.get(0)?,
        kind: row.get(1)?,
        amount: row.get(2)?,
        reference_date: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        account_id: row.get(6)?,
    })
}

/// Load the user's transactions whose reference date is in the filter's range,
/// ordered by reference date.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn fetch_report_rows(
    filter: &ReportFilter,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<ReportRow>, Error> {
    let reference_date = filter.regime.reference_date_sql();
    let mut query_filter = scope(filter, user_id);
    query_filter.push(
        format!("{reference_date} >= ?"),
        filter.start_date.to_string(),
    );
    query_filter.push(
        format!("{reference_date} <= ?"),
        filter.end_date.to_string(),
    );

    let query = format!(
        "SELECT t.id, t.kind, t.amount, {reference_date}, t.category_id, c.name, t.account_id
        FROM \"transaction\" t
        LEFT JOIN category c ON c.id = t.category_id
        WHERE {}
        ORDER BY {reference_date} ASC, t.id ASC",
        query_filter.where_clause()
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(query_filter.params()), map_report_row)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// The balance before the first day of the report.
///
/// This is the initial balance of the in-scope accounts plus the net of every
/// earlier account transaction counted under the same regime and scope. A balance has
/// no meaning for a subset of categories, so it is zero when the filter is
/// scoped to categories.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn fetch_opening_balance(
    filter: &ReportFilter,
    user_id: UserID,
    connection: &Connection,
) -> Result<f64, Error> {
    if filter.category_ids.is_some() {
        return Ok(0.0);
    }

    let mut account_filter = QueryFilter::for_user("user_id", user_id);
    if let Some(account_ids) = &filter.account_ids {
        account_filter.push_in("id", account_ids);
    }

    let initial_balance: f64 = connection.query_row(
        &format!(
            "SELECT COALESCE(SUM(initial_balance), 0.0) FROM account WHERE {}",
            account_filter.where_clause()
        ),
        params_from_iter(account_filter.params()),
        |row| row.get(0),
    )?;

    let reference_date = filter.regime.reference_date_sql();
    let mut query_filter = scope(filter, user_id);
    query_filter.push(
        format!("{reference_date} < ?"),
        filter.start_date.to_string(),
    );
    // Credit card purchases and unassigned rows move no account balance.
    if filter.account_ids.is_none() {
        query_filter.push_condition("t.account_id IS NOT NULL");
    }

    let earlier_net: f64 = connection.query_row(
        &format!(
            "SELECT COALESCE(SUM(CASE WHEN t.kind = 'income' THEN t.amount ELSE -t.amount END), 0.0)
            FROM \"transaction\" t
            WHERE {}",
            query_filter.where_clause()
        ),
        params_from_iter(query_filter.params()),
        |row| row.get(0),
    )?;

    Ok(round_to_cents(initial_balance + earlier_net))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{AccountData, AccountKind, create_account},
        auth::UserID,
        category::{CategoryData, create_category},
        credit_card::{CreditCardData, create_credit_card},
        report::filter::{Granularity, Regime, ReportFilter},
        test_utils::{create_test_user, get_test_connection},
        transaction::{TransactionBuilder, TransactionKind, create_transaction},
    };

    use super::{fetch_opening_balance, fetch_report_rows};

    fn filter(regime: Regime, include_unpaid: bool) -> ReportFilter {
        ReportFilter {
            start_date: date!(2026 - 01 - 01),
            end_date: date!(2026 - 01 - 31),
            granularity: Granularity::Monthly,
            regime,
            include_unpaid,
            category_ids: None,
            account_ids: None,
        }
    }

    fn setup() -> (Connection, UserID) {
        let conn = get_test_connection();
        let user_id = create_test_user("test@example.com", &conn);
        (conn, user_id)
    }

    #[test]
    fn unpaid_transactions_are_excluded_by_default() {
        let (conn, user_id) = setup();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 10.0, date!(2026 - 01 - 05))
                .paid_at(date!(2026 - 01 - 05)),
            &conn,
        )
        .unwrap();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 20.0, date!(2026 - 01 - 06)),
            &conn,
        )
        .unwrap();

        let paid_only = fetch_report_rows(&filter(Regime::Cash, false), user_id, &conn).unwrap();
        let with_unpaid = fetch_report_rows(&filter(Regime::Cash, true), user_id, &conn).unwrap();

        assert_eq!(paid_only.len(), 1);
        assert_eq!(paid_only[0].amount, 10.0);
        assert_eq!(with_unpaid.len(), 2);
    }

    #[test]
    fn regime_decides_reference_date() {
        let (conn, user_id) = setup();
        // Accrued in December, paid in January.
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 50.0, date!(2025 - 12 - 20))
                .paid_at(date!(2026 - 01 - 03)),
            &conn,
        )
        .unwrap();

        let cash = fetch_report_rows(&filter(Regime::Cash, false), user_id, &conn).unwrap();
        let accrual = fetch_report_rows(&filter(Regime::Accrual, false), user_id, &conn).unwrap();

        assert_eq!(cash.len(), 1);
        assert_eq!(cash[0].reference_date, date!(2026 - 01 - 03));
        assert!(accrual.is_empty());
    }

    #[test]
    fn unpaid_rows_use_due_date_under_cash_regime() {
        let (conn, user_id) = setup();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 80.0, date!(2025 - 12 - 28))
                .due_date(date!(2026 - 01 - 10)),
            &conn,
        )
        .unwrap();

        let rows = fetch_report_rows(&filter(Regime::Cash, true), user_id, &conn).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_date, date!(2026 - 01 - 10));
    }

    #[test]
    fn rows_include_category_name() {
        let (conn, user_id) = setup();
        let category = create_category(
            user_id,
            &CategoryData {
                name: "Groceries".to_owned(),
                kind: TransactionKind::Expense,
            },
            &conn,
        )
        .unwrap();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 12.5, date!(2026 - 01 - 15))
                .paid_at(date!(2026 - 01 - 15))
                .category(category.id),
            &conn,
        )
        .unwrap();

        let rows = fetch_report_rows(&filter(Regime::Cash, false), user_id, &conn).unwrap();

        assert_eq!(rows[0].category_id, Some(category.id));
        assert_eq!(rows[0].category_name.as_deref(), Some("Groceries"));
    }

    #[test]
    fn other_users_rows_are_excluded() {
        let (conn, user_id) = setup();
        let other_user = create_test_user("other@example.com", &conn);
        create_transaction(
            other_user,
            TransactionBuilder::new(TransactionKind::Income, 99.0, date!(2026 - 01 - 15))
                .paid_at(date!(2026 - 01 - 15)),
            &conn,
        )
        .unwrap();

        let rows = fetch_report_rows(&filter(Regime::Cash, false), user_id, &conn).unwrap();

        assert!(rows.is_empty());
    }

    #[test]
    fn opening_balance_includes_initial_balances_and_earlier_rows() {
        let (conn, user_id) = setup();
        let account = create_account(
            user_id,
            &AccountData {
                name: "Everyday".to_owned(),
                kind: AccountKind::Checking,
                initial_balance: 100.0,
            },
            &conn,
        )
        .unwrap();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Income, 40.0, date!(2025 - 12 - 15))
                .paid_at(date!(2025 - 12 - 15))
                .account(account.id),
            &conn,
        )
        .unwrap();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 15.0, date!(2025 - 12 - 20))
                .paid_at(date!(2025 - 12 - 20))
                .account(account.id),
            &conn,
        )
        .unwrap();
        // Inside the report range, so not part of the opening balance.
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 5.0, date!(2026 - 01 - 02))
                .paid_at(date!(2026 - 01 - 02))
                .account(account.id),
            &conn,
        )
        .unwrap();

        let opening = fetch_opening_balance(&filter(Regime::Cash, false), user_id, &conn).unwrap();

        assert_eq!(opening, 125.0);
    }

    #[test]
    fn opening_balance_is_zero_for_category_scope() {
        let (conn, user_id) = setup();
        create_account(
            user_id,
            &AccountData {
                name: "Everyday".to_owned(),
                kind: AccountKind::Checking,
                initial_balance: 100.0,
            },
            &conn,
        )
        .unwrap();
        let mut filter = filter(Regime::Cash, false);
        filter.category_ids = Some(vec![1]);

        assert_eq!(fetch_opening_balance(&filter, user_id, &conn).unwrap(), 0.0);
    }

    #[test]
    fn opening_balance_ignores_rows_without_an_account() {
        let (conn, user_id) = setup();
        create_account(
            user_id,
            &AccountData {
                name: "Everyday".to_owned(),
                kind: AccountKind::Checking,
                initial_balance: 100.0,
            },
            &conn,
        )
        .unwrap();
        let card = create_credit_card(
            user_id,
            &CreditCardData {
                name: "Visa".to_owned(),
                limit: 1000.0,
                closing_day: 20,
                due_day: 5,
            },
            &conn,
        )
        .unwrap();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 30.0, date!(2025 - 12 - 10))
                .paid_at(date!(2025 - 12 - 10))
                .credit_card(card.id),
            &conn,
        )
        .unwrap();
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 7.0, date!(2025 - 12 - 11))
                .paid_at(date!(2025 - 12 - 11)),
            &conn,
        )
        .unwrap();

        let opening = fetch_opening_balance(&filter(Regime::Cash, false), user_id, &conn).unwrap();

        assert_eq!(opening, 100.0);
    }
}
