//! Database query helpers for listing transactions.

use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    database_id::DatabaseId,
    db::QueryFilter,
    pagination::{Page, PageRequest, SortSpec, fetch_page},
};

use super::core::{TRANSACTION_COLUMNS, Transaction, TransactionKind, map_transaction_row};

/// The filters accepted by the transaction list endpoint, in addition to the
/// pagination parameters.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct TransactionFilter {
    /// Only include transactions dated on or after this date.
    pub start_date: Option<Date>,
    /// Only include transactions dated on or before this date.
    pub end_date: Option<Date>,
    /// Only include income or expenses.
    pub kind: Option<TransactionKind>,
    /// Only include paid or unpaid transactions.
    pub paid: Option<bool>,
    pub account_id: Option<DatabaseId>,
    pub credit_card_id: Option<DatabaseId>,
    pub category_id: Option<DatabaseId>,
}

pub(crate) const TRANSACTION_SORT: SortSpec = SortSpec {
    fields: &[
        ("id", "t.id"),
        ("date", "t.date"),
        ("due_date", "t.due_date"),
        ("paid_at", "t.paid_at"),
        ("amount", "t.amount"),
        ("description", "t.description"),
        ("kind", "t.kind"),
    ],
    default_field: "date",
    id_column: "t.id",
};

/// Get a page of the transactions belonging to `user_id` that match `filter`.
///
/// The search string matches the description, ignoring case.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_transactions_page(
    user_id: UserID,
    filter: &TransactionFilter,
    request: &PageRequest,
    connection: &Connection,
) -> Result<Page<Transaction>, Error> {
    let mut query_filter = QueryFilter::for_user("t.user_id", user_id);

    if let Some(start_date) = filter.start_date {
        query_filter.push("t.date >= ?", start_date.to_string());
    }
    if let Some(end_date) = filter.end_date {
        query_filter.push("t.date <= ?", end_date.to_string());
    }
    if let Some(kind) = filter.kind {
        query_filter.push("t.kind = ?", kind.as_str().to_owned());
    }
    if let Some(paid) = filter.paid {
        query_filter.push("t.paid = ?", paid);
    }
    if let Some(account_id) = filter.account_id {
        query_filter.push("t.account_id = ?", account_id);
    }
    if let Some(credit_card_id) = filter.credit_card_id {
        query_filter.push("t.credit_card_id = ?", credit_card_id);
    }
    if let Some(category_id) = filter.category_id {
        query_filter.push("t.category_id = ?", category_id);
    }
    if let Some(pattern) = request.search_pattern() {
        query_filter.push("t.description LIKE ? ESCAPE '\\'", pattern);
    }

    fetch_page(
        connection,
        TRANSACTION_COLUMNS,
        "FROM \"transaction\" t",
        &query_filter,
        request,
        map_transaction_row,
    )
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        auth::UserID,
        pagination::{PaginationConfig, PaginationQuery, SortOrder},
        test_utils::{create_test_user, get_test_connection},
        transaction::{TransactionBuilder, TransactionKind, create_transaction},
    };

    use super::{TRANSACTION_SORT, TransactionFilter, get_transactions_page};

    fn insert(user_id: UserID, kind: TransactionKind, amount: f64, date: Date, conn: &Connection) {
        create_transaction(
            user_id,
            TransactionBuilder::new(kind, amount, date).description(&format!("Item {amount}")),
            conn,
        )
        .unwrap();
    }

    fn request(query: PaginationQuery) -> crate::pagination::PageRequest {
        query
            .resolve(&PaginationConfig::default(), &TRANSACTION_SORT)
            .unwrap()
    }

    #[test]
    fn pages_are_sorted_by_date_descending_by_default() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        insert(user_id, TransactionKind::Expense, 1.0, date!(2026 - 01 - 01), &conn);
        insert(user_id, TransactionKind::Expense, 2.0, date!(2026 - 01 - 03), &conn);
        insert(user_id, TransactionKind::Expense, 3.0, date!(2026 - 01 - 02), &conn);

        let page = get_transactions_page(
            user_id,
            &TransactionFilter::default(),
            &request(PaginationQuery {
                limit: Some(2),
                ..Default::default()
            }),
            &conn,
        )
        .unwrap();

        let amounts: Vec<f64> = page.data.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [2.0, 3.0]);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 2);
    }

    #[test]
    fn second_page_continues_where_first_ended() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        for day in 1..=5 {
            let date = Date::from_calendar_date(2026, time::Month::March, day).unwrap();
            insert(user_id, TransactionKind::Income, day as f64, date, &conn);
        }

        let page = get_transactions_page(
            user_id,
            &TransactionFilter::default(),
            &request(PaginationQuery {
                page: Some(2),
                limit: Some(2),
                sort_by: Some("amount".to_owned()),
                sort_order: Some(SortOrder::Ascending),
                search: None,
            }),
            &conn,
        )
        .unwrap();

        let amounts: Vec<f64> = page.data.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [3.0, 4.0]);
    }

    #[test]
    fn filters_by_date_kind_and_search() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        insert(user_id, TransactionKind::Expense, 10.0, date!(2026 - 01 - 15), &conn);
        insert(user_id, TransactionKind::Income, 20.0, date!(2026 - 01 - 16), &conn);
        insert(user_id, TransactionKind::Expense, 30.0, date!(2026 - 02 - 01), &conn);

        let filter = TransactionFilter {
            start_date: Some(date!(2026 - 01 - 01)),
            end_date: Some(date!(2026 - 01 - 31)),
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        };
        let page = get_transactions_page(
            user_id,
            &filter,
            &request(PaginationQuery::default()),
            &conn,
        )
        .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].amount, 10.0);

        let page = get_transactions_page(
            user_id,
            &TransactionFilter::default(),
            &request(PaginationQuery {
                search: Some("item 2".to_owned()),
                ..Default::default()
            }),
            &conn,
        )
        .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].amount, 20.0);
    }

    #[test]
    fn filters_by_paid() {
        let conn = get_test_connection();
        let user_id = create_test_user("foo@bar.baz", &conn);
        let date = date!(2026 - 01 - 15);
        insert(user_id, TransactionKind::Expense, 10.0, date, &conn);
        create_transaction(
            user_id,
            TransactionBuilder::new(TransactionKind::Expense, 5.0, date).paid_at(date),
            &conn,
        )
        .unwrap();

        let filter = TransactionFilter {
            paid: Some(true),
            ..Default::default()
        };
        let page = get_transactions_page(
            user_id,
            &filter,
            &request(PaginationQuery::default()),
            &conn,
        )
        .unwrap();

        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].amount, 5.0);
    }

    #[test]
    fn excludes_other_users_transactions() {
        let conn = get_test_connection();
        let owner = create_test_user("owner@bar.baz", &conn);
        let other = create_test_user("other@bar.baz", &conn);
        insert(owner, TransactionKind::Expense, 10.0, date!(2026 - 01 - 15), &conn);

        let page = get_transactions_page(
            other,
            &TransactionFilter::default(),
            &request(PaginationQuery::default()),
            &conn,
        )
        .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.meta.total, 0);
        assert_eq!(page.meta.total_pages, 0);
    }
}
