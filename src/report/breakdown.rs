//! Totals grouped by category and by bank account.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    account::Account,
    database_id::DatabaseId,
    money::{percent_of, round_to_cents},
    transaction::TransactionKind,
};

use super::rows::ReportRow;

/// The display name for transactions without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// The display name for transactions without a bank account.
pub const NO_ACCOUNT_LABEL: &str = "No account";

/// The unrounded total of one category for one transaction kind.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryGroup {
    pub category_id: Option<DatabaseId>,
    pub name: String,
    pub total: f64,
    pub count: usize,
}

/// Group the rows of `kind` by category, largest total first.
///
/// Uncategorized rows are always grouped last, regardless of their total.
pub(super) fn group_by_category(rows: &[ReportRow], kind: TransactionKind) -> Vec<CategoryGroup> {
    let mut groups: HashMap<Option<DatabaseId>, CategoryGroup> = HashMap::new();

    for row in rows.iter().filter(|row| row.kind == kind) {
        let group = groups
            .entry(row.category_id)
            .or_insert_with(|| CategoryGroup {
                category_id: row.category_id,
                name: row
                    .category_name
                    .clone()
                    .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_owned()),
                total: 0.0,
                count: 0,
            });
        group.total += row.amount;
        group.count += 1;
    }

    let mut groups: Vec<CategoryGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        a.category_id
            .is_none()
            .cmp(&b.category_id.is_none())
            .then(b.total.total_cmp(&a.total))
            .then_with(|| a.name.cmp(&b.name))
    });

    groups
}

/// The total of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// `None` for uncategorized transactions.
    pub category_id: Option<DatabaseId>,
    pub category: String,
    pub total: f64,
    /// The share of the total for the category's kind.
    pub percent: f64,
    /// The number of transactions in the category.
    pub count: usize,
}

/// Income and expense totals per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub total_income: f64,
    pub total_expense: f64,
    pub income: Vec<CategoryTotal>,
    pub expense: Vec<CategoryTotal>,
}

fn category_totals(groups: Vec<CategoryGroup>, kind_total: f64) -> Vec<CategoryTotal> {
    groups
        .into_iter()
        .map(|group| CategoryTotal {
            category_id: group.category_id,
            category: group.name,
            total: round_to_cents(group.total),
            percent: percent_of(group.total, kind_total),
            count: group.count,
        })
        .collect()
}

fn kind_total(rows: &[ReportRow], kind: TransactionKind) -> f64 {
    rows.iter()
        .filter(|row| row.kind == kind)
        .map(|row| row.amount)
        .sum()
}

/// Total the rows per category, separately for income and expenses.
pub fn build_category_breakdown(rows: &[ReportRow]) -> CategoryBreakdown {
    let total_income = kind_total(rows, TransactionKind::Income);
    let total_expense = kind_total(rows, TransactionKind::Expense);

    CategoryBreakdown {
        total_income: round_to_cents(total_income),
        total_expense: round_to_cents(total_expense),
        income: category_totals(
            group_by_category(rows, TransactionKind::Income),
            total_income,
        ),
        expense: category_totals(
            group_by_category(rows, TransactionKind::Expense),
            total_expense,
        ),
    }
}

/// The totals of one bank account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountTotal {
    /// `None` for transactions without a bank account, e.g. credit card purchases.
    pub account_id: Option<DatabaseId>,
    pub account: String,
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    /// The account's share of all expenses.
    pub expense_percent: f64,
}

/// Income and expense totals per bank account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountBreakdown {
    pub total_income: f64,
    pub total_expense: f64,
    pub accounts: Vec<AccountTotal>,
}

#[derive(Default)]
struct Sums {
    income: f64,
    expense: f64,
}

/// Total the rows per bank account.
///
/// Every account in `accounts` is listed in the given order, even if it has
/// no transactions. Rows without an account, or with an account not in
/// `accounts`, are grouped last under [NO_ACCOUNT_LABEL] if there are any.
pub fn build_account_breakdown(rows: &[ReportRow], accounts: &[Account]) -> AccountBreakdown {
    let mut sums: HashMap<Option<DatabaseId>, Sums> = HashMap::new();

    for row in rows {
        let key = row
            .account_id
            .filter(|id| accounts.iter().any(|account| account.id == *id));
        let entry = sums.entry(key).or_default();

        match row.kind {
            TransactionKind::Income => entry.income += row.amount,
            TransactionKind::Expense => entry.expense += row.amount,
        }
    }

    let total_income = kind_total(rows, TransactionKind::Income);
    let total_expense = kind_total(rows, TransactionKind::Expense);

    let account_total = |account_id: Option<DatabaseId>, name: String, sums: &Sums| AccountTotal {
        account_id,
        account: name,
        income: round_to_cents(sums.income),
        expense: round_to_cents(sums.expense),
        net: round_to_cents(sums.income - sums.expense),
        expense_percent: percent_of(sums.expense, total_expense),
    };

    let empty = Sums::default();
    let mut totals: Vec<AccountTotal> = accounts
        .iter()
        .map(|account| {
            let account_sums = sums.get(&Some(account.id)).unwrap_or(&empty);
            account_total(Some(account.id), account.name.clone(), account_sums)
        })
        .collect();

    if let Some(unassigned) = sums.get(&None) {
        totals.push(account_total(None, NO_ACCOUNT_LABEL.to_owned(), unassigned));
    }

    AccountBreakdown {
        total_income: round_to_cents(total_income),
        total_expense: round_to_cents(total_expense),
        accounts: totals,
    }
}
