//! The income statement: revenue and expenses by category with the net result.

use serde::Serialize;

use crate::{
    database_id::DatabaseId,
    money::{percent_of, round_to_cents},
    transaction::TransactionKind,
};

use super::{
    axis::{AxisBounds, axis_bounds},
    breakdown::{CategoryGroup, group_by_category},
    filter::ReportFilter,
    period::{Period, period_buckets, period_index},
    rows::ReportRow,
};

/// One category line of the income statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementLine {
    /// `None` for uncategorized transactions.
    pub category_id: Option<DatabaseId>,
    pub category: String,
    pub amount: f64,
    /// The share of gross revenue.
    pub percent: f64,
}

/// The net result of a single period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementPeriod {
    #[serde(flatten)]
    pub period: Period,
    pub revenue: f64,
    pub expenses: f64,
    pub net_result: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeStatement {
    pub gross_revenue: f64,
    pub revenue: Vec<StatementLine>,
    pub total_expenses: f64,
    pub expenses: Vec<StatementLine>,
    /// Gross revenue minus total expenses.
    pub net_result: f64,
    /// The net result as a percentage of gross revenue, zero without revenue.
    pub net_margin: f64,
    pub periods: Vec<StatementPeriod>,
    /// The y-axis range for charting the period results.
    pub axis: AxisBounds,
}

fn statement_lines(groups: Vec<CategoryGroup>, gross_revenue: f64) -> Vec<StatementLine> {
    groups
        .into_iter()
        .map(|group| StatementLine {
            category_id: group.category_id,
            category: group.name,
            amount: round_to_cents(group.total),
            percent: percent_of(group.total, gross_revenue),
        })
        .collect()
}

/// Build the income statement for the rows in the filter's range.
///
/// Both revenue and expense lines are sorted by amount, largest first, with
/// uncategorized transactions last. Percentages are relative to gross revenue.
pub fn build_income_statement(filter: &ReportFilter, rows: &[ReportRow]) -> IncomeStatement {
    let revenue = group_by_category(rows, TransactionKind::Income);
    let expenses = group_by_category(rows, TransactionKind::Expense);
    let gross_revenue: f64 = revenue.iter().map(|group| group.total).sum();
    let total_expenses: f64 = expenses.iter().map(|group| group.total).sum();
    let net_result = gross_revenue - total_expenses;

    let buckets = period_buckets(filter);
    let mut sums = vec![(0.0_f64, 0.0_f64); buckets.len()];
    for row in rows {
        if let Some(index) = period_index(&buckets, row.reference_date) {
            match row.kind {
                TransactionKind::Income => sums[index].0 += row.amount,
                TransactionKind::Expense => sums[index].1 += row.amount,
            }
        }
    }

    let periods: Vec<StatementPeriod> = buckets
        .into_iter()
        .zip(sums)
        .map(|(period, (revenue, expenses))| StatementPeriod {
            period,
            revenue: round_to_cents(revenue),
            expenses: round_to_cents(expenses),
            net_result: round_to_cents(revenue - expenses),
        })
        .collect();
    let axis = axis_bounds(
        periods
            .iter()
            .flat_map(|period| [period.revenue, period.expenses, period.net_result]),
    );

    IncomeStatement {
        gross_revenue: round_to_cents(gross_revenue),
        revenue: statement_lines(revenue, gross_revenue),
        total_expenses: round_to_cents(total_expenses),
        expenses: statement_lines(expenses, gross_revenue),
        net_result: round_to_cents(net_result),
        net_margin: percent_of(net_result, gross_revenue),
        periods,
        axis,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        database_id::DatabaseId,
        report::{
            breakdown::UNCATEGORIZED_LABEL,
            filter::{Granularity, Regime, ReportFilter},
            rows::ReportRow,
        },
        transaction::TransactionKind,
    };

    use super::build_income_statement;

    fn filter() -> ReportFilter {
        ReportFilter {
            start_date: date!(2026 - 01 - 01),
            end_date: date!(2026 - 02 - 28),
            granularity: Granularity::Monthly,
            regime: Regime::Accrual,
            include_unpaid: true,
            category_ids: None,
            account_ids: None,
        }
    }

    fn row(
        kind: TransactionKind,
        amount: f64,
        category: Option<(DatabaseId, &str)>,
        reference_date: time::Date,
    ) -> ReportRow {
        ReportRow {
            transaction_id: 1,
            kind,
            amount,
            reference_date,
            category_id: category.map(|(id, _)| id),
            category_name: category.map(|(_, name)| name.to_owned()),
            account_id: None,
        }
    }

    #[test]
    fn computes_net_result_and_margin() {
        let rows = [
            row(TransactionKind::Income, 4000.0, Some((1, "Wages")), date!(2026 - 01 - 15)),
            row(TransactionKind::Income, 1000.0, Some((2, "Freelance")), date!(2026 - 02 - 15)),
            row(TransactionKind::Expense, 1500.0, Some((3, "Rent")), date!(2026 - 01 - 01)),
            row(TransactionKind::Expense, 100.0, None, date!(2026 - 01 - 03)),
            row(TransactionKind::Expense, 400.0, Some((4, "Food")), date!(2026 - 02 - 03)),
        ];

        let statement = build_income_statement(&filter(), &rows);

        assert_eq!(statement.gross_revenue, 5000.0);
        assert_eq!(statement.total_expenses, 2000.0);
        assert_eq!(statement.net_result, 3000.0);
        assert_eq!(statement.net_margin, 60.0);
        assert_eq!(statement.revenue[0].category, "Wages");
        assert_eq!(statement.revenue[0].percent, 80.0);
        let expense_names: Vec<_> = statement
            .expenses
            .iter()
            .map(|line| line.category.as_str())
            .collect();
        assert_eq!(expense_names, ["Rent", "Food", UNCATEGORIZED_LABEL]);
        assert_eq!(statement.expenses[0].percent, 30.0);
        assert_eq!(statement.periods.len(), 2);
        assert_eq!(statement.periods[0].net_result, 2400.0);
        assert_eq!(statement.periods[1].net_result, 600.0);
    }

    #[test]
    fn no_revenue_gives_zero_percentages() {
        let rows = [row(
            TransactionKind::Expense,
            75.0,
            Some((3, "Rent")),
            date!(2026 - 01 - 01),
        )];

        let statement = build_income_statement(&filter(), &rows);

        assert_eq!(statement.gross_revenue, 0.0);
        assert_eq!(statement.net_result, -75.0);
        assert_eq!(statement.net_margin, 0.0);
        assert_eq!(statement.expenses[0].percent, 0.0);
    }

    #[test]
    fn empty_statement() {
        let statement = build_income_statement(&filter(), &[]);

        assert_eq!(statement.net_result, 0.0);
        assert!(statement.revenue.is_empty());
        assert_eq!(statement.periods.len(), 2);
        assert_eq!(statement.axis.max, 1.0);
    }
}
