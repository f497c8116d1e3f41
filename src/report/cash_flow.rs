//! The cash flow report: income, expenses and the running balance per period.

use serde::Serialize;

use crate::{money::round_to_cents, transaction::TransactionKind};

use super::{
    axis::{AxisBounds, axis_bounds},
    filter::ReportFilter,
    period::{Period, period_buckets, period_index},
    rows::ReportRow,
};

/// The cash flow of a single period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowPeriod {
    #[serde(flatten)]
    pub period: Period,
    pub income: f64,
    pub expense: f64,
    /// Income minus expenses.
    pub net: f64,
    /// The running balance at the end of the period.
    pub balance: f64,
}

/// Sums over the whole report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowTotals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowReport {
    /// The balance before the first period.
    pub opening_balance: f64,
    /// The balance after the last period.
    pub closing_balance: f64,
    pub periods: Vec<CashFlowPeriod>,
    pub totals: CashFlowTotals,
    /// The y-axis range for charting income, expenses, net and balance.
    pub axis: AxisBounds,
}

/// Bucket `rows` into the filter's periods and compute the running balance
/// starting from `opening_balance`.
///
/// Every period in the range is present, including periods with no rows.
pub fn build_cash_flow(
    filter: &ReportFilter,
    rows: &[ReportRow],
    opening_balance: f64,
) -> CashFlowReport {
    let periods = period_buckets(filter);
    let mut sums = vec![(0.0_f64, 0.0_f64); periods.len()];
    let mut total_income = 0.0;
    let mut total_expense = 0.0;

    for row in rows {
        let Some(index) = period_index(&periods, row.reference_date) else {
            tracing::warn!(
                "Report row for transaction {} on {} is outside of the report range",
                row.transaction_id,
                row.reference_date
            );
            continue;
        };

        match row.kind {
            TransactionKind::Income => {
                sums[index].0 += row.amount;
                total_income += row.amount;
            }
            TransactionKind::Expense => {
                sums[index].1 += row.amount;
                total_expense += row.amount;
            }
        }
    }

    let mut balance = opening_balance;
    let periods: Vec<CashFlowPeriod> = periods
        .into_iter()
        .zip(sums)
        .map(|(period, (income, expense))| {
            let net = income - expense;
            balance += net;

            CashFlowPeriod {
                period,
                income: round_to_cents(income),
                expense: round_to_cents(expense),
                net: round_to_cents(net),
                balance: round_to_cents(balance),
            }
        })
        .collect();

    let axis = axis_bounds(periods.iter().flat_map(|period| {
        [period.income, period.expense, period.net, period.balance]
    }));

    CashFlowReport {
        opening_balance: round_to_cents(opening_balance),
        closing_balance: round_to_cents(balance),
        periods,
        totals: CashFlowTotals {
            income: round_to_cents(total_income),
            expense: round_to_cents(total_expense),
            net: round_to_cents(total_income - total_expense),
        },
        axis,
    }
}
