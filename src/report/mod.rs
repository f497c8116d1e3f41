//! Financial reports: cash flow, income statement and breakdowns by category
//! and bank account.
//!
//! Every report is built in the same way:
//! 1. The query parameters are validated into a [ReportFilter].
//! 2. The matching transactions are loaded as [ReportRow]s, each with the
//!    date it counts on under the chosen regime.
//! 3. The rows are aggregated in memory.

mod axis;
mod breakdown;
mod cash_flow;
mod filter;
mod handlers;
mod income_statement;
mod period;
mod rows;

pub use axis::{AxisBounds, axis_bounds};
pub use breakdown::{
    AccountBreakdown, AccountTotal, CategoryBreakdown, CategoryTotal, NO_ACCOUNT_LABEL,
    UNCATEGORIZED_LABEL, build_account_breakdown, build_category_breakdown,
};
pub use cash_flow::{CashFlowPeriod, CashFlowReport, CashFlowTotals, build_cash_flow};
pub use filter::{Granularity, MAX_DAILY_RANGE_DAYS, Regime, ReportFilter, ReportQuery};
pub use handlers::{
    ReportResponse, ReportState, account_report_endpoint, cash_flow_endpoint,
    category_report_endpoint, income_statement_endpoint,
};
pub use income_statement::{IncomeStatement, StatementLine, StatementPeriod, build_income_statement};
pub use period::{Period, bucket_start, period_buckets};
pub use rows::{ReportRow, fetch_opening_balance, fetch_report_rows};
