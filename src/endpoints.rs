//! The REST API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for exchanging credentials for a bearer token.
pub const LOG_IN: &str = "/api/auth/log_in";
/// The route for registering users.
pub const USERS: &str = "/api/users";
/// The route for the user that owns the bearer token.
pub const CURRENT_USER: &str = "/api/users/me";

/// The route to create and list bank accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to access a single bank account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";

/// The route to create and list credit cards.
pub const CREDIT_CARDS: &str = "/api/credit-cards";
/// The route to access a single credit card.
pub const CREDIT_CARD: &str = "/api/credit-cards/{credit_card_id}";

/// The route to create and list categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to mark a transaction as paid.
pub const PAY_TRANSACTION: &str = "/api/transactions/{transaction_id}/pay";
/// The route to mark a transaction as unpaid.
pub const UNPAY_TRANSACTION: &str = "/api/transactions/{transaction_id}/unpay";

/// The route to create and list recurring transactions.
pub const RECURRING: &str = "/api/recurring";
/// The route to access a single recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring/{recurring_id}";
/// The route to generate the pending transactions of a recurring transaction.
pub const GENERATE_RECURRING: &str = "/api/recurring/{recurring_id}/generate";

/// The cash flow report.
pub const CASH_FLOW_REPORT: &str = "/api/reports/cash-flow";
/// The income statement (DRE) report.
pub const INCOME_STATEMENT_REPORT: &str = "/api/reports/income-statement";
/// The totals per category report.
pub const CATEGORY_REPORT: &str = "/api/reports/categories";
/// The totals per bank account report.
pub const ACCOUNT_REPORT: &str = "/api/reports/accounts";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{account_id}' in '/api/accounts/{account_id}'. Only the first parameter
/// is replaced. If there is no parameter, `endpoint_path` is returned as is.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
