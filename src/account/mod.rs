//! Bank accounts and wallets, and their current balances.

mod core;
mod endpoints;

pub use core::{
    Account, AccountData, AccountKind, create_account, create_account_table, delete_account,
    get_account, get_accounts, get_accounts_page, update_account,
};
pub use endpoints::{
    AccountState, create_account_endpoint, delete_account_endpoint, get_account_endpoint,
    list_accounts_endpoint, update_account_endpoint,
};
