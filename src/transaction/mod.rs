//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, paying and deleting transactions
//! - The REST endpoints for transactions

mod core;
mod endpoints;
mod query;

pub(crate) use core::validate_references;
pub use core::{
    Transaction, TransactionBuilder, TransactionKind, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, map_transaction_row,
    pay_transaction, unpay_transaction, update_transaction,
};
pub use endpoints::{
    PayData, TransactionState, create_transaction_endpoint, delete_transaction_endpoint,
    get_transaction_endpoint, list_transactions_endpoint, pay_transaction_endpoint,
    unpay_transaction_endpoint, update_transaction_endpoint,
};
pub use query::{TransactionFilter, get_transactions_page};
