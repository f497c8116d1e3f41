//! Recurring transactions, e.g. wages or rent, and the pending transactions generated from them.

mod core;
mod endpoints;
mod schedule;

pub use core::{
    RecurringData, RecurringTransaction, create_recurring, create_recurring_table,
    delete_recurring, generate_transactions, get_recurring, get_recurring_page, update_recurring,
};
pub use endpoints::{
    GenerateData, RecurringState, create_recurring_endpoint, delete_recurring_endpoint,
    generate_recurring_endpoint, get_recurring_endpoint, list_recurring_endpoint,
    update_recurring_endpoint,
};
pub use schedule::{Frequency, MAX_OCCURRENCES, occurrences};
