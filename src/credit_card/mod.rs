//! Credit cards with their limits and statement days.

mod core;
mod endpoints;

pub use core::{
    CreditCard, CreditCardData, create_credit_card, create_credit_card_table, delete_credit_card,
    get_credit_card, get_credit_cards_page, update_credit_card,
};
pub use endpoints::{
    CreditCardState, create_credit_card_endpoint, delete_credit_card_endpoint,
    get_credit_card_endpoint, list_credit_cards_endpoint, update_credit_card_endpoint,
};
