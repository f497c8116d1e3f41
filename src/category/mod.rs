//! Income and expense categories.

mod core;
mod endpoints;

pub(crate) use core::get_referenced_category_kind;
pub use core::{
    Category, CategoryData, create_category, create_category_table, delete_category,
    get_categories_page, get_category, update_category,
};
pub use endpoints::{
    CategoryState, create_category_endpoint, delete_category_endpoint, get_category_endpoint,
    list_categories_endpoint, update_category_endpoint,
};
