//! Unified error type for the order backend.
//!
//! Every fallible operation in `core`, `config` and `api` returns
//! [`Result`]. The API layer turns these variants into HTTP responses.

use thiserror::Error;

/// Errors produced anywhere in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The request body failed shape or reference validation
    #[error("{message}")]
    Validation {
        /// Message shown to the caller under `non_field_errors`
        message: String,
    },

    /// A single field of a partial update was rejected
    #[error("{field}: {message}")]
    FieldValidation {
        /// Name of the offending field
        field: String,
        /// Message shown to the caller under the field name
        message: String,
    },

    /// No user with this id
    #[error("User {id} not found")]
    UserNotFound {
        /// Requested user id
        id: String,
    },

    /// No menu item with this id
    #[error("Menu item {id} not found")]
    MenuItemNotFound {
        /// Requested menu item id
        id: i64,
    },

    /// No order with this id
    #[error("Order {id} not found")]
    OrderNotFound {
        /// Requested order id
        id: i64,
    },

    /// No order line with this id
    #[error("Order line {id} not found")]
    OrderLineNotFound {
        /// Requested order line id
        id: i64,
    },

    /// A record id in the URL was not a number
    #[error("Invalid record id: {message}")]
    InvalidId {
        /// Why the path segment was rejected
        message: String,
    },

    /// Requested page is past the end of the listing
    #[error("Invalid page {page}")]
    InvalidPage {
        /// Requested 1-based page number
        page: u64,
    },

    /// Some lines could not be created and the policy forbids partial orders
    #[error("{failed} order line(s) could not be created")]
    LinesRejected {
        /// Number of lines that failed
        failed: usize,
    },

    /// A menu price was negative or unparsable
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The rejected price as given
        price: String,
    },

    /// Missing or unknown credentials
    #[error("{message}")]
    Unauthorized {
        /// Message shown to the caller under `detail`
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (config or CSV file access, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
