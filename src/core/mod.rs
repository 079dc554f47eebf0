//! Core business logic - framework-agnostic catalog, user, order and order line operations.
//!
//! Every function takes its database handle as a parameter; nothing here knows about HTTP.

/// Menu items and the CSV catalog import
pub mod catalog;
/// Order validation, creation, listing and deletion
pub mod order;
/// Order line partial updates and amount adjustment
pub mod order_line;
/// Users and API tokens
pub mod users;
