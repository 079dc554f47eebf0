//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod auth_token;
pub mod menu_item;
pub mod order;
pub mod order_line;
pub mod user;

// Re-export specific types to avoid conflicts
pub use auth_token::{Column as AuthTokenColumn, Entity as AuthToken, Model as AuthTokenModel};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_line::{Column as OrderLineColumn, Entity as OrderLine, Model as OrderLineModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
