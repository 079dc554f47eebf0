//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{catalog, users},
    entities::{self, order, order_line},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber (no-op if one is already set).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an active user with a `<username>@example.com` address.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    users::create_user(db, username, &format!("{username}@example.com")).await
}

/// Creates a menu item with the given price.
pub async fn create_test_menu_item(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
) -> Result<entities::menu_item::Model> {
    catalog::create_menu_item(db, name, price).await
}

/// Inserts an order directly, bypassing the creation service.
///
/// The amount is computed from `lines` (menu item, quantity), so the fixture
/// starts out consistent.
pub async fn create_test_order(
    db: &DatabaseConnection,
    user: &entities::user::Model,
    lines: &[(entities::menu_item::Model, i32)],
) -> Result<order::Model> {
    let now = chrono::Utc::now().naive_utc();
    let amount: Decimal = lines
        .iter()
        .map(|(menu, quantity)| menu.price * Decimal::from(*quantity))
        .sum();

    let order = order::ActiveModel {
        user_id: Set(user.id),
        amount: Set(amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (menu, quantity) in lines {
        order_line::ActiveModel {
            order_id: Set(order.id),
            menu_id: Set(menu.id),
            quantity: Set(*quantity),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(order)
}

/// A user "rabia", two pizzas (700 and 500) and one order holding one of each.
pub struct OrderFixture {
    /// Database holding the fixture
    pub db: DatabaseConnection,
    /// Owner of the order
    pub user: entities::user::Model,
    /// `[sicilian pizza @ 700, italian pizza @ 500]`
    pub menu_items: Vec<entities::menu_item::Model>,
    /// The order, amount 1200
    pub order: order::Model,
    /// The order's two lines, quantity 1 each, in menu item order
    pub lines: Vec<order_line::Model>,
}

/// Sets up the standard order fixture.
pub async fn setup_with_order() -> Result<OrderFixture> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "rabia").await?;
    let sicilian = create_test_menu_item(&db, "sicilian pizza", Decimal::from(700)).await?;
    let italian = create_test_menu_item(&db, "italian pizza", Decimal::from(500)).await?;

    let order = create_test_order(&db, &user, &[(sicilian.clone(), 1), (italian.clone(), 1)]).await?;
    let lines = crate::entities::OrderLine::find()
        .filter(crate::entities::OrderLineColumn::OrderId.eq(order.id))
        .order_by_asc(crate::entities::OrderLineColumn::Id)
        .all(&db)
        .await?;

    Ok(OrderFixture {
        db,
        user,
        menu_items: vec![sicilian, italian],
        order,
        lines,
    })
}
