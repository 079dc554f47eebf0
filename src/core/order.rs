//! Order business logic - Validation, creation, listing, retrieval and deletion of orders.
//!
//! An order is created from a request body holding exactly two fields, `user` and
//! `lines`. Validation resolves the user and every line's menu item before anything
//! is written. Creation then runs in one database transaction: the order row first,
//! then one row per line, then the final amount (`Σ price * quantity` over the lines
//! that were stored). Lines that cannot be stored are reported back as
//! [`LineFailure`]s; [`LineFailurePolicy`] decides whether the order is kept
//! without them or rolled back.

use crate::{
    config::LineFailurePolicy,
    core::catalog,
    entities::{MenuItem, Order, OrderLine, User, menu_item, order, order_line, user},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

/// Top-level fields an order request must carry, and the only ones it may carry
pub const REQUIRED_PARAMS: [&str; 2] = ["user", "lines"];

/// Renders [`REQUIRED_PARAMS`] the way validation messages quote them: `('user', 'lines')`
fn quoted_params() -> String {
    let quoted: Vec<String> = REQUIRED_PARAMS.iter().map(|p| format!("'{p}'")).collect();
    format!("({})", quoted.join(", "))
}

/// Strictly decoded order request. Identifiers stay raw JSON until resolved.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OrderRequest {
    user: Value,
    lines: Vec<LineRequest>,
}

#[derive(Debug, Deserialize)]
struct LineRequest {
    #[serde(default)]
    menu: Value,
    #[serde(default)]
    quantity: Value,
}

/// A requested line whose menu item exists.
#[derive(Debug, Clone)]
pub struct ValidatedLine {
    /// Resolved menu item
    pub menu: menu_item::Model,
    /// Requested quantity; `None` when it was missing or not a positive integer
    pub quantity: Option<i32>,
}

/// An order request whose references all resolved.
#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    /// Owner of the new order
    pub user: user::Model,
    /// Lines in request order
    pub lines: Vec<ValidatedLine>,
}

/// An order line together with its menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDetail {
    /// The stored line
    pub line: order_line::Model,
    /// The menu item it references
    pub menu: menu_item::Model,
}

/// An order with its owner and lines, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetail {
    /// The stored order
    pub order: order::Model,
    /// Owner of the order
    pub user: user::Model,
    /// Lines in creation order
    pub lines: Vec<LineDetail>,
}

/// A requested line that could not be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    /// 0-based position of the line in the request
    pub index: usize,
    /// Menu item the line referenced
    pub menu_id: i64,
    /// Why the line was not stored
    pub reason: String,
}

/// Outcome of a successful [`create_order`].
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    /// The committed order
    pub order: OrderDetail,
    /// Lines that were dropped (always empty under `RejectOrder`)
    pub line_failures: Vec<LineFailure>,
}

/// One page of the order listing.
#[derive(Debug, Clone)]
pub struct OrderPage {
    /// Total number of orders
    pub count: u64,
    /// 1-based page number
    pub page: u64,
    /// Maximum number of orders per page
    pub page_size: u64,
    /// Orders on this page, newest id first
    pub orders: Vec<OrderDetail>,
}

impl OrderPage {
    /// Whether a further page exists
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page * self.page_size < self.count
    }

    /// Whether an earlier page exists
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Reads an identifier given either as a JSON integer or as a numeric string.
fn parse_identifier(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Renders an identifier for error messages; an absent one reads `None`.
fn display_identifier(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a quantity that must be a positive integer.
fn parse_quantity(value: &Value) -> Option<i32> {
    let quantity = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    i32::try_from(quantity).ok().filter(|q| *q >= 1)
}

fn check_params(body: &Map<String, Value>) -> Result<()> {
    if REQUIRED_PARAMS.iter().any(|p| !body.contains_key(*p)) {
        return Err(Error::Validation {
            message: format!("Params missing. Required params are {}", quoted_params()),
        });
    }
    if body.keys().any(|k| !REQUIRED_PARAMS.contains(&k.as_str())) {
        return Err(Error::Validation {
            message: format!("Not a valid param. Options are {}", quoted_params()),
        });
    }
    Ok(())
}

/// Validates an order request body and resolves its references.
///
/// Checks run in this order and stop at the first failure:
/// 1. both `user` and `lines` are present
/// 2. no other top-level field is present
/// 3. the body decodes (`lines` is a list of objects)
/// 4. `user` names an existing user
/// 5. every line's `menu` names an existing menu item
///
/// Nothing is written to the database.
///
/// # Errors
/// Returns `Error::Validation` carrying the caller-facing message, or a
/// database error if a lookup fails.
#[instrument(skip(db, body))]
pub async fn validate_order_request<C: ConnectionTrait>(
    db: &C,
    body: &Value,
) -> Result<ValidatedOrder> {
    let Some(object) = body.as_object() else {
        return Err(Error::Validation {
            message: "Invalid data. Expected a dictionary.".to_string(),
        });
    };
    check_params(object)?;

    let request: OrderRequest =
        serde_json::from_value(body.clone()).map_err(|e| Error::Validation {
            message: format!("Invalid order request: {e}"),
        })?;

    let user = match parse_identifier(&request.user) {
        Some(user_id) => User::find_by_id(user_id).one(db).await?,
        None => None,
    }
    .ok_or_else(|| Error::Validation {
        message: "User doesn't exist!".to_string(),
    })?;

    let mut lines = Vec::with_capacity(request.lines.len());
    for line in request.lines {
        let menu = match parse_identifier(&line.menu) {
            Some(menu_id) => catalog::get_menu_item_by_id(db, menu_id).await?,
            None => None,
        }
        .ok_or_else(|| Error::Validation {
            message: format!("Menu id {} doesn't exist!", display_identifier(&line.menu)),
        })?;

        lines.push(ValidatedLine {
            menu,
            quantity: parse_quantity(&line.quantity),
        });
    }

    Ok(ValidatedOrder { user, lines })
}

async fn insert_line<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
    line: &ValidatedLine,
) -> Result<order_line::Model> {
    let quantity = line.quantity.ok_or_else(|| Error::FieldValidation {
        field: "quantity".to_string(),
        message: "A valid positive integer is required.".to_string(),
    })?;

    let model = order_line::ActiveModel {
        order_id: Set(order_id),
        menu_id: Set(line.menu.id),
        quantity: Set(quantity),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates an order and its lines in a single transaction.
///
/// The amount is the sum of `price * quantity` over the lines that were stored.
///
/// # Returns
/// * `Ok(Some(created))` - the committed order, plus any dropped lines
/// * `Ok(None)` - the order row itself could not be inserted; nothing was written
///
/// # Errors
/// Returns `Error::LinesRejected` if a line failed under
/// [`LineFailurePolicy::RejectOrder`] (the transaction is rolled back), or a
/// database error if the transaction cannot be started or committed.
#[instrument(skip(db, validated), fields(user_id = validated.user.id, lines = validated.lines.len()))]
pub async fn create_order(
    db: &DatabaseConnection,
    validated: ValidatedOrder,
    policy: LineFailurePolicy,
) -> Result<Option<CreatedOrder>> {
    let txn = db.begin().await?;

    let now = chrono::Utc::now().naive_utc();
    let new_order = order::ActiveModel {
        user_id: Set(validated.user.id),
        amount: Set(Decimal::ZERO),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let order = match new_order.insert(&txn).await {
        Ok(order) => order,
        Err(e) => {
            error!("Unable to create order: {}", e);
            txn.rollback().await?;
            return Ok(None);
        }
    };
    info!("Order with id {} has been created.", order.id);

    let mut amount = Decimal::ZERO;
    let mut lines = Vec::with_capacity(validated.lines.len());
    let mut line_failures = Vec::new();

    for (index, line) in validated.lines.into_iter().enumerate() {
        match insert_line(&txn, order.id, &line).await {
            Ok(stored) => {
                info!("Order line with id {} has been created.", stored.id);
                amount += line.menu.price * Decimal::from(stored.quantity);
                lines.push(LineDetail {
                    line: stored,
                    menu: line.menu,
                });
            }
            Err(e) => {
                error!("Unable to create order line {}: {}", index, e);
                line_failures.push(LineFailure {
                    index,
                    menu_id: line.menu.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    if !line_failures.is_empty() {
        if policy == LineFailurePolicy::RejectOrder {
            txn.rollback().await?;
            return Err(Error::LinesRejected {
                failed: line_failures.len(),
            });
        }
        warn!(
            "Order {} stored without {} failed line(s)",
            order.id,
            line_failures.len()
        );
    }

    let mut active: order::ActiveModel = order.into();
    active.amount = Set(amount);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    Ok(Some(CreatedOrder {
        order: OrderDetail {
            order,
            user: validated.user,
            lines,
        },
        line_failures,
    }))
}

/// Loads the lines (with menu items) of the given orders, grouped by order id.
async fn load_lines<C: ConnectionTrait>(
    db: &C,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<LineDetail>>> {
    let rows = OrderLine::find()
        .filter(order_line::Column::OrderId.is_in(order_ids.iter().copied()))
        .order_by_asc(order_line::Column::Id)
        .find_also_related(MenuItem)
        .all(db)
        .await?;

    let mut grouped: HashMap<i64, Vec<LineDetail>> = HashMap::new();
    for (line, menu) in rows {
        let Some(menu) = menu else {
            warn!("Order line {} references missing menu item {}", line.id, line.menu_id);
            continue;
        };
        grouped
            .entry(line.order_id)
            .or_default()
            .push(LineDetail { line, menu });
    }
    Ok(grouped)
}

/// Retrieves an order with its owner and lines.
///
/// # Errors
/// Returns `Error::OrderNotFound` if no order has this id.
pub async fn get_order_detail<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<OrderDetail> {
    let (order, user) = Order::find_by_id(order_id)
        .find_also_related(User)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;
    let user = user.ok_or_else(|| Error::UserNotFound {
        id: order.user_id.to_string(),
    })?;

    let lines = load_lines(db, &[order.id])
        .await?
        .remove(&order.id)
        .unwrap_or_default();

    Ok(OrderDetail { order, user, lines })
}

/// Lists orders newest id first, one page at a time.
///
/// `page` is 1-based. The first page always exists, even when there are no
/// orders; any later page must contain at least one order.
///
/// # Errors
/// Returns `Error::InvalidPage` for page 0 or a page past the end.
pub async fn list_orders(db: &DatabaseConnection, page: u64, page_size: u64) -> Result<OrderPage> {
    let page_size = page_size.max(1);
    let paginator = Order::find()
        .order_by_desc(order::Column::Id)
        .find_also_related(User)
        .paginate(db, page_size);

    let count = paginator.num_items().await?;
    if page == 0 || (page > 1 && (page - 1) * page_size >= count) {
        return Err(Error::InvalidPage { page });
    }

    let rows = paginator.fetch_page(page - 1).await?;
    let order_ids: Vec<i64> = rows.iter().map(|(order, _)| order.id).collect();
    let mut lines = load_lines(db, &order_ids).await?;

    let mut orders = Vec::with_capacity(rows.len());
    for (order, user) in rows {
        let user = user.ok_or_else(|| Error::UserNotFound {
            id: order.user_id.to_string(),
        })?;
        let order_lines = lines.remove(&order.id).unwrap_or_default();
        orders.push(OrderDetail {
            order,
            user,
            lines: order_lines,
        });
    }

    Ok(OrderPage {
        count,
        page,
        page_size,
        orders,
    })
}

/// Deletes an order and all of its lines.
///
/// # Errors
/// Returns `Error::OrderNotFound` if no order has this id.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let removed = OrderLine::delete_many()
        .filter(order_line::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?
        .rows_affected;
    Order::delete_by_id(order_id).exec(&txn).await?;

    txn.commit().await?;
    info!("Deleted order {} with {} line(s)", order_id, removed);
    Ok(())
}
