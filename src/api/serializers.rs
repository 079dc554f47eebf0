//! JSON representations of orders, order lines and menu items.
//!
//! No representation carries the record's own `id`. Money is rendered as a
//! string with two decimals and timestamps as `%Y-%m-%d %H:%M:%S`.

use crate::{
    core::order::{LineDetail, OrderDetail, OrderPage},
    entities::menu_item,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// Timestamp format of `created_at` and `updated_at`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_money(value: Decimal) -> String {
    format!("{value:.2}")
}

fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// A menu item, expanded inside each order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemBody {
    /// Item name
    pub name: String,
    /// Unit price, two decimals
    pub price: String,
}

impl From<&menu_item::Model> for MenuItemBody {
    fn from(item: &menu_item::Model) -> Self {
        Self {
            name: item.name.clone(),
            price: format_money(item.price),
        }
    }
}

/// An order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineBody {
    /// Id of the parent order
    pub order: i64,
    /// The ordered menu item
    pub menu: MenuItemBody,
    /// Number of units
    pub quantity: i32,
}

impl From<&LineDetail> for OrderLineBody {
    fn from(detail: &LineDetail) -> Self {
        Self {
            order: detail.line.order_id,
            menu: MenuItemBody::from(&detail.menu),
            quantity: detail.line.quantity,
        }
    }
}

/// An order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBody {
    /// Username of the owner
    pub user: String,
    /// Lines in creation order
    pub order_lines: Vec<OrderLineBody>,
    /// Creation time
    pub created_at: String,
    /// Last modification time
    pub updated_at: String,
    /// Order total, two decimals
    pub amount: String,
}

impl From<&OrderDetail> for OrderBody {
    fn from(detail: &OrderDetail) -> Self {
        Self {
            user: detail.user.username.clone(),
            order_lines: detail.lines.iter().map(OrderLineBody::from).collect(),
            created_at: format_datetime(detail.order.created_at),
            updated_at: format_datetime(detail.order.updated_at),
            amount: format_money(detail.order.amount),
        }
    }
}

/// A page of the order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderListBody {
    /// Total number of orders
    pub count: u64,
    /// Link to the next page, if any
    pub next: Option<String>,
    /// Link to the previous page, if any
    pub previous: Option<String>,
    /// Orders on this page
    pub results: Vec<OrderBody>,
}

/// Builds a listing link. Page 1 is addressed without a `page` parameter.
fn page_link(path: &str, page: u64, page_size: Option<u64>) -> String {
    let mut params = Vec::new();
    if page > 1 {
        params.push(format!("page={page}"));
    }
    if let Some(size) = page_size {
        params.push(format!("page_size={size}"));
    }
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", params.join("&"))
    }
}

impl OrderListBody {
    /// Renders `page`, linking neighbours under `path`. `requested_page_size`
    /// is repeated in the links only when the caller asked for one.
    #[must_use]
    pub fn from_page(page: &OrderPage, path: &str, requested_page_size: Option<u64>) -> Self {
        Self {
            count: page.count,
            next: page
                .has_next()
                .then(|| page_link(path, page.page + 1, requested_page_size)),
            previous: page
                .has_previous()
                .then(|| page_link(path, page.page - 1, requested_page_size)),
            results: page.orders.iter().map(OrderBody::from).collect(),
        }
    }
}
