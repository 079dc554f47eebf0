//! Order line business logic - Partial updates of a line and the parent order's amount.
//!
//! After a line is updated the parent order's amount is adjusted according to
//! [`AmountPolicy`]:
//! - `Additive` adds `menu price * new quantity` to the current amount without
//!   removing what the line contributed before. Orders created through the API
//!   drift above their true total after each update under this policy.
//! - `Recompute` sets the amount to the sum over all current lines.

use crate::{
    config::AmountPolicy,
    core::order::LineDetail,
    entities::{MenuItem, Order, OrderLine, order, order_line},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde_json::Value;
use tracing::{info, instrument};

/// Fields of an order line that a partial update may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderLinePatch {
    /// New quantity, at least 1; `None` leaves the quantity unchanged
    pub quantity: Option<i32>,
}

fn quantity_error(message: &str) -> Error {
    Error::FieldValidation {
        field: "quantity".to_string(),
        message: message.to_string(),
    }
}

impl OrderLinePatch {
    /// Reads a patch from a JSON request body.
    ///
    /// Unknown fields are ignored. `quantity` must be an integer (or a string
    /// holding one) of at least 1.
    ///
    /// # Errors
    /// Returns `Error::FieldValidation` for a bad `quantity`, or
    /// `Error::Validation` if the body is not an object.
    pub fn from_json(body: &Value) -> Result<Self> {
        let Some(object) = body.as_object() else {
            return Err(Error::Validation {
                message: "Invalid data. Expected a dictionary.".to_string(),
            });
        };

        let quantity = match object.get("quantity") {
            None => None,
            Some(Value::Number(n)) => Some(
                n.as_i64()
                    .ok_or_else(|| quantity_error("A valid integer is required."))?,
            ),
            Some(Value::String(s)) => Some(
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| quantity_error("A valid integer is required."))?,
            ),
            Some(Value::Null) => return Err(quantity_error("This field may not be null.")),
            Some(_) => return Err(quantity_error("A valid integer is required.")),
        };

        let quantity = quantity
            .map(|q| {
                i32::try_from(q)
                    .ok()
                    .filter(|q| *q >= 1)
                    .ok_or_else(|| quantity_error("Ensure this value is greater than or equal to 1."))
            })
            .transpose()?;

        Ok(Self { quantity })
    }
}

/// Sum of `price * quantity` over the order's current lines.
pub async fn order_total<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<Decimal> {
    let lines = OrderLine::find()
        .filter(order_line::Column::OrderId.eq(order_id))
        .find_also_related(MenuItem)
        .all(db)
        .await?;

    Ok(lines
        .into_iter()
        .filter_map(|(line, menu)| menu.map(|menu| menu.price * Decimal::from(line.quantity)))
        .sum())
}

/// Retrieves an order line.
///
/// # Errors
/// Returns `Error::OrderLineNotFound` if no line has this id.
pub async fn get_order_line<C: ConnectionTrait>(db: &C, line_id: i64) -> Result<order_line::Model> {
    OrderLine::find_by_id(line_id)
        .one(db)
        .await?
        .ok_or(Error::OrderLineNotFound { id: line_id })
}

/// Applies a partial update to an order line and adjusts the parent order's amount.
///
/// The line update and the amount change commit together. The amount is
/// adjusted even when the patch leaves the line unchanged.
///
/// # Errors
/// Returns an error if:
/// - The line does not exist (checked first)
/// - The patch quantity is below 1
/// - The database update fails
#[instrument(skip(db))]
pub async fn update_order_line(
    db: &DatabaseConnection,
    line_id: i64,
    patch: OrderLinePatch,
    policy: AmountPolicy,
) -> Result<LineDetail> {
    let txn = db.begin().await?;

    let (line, menu) = OrderLine::find_by_id(line_id)
        .find_also_related(MenuItem)
        .one(&txn)
        .await?
        .ok_or(Error::OrderLineNotFound { id: line_id })?;
    let menu = menu.ok_or(Error::MenuItemNotFound { id: line.menu_id })?;

    if patch.quantity.is_some_and(|q| q < 1) {
        return Err(quantity_error(
            "Ensure this value is greater than or equal to 1.",
        ));
    }

    let line = match patch.quantity {
        Some(quantity) => {
            let mut active: order_line::ActiveModel = line.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?
        }
        None => line,
    };

    let now = chrono::Utc::now().naive_utc();
    let amount_expr = match policy {
        AmountPolicy::Additive => {
            let delta = menu.price * Decimal::from(line.quantity);
            Expr::col(order::Column::Amount).add(delta)
        }
        AmountPolicy::Recompute => Expr::value(order_total(&txn, line.order_id).await?),
    };

    let updated = Order::update_many()
        .col_expr(order::Column::Amount, amount_expr)
        .col_expr(order::Column::UpdatedAt, Expr::value(now))
        .filter(order::Column::Id.eq(line.order_id))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        return Err(Error::OrderNotFound { id: line.order_id });
    }

    txn.commit().await?;
    info!(
        "Order line {} updated to quantity {} ({:?} amount update on order {})",
        line.id, line.quantity, policy, line.order_id
    );

    Ok(LineDetail { line, menu })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    #[test]
    fn test_patch_from_json() {
        assert_eq!(
            OrderLinePatch::from_json(&json!({"quantity": 3})).unwrap(),
            OrderLinePatch { quantity: Some(3) }
        );
        assert_eq!(
            OrderLinePatch::from_json(&json!({"quantity": "4"})).unwrap(),
            OrderLinePatch { quantity: Some(4) }
        );
        assert_eq!(
            OrderLinePatch::from_json(&json!({"note": "extra cheese"})).unwrap(),
            OrderLinePatch { quantity: None }
        );
    }

    #[test]
    fn test_patch_from_json_rejects_bad_quantity() {
        for body in [
            json!({"quantity": 0}),
            json!({"quantity": -2}),
            json!({"quantity": 1.5}),
            json!({"quantity": "many"}),
            json!({"quantity": null}),
            json!({"quantity": [1]}),
        ] {
            let result = OrderLinePatch::from_json(&body);
            assert!(
                matches!(result, Err(Error::FieldValidation { ref field, .. }) if field == "quantity"),
                "{body} should be rejected"
            );
        }

        assert!(matches!(
            OrderLinePatch::from_json(&json!(3)),
            Err(Error::Validation { message: _ })
        ));
    }

    #[tokio::test]
    async fn test_additive_update_adds_new_subtotal() -> Result<()> {
        let fixture = setup_with_order().await?;
        let line = &fixture.lines[0];

        let updated = update_order_line(
            &fixture.db,
            line.id,
            OrderLinePatch { quantity: Some(3) },
            AmountPolicy::Additive,
        )
        .await?;
        assert_eq!(updated.line.quantity, 3);
        assert_eq!(updated.menu.id, fixture.menu_items[0].id);

        // 1200 + 700 * 3, the old 700 * 1 is not removed
        let order = Order::find_by_id(fixture.order.id)
            .one(&fixture.db)
            .await?
            .unwrap();
        assert_eq!(order.amount, Decimal::from(3300));

        let stored = OrderLine::find_by_id(line.id).one(&fixture.db).await?.unwrap();
        assert_eq!(stored.quantity, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_additive_update_without_changes_still_adds() -> Result<()> {
        let fixture = setup_with_order().await?;

        update_order_line(
            &fixture.db,
            fixture.lines[1].id,
            OrderLinePatch::default(),
            AmountPolicy::Additive,
        )
        .await?;

        let order = Order::find_by_id(fixture.order.id)
            .one(&fixture.db)
            .await?
            .unwrap();
        assert_eq!(order.amount, Decimal::from(1700));

        Ok(())
    }

    #[tokio::test]
    async fn test_recompute_update_sums_current_lines() -> Result<()> {
        let fixture = setup_with_order().await?;

        update_order_line(
            &fixture.db,
            fixture.lines[0].id,
            OrderLinePatch { quantity: Some(3) },
            AmountPolicy::Recompute,
        )
        .await?;

        // 700 * 3 + 500 * 1
        let order = Order::find_by_id(fixture.order.id)
            .one(&fixture.db)
            .await?
            .unwrap();
        assert_eq!(order.amount, Decimal::from(2600));
        assert_eq!(order_total(&fixture.db, fixture.order.id).await?, Decimal::from(2600));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_line() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_order_line(
            &db,
            77,
            OrderLinePatch { quantity: Some(2) },
            AmountPolicy::Additive,
        )
        .await;
        assert!(matches!(result, Err(Error::OrderLineNotFound { id: 77 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_line_wins_over_bad_quantity() -> Result<()> {
        let fixture = setup_with_order().await?;

        let result = update_order_line(
            &fixture.db,
            9999,
            OrderLinePatch { quantity: Some(0) },
            AmountPolicy::Additive,
        )
        .await;
        assert!(matches!(result, Err(Error::OrderLineNotFound { id: 9999 })));

        let found = get_order_line(&fixture.db, fixture.lines[0].id).await?;
        assert_eq!(found.quantity, 1);
        assert!(matches!(
            get_order_line(&fixture.db, 9999).await,
            Err(Error::OrderLineNotFound { id: 9999 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_zero_quantity() -> Result<()> {
        let fixture = setup_with_order().await?;

        let result = update_order_line(
            &fixture.db,
            fixture.lines[0].id,
            OrderLinePatch { quantity: Some(0) },
            AmountPolicy::Additive,
        )
        .await;
        assert!(matches!(result, Err(Error::FieldValidation { field: _, message: _ })));

        let stored = OrderLine::find_by_id(fixture.lines[0].id)
            .one(&fixture.db)
            .await?
            .unwrap();
        assert_eq!(stored.quantity, 1);

        Ok(())
    }
}
