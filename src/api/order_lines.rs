//! `/order-lines/` handlers.

use crate::{
    api::{AppState, record_id, serializers::OrderLineBody},
    core::order_line::{self, OrderLinePatch},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde_json::Value;

/// `PATCH /order-lines/{id}/` - update a line's quantity and adjust its order's amount.
///
/// An unknown line is a 404 before the body is looked at.
pub async fn partial_update(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<OrderLineBody>> {
    let line_id = record_id(path)?;
    order_line::get_order_line(state.db.as_ref(), line_id).await?;

    let Json(body) = payload.map_err(|rejection| Error::Validation {
        message: rejection.body_text(),
    })?;
    let patch = OrderLinePatch::from_json(&body)?;

    let detail = order_line::update_order_line(
        state.db.as_ref(),
        line_id,
        patch,
        state.config.orders.amount_policy,
    )
    .await?;
    Ok(Json(OrderLineBody::from(&detail)))
}
