//! `/orders/` handlers: list, create, retrieve and delete.

use crate::{
    api::{
        AppState,
        record_id,
        auth::AuthenticatedUser,
        serializers::{OrderBody, OrderListBody},
    },
    core::order::{self, CreatedOrder},
    errors::{Error, Result},
};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

const ORDERS_PATH: &str = "/orders/";

/// Query parameters of the listing. Both are read leniently: an unparsable
/// `page` is an invalid page, an unparsable `page_size` falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    page: Option<String>,
    page_size: Option<String>,
}

/// `GET /orders/` - one page of orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<OrderListBody>> {
    let page = match params.page.as_deref() {
        None => 1,
        Some(raw) => raw.trim().parse().map_err(|_| Error::InvalidPage { page: 0 })?,
    };
    let requested_size = params
        .page_size
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|size| *size > 0)
        .map(|size| size.min(state.config.api.max_page_size));
    let page_size = requested_size.unwrap_or(state.config.api.page_size);

    let orders = order::list_orders(state.db.as_ref(), page, page_size).await?;
    Ok(Json(OrderListBody::from_page(
        &orders,
        ORDERS_PATH,
        requested_size,
    )))
}

/// `POST /orders/` - validate and create an order.
///
/// Answers 201 with the order, or 201 with `{}` when the order row could not
/// be stored.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload.map_err(|rejection| Error::Validation {
        message: rejection.body_text(),
    })?;
    debug!("Order creation requested by {}", caller.0.username);

    let validated = order::validate_order_request(state.db.as_ref(), &body).await?;
    let created =
        order::create_order(state.db.as_ref(), validated, state.config.orders.line_failure_policy).await?;

    Ok(created_response(created))
}

/// 201 with the order, or 201 with `{}` when the order row was not stored.
fn created_response(created: Option<CreatedOrder>) -> Response {
    match created {
        Some(created) => {
            if !created.line_failures.is_empty() {
                info!(
                    "Order {} created with {} line(s) dropped",
                    created.order.order.id,
                    created.line_failures.len()
                );
            }
            (StatusCode::CREATED, Json(OrderBody::from(&created.order))).into_response()
        }
        None => (StatusCode::CREATED, Json(json!({}))).into_response(),
    }
}

/// `GET /orders/{id}/`
pub async fn retrieve_order(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderBody>> {
    let order_id = record_id(path)?;
    let detail = order::get_order_detail(state.db.as_ref(), order_id).await?;
    Ok(Json(OrderBody::from(&detail)))
}

/// `DELETE /orders/{id}/`
pub async fn destroy_order(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let order_id = record_id(path)?;
    order::delete_order(state.db.as_ref(), order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
