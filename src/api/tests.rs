#![allow(clippy::unwrap_used)]
//! Router-level tests: authentication, status codes and response bodies.

use super::*;
use crate::{
    config::{AmountPolicy, LineFailurePolicy},
    core::users,
    entities::{Order, OrderLine, menu_item, order, order_line, user},
    test_utils::*,
};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use tower::ServiceExt;

/// The order fixture behind a router, authenticated as its user.
struct TestApi {
    app: Router,
    token: String,
    db: Arc<DatabaseConnection>,
    user: user::Model,
    menu_items: Vec<menu_item::Model>,
    order: order::Model,
    lines: Vec<order_line::Model>,
}

async fn setup_api_with(config: AppConfig) -> crate::errors::Result<TestApi> {
    let OrderFixture {
        db,
        user,
        menu_items,
        order,
        lines,
    } = setup_with_order().await?;
    let token = users::get_or_create_token(&db, user.id).await?;
    let db = Arc::new(db);
    let app = router(AppState::new(Arc::clone(&db), Arc::new(config)));
    Ok(TestApi {
        app,
        token: token.key,
        db,
        user,
        menu_items,
        order,
        lines,
    })
}

async fn setup_api() -> crate::errors::Result<TestApi> {
    setup_api_with(AppConfig::default()).await
}

impl TestApi {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let authorization = Some(format!("Token {}", self.token));
        self.send(method, uri, authorization, body).await
    }
}

#[tokio::test]
async fn test_create_order_saves_valid_data() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let body = json!({
        "user": api.user.id,
        "lines": [{"menu": api.menu_items[0].id, "quantity": 8}]
    });
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"], "rabia");
    assert_eq!(json["order_lines"].as_array().unwrap().len(), 1);
    assert_eq!(json["order_lines"][0]["menu"]["name"], "sicilian pizza");
    assert_eq!(json["order_lines"][0]["menu"]["price"], "700.00");
    assert_eq!(json["amount"], "5600.00");
    assert!(json.get("id").is_none());
    assert_eq!(Order::find().count(api.db.as_ref()).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_create_order_missing_param() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let body = json!({"user": api.user.id});
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["non_field_errors"],
        json!(["Params missing. Required params are ('user', 'lines')"])
    );

    Ok(())
}

#[tokio::test]
async fn test_create_order_invalid_param() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let body = json!({
        "key": "error",
        "user": api.user.id,
        "lines": [{"menu": api.menu_items[0].id, "quantity": 8}]
    });
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["non_field_errors"],
        json!(["Not a valid param. Options are ('user', 'lines')"])
    );

    Ok(())
}

#[tokio::test]
async fn test_create_order_unknown_references_persist_nothing() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let body = json!({"user": 999, "lines": []});
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["non_field_errors"], json!(["User doesn't exist!"]));

    let body = json!({
        "user": api.user.id,
        "lines": [
            {"menu": api.menu_items[0].id, "quantity": 1},
            {"menu": 31337, "quantity": 1}
        ]
    });
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["non_field_errors"], json!(["Menu id 31337 doesn't exist!"]));

    assert_eq!(Order::find().count(api.db.as_ref()).await?, 1);
    assert_eq!(OrderLine::find().count(api.db.as_ref()).await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_create_order_drops_line_without_quantity() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let body = json!({
        "user": api.user.id,
        "lines": [
            {"menu": api.menu_items[0].id, "quantity": 8},
            {"menu": api.menu_items[1].id}
        ]
    });
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["amount"], "5600.00");
    assert_eq!(json["order_lines"].as_array().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_create_order_reject_policy_returns_400() -> crate::errors::Result<()> {
    let mut config = AppConfig::default();
    config.orders.line_failure_policy = LineFailurePolicy::RejectOrder;
    let api = setup_api_with(config).await?;

    let body = json!({
        "user": api.user.id,
        "lines": [{"menu": api.menu_items[1].id}]
    });
    let (status, json) = api.call(Method::POST, "/orders/", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["non_field_errors"].is_array());
    assert_eq!(Order::find().count(api.db.as_ref()).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_create_order_malformed_json() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/orders/")
        .header(header::AUTHORIZATION, format!("Token {}", api.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"user\": "))
        .unwrap();
    let response = api.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_retrieve_order() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let uri = format!("/orders/{}/", api.order.id);
    let (status, json) = api.call(Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"], "rabia");
    assert_eq!(json["order_lines"].as_array().unwrap().len(), 2);
    assert_eq!(json["amount"], "1200.00");
    assert_eq!(json["order_lines"][1]["menu"]["price"], "500.00");

    let (status, json) = api.call(Method::GET, "/orders/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["detail"], "Not found.");

    Ok(())
}

#[tokio::test]
async fn test_delete_order() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let uri = format!("/orders/{}/", api.order.id);
    let (status, _) = api.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = api.call(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = api.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(OrderLine::find().count(api.db.as_ref()).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_list_orders() -> crate::errors::Result<()> {
    let api = setup_api().await?;
    for _ in 0..2 {
        create_test_order(api.db.as_ref(), &api.user, &[]).await?;
    }

    let (status, json) = api.call(Method::GET, "/orders/?page_size=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    assert_eq!(json["next"], "/orders/?page=2&page_size=2");
    assert_eq!(json["previous"], Value::Null);

    let (status, json) = api.call(Method::GET, "/orders/?page=2&page_size=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    // oldest order comes last
    assert_eq!(results[0]["amount"], "1200.00");
    assert_eq!(results[0]["order_lines"].as_array().unwrap().len(), 2);
    assert_eq!(json["next"], Value::Null);

    let (status, json) = api.call(Method::GET, "/orders/?page=9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["detail"], "Invalid page.");

    Ok(())
}

#[tokio::test]
async fn test_patch_order_line_additive() -> crate::errors::Result<()> {
    let api = setup_api().await?;
    let line = &api.lines[0];
    assert_eq!(line.quantity, 1);

    let uri = format!("/order-lines/{}/", line.id);
    let (status, json) = api.call(Method::PATCH, &uri, Some(json!({"quantity": 3}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quantity"], 3);
    assert_eq!(json["menu"]["name"], "sicilian pizza");
    assert_eq!(json["order"], api.order.id);

    let order_uri = format!("/orders/{}/", api.order.id);
    let (_, order) = api.call(Method::GET, &order_uri, None).await;
    assert_eq!(order["amount"], "3300.00");

    Ok(())
}

#[tokio::test]
async fn test_patch_order_line_recompute() -> crate::errors::Result<()> {
    let mut config = AppConfig::default();
    config.orders.amount_policy = AmountPolicy::Recompute;
    let api = setup_api_with(config).await?;

    let uri = format!("/order-lines/{}/", api.lines[0].id);
    let (status, _) = api.call(Method::PATCH, &uri, Some(json!({"quantity": 3}))).await;
    assert_eq!(status, StatusCode::OK);

    let order_uri = format!("/orders/{}/", api.order.id);
    let (_, order) = api.call(Method::GET, &order_uri, None).await;
    assert_eq!(order["amount"], "2600.00");

    Ok(())
}

#[tokio::test]
async fn test_patch_order_line_errors() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let uri = format!("/order-lines/{}/", api.lines[0].id);
    let (status, json) = api.call(Method::PATCH, &uri, Some(json!({"quantity": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["quantity"],
        json!(["Ensure this value is greater than or equal to 1."])
    );

    let (status, json) = api.call(Method::PATCH, &uri, Some(json!({"quantity": "lots"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["quantity"], json!(["A valid integer is required."]));

    let (status, _) = api
        .call(Method::PATCH, "/order-lines/999/", Some(json!({"quantity": 2})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_patch_unknown_line_is_404_even_with_bad_quantity() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    let (status, json) = api
        .call(Method::PATCH, "/order-lines/9999/", Some(json!({"quantity": 0})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["detail"], "Not found.");

    Ok(())
}

#[tokio::test]
async fn test_non_numeric_ids_are_json_404() -> crate::errors::Result<()> {
    let api = setup_api().await?;

    for (method, uri, body) in [
        (Method::GET, "/orders/abc/", None),
        (Method::DELETE, "/orders/abc/", None),
        (Method::PATCH, "/order-lines/abc/", Some(json!({"quantity": 2}))),
    ] {
        let (status, json) = api.call(method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(json["detail"], "Not found.");
    }

    Ok(())
}

#[tokio::test]
async fn test_requests_without_valid_token_are_rejected() -> crate::errors::Result<()> {
    let api = setup_api().await?;
    let order_uri = format!("/orders/{}/", api.order.id);
    let line_uri = format!("/order-lines/{}/", api.lines[0].id);

    let cases = [
        (Method::GET, "/orders/".to_string(), None),
        (Method::POST, "/orders/".to_string(), Some(json!({"user": 1, "lines": []}))),
        (Method::GET, order_uri.clone(), None),
        (Method::DELETE, order_uri.clone(), None),
        (Method::PATCH, line_uri, Some(json!({"quantity": 2}))),
    ];
    for (method, uri, body) in cases {
        let (status, json) = api.send(method.clone(), &uri, None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(json["detail"], "Authentication credentials were not provided.");

        let (status, json) = api
            .send(method, &uri, Some("Token wrong".to_string()), body)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["detail"], "Invalid token.");
    }

    // nothing was deleted by the unauthenticated DELETE
    let (status, _) = api.call(Method::GET, &order_uri, None).await;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}
