//! JSON-over-HTTP implementation of the backend collaborators.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::RwLock;
use tracing::{debug, instrument};

use super::{ApiError, OrderService, ServerCart, ServerCartView, SyncItem};
use crate::domain::aggregates::{CreateOrderRequest, PlacedOrder};
use crate::domain::value_objects::Quantity;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Success bodies come either as `{ "data": ... }` or as the bare payload.
/// Whichever shape is present must parse; there is no fallback between them.
fn unwrap_envelope<T: DeserializeOwned>(mut body: Value) -> Result<T, ApiError> {
    let data = body.as_object_mut().and_then(|o| o.remove("data"));
    Ok(serde_json::from_value(data.unwrap_or(body))?)
}

/// Human-readable text from an error body field. Arrays of strings are joined
/// and nested `{ "message": ... }` objects are followed.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(parts) => {
            let joined = parts.iter().filter_map(Value::as_str).collect::<Vec<_>>().join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        Value::Object(fields) => fields.get("message").and_then(message_text),
        _ => None,
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.get("message").and_then(message_text).or_else(|| body.get("error").and_then(message_text))
}

#[derive(Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self { Self::with_client(Client::new(), base_url) }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, token: RwLock::new(None) }
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    /// Bearer token used for account-scoped calls; `None` signs out.
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() { *slot = token; }
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    fn authed(&self, rb: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.read().ok().and_then(|t| t.clone()).ok_or(ApiError::Unauthenticated)?;
        Ok(rb.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, ApiError> {
        let resp = check(rb.send().await?).await?;
        let body: Value = resp.json().await?;
        unwrap_envelope(body)
    }
}

async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() { return Ok(resp); }
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).ok();
    let message = body.as_ref().and_then(error_message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
    debug!(status = status.as_u16(), message = %message, "backend rejected request");
    Err(ApiError::backend(status.as_u16(), message))
}

#[async_trait]
impl ServerCart for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<ServerCartView, ApiError> {
        Self::send(self.authed(self.client.get(self.url("/cart")))?).await
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    async fn sync_items(&self, items: &[SyncItem]) -> Result<ServerCartView, ApiError> {
        let rb = self.client.post(self.url("/cart/sync")).json(&serde_json::json!({ "items": items }));
        Self::send(self.authed(rb)?).await
    }

    #[instrument(skip(self))]
    async fn update_quantity(&self, item_id: &str, quantity: Quantity) -> Result<ServerCartView, ApiError> {
        let rb = self.client.patch(self.url(&format!("/cart/items/{item_id}"))).json(&serde_json::json!({ "quantity": quantity }));
        Self::send(self.authed(rb)?).await
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, item_id: &str) -> Result<ServerCartView, ApiError> {
        Self::send(self.authed(self.client.delete(self.url(&format!("/cart/items/{item_id}"))))?).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), ApiError> {
        check(self.authed(self.client.delete(self.url("/cart")))?.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderService for HttpBackend {
    #[instrument(skip(self, request), fields(store_id = %request.store_id))]
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, ApiError> {
        let rb = self.client.post(self.url("/orders"))
            .header(IDEMPOTENCY_HEADER, request.idempotency_key.to_string())
            .json(request);
        Self::send(self.authed(rb)?).await
    }

    #[instrument(skip(self, request), fields(store_id = %request.store_id))]
    async fn create_guest_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder, ApiError> {
        let rb = self.client.post(self.url("/orders/guest"))
            .header(IDEMPOTENCY_HEADER, request.idempotency_key.to_string())
            .json(request);
        Self::send(rb).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CheckoutDetails, OrderItemRequest};
    use crate::domain::value_objects::DeliveryLocation;
    use crate::sync::SyncPolicy;
    use axum::{
        extract::{Json, Path},
        http::{HeaderMap, StatusCode},
        routing::{delete, get, post},
        Router,
    };
    use serde_json::json;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn cart_json() -> Value {
        json!({"data": {"id": "C1", "items": [{
            "id": "L1", "variantId": null, "quantity": 2,
            "product": {"id": "P1", "name": "Tea", "price": 45, "store": {"id": "S1", "name": "Leaf"}}
        }]}})
    }

    fn app() -> Router {
        Router::new()
            .route("/cart", get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer t0k3n") => (StatusCode::OK, Json(cart_json())),
                    _ => (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))),
                }
            }).delete(|| async { StatusCode::NO_CONTENT }))
            .route("/cart/sync", post(|| async {
                (StatusCode::NOT_FOUND, Json(json!({"message": "Profile not found for user"})))
            }))
            .route("/cart/items/:id", delete(|Path(id): Path<String>| async move {
                if id == "L1" {
                    (StatusCode::OK, Json(json!({"data": {"id": "C1", "items": []}})))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"error": format!("Cart item {id} not found")})))
                }
            }).patch(|Path(_id): Path<String>, Json(body): Json<Value>| async move {
                let mut cart = cart_json();
                cart["data"]["items"][0]["quantity"] = body["quantity"].clone();
                Json(cart)
            }))
            .route("/orders/guest", post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let key = headers.get(IDEMPOTENCY_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
                assert!(!body.to_string().contains("price"));
                Json(json!({"id": key, "orderNumber": "ORD-1", "storeId": body["storeId"]}))
            }))
    }

    #[tokio::test]
    async fn test_fetch_requires_token() {
        let backend = HttpBackend::new(spawn(app()).await);
        assert!(matches!(backend.fetch().await, Err(ApiError::Unauthenticated)));
        backend.set_access_token(Some("wrong".into()));
        match backend.fetch().await {
            Err(ApiError::Backend { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected: {other:?}"),
        }
        backend.set_access_token(Some("t0k3n".into()));
        let cart = backend.fetch().await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product.store.id, "S1");
    }

    #[tokio::test]
    async fn test_line_mutations() {
        let backend = HttpBackend::new(spawn(app()).await);
        backend.set_access_token(Some("t0k3n".into()));
        let cart = backend.update_quantity("L1", Quantity::new(5).unwrap()).await.unwrap();
        assert_eq!(cart.items[0].quantity.value(), 5);
        assert!(backend.remove_item("L1").await.unwrap().items.is_empty());
        let err = backend.remove_item("L9").await.unwrap_err();
        assert_eq!(err.backend_message(), Some("Cart item L9 not found"));
        backend.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_backend_message_is_surfaced() {
        let backend = HttpBackend::new(spawn(app()).await);
        backend.set_access_token(Some("t0k3n".into()));
        let err = backend.sync_items(&[]).await.unwrap_err();
        assert_eq!(err.backend_message(), Some("Profile not found for user"));
    }

    #[tokio::test]
    async fn test_malformed_cart_is_an_error() {
        let app = Router::new().route("/cart", get(|| async {
            Json(json!({"data": {"id": "C1", "items": [{
                "id": "L1", "quantity": 0,
                "product": {"id": "P1", "name": "Tea", "price": 45, "store": {"id": "S1", "name": "Leaf"}}
            }]}}))
        }));
        let backend = HttpBackend::new(spawn(app).await);
        backend.set_access_token(Some("t0k3n".into()));
        assert!(matches!(backend.fetch().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_bare_cart_without_items_is_an_error() {
        let app = Router::new().route("/cart", get(|| async { Json(json!({"id": "C1"})) }));
        let backend = HttpBackend::new(spawn(app).await);
        backend.set_access_token(Some("t0k3n".into()));
        assert!(matches!(backend.fetch().await, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_message_survives_structured_error_field() {
        let app = Router::new().route("/cart/sync", post(|| async {
            (StatusCode::NOT_FOUND, Json(json!({"success": false, "message": "Profile not found", "error": {"code": "P404"}})))
        }));
        let backend = HttpBackend::new(spawn(app).await);
        backend.set_access_token(Some("t0k3n".into()));
        let err = backend.sync_items(&[]).await.unwrap_err();
        assert_eq!(err.backend_message(), Some("Profile not found"));
        assert!(SyncPolicy::default().is_retryable(&err));
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(&json!({"message": ["phone is required", "name is required"]})).as_deref(),
            Some("phone is required; name is required"));
        assert_eq!(error_message(&json!({"error": {"code": 7, "message": "Out of stock"}})).as_deref(), Some("Out of stock"));
        assert_eq!(error_message(&json!({"message": 42, "error": "Bad request"})).as_deref(), Some("Bad request"));
        assert_eq!(error_message(&json!({"error": {"code": 7}})), None);
    }

    #[tokio::test]
    async fn test_guest_order_sends_idempotency_key() {
        let backend = HttpBackend::new(format!("{}/", spawn(app()).await));
        let item = OrderItemRequest { product_id: "P1".into(), variant_id: None, quantity: Quantity::ONE };
        let request = CreateOrderRequest::new("S9", DeliveryLocation::InsideCity, &CheckoutDetails::default(), vec![item]);
        let placed = backend.create_guest_order(&request).await.unwrap();
        assert_eq!(placed.id, request.idempotency_key.to_string());
        assert_eq!(placed.store_id, "S9");
    }
}
