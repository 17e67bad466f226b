//! HTTP client for the HashiCups API.
//!
//! [`HashiCupsApi`] is the seam the coffee resource talks through; [`Client`]
//! implements it over `reqwest`, and `testing::InMemoryHashiCups` implements it
//! in memory for tests.

mod models;

pub use models::{Coffee, CoffeeIngredientRequest, Ingredient, IngredientRef};

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::ProviderError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations of the HashiCups API used by the provider.
#[async_trait::async_trait]
pub trait HashiCupsApi: Send + Sync {
    /// List every coffee.
    async fn get_coffees(&self) -> Result<Vec<Coffee>, ProviderError>;

    /// Fetch one coffee. An empty answer is [`ProviderError::NotFound`].
    async fn get_coffee(&self, coffee_id: i64) -> Result<Coffee, ProviderError>;

    /// List the ingredients of a coffee.
    async fn get_coffee_ingredients(&self, coffee_id: i64)
        -> Result<Vec<Ingredient>, ProviderError>;

    /// Create a coffee; the returned value carries the assigned id.
    async fn create_coffee(&self, coffee: &Coffee) -> Result<Coffee, ProviderError>;

    /// Replace the scalar attributes of `coffee.id`.
    async fn update_coffee(&self, coffee: &Coffee) -> Result<Coffee, ProviderError>;

    /// Delete a coffee.
    async fn delete_coffee(&self, coffee_id: i64) -> Result<(), ProviderError>;

    /// Create or replace one named ingredient of a coffee.
    async fn create_coffee_ingredient(
        &self,
        coffee_id: i64,
        request: &CoffeeIngredientRequest,
    ) -> Result<Ingredient, ProviderError>;
}

/// `reqwest`-backed HashiCups client.
#[derive(Debug, Clone)]
pub struct Client {
    host_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for `host_url` with the [`DEFAULT_TIMEOUT`].
    pub fn new(host_url: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_timeout(host_url, DEFAULT_TIMEOUT)
    }

    /// Create a client for `host_url` with a per-request timeout.
    pub fn with_timeout(
        host_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let host_url = host_url.into().trim_end_matches('/').to_string();
        if host_url.is_empty() {
            return Err(ProviderError::Configuration(
                "HashiCups host URL must not be empty".to_string(),
            ));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { host_url, http })
    }

    /// Base URL requests are issued against.
    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.host_url, path))
    }

    /// Send a request and return the body of a successful response.
    async fn do_request(&self, request: RequestBuilder) -> Result<Vec<u8>, ProviderError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "HashiCups response");

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "Could not read HashiCups error body");
                    format!("<unreadable response body: {}>", e)
                },
            };
            warn!(status = status.as_u16(), body = %body, "HashiCups request failed");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let body = self.do_request(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl HashiCupsApi for Client {
    #[instrument(skip(self))]
    async fn get_coffees(&self) -> Result<Vec<Coffee>, ProviderError> {
        self.fetch(self.request(Method::GET, "/coffees")).await
    }

    #[instrument(skip(self))]
    async fn get_coffee(&self, coffee_id: i64) -> Result<Coffee, ProviderError> {
        // The API answers with a list even for a single coffee.
        let coffees: Vec<Coffee> = self
            .fetch(self.request(Method::GET, &format!("/coffees/{}", coffee_id)))
            .await?;
        coffees
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("coffee {}", coffee_id)))
    }

    #[instrument(skip(self))]
    async fn get_coffee_ingredients(
        &self,
        coffee_id: i64,
    ) -> Result<Vec<Ingredient>, ProviderError> {
        self.fetch(self.request(Method::GET, &format!("/coffees/{}/ingredients", coffee_id)))
            .await
    }

    #[instrument(skip(self, coffee), fields(name = %coffee.name))]
    async fn create_coffee(&self, coffee: &Coffee) -> Result<Coffee, ProviderError> {
        self.fetch(self.request(Method::POST, "/coffees").json(coffee))
            .await
    }

    #[instrument(skip(self, coffee), fields(coffee_id = coffee.id))]
    async fn update_coffee(&self, coffee: &Coffee) -> Result<Coffee, ProviderError> {
        self.fetch(
            self.request(Method::PUT, &format!("/coffees/{}", coffee.id))
                .json(coffee),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_coffee(&self, coffee_id: i64) -> Result<(), ProviderError> {
        self.do_request(self.request(Method::DELETE, &format!("/coffees/{}", coffee_id)))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name, quantity = request.quantity))]
    async fn create_coffee_ingredient(
        &self,
        coffee_id: i64,
        request: &CoffeeIngredientRequest,
    ) -> Result<Ingredient, ProviderError> {
        self.fetch(
            self.request(Method::POST, &format!("/coffees/{}/ingredients", coffee_id))
                .json(request),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_client_rejects_empty_host() {
        let err = Client::new("").unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = Client::new("http://localhost:19090/").unwrap();
        assert_eq!(client.host_url(), "http://localhost:19090");
    }

    #[tokio::test]
    async fn test_get_coffee_takes_first_entry() {
        let app = Router::new().route(
            "/coffees/{id}",
            get(|Path(id): Path<i64>| async move {
                Json(json!([{"id": id, "name": "Packer Spiced Latte", "price": 350}]))
            }),
        );
        let client = Client::new(spawn(app).await).unwrap();

        let coffee = client.get_coffee(4).await.unwrap();
        assert_eq!(coffee.id, 4);
        assert_eq!(coffee.name, "Packer Spiced Latte");
        assert_eq!(coffee.price, 350.0);
    }

    #[tokio::test]
    async fn test_get_coffee_empty_is_not_found() {
        let app = Router::new().route("/coffees/{id}", get(|| async { Json(json!([])) }));
        let client = Client::new(spawn(app).await).unwrap();

        let err = client.get_coffee(99).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_coffee_ingredients() {
        let app = Router::new().route(
            "/coffees/{id}/ingredients",
            get(|| async {
                Json(json!([
                    {"id": 1, "name": "Espresso", "quantity": 40, "unit": "ml"},
                    {"id": 3, "name": "Steamed Milk", "quantity": 300, "unit": "ml"}
                ]))
            }),
        );
        let client = Client::new(spawn(app).await).unwrap();

        let ingredients = client.get_coffee_ingredients(1).await.unwrap();
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[1].name, "Steamed Milk");
        assert_eq!(ingredients[1].quantity, 300);
    }

    #[tokio::test]
    async fn test_create_coffee_ingredient_posts_request() {
        let app = Router::new().route(
            "/coffees/{id}/ingredients",
            post(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                assert_eq!(body["coffee_id"], id);
                Json(json!({
                    "id": 12,
                    "name": body["name"],
                    "quantity": body["quantity"],
                    "unit": body["unit"]
                }))
            }),
        );
        let client = Client::new(spawn(app).await).unwrap();

        let request = CoffeeIngredientRequest {
            coffee_id: 5,
            ingredient_id: 0,
            name: "Pumpkin Spice".to_string(),
            quantity: 1,
            unit: "ml".to_string(),
        };
        let ingredient = client.create_coffee_ingredient(5, &request).await.unwrap();
        assert_eq!(
            ingredient,
            Ingredient {
                id: 12,
                name: "Pumpkin Spice".to_string(),
                quantity: 1,
                unit: "ml".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_create_and_update_coffee() {
        let app = Router::new()
            .route(
                "/coffees",
                post(|Json(mut body): Json<Value>| async move {
                    body["id"] = json!(21);
                    Json(body)
                }),
            )
            .route(
                "/coffees/{id}",
                axum::routing::put(|Json(body): Json<Value>| async move { Json(body) }),
            );
        let client = Client::new(spawn(app).await).unwrap();

        let created = client
            .create_coffee(&Coffee {
                name: "terraspiced latte".to_string(),
                price: 150.0,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.id, 21);

        let updated = client
            .update_coffee(&Coffee {
                price: 250.0,
                ..created
            })
            .await
            .unwrap();
        assert_eq!(updated.id, 21);
        assert_eq!(updated.price, 250.0);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let app = Router::new().route(
            "/coffees/{id}",
            axum::routing::delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
        );
        let client = Client::new(spawn(app).await).unwrap();

        let err = client.delete_coffee(1).await.unwrap_err();
        match err {
            ProviderError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "db down");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_reported() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            // Promise more body than is sent, then hang up.
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\ndb do")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        let client = Client::new(format!("http://{}", addr)).unwrap();

        let err = client.delete_coffee(1).await.unwrap_err();
        match err {
            ProviderError::Api { status, body } => {
                assert_eq!(status, 500);
                assert!(body.starts_with("<unreadable response body"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_coffee_ignores_body() {
        let app = Router::new().route(
            "/coffees/{id}",
            axum::routing::delete(|| async { "Deleted coffee" }),
        );
        let client = Client::new(spawn(app).await).unwrap();

        tokio_test::assert_ok!(client.delete_coffee(1).await);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        // Port 9 (discard) is not expected to run an HTTP server.
        let client = Client::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.get_coffees().await.unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)));
        assert!(err.is_remote());
    }
}
