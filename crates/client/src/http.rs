//! `reqwest` implementation of the Data API traits.
//!
//! Plain REST with JSON bodies. Every request carries the bearer token from
//! configuration plus a generated `x-request-id` so client logs can be
//! correlated with the server's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use chispa_core::catalog::{CategoryNode, Offer, Page, Product};
use chispa_core::checkout::{OrderLine, ShippingInfo};
use chispa_core::types::{CategoryId, MediaId, OfferId, ProductId};

use crate::api::{
    AdminApi, ApiResult, CartApi, CartSnapshot, CatalogApi, CategoryFilters, CategoryInput,
    ComposedMessage, MediaInput, OfferInput, ProductFilters, ProductInput,
};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client for the Chispa Data API.
///
/// Cheap to clone; all state lives behind the `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new Data API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.token.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Send a request, discarding the response body.
    async fn execute_unit(&self, request: reqwest::RequestBuilder) -> ApiResult<()> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let request_id = Uuid::new_v4();
        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let path = response.url().path().to_owned();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                path,
                request_id = %request_id,
                "Data API request failed"
            );
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(response)
    }
}

/// Request body for creating a product with its staged media.
#[derive(Serialize)]
struct ProductCreateBody<'a> {
    #[serde(flatten)]
    fields: &'a ProductInput,
    media: &'a [MediaInput],
}

/// Request body for updating a product together with media changes.
#[derive(Serialize)]
struct ProductUpdateBody<'a> {
    #[serde(flatten)]
    fields: &'a ProductInput,
    media_add: &'a [MediaInput],
    media_remove: &'a [MediaId],
}

/// Request body for creating an offer.
#[derive(Serialize)]
struct OfferCreateBody<'a> {
    product_id: ProductId,
    #[serde(flatten)]
    fields: &'a OfferInput,
}

#[async_trait]
impl CatalogApi for HttpClient {
    #[instrument(skip(self, filters))]
    async fn list_products(
        &self,
        filters: &ProductFilters,
        page: u32,
    ) -> ApiResult<Page<Product>> {
        let request = self
            .client
            .get(self.endpoint("api/products"))
            .query(filters)
            .query(&[("page", page)]);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
        let request = self.client.get(self.endpoint(&format!("api/products/{id}")));
        self.execute(request).await
    }

    #[instrument(skip(self, filters))]
    async fn list_categories(
        &self,
        filters: &CategoryFilters,
        page: u32,
    ) -> ApiResult<Page<CategoryNode>> {
        let request = self
            .client
            .get(self.endpoint("api/categories"))
            .query(filters)
            .query(&[("page", page)]);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn get_category(&self, id: CategoryId) -> ApiResult<CategoryNode> {
        let request = self
            .client
            .get(self.endpoint(&format!("api/categories/{id}")));
        self.execute(request).await
    }
}

#[async_trait]
impl CartApi for HttpClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> ApiResult<CartSnapshot> {
        let request = self.client.get(self.endpoint("api/cart"));
        self.execute(request).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> ApiResult<CartSnapshot> {
        let body = serde_json::json!({ "product_id": product_id, "quantity": quantity });
        let request = self
            .client
            .post(self.endpoint("api/cart/items"))
            .json(&body);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn update_cart_line(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> ApiResult<CartSnapshot> {
        let body = serde_json::json!({ "quantity": quantity });
        let request = self
            .client
            .put(self.endpoint(&format!("api/cart/items/{product_id}")))
            .json(&body);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_cart_line(&self, product_id: ProductId) -> ApiResult<CartSnapshot> {
        let request = self
            .client
            .delete(self.endpoint(&format!("api/cart/items/{product_id}")));
        self.execute(request).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> ApiResult<()> {
        let request = self.client.delete(self.endpoint("api/cart"));
        self.execute_unit(request).await
    }

    #[instrument(skip(self, lines, customer))]
    async fn compose_whatsapp_message(
        &self,
        lines: &[OrderLine],
        customer: &ShippingInfo,
    ) -> ApiResult<ComposedMessage> {
        let body = serde_json::json!({ "lines": lines, "customer": customer });
        let request = self
            .client
            .post(self.endpoint("api/checkout/whatsapp-message"))
            .json(&body);
        self.execute(request).await
    }
}

#[async_trait]
impl AdminApi for HttpClient {
    #[instrument(skip(self, input, media))]
    async fn create_product(
        &self,
        input: &ProductInput,
        media: &[MediaInput],
    ) -> ApiResult<Product> {
        let body = ProductCreateBody {
            fields: input,
            media,
        };
        let request = self
            .client
            .post(self.endpoint("api/products"))
            .json(&body);
        self.execute(request).await
    }

    #[instrument(skip(self, input, media_add, media_remove), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
        media_add: &[MediaInput],
        media_remove: &[MediaId],
    ) -> ApiResult<Product> {
        let body = ProductUpdateBody {
            fields: input,
            media_add,
            media_remove,
        };
        let request = self
            .client
            .put(self.endpoint(&format!("api/products/{id}")))
            .json(&body);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> ApiResult<()> {
        let request = self
            .client
            .delete(self.endpoint(&format!("api/products/{id}")));
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(product_id = %product_id, media_id = %media_id))]
    async fn set_primary_image(&self, product_id: ProductId, media_id: MediaId) -> ApiResult<()> {
        let request = self.client.post(self.endpoint(&format!(
            "api/products/{product_id}/media/{media_id}/primary"
        )));
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn toggle_product_active(&self, id: ProductId) -> ApiResult<()> {
        let request = self
            .client
            .post(self.endpoint(&format!("api/products/{id}/toggle-active")));
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn toggle_product_featured(&self, id: ProductId) -> ApiResult<()> {
        let request = self
            .client
            .post(self.endpoint(&format!("api/products/{id}/toggle-featured")));
        self.execute_unit(request).await
    }

    #[instrument(skip(self, input))]
    async fn create_category(&self, input: &CategoryInput) -> ApiResult<CategoryNode> {
        let request = self
            .client
            .post(self.endpoint("api/categories"))
            .json(input);
        self.execute(request).await
    }

    #[instrument(skip(self, input), fields(category_id = %id))]
    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> ApiResult<CategoryNode> {
        let request = self
            .client
            .put(self.endpoint(&format!("api/categories/{id}")))
            .json(input);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn delete_category(&self, id: CategoryId) -> ApiResult<()> {
        let request = self
            .client
            .delete(self.endpoint(&format!("api/categories/{id}")));
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn toggle_category_active(&self, id: CategoryId) -> ApiResult<()> {
        let request = self
            .client
            .post(self.endpoint(&format!("api/categories/{id}/toggle-active")));
        self.execute_unit(request).await
    }

    #[instrument(skip(self))]
    async fn list_offers(&self, page: u32) -> ApiResult<Page<Offer>> {
        let request = self
            .client
            .get(self.endpoint("api/offers"))
            .query(&[("page", page)]);
        self.execute(request).await
    }

    #[instrument(skip(self, input), fields(product_id = %product_id))]
    async fn create_offer(&self, product_id: ProductId, input: &OfferInput) -> ApiResult<Offer> {
        let body = OfferCreateBody {
            product_id,
            fields: input,
        };
        let request = self.client.post(self.endpoint("api/offers")).json(&body);
        self.execute(request).await
    }

    #[instrument(skip(self, input), fields(offer_id = %id))]
    async fn update_offer(&self, id: OfferId, input: &OfferInput) -> ApiResult<Offer> {
        let request = self
            .client
            .put(self.endpoint(&format!("api/offers/{id}")))
            .json(input);
        self.execute(request).await
    }

    #[instrument(skip(self), fields(offer_id = %id))]
    async fn delete_offer(&self, id: OfferId) -> ApiResult<()> {
        let request = self.client.delete(self.endpoint(&format!("api/offers/{id}")));
        self.execute_unit(request).await
    }

    #[instrument(skip(self), fields(offer_id = %id))]
    async fn toggle_offer_active(&self, id: OfferId) -> ApiResult<()> {
        let request = self
            .client
            .post(self.endpoint(&format!("api/offers/{id}/toggle-active")));
        self.execute_unit(request).await
    }
}
