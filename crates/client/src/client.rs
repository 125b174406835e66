//! Inventory HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Every call is a
//! single request; batches are driven by the caller one line at a time.

use std::time::Duration;

use reqwest::blocking::{RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use galley_recon::{
    BackendFailure, CatalogBackend, DepletionBackend, IngredientKind, NewProduct, Product,
    ProductId, ProductPatch, Recipe, RecipeDetail, RecipeId, RecipeIngredientId, RecipePatch,
    RecipeType, ReplenishBackend,
};

use crate::account::{Account, AccountBody};

/// Inventory API client (blocking).
#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base: Url,
    token: Option<String>,
}

/// Error type for API operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered 401
    #[error("not authenticated: run `galley login` first")]
    NotAuthenticated,
    /// Could not reach the server
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response; `error` is the body's `error` field when present
    #[error("{}", .error.as_deref().unwrap_or("Request failed"))]
    Http { status: u16, error: Option<String> },
    /// Response body did not decode
    #[error("parse error: {0}")]
    Parse(String),
    /// Local file I/O (credentials)
    #[error("I/O error: {0}")]
    Io(String),
    #[error("invalid API URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<ClientError> for BackendFailure {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http { status, error } => BackendFailure {
                status: Some(status),
                message: error,
            },
            ClientError::NotAuthenticated => BackendFailure::new(Some(401), "Unauthorized"),
            other => BackendFailure::new(None, other.to_string()),
        }
    }
}

/// Error payload the API sends with non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl ApiClient {
    /// Create a client for `api_url`. `token` is sent as a bearer token when present.
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base = parse_base_url(api_url)?;

        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("galley/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base, token })
    }

    /// `GET /recipes[?recipe_type=…]`
    pub fn list_recipes(&self, recipe_type: Option<RecipeType>) -> Result<Vec<Recipe>, ClientError> {
        let mut req = self.http.get(self.endpoint(&["recipes"])?);
        if let Some(t) = recipe_type {
            req = req.query(&[("recipe_type", t.as_str())]);
        }
        let mut recipes: Vec<Recipe> = read_json(self.send(req)?)?.unwrap_or_default();

        // The filtered listing may omit the type field.
        if let Some(t) = recipe_type {
            for r in &mut recipes {
                r.recipe_type = t;
            }
        }
        log::debug!("fetched {} recipe(s)", recipes.len());
        Ok(recipes)
    }

    /// `POST /recipes/{id}/deplete`
    pub fn deplete_recipe(&self, recipe_id: RecipeId, quantity: f64) -> Result<(), ClientError> {
        let url = self.endpoint(&["recipes", &recipe_id.to_string(), "deplete"])?;
        let req = self.http.post(url).json(&quantity_body(quantity));
        self.send(req)?;
        Ok(())
    }

    /// `GET /products`
    pub fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let req = self.http.get(self.endpoint(&["products"])?);
        let products: Vec<Product> = read_json(self.send(req)?)?.unwrap_or_default();
        log::debug!("fetched {} product(s)", products.len());
        Ok(products)
    }

    /// `GET /products/by-barcode/{code}`. A 404 means no such product.
    pub fn lookup_barcode(&self, code: &str) -> Result<Option<Product>, ClientError> {
        let req = self
            .http
            .get(self.endpoint(&["products", "by-barcode", code])?);
        match self.send(req) {
            Ok(resp) => read_json(resp),
            Err(ClientError::Http { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /products/{id}/replenish`
    pub fn replenish_product(&self, product_id: ProductId, quantity: f64) -> Result<(), ClientError> {
        let url = self.endpoint(&["products", &product_id.to_string(), "replenish"])?;
        let req = self.http.post(url).json(&quantity_body(quantity));
        self.send(req)?;
        Ok(())
    }

    /// `POST /products`
    pub fn create_product(&self, product: &NewProduct) -> Result<Product, ClientError> {
        let req = self
            .http
            .post(self.endpoint(&["products"])?)
            .json(&serde_json::json!({ "product": product }));
        let created = read_json(self.send(req)?)?.ok_or_else(|| empty_response("POST /products"))?;
        Ok(created)
    }

    /// `PATCH /products/{id}`. Returns the updated product when the server sends it.
    pub fn update_product(
        &self,
        product_id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Option<Product>, ClientError> {
        let url = self.endpoint(&["products", &product_id.to_string()])?;
        let req = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "product": patch }));
        read_json(self.send(req)?)
    }

    /// `DELETE /products/{id}`
    pub fn delete_product(&self, product_id: ProductId) -> Result<(), ClientError> {
        let url = self.endpoint(&["products", &product_id.to_string()])?;
        self.send(self.http.delete(url))?;
        Ok(())
    }

    /// `GET /recipes[?recipe_type=…]`, keeping each recipe's ingredient lines.
    pub fn list_recipe_details(
        &self,
        recipe_type: Option<RecipeType>,
    ) -> Result<Vec<RecipeDetail>, ClientError> {
        let mut req = self.http.get(self.endpoint(&["recipes"])?);
        if let Some(t) = recipe_type {
            req = req.query(&[("recipe_type", t.as_str())]);
        }
        let mut details: Vec<RecipeDetail> = read_json(self.send(req)?)?.unwrap_or_default();
        if let Some(t) = recipe_type {
            for d in &mut details {
                d.recipe.recipe_type = t;
            }
        }
        Ok(details)
    }

    /// `POST /recipes`. Ingredients are added afterwards, one call each.
    pub fn create_recipe(&self, name: &str, recipe_type: RecipeType) -> Result<Recipe, ClientError> {
        let req = self.http.post(self.endpoint(&["recipes"])?).json(&serde_json::json!({
            "recipe": { "name": name, "recipe_type": recipe_type }
        }));
        let created = read_json(self.send(req)?)?.ok_or_else(|| empty_response("POST /recipes"))?;
        Ok(created)
    }

    /// `PATCH /recipes/{id}`
    pub fn update_recipe(&self, recipe_id: RecipeId, patch: &RecipePatch) -> Result<(), ClientError> {
        let url = self.endpoint(&["recipes", &recipe_id.to_string()])?;
        let req = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "recipe": patch }));
        self.send(req)?;
        Ok(())
    }

    /// `DELETE /recipes/{id}`
    pub fn delete_recipe(&self, recipe_id: RecipeId) -> Result<(), ClientError> {
        let url = self.endpoint(&["recipes", &recipe_id.to_string()])?;
        self.send(self.http.delete(url))?;
        Ok(())
    }

    /// `POST /recipes/{id}/recipe_ingredients`
    pub fn add_recipe_ingredient(
        &self,
        recipe_id: RecipeId,
        kind: IngredientKind,
        ingredient_id: i64,
        quantity: f64,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&["recipes", &recipe_id.to_string(), "recipe_ingredients"])?;
        let req = self.http.post(url).json(&serde_json::json!({
            "recipe_ingredient": {
                "ingredient_id": ingredient_id,
                "ingredient_type": kind,
                "quantity": wire_number(quantity),
            }
        }));
        self.send(req)?;
        Ok(())
    }

    /// `PATCH /recipes/{id}/recipe_ingredients/{line}`
    pub fn update_recipe_ingredient(
        &self,
        recipe_id: RecipeId,
        line: RecipeIngredientId,
        quantity: f64,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&[
            "recipes",
            &recipe_id.to_string(),
            "recipe_ingredients",
            &line.to_string(),
        ])?;
        let req = self.http.patch(url).json(&serde_json::json!({
            "recipe_ingredient": { "quantity": wire_number(quantity) }
        }));
        self.send(req)?;
        Ok(())
    }

    /// `GET /me`
    pub fn get_account(&self) -> Result<Account, ClientError> {
        let req = self.http.get(self.endpoint(&["me"])?);
        read_json(self.send(req)?)?.ok_or_else(|| empty_response("GET /me"))
    }

    /// `PATCH /me`
    pub fn update_account(&self, body: &AccountBody) -> Result<Option<Account>, ClientError> {
        let req = self.http.patch(self.endpoint(&["me"])?).json(body);
        read_json(self.send(req)?)
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.base.to_string(),
                reason: "not a base URL".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let response = req
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        log::debug!("{} {}", status.as_u16(), response.url());

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::NotAuthenticated);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let error = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty());
            return Err(ClientError::Http {
                status: status.as_u16(),
                error,
            });
        }

        Ok(response)
    }
}

/// Parse an API base URL. Only `http` and `https` bases are accepted.
pub fn parse_base_url(api_url: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: api_url.to_string(),
        reason,
    };
    let base = Url::parse(api_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", base.scheme())));
    }
    if base.cannot_be_a_base() || base.host_str().is_none() {
        return Err(invalid("not a base URL".into()));
    }
    Ok(base)
}

/// Decode a JSON body. `204` and empty bodies yield `None`.
fn read_json<T: DeserializeOwned>(response: Response) -> Result<Option<T>, ClientError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let bytes = response
        .bytes()
        .map_err(|e| ClientError::Network(e.to_string()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| ClientError::Parse(e.to_string()))
}

fn empty_response(what: &str) -> ClientError {
    ClientError::Parse(format!("{what} returned no body"))
}

/// `{"quantity": n}`, with whole numbers sent as integers.
fn quantity_body(quantity: f64) -> serde_json::Value {
    serde_json::json!({ "quantity": wire_number(quantity) })
}

fn wire_number(value: f64) -> serde_json::Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Value::from(value)
    }
}

impl DepletionBackend for ApiClient {
    fn deplete(&self, recipe_id: RecipeId, quantity: f64) -> Result<(), BackendFailure> {
        self.deplete_recipe(recipe_id, quantity).map_err(BackendFailure::from)
    }
}

impl ReplenishBackend for ApiClient {
    fn product_by_barcode(&self, code: &str) -> Result<Option<Product>, BackendFailure> {
        self.lookup_barcode(code).map_err(BackendFailure::from)
    }

    fn replenish(&self, product_id: ProductId, quantity: f64) -> Result<(), BackendFailure> {
        self.replenish_product(product_id, quantity)
            .map_err(BackendFailure::from)
    }
}

impl CatalogBackend for ApiClient {
    fn create_recipe(&self, name: &str, recipe_type: RecipeType) -> Result<Recipe, BackendFailure> {
        ApiClient::create_recipe(self, name, recipe_type).map_err(BackendFailure::from)
    }

    fn add_ingredient(
        &self,
        recipe_id: RecipeId,
        kind: IngredientKind,
        ingredient_id: i64,
        quantity: f64,
    ) -> Result<(), BackendFailure> {
        self.add_recipe_ingredient(recipe_id, kind, ingredient_id, quantity)
            .map_err(BackendFailure::from)
    }

    fn set_ingredient_quantity(
        &self,
        recipe_id: RecipeId,
        line: RecipeIngredientId,
        quantity: f64,
    ) -> Result<(), BackendFailure> {
        self.update_recipe_ingredient(recipe_id, line, quantity)
            .map_err(BackendFailure::from)
    }
}
