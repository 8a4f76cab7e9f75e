//! Admin API client for the product endpoints.

use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;

use crate::auth::Session;
use crate::clients::errors::ClientError;
use crate::config::ShopifyConfig;
use crate::BoxFuture;

/// Crate version, sent in the `User-Agent` header.
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of products created per sample-creation request.
pub const DEFAULT_PRODUCTS_COUNT: usize = 5;

const ADJECTIVES: &[&str] = &[
    "autumn", "hidden", "bitter", "misty", "silent", "empty", "dry", "dark", "summer", "icy",
    "delicate", "quiet", "white", "cool", "spring", "winter", "patient", "twilight", "dawn",
    "crimson", "wispy", "weathered", "blue", "billowing", "broken", "cold", "damp", "falling",
    "frosty", "green", "long",
];

const NOUNS: &[&str] = &[
    "waterfall", "river", "breeze", "moon", "rain", "wind", "sea", "morning", "snow", "lake",
    "sunset", "pine", "shadow", "leaf", "dawn", "glitter", "forest", "hill", "cloud", "meadow",
    "sun", "glade", "bird", "brook", "butterfly", "bush", "dew", "dust", "field", "fire",
    "flower",
];

const CREATE_PRODUCT_MUTATION: &str = r"mutation populateProduct($input: ProductInput!) {
  productCreate(input: $input) {
    product { id }
    userErrors { field message }
  }
}";

/// Product operations used by the protected API routes.
///
/// Implemented by [`AdminClient`]; tests substitute their own.
pub trait ProductService: Send + Sync {
    /// Number of products in the session's shop.
    fn product_count<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<u64, ClientError>>;

    /// Creates [`DEFAULT_PRODUCTS_COUNT`] products with random titles and
    /// returns how many were created.
    fn create_sample_products<'a>(
        &'a self,
        session: &'a Session,
    ) -> BoxFuture<'a, Result<usize, ClientError>>;
}

/// Calls the Admin API with a session's access token.
///
/// Requests go to `{admin origin}/admin/api/{version}`, where the origin is
/// `https://{shop}` unless the config overrides it.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    config: ShopifyConfig,
    user_agent: String,
}

// Verify AdminClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AdminClient>();
};

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphqlMessage>,
}

#[derive(Deserialize)]
struct GraphqlMessage {
    message: String,
}

impl AdminClient {
    /// Creates a client sharing `http`'s connection pool.
    #[must_use]
    pub fn new(http: reqwest::Client, config: ShopifyConfig) -> Self {
        let prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!("{prefix}Storefront Gateway v{GATEWAY_VERSION} | Rust {rust_version}");
        Self {
            http,
            config,
            user_agent,
        }
    }

    /// The `User-Agent` sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn api_url(&self, session: &Session, path: &str) -> String {
        format!(
            "{}/admin/api/{}/{path}",
            self.config.admin_origin(&session.shop),
            self.config.api_version()
        )
    }

    fn request(&self, method: reqwest::Method, url: &str, session: &Session) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .header("X-Shopify-Access-Token", &session.access_token)
    }

    /// Fetches the product count over REST.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure, a non-2xx response or a
    /// body without `count`.
    pub async fn fetch_product_count(&self, session: &Session) -> Result<u64, ClientError> {
        let url = self.api_url(session, "products/count.json");
        let response = self.request(reqwest::Method::GET, &url, session).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let body: CountResponse =
            response
                .json()
                .await
                .map_err(|e| ClientError::UnexpectedResponse {
                    message: format!("product count: {e}"),
                })?;
        Ok(body.count)
    }

    /// Creates one product with `title` over GraphQL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graphql`] when the response carries `errors`
    /// or `userErrors`, and other variants for transport failures.
    pub async fn create_product(&self, session: &Session, title: &str) -> Result<(), ClientError> {
        let url = self.api_url(session, "graphql.json");
        let body = json!({
            "query": CREATE_PRODUCT_MUTATION,
            "variables": { "input": { "title": title } },
        });

        let response = self
            .request(reqwest::Method::POST, &url, session)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let parsed: GraphqlResponse =
            response
                .json()
                .await
                .map_err(|e| ClientError::UnexpectedResponse {
                    message: format!("productCreate: {e}"),
                })?;

        if !parsed.errors.is_empty() {
            return Err(ClientError::Graphql {
                message: join_messages(parsed.errors.iter().map(|e| e.message.as_str())),
            });
        }

        let user_errors = parsed
            .data
            .as_ref()
            .and_then(|d| d.pointer("/productCreate/userErrors"))
            .and_then(serde_json::Value::as_array);
        if let Some(errors) = user_errors.filter(|e| !e.is_empty()) {
            return Err(ClientError::Graphql {
                message: join_messages(
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(serde_json::Value::as_str)),
                ),
            });
        }
        Ok(())
    }
}

impl ProductService for AdminClient {
    fn product_count<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<u64, ClientError>> {
        Box::pin(self.fetch_product_count(session))
    }

    fn create_sample_products<'a>(
        &'a self,
        session: &'a Session,
    ) -> BoxFuture<'a, Result<usize, ClientError>> {
        Box::pin(async move {
            let titles: Vec<String> = (0..DEFAULT_PRODUCTS_COUNT).map(|_| random_title()).collect();
            for title in &titles {
                self.create_product(session, title).await?;
            }
            tracing::info!(shop = %session.shop, created = titles.len(), "sample products created");
            Ok(titles.len())
        })
    }
}

fn random_title() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("plain");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("product");
    format!("{adjective} {noun}")
}

fn join_messages<'a>(messages: impl Iterator<Item = &'a str>) -> String {
    messages.collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, ApiVersion, HostUrl, ShopDomain};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(origin: &str) -> AdminClient {
        let config = ShopifyConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .api_version(ApiVersion::V2025_10)
            .admin_origin_override(HostUrl::new(origin).unwrap())
            .user_agent_prefix("MyApp/1.0")
            .build()
            .unwrap();
        AdminClient::new(reqwest::Client::new(), config)
    }

    fn session() -> Session {
        let shop = ShopDomain::new("test-shop").unwrap();
        Session::new(
            Session::offline_id(&shop),
            shop,
            "shpat_token".to_string(),
            "write_products".parse().unwrap(),
            false,
            None,
        )
    }

    #[test]
    fn test_user_agent_includes_prefix_and_version() {
        let client = client("https://admin.example.com");
        assert!(client.user_agent().starts_with("MyApp/1.0 | Storefront Gateway v"));
    }

    #[test]
    fn test_random_title_has_two_words() {
        let title = random_title();
        assert_eq!(title.split(' ').count(), 2);
    }

    #[tokio::test]
    async fn test_product_count_sends_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-10/products/count.json"))
            .and(header("X-Shopify-Access-Token", "shpat_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 12})))
            .expect(1)
            .mount(&server)
            .await;

        let count = client(&server.uri()).product_count(&session()).await.unwrap();
        assert_eq!(count, 12);
    }

    #[tokio::test]
    async fn test_product_count_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2025-10/products/count.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let error = client(&server.uri())
            .product_count(&session())
            .await
            .unwrap_err();
        assert_eq!(error.status(), Some(401));
    }

    #[tokio::test]
    async fn test_create_sample_products_runs_five_mutations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2025-10/graphql.json"))
            .and(body_partial_json(json!({"query": CREATE_PRODUCT_MUTATION})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productCreate": {"product": {"id": "gid://shopify/Product/1"}, "userErrors": []}}
            })))
            .expect(5)
            .mount(&server)
            .await;

        let created = client(&server.uri())
            .create_sample_products(&session())
            .await
            .unwrap();
        assert_eq!(created, DEFAULT_PRODUCTS_COUNT);
    }

    #[tokio::test]
    async fn test_user_errors_fail_creation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2025-10/graphql.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"productCreate": {"product": null, "userErrors": [
                    {"field": ["title"], "message": "Title can't be blank"}
                ]}}
            })))
            .mount(&server)
            .await;

        let error = client(&server.uri())
            .create_sample_products(&session())
            .await
            .unwrap_err();
        assert!(matches!(error, ClientError::Graphql { ref message } if message.contains("blank")));
    }

    #[tokio::test]
    async fn test_top_level_graphql_errors_fail_creation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"message": "Access denied for productCreate field."}]
            })))
            .mount(&server)
            .await;

        let error = client(&server.uri())
            .create_product(&session(), "misty river")
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Access denied"));
    }
}
