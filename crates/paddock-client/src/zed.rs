use std::time::Duration;

use paddock_core::traits::{CredentialSource, HorseRegistry};
use paddock_core::{AccountProfile, AppError, ExternalRecord, HorseStatus, HttpConfig, StablePage};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::transport::{HttpTransport, RawResponse, Transport};

/// Client for the ZED Champions horse registry.
///
/// Every call first checks the credential, then tries each transport in
/// order. A transport that produces no HTTP answer (timeout, connection
/// error) hands over to the next one; the first HTTP answer is final.
///
/// API reference: `GET /me`, `GET /horses/{id}`, `GET /horses/search?q=...`,
/// `GET /stable/{racing|breeding}`.
///
/// # Examples
///
/// ```no_run
/// use paddock_client::ZedClient;
/// use paddock_core::traits::HorseRegistry;
/// use paddock_core::{Credential, HorseStatus, HttpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let credential = Credential::parse("eyJhbGciOi...")?;
/// let client = ZedClient::new(credential, &HttpConfig::default())?;
/// let horses = client.fetch_batch(HorseStatus::Racing).await?;
/// println!("Found {} racing horses", horses.len());
/// # Ok(())
/// # }
/// ```
pub struct ZedClient<C, T = HttpTransport> {
    credentials: C,
    transports: Vec<T>,
    timeout: Duration,
}

impl<C: CredentialSource> ZedClient<C, HttpTransport> {
    /// Creates a client from configuration.
    ///
    /// The proxy, when configured, is tried before the direct API.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if a configured URL is invalid.
    pub fn new(credentials: C, config: &HttpConfig) -> Result<Self, AppError> {
        let mut transports = Vec::with_capacity(2);
        if let Some(proxy) = config.proxy_base.as_deref() {
            transports.push(HttpTransport::new("proxy", proxy, config.timeout)?);
        }
        transports.push(HttpTransport::new("direct", &config.api_base, config.timeout)?);

        Ok(Self::with_transports(credentials, transports, config.timeout))
    }
}

impl<C, T> ZedClient<C, T>
where
    C: CredentialSource,
    T: Transport,
{
    pub fn with_transports(credentials: C, transports: Vec<T>, timeout: Duration) -> Self {
        Self {
            credentials,
            transports,
            timeout,
        }
    }

    fn bearer(&self) -> Result<String, AppError> {
        match self.credentials.token() {
            Some(token) if !self.credentials.is_expired() => Ok(token),
            _ => Err(AppError::Unauthenticated),
        }
    }

    async fn get_json<D: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<D, AppError> {
        let token = self.bearer()?;
        let mut last_error = None;

        for transport in &self.transports {
            let request = transport.get(segments, query, &token);
            let attempt = tokio::time::timeout(self.timeout, request)
                .await
                .unwrap_or_else(|_| Err(AppError::Timeout));

            match attempt {
                Ok(resp) => {
                    debug!(
                        transport = transport.name(),
                        path = %segments.join("/"),
                        status = resp.status,
                        "Registry answered"
                    );
                    return decode(resp);
                }
                Err(e) if e.is_transport() => {
                    warn!(
                        transport = transport.name(),
                        path = %segments.join("/"),
                        error = %e,
                        "Registry unreachable, trying next route"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Generic("no API transport configured".to_string())))
    }
}

impl<C, T> HorseRegistry for ZedClient<C, T>
where
    C: CredentialSource,
    T: Transport,
{
    async fn fetch_batch(&self, kind: HorseStatus) -> Result<Vec<ExternalRecord>, AppError> {
        let page: StablePage = self.get_json(&["stable", kind.as_str()], &[]).await?;
        Ok(page.horses)
    }

    async fn fetch_one(&self, raw_id: &str) -> Result<ExternalRecord, AppError> {
        self.bearer()?;
        let id = extract_horse_id(raw_id)?;
        self.get_json(&["horses", id.as_str()], &[]).await
    }

    async fn search(&self, query: &str) -> Result<Vec<ExternalRecord>, AppError> {
        self.bearer()?;
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("empty search query".to_string()));
        }

        let results: SearchResults = self
            .get_json(&["horses", "search"], &[("q", query)])
            .await?;
        Ok(results.into_records())
    }

    async fn me(&self) -> Result<AccountProfile, AppError> {
        self.get_json(&["me"], &[]).await
    }
}

/// Search answers come either as a bare list or wrapped like a stable page.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResults {
    List(Vec<ExternalRecord>),
    Page(StablePage),
}

impl SearchResults {
    fn into_records(self) -> Vec<ExternalRecord> {
        match self {
            SearchResults::List(horses) => horses,
            SearchResults::Page(page) => page.horses,
        }
    }
}

/// Extracts a horse id from a bare id or a pasted horse URL.
///
/// The last non-empty path segment wins; query strings, fragments and
/// trailing slashes are ignored.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` if no id can be found.
pub fn extract_horse_id(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let without_suffix = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let path = match without_suffix.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
        None => without_suffix,
    };

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidInput(format!("No horse id in '{}'", raw)))
}

fn decode<D: DeserializeOwned>(resp: RawResponse) -> Result<D, AppError> {
    if !resp.is_success() {
        return Err(AppError::HttpError {
            status: resp.status,
            message: error_message(resp.status, &resp.body),
        });
    }

    serde_json::from_str(&resp.body).map_err(|e| AppError::MalformedResponse(e.to_string()))
}

/// Message for a non-2xx answer: the body's `message` (or the proxy's
/// `error`) when present, a generic one otherwise.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("API error: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_core::traits::CollectionStore;
    use paddock_core::{HorseCollection, ImportError, ImportService, LocalRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeCredential {
        token: Option<&'static str>,
        expired: bool,
    }

    impl CredentialSource for FakeCredential {
        fn token(&self) -> Option<String> {
            self.token.map(str::to_string)
        }

        fn is_expired(&self) -> bool {
            self.expired
        }
    }

    fn valid() -> FakeCredential {
        FakeCredential {
            token: Some("tok"),
            expired: false,
        }
    }

    #[derive(Clone)]
    enum Behavior {
        Respond(u16, &'static str),
        Unreachable,
        Hang,
    }

    #[derive(Clone)]
    struct MockTransport {
        name: &'static str,
        behavior: Behavior,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockTransport {
        fn new(name: &'static str, behavior: Behavior, calls: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                behavior,
                calls: Arc::clone(calls),
            }
        }
    }

    impl Transport for MockTransport {
        fn name(&self) -> &str {
            self.name
        }

        async fn get(
            &self,
            segments: &[&str],
            query: &[(&str, &str)],
            token: &str,
        ) -> Result<RawResponse, AppError> {
            assert_eq!(token, "tok");
            let mut call = format!("{}:{}", self.name, segments.join("/"));
            for (key, value) in query {
                call.push_str(&format!("?{key}={value}"));
            }
            self.calls.lock().unwrap().push(call);

            match &self.behavior {
                Behavior::Respond(status, body) => Ok(RawResponse {
                    status: *status,
                    body: body.to_string(),
                }),
                Behavior::Unreachable => {
                    Err(AppError::NetworkFailure("connection refused".to_string()))
                }
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(AppError::NetworkFailure("unreachable".to_string()))
                }
            }
        }
    }

    fn client(
        credentials: FakeCredential,
        behaviors: Vec<(&'static str, Behavior)>,
    ) -> (ZedClient<FakeCredential, MockTransport>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let transports = behaviors
            .into_iter()
            .map(|(name, b)| MockTransport::new(name, b, &calls))
            .collect();
        (
            ZedClient::with_transports(credentials, transports, Duration::from_secs(15)),
            calls,
        )
    }

    const STABLE: &str = r#"{"horses":[
        {"id":"h1","name":"One","bloodline":"Nakamoto","overall_rating":4},
        {"id":"h2","name":"Two"}
    ]}"#;

    #[tokio::test]
    async fn test_fetch_batch_parses_horses() {
        let (client, calls) = client(valid(), vec![("direct", Behavior::Respond(200, STABLE))]);

        let horses = client.fetch_batch(HorseStatus::Racing).await.unwrap();

        assert_eq!(horses.len(), 2);
        assert_eq!(horses[0].overall_rating, Some(4.0));
        assert_eq!(*calls.lock().unwrap(), vec!["direct:stable/racing"]);
    }

    #[tokio::test]
    async fn test_expired_credential_makes_no_calls() {
        let expired = FakeCredential {
            token: Some("tok"),
            expired: true,
        };
        let (client, calls) = client(expired, vec![("direct", Behavior::Respond(200, STABLE))]);

        let batch = client.fetch_batch(HorseStatus::Breeding).await;
        let single = client.fetch_one("h1").await;

        assert!(matches!(batch, Err(AppError::Unauthenticated)));
        assert!(matches!(single, Err(AppError::Unauthenticated)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[derive(Clone, Default)]
    struct CountingStore {
        saves: Arc<AtomicUsize>,
    }

    impl CollectionStore for CountingStore {
        async fn save(&self, _collection: &str, _records: &[LocalRecord]) -> Result<(), AppError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn load(&self, _collection: &str) -> Result<Vec<LocalRecord>, AppError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_import_with_expired_credential_touches_nothing() {
        let expired = FakeCredential {
            token: Some("tok"),
            expired: true,
        };
        let (client, calls) = client(
            expired,
            vec![
                ("proxy", Behavior::Respond(200, STABLE)),
                ("direct", Behavior::Respond(200, STABLE)),
            ],
        );
        let store = CountingStore::default();
        let service = ImportService::new(client, store.clone());
        let mut racing = HorseCollection::new(HorseStatus::Racing);

        let batch = service.import_batch(HorseStatus::Racing, &mut racing).await;
        let single = service.import_single("h1", &mut racing).await;

        assert!(matches!(
            batch,
            Err(ImportError::Fetch(AppError::Unauthenticated))
        ));
        assert!(matches!(
            single,
            Err(ImportError::Fetch(AppError::Unauthenticated))
        ));
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
        assert!(racing.is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_calls() {
        let missing = FakeCredential {
            token: None,
            expired: false,
        };
        let (client, calls) = client(missing, vec![("direct", Behavior::Respond(200, "{}"))]);

        assert!(matches!(client.me().await, Err(AppError::Unauthenticated)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_one_accepts_pasted_url() {
        let body = r#"{"id":"abc-123","name":"Pasted"}"#;
        let (client, calls) = client(valid(), vec![("direct", Behavior::Respond(200, body))]);

        client
            .fetch_one("https://example.com/horse/abc-123/")
            .await
            .unwrap();
        client.fetch_one("abc-123").await.unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["direct:horses/abc-123", "direct:horses/abc-123"]
        );
    }

    #[tokio::test]
    async fn test_search_sends_query_pair() {
        let body = r#"[{"id":"h7","name":"Thunder Hoof"},{"id":"h8","name":"Thunder Bay"}]"#;
        let (client, calls) = client(valid(), vec![("direct", Behavior::Respond(200, body))]);

        let found = client.search("  thunder ").await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].id, "h8");
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["direct:horses/search?q=thunder"]
        );
    }

    #[tokio::test]
    async fn test_search_accepts_wrapped_results() {
        let (client, _) = client(valid(), vec![("direct", Behavior::Respond(200, STABLE))]);

        let found = client.search("one").await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name.as_deref(), Some("One"));
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query_without_calls() {
        let (client, calls) = client(valid(), vec![("direct", Behavior::Respond(200, "[]"))]);

        assert!(matches!(
            client.search("   ").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_falls_back_to_next_transport() {
        let (client, calls) = client(
            valid(),
            vec![
                ("proxy", Behavior::Unreachable),
                ("direct", Behavior::Respond(200, STABLE)),
            ],
        );

        let horses = client.fetch_batch(HorseStatus::Racing).await.unwrap();

        assert_eq!(horses.len(), 2);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["proxy:stable/racing", "direct:stable/racing"]
        );
    }

    #[tokio::test]
    async fn test_http_error_does_not_fall_back() {
        let (client, calls) = client(
            valid(),
            vec![
                ("proxy", Behavior::Respond(404, r#"{"message":"Horse not found"}"#)),
                ("direct", Behavior::Respond(200, r#"{"id":"x","name":"X"}"#)),
            ],
        );

        let result = client.fetch_one("x").await;

        match result {
            Err(AppError::HttpError { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Horse not found");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_http_error_with_unparseable_body_gets_generic_message() {
        let (client, _) = client(valid(), vec![("direct", Behavior::Respond(502, "<html>"))]);

        match client.me().await {
            Err(AppError::HttpError { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "API error: 502");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_proxy_error_field_is_used() {
        let body = r#"{"error":"fetch failed","detail":"Error in API proxy"}"#;
        let (client, _) = client(valid(), vec![("proxy", Behavior::Respond(500, body))]);

        match client.fetch_batch(HorseStatus::Racing).await {
            Err(AppError::HttpError { message, .. }) => assert_eq!(message, "fetch failed"),
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_with_garbage_body_is_malformed() {
        let (client, _) = client(valid(), vec![("direct", Behavior::Respond(200, "not json"))]);

        assert!(matches!(
            client.fetch_batch(HorseStatus::Racing).await,
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_request_times_out() {
        let (client, calls) = client(valid(), vec![("direct", Behavior::Hang)]);

        let result = client.fetch_batch(HorseStatus::Racing).await;

        assert!(matches!(result, Err(AppError::Timeout)));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_transports_down_reports_last_error() {
        let (client, calls) = client(
            valid(),
            vec![("proxy", Behavior::Unreachable), ("direct", Behavior::Unreachable)],
        );

        assert!(matches!(
            client.me().await,
            Err(AppError::NetworkFailure(_))
        ));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_extract_horse_id_variants() {
        let expected = "abc-123";
        for raw in [
            "abc-123",
            "  abc-123 ",
            "https://example.com/horse/abc-123",
            "https://example.com/horse/abc-123/",
            "https://example.com/horse/abc-123?tab=stats",
            "https://example.com/horse/abc-123/#pedigree",
            "example.com/horse/abc-123",
        ] {
            assert_eq!(extract_horse_id(raw).unwrap(), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_extract_horse_id_rejects_empty() {
        for raw in ["", "   ", "/", "https://example.com/", "?q=1"] {
            assert!(
                matches!(extract_horse_id(raw), Err(AppError::InvalidInput(_))),
                "input: {raw}"
            );
        }
    }

    #[test]
    fn test_client_from_config_orders_proxy_first() {
        let config = HttpConfig {
            proxy_base: Some("http://localhost:3000/api/zed".to_string()),
            ..HttpConfig::default()
        };
        let client = ZedClient::new(valid(), &config).unwrap();

        let names: Vec<_> = client.transports.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["proxy", "direct"]);
    }
}
