//! HTTP client for the OTOBO/Znuny ticket web service.
//!
//! This module provides the `OtoboClient` struct for calling the ticket
//! operations a generic-interface webservice exposes.
//!
//! # Endpoint Map
//!
//! Every operation resolves through the configured endpoint map before any
//! network I/O. Calling an operation the webservice does not expose fails
//! immediately with a configuration error instead of a server-side 404.
//!
//! # Credentials
//!
//! The protocol carries authentication in the request body, not in
//! headers: `UserLogin` and `Password` are merged into every payload and
//! override colliding keys. Swapping credentials requires exclusive access
//! to the client, so no request can observe a half-applied login.
//!
//! # Lenient Decoding
//!
//! Instances differ in how their mapping layers render responses (string
//! ids, collapsed one-element lists, extra keys). Response bodies that do
//! not match the expected shape are decoded best-effort with a warning
//! rather than rejected.
//!
//! # Security
//!
//! The password is never logged. Error bodies are truncated before they
//! are attached to errors.

use std::collections::HashMap;
use std::time::Duration;

use futures::future;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, Credentials};
use crate::error::OtoboError;
use crate::mapper;
use crate::models::wire::{
    WireTicketGetRequest, WireTicketGetResponse, WireTicketResponse, WireTicketSearchResponse,
};
use crate::models::{Ticket, TicketCreate, TicketSearch, TicketUpdate};
use crate::operation::TicketOperation;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum length for HTTP error response bodies attached to errors.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Path segment the generic interface mounts web services under.
const WEBSERVICE_PATH_PREFIX: &str = "Webservice";

/// Placeholder in endpoint names replaced with the ticket id.
const TICKET_ID_PLACEHOLDER: &str = ":TicketID";

/// HTTP client for a ticket webservice.
///
/// Handles endpoint resolution, credential injection, request formatting,
/// and lenient response parsing for all ticket operations.
///
/// # Example
///
/// ```ignore
/// let config = ClientConfig::from_env()?;
/// let client = OtoboClient::new(config)?;
///
/// let ids = client.search_tickets(&TicketSearch::new().with_queue(IdName::by_id(2))).await?;
/// ```
#[derive(Clone)]
pub struct OtoboClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Base URL of the generic interface, without a trailing slash.
    base_url: String,

    /// Name of the webservice, used as a URL path segment.
    webservice: String,

    /// Endpoint name per configured operation.
    operations: HashMap<TicketOperation, String>,

    /// Credentials merged into every request body.
    /// SECURITY: the password inside is never logged.
    credentials: Option<Credentials>,
}

impl OtoboClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::HttpClient` if the HTTP client fails to
    /// initialize.
    pub fn new(config: ClientConfig) -> Result<Self, OtoboError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(OtoboError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.base_url,
            webservice: config.webservice,
            operations: config.operations,
            credentials: config.credentials,
        })
    }

    /// Replaces the credentials used for subsequent requests.
    ///
    /// Requires exclusive access, so an in-flight request can never see a
    /// partially applied credential swap.
    pub fn login(&mut self, credentials: Credentials) {
        tracing::debug!(user_login = %credentials.user_login(), "switching client credentials");
        self.credentials = Some(credentials);
    }

    /// Drops the stored credentials; subsequent requests fail until the
    /// next [`OtoboClient::login`].
    pub fn logout(&mut self) {
        self.credentials = None;
    }

    /// True when credentials are available for requests.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Creates a ticket and returns the server's view of it.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::NotConfigured` if the webservice does not
    /// expose the create operation, `OtoboError::Api` if the server
    /// rejects the payload, and `OtoboError::UnexpectedResponse` if the
    /// response carries no ticket data.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let create = TicketCreate::new("Printer broken")
    ///     .with_queue(IdName::by_name("Raw")?)
    ///     .with_article(Article::plain_text("Printer broken", "Paper jam in tray 2"));
    /// let ticket = client.create_ticket(&create).await?;
    /// println!("created ticket {}", ticket.number);
    /// ```
    pub async fn create_ticket(&self, create: &TicketCreate) -> Result<Ticket, OtoboError> {
        let request = mapper::ticket_create_to_wire(create);
        let response: WireTicketResponse = self
            .send(TicketOperation::Create, serde_json::to_value(&request)?, None)
            .await?;

        let ticket = response.ticket.ok_or_else(|| {
            OtoboError::unexpected_response(TicketOperation::Create, "response carried no ticket data")
        })?;
        Ok(mapper::ticket_from_wire(ticket))
    }

    /// Fetches one ticket by id, with all articles and dynamic fields.
    pub async fn get_ticket(&self, ticket_id: u64) -> Result<Ticket, OtoboError> {
        let request = WireTicketGetRequest {
            ticket_id: Some(ticket_id),
            ..WireTicketGetRequest::default()
        };
        self.fetch_single(request, Some(ticket_id)).await
    }

    /// Fetches one ticket by its human-facing ticket number.
    pub async fn get_ticket_by_number(&self, number: &str) -> Result<Ticket, OtoboError> {
        let request = WireTicketGetRequest {
            ticket_number: Some(number.to_string()),
            ..WireTicketGetRequest::default()
        };
        self.fetch_single(request, None).await
    }

    /// Applies a partial update and returns the server's view of the
    /// changed ticket.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Validation` if the update identifies no target
    /// ticket.
    pub async fn update_ticket(&self, update: &TicketUpdate) -> Result<Ticket, OtoboError> {
        if update.id.is_none() && update.number.is_none() {
            return Err(OtoboError::validation(
                "ticket update needs an id or a ticket number",
            ));
        }

        let request = mapper::ticket_update_to_wire(update);
        let response: WireTicketResponse = self
            .send(
                TicketOperation::Update,
                serde_json::to_value(&request)?,
                update.id,
            )
            .await?;

        let ticket = response.ticket.ok_or_else(|| {
            OtoboError::unexpected_response(TicketOperation::Update, "response carried no ticket data")
        })?;
        Ok(mapper::ticket_from_wire(ticket))
    }

    /// Searches for tickets and returns the matching ids, in server order.
    pub async fn search_tickets(&self, search: &TicketSearch) -> Result<Vec<u64>, OtoboError> {
        let request = mapper::ticket_search_to_wire(search);
        let response: WireTicketSearchResponse = self
            .send(TicketOperation::Search, serde_json::to_value(&request)?, None)
            .await?;

        Ok(response
            .ticket_id
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.0)
            .collect())
    }

    /// Searches for tickets and fetches the full details of the matches.
    ///
    /// Both the search and the get operation must be configured; this is
    /// checked up front so a missing get endpoint fails before the search
    /// runs. The individual fetches run concurrently and the returned
    /// tickets follow the planned id order.
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Sample at most five random open tickets.
    /// let tickets = client
    ///     .search_and_get(
    ///         &TicketSearch::new().with_state(IdName::by_name("open")?),
    ///         &SearchAndGet::new().with_shuffle().with_max_tickets(5),
    ///     )
    ///     .await?;
    /// ```
    pub async fn search_and_get(
        &self,
        search: &TicketSearch,
        options: &SearchAndGet,
    ) -> Result<Vec<Ticket>, OtoboError> {
        self.ensure_configured(&[TicketOperation::Search, TicketOperation::Get])?;

        let ids = options.plan(self.search_tickets(search).await?);
        tracing::debug!(count = ids.len(), "fetching tickets from search result");

        future::try_join_all(ids.into_iter().map(|id| self.get_ticket(id))).await
    }

    /// Fetches a single ticket and fails on any other cardinality.
    async fn fetch_single(
        &self,
        request: WireTicketGetRequest,
        ticket_id: Option<u64>,
    ) -> Result<Ticket, OtoboError> {
        let response: WireTicketGetResponse = self
            .send(TicketOperation::Get, serde_json::to_value(&request)?, ticket_id)
            .await?;

        let mut tickets = response.ticket.unwrap_or_default();
        if tickets.len() != 1 {
            return Err(OtoboError::unexpected_response(
                TicketOperation::Get,
                format!("expected exactly one ticket, got {}", tickets.len()),
            ));
        }
        Ok(mapper::ticket_from_wire(tickets.remove(0)))
    }

    /// Resolves the endpoint name for an operation.
    fn endpoint(&self, operation: TicketOperation) -> Result<&str, OtoboError> {
        self.operations
            .get(&operation)
            .map(String::as_str)
            .ok_or(OtoboError::NotConfigured { operation })
    }

    /// Checks that all given operations are configured.
    fn ensure_configured(&self, operations: &[TicketOperation]) -> Result<(), OtoboError> {
        for operation in operations {
            self.endpoint(*operation)?;
        }
        Ok(())
    }

    /// Builds the request URL for an endpoint name.
    ///
    /// Endpoint names may be plain (`ticket-get`) or route-shaped
    /// (`tickets/:TicketID`); the placeholder is replaced with the ticket
    /// id. A route-shaped endpoint with no id to substitute is a
    /// validation error, the literal placeholder is never sent. Each path
    /// segment is percent-encoded.
    fn build_url(&self, endpoint: &str, ticket_id: Option<u64>) -> Result<String, OtoboError> {
        let mut path = Vec::new();
        for segment in endpoint.trim_matches('/').split('/') {
            if segment.is_empty() {
                continue;
            }
            if segment == TICKET_ID_PLACEHOLDER {
                let Some(id) = ticket_id else {
                    return Err(OtoboError::validation(format!(
                        "endpoint '{endpoint}' requires a ticket id"
                    )));
                };
                path.push(id.to_string());
            } else if segment.starts_with(':') {
                // Other route placeholders pass through untouched.
                path.push(segment.to_string());
            } else {
                path.push(urlencoding::encode(segment).into_owned());
            }
        }

        Ok(format!(
            "{}/{}/{}/{}",
            self.base_url,
            WEBSERVICE_PATH_PREFIX,
            urlencoding::encode(&self.webservice),
            path.join("/")
        ))
    }

    /// Sends one ticket operation request and decodes the response.
    ///
    /// The failure order is fixed: endpoint lookup, credential check,
    /// route substitution, transport errors, the error envelope in the
    /// body, then the HTTP status. A JSON body that merely fails the
    /// expected schema is not an error; it decodes to the type's default
    /// with a warning.
    async fn send<T>(
        &self,
        operation: TicketOperation,
        body: serde_json::Value,
        ticket_id: Option<u64>,
    ) -> Result<T, OtoboError>
    where
        T: DeserializeOwned + Default,
    {
        let endpoint = self.endpoint(operation)?.to_string();
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(OtoboError::NotAuthenticated)?;

        let mut payload = match body {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        // Credentials override colliding keys from the request payload.
        payload.insert(
            "UserLogin".to_string(),
            serde_json::Value::String(credentials.user_login().to_string()),
        );
        payload.insert(
            "Password".to_string(),
            serde_json::Value::String(credentials.password().to_string()),
        );

        let method = operation.request_method();
        let url = self.build_url(&endpoint, ticket_id)?;

        tracing::debug!(
            method = %method,
            operation = %operation,
            url = %url,
            "sending ticket request"
        );

        let response = self
            .http
            .request(method, &url)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(OtoboError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(OtoboError::Http)?;

        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => {
                // Proxies and fatal server errors answer with HTML bodies.
                if !status.is_success() {
                    return Err(OtoboError::HttpStatus {
                        status,
                        body: truncate_body(&body),
                    });
                }
                tracing::error!(
                    status = %status,
                    body = %truncate_body(&body),
                    "response is not valid JSON"
                );
                return Err(OtoboError::Serialization(err));
            }
        };

        // The generic interface reports application errors in the body,
        // frequently with HTTP 200. The envelope wins over the status code.
        if let Some(error) = extract_api_error(&value) {
            tracing::error!(operation = %operation, error = %error, "server rejected the request");
            return Err(error);
        }

        if !status.is_success() {
            return Err(OtoboError::HttpStatus {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(decode_lenient(operation, value))
    }
}

/// Options for [`OtoboClient::search_and_get`].
///
/// By default all matches are fetched in search order; a shuffle and a cap
/// turn the call into a random sample.
#[derive(Debug, Clone, Default)]
pub struct SearchAndGet {
    max_tickets: Option<usize>,
    shuffle: bool,
    seed: Option<u64>,
}

impl SearchAndGet {
    /// Creates options that fetch every match in search order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps how many tickets are fetched.
    #[must_use]
    pub fn with_max_tickets(mut self, max_tickets: usize) -> Self {
        self.max_tickets = Some(max_tickets);
        self
    }

    /// Shuffles the matched ids before the cap is applied.
    #[must_use]
    pub fn with_shuffle(mut self) -> Self {
        self.shuffle = true;
        self
    }

    /// Shuffles with a fixed seed, making the selection reproducible.
    /// Implies [`SearchAndGet::with_shuffle`].
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = Some(seed);
        self
    }

    /// Applies the configured shuffle and cap to a search result.
    ///
    /// Without a shuffle the input order is preserved; the cap truncates
    /// after any shuffling.
    pub fn plan(&self, mut ids: Vec<u64>) -> Vec<u64> {
        if self.shuffle {
            match self.seed {
                Some(seed) => ids.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => ids.shuffle(&mut rand::thread_rng()),
            }
        }
        if let Some(max_tickets) = self.max_tickets {
            ids.truncate(max_tickets);
        }
        ids
    }
}

/// Extracts the application error envelope from a response body, if present.
///
/// Code and message are coerced to strings; instances disagree on whether
/// `ErrorCode` is numeric.
fn extract_api_error(body: &serde_json::Value) -> Option<OtoboError> {
    let error = body.get("Error")?;
    let field = |key: &str| match error.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    Some(OtoboError::api(field("ErrorCode"), field("ErrorMessage")))
}

/// Decodes a response body, falling back to the type's default when the
/// shape does not match.
fn decode_lenient<T>(operation: TicketOperation, body: serde_json::Value) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value(body) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!(
                operation = %operation,
                error = %err,
                "response did not match the expected shape, continuing with a partial decode"
            );
            T::default()
        }
    }
}

/// Truncates an error body without splitting a UTF-8 character.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Creates a client for unit tests without requiring env vars.
    fn test_client() -> OtoboClient {
        let mut operations = HashMap::new();
        for op in TicketOperation::ALL {
            operations.insert(op, op.endpoint_name().to_string());
        }
        OtoboClient {
            http: Client::new(),
            base_url: "https://support.example.com/otobo/nph-genericinterface.pl".to_string(),
            webservice: "Support".to_string(),
            operations,
            credentials: Some(Credentials::new("agent", "secret")),
        }
    }

    #[test]
    fn test_build_url_joins_segments() {
        let client = test_client();
        assert_eq!(
            client.build_url("ticket-search", None).unwrap(),
            "https://support.example.com/otobo/nph-genericinterface.pl/Webservice/Support/ticket-search"
        );
    }

    #[test]
    fn test_build_url_substitutes_ticket_id() {
        let client = test_client();
        assert_eq!(
            client.build_url("tickets/:TicketID", Some(7)).unwrap(),
            "https://support.example.com/otobo/nph-genericinterface.pl/Webservice/Support/tickets/7"
        );
        // Without an id the placeholder cannot be filled.
        let err = client.build_url("tickets/:TicketID", None).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("requires a ticket id"));
    }

    #[test]
    fn test_build_url_encodes_segments() {
        let mut client = test_client();
        client.webservice = "My Service".to_string();
        let url = client.build_url("ticket get", None).unwrap();
        assert!(url.contains("/Webservice/My%20Service/"));
        assert!(url.ends_with("/ticket%20get"));
    }

    #[test]
    fn test_missing_endpoint_is_config_error() {
        let mut client = test_client();
        client.operations.remove(&TicketOperation::Search);

        let err = client.endpoint(TicketOperation::Search).unwrap_err();
        assert!(matches!(
            err,
            OtoboError::NotConfigured {
                operation: TicketOperation::Search
            }
        ));
        assert!(err.is_config_error());

        assert!(client
            .ensure_configured(&[TicketOperation::Search, TicketOperation::Get])
            .is_err());
        assert!(client.ensure_configured(&[TicketOperation::Get]).is_ok());
    }

    #[test]
    fn test_unauthenticated_request_fails_before_network() {
        let mut client = test_client();
        client.logout();
        assert!(!client.is_authenticated());

        let err = tokio_test::block_on(client.get_ticket(1)).unwrap_err();
        assert!(matches!(err, OtoboError::NotAuthenticated));
    }

    #[test]
    fn test_plan_preserves_order_without_shuffle() {
        let options = SearchAndGet::new().with_max_tickets(2);
        assert_eq!(options.plan(vec![11, 22, 33]), vec![11, 22]);
        assert_eq!(SearchAndGet::new().plan(vec![11, 22, 33]), vec![11, 22, 33]);
    }

    #[test]
    fn test_plan_seeded_shuffle_is_deterministic() {
        let ids: Vec<u64> = (1..=20).collect();
        let options = SearchAndGet::new().with_seed(42);

        let first = options.plan(ids.clone());
        let second = options.plan(ids.clone());
        assert_eq!(first, second);

        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, ids);
    }

    #[test]
    fn test_plan_unseeded_shuffle_keeps_all_ids() {
        let ids: Vec<u64> = (1..=20).collect();
        let mut shuffled = SearchAndGet::new().with_shuffle().plan(ids.clone());
        shuffled.sort_unstable();
        assert_eq!(shuffled, ids);
    }

    #[test]
    fn test_extract_api_error_reads_envelope() {
        let err = extract_api_error(&json!({
            "Error": {"ErrorCode": "TicketCreate.AuthFail", "ErrorMessage": "auth failed"}
        }))
        .unwrap();
        match err {
            OtoboError::Api { code, message } => {
                assert_eq!(code, "TicketCreate.AuthFail");
                assert_eq!(message, "auth failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Numeric codes are coerced to strings.
        let err = extract_api_error(&json!({"Error": {"ErrorCode": 501}})).unwrap();
        match err {
            OtoboError::Api { code, message } => {
                assert_eq!(code, "501");
                assert_eq!(message, "");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(extract_api_error(&json!({"TicketID": 1})).is_none());
    }

    #[test]
    fn test_decode_lenient_falls_back_to_default() {
        let decoded: WireTicketGetResponse =
            decode_lenient(TicketOperation::Get, json!({"Ticket": "garbage"}));
        assert_eq!(decoded, WireTicketGetResponse::default());

        let decoded: WireTicketSearchResponse =
            decode_lenient(TicketOperation::Search, json!({"TicketID": ["4", 5]}));
        assert_eq!(
            decoded.ticket_id,
            Some(vec![
                crate::models::wire::WireId(4),
                crate::models::wire::WireId(5)
            ])
        );
    }

    #[test]
    fn test_truncate_body_appends_marker() {
        let long = "x".repeat(MAX_ERROR_BODY_LEN + 100);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("...[truncated]"));
        assert!(truncated.len() < long.len());
        assert_eq!(truncate_body("short"), "short");
    }
}
