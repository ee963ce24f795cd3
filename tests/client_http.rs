//! Integration tests for the ticket client over a mocked webservice.
//!
//! These cover the HTTP-level contract: credential injection into request
//! bodies, verb and URL selection per operation, the error-envelope
//! precedence over HTTP status, lenient decoding of loosely typed
//! responses, and the search-then-get fan-out.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use otobo_client::client::{OtoboClient, SearchAndGet};
use otobo_client::config::{ClientConfig, Credentials};
use otobo_client::error::OtoboError;
use otobo_client::models::{Article, IdName, TicketCreate, TicketSearch, TicketUpdate};
use otobo_client::operation::TicketOperation;

/// Configuration pointing at the mock server with all four operations on
/// their default endpoint names.
fn support_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri(), "Support")
        .expect("mock server uri should validate")
        .with_default_operations()
}

fn support_client(server: &MockServer) -> OtoboClient {
    OtoboClient::new(support_config(server).with_credentials(Credentials::new("agent", "secret")))
        .expect("client should build")
}

/// A minimal wire-shaped ticket for get responses.
fn wire_ticket(id: u64, number: &str, title: &str) -> serde_json::Value {
    json!({
        "TicketID": id,
        "TicketNumber": number,
        "Title": title,
        "Queue": "Support",
        "QueueID": 2,
        "State": "open",
        "Priority": "3 normal",
    })
}

#[tokio::test]
async fn create_sends_credentials_and_maps_echoed_ticket() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-create"))
        .and(header("Accept", "application/json"))
        .and(body_partial_json(json!({
            "UserLogin": "agent",
            "Password": "secret",
            "Ticket": {"Title": "Printer broken", "Queue": "Raw"},
            "Article": {"Subject": "Printer broken", "Body": "Paper jam in tray 2"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TicketID": "77",
            "TicketNumber": 2025091700077_u64,
            "ArticleID": 1,
            "Ticket": {
                "TicketID": "77",
                "TicketNumber": 2025091700077_u64,
                "Title": "Printer broken",
                "Queue": "Raw",
                "QueueID": "1",
                "DynamicField": [{"Name": "Device", "Value": "printer-4"}],
                // Single article object instead of a list.
                "Article": {"Subject": "Printer broken", "Body": "Paper jam in tray 2"},
                "SomeNewerField": true,
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = support_client(&server);
    let create = TicketCreate::new("Printer broken")
        .with_queue(IdName::by_name("Raw").unwrap())
        .with_article(Article::plain_text("Printer broken", "Paper jam in tray 2"));

    let ticket = client.create_ticket(&create).await.unwrap();
    assert_eq!(ticket.id, 77);
    assert_eq!(ticket.number, "2025091700077");
    assert_eq!(ticket.title.as_deref(), Some("Printer broken"));
    assert_eq!(ticket.queue_name(), Some("Raw"));
    assert_eq!(ticket.dynamic_field("Device"), Some("printer-4"));
    assert_eq!(ticket.articles.len(), 1);
    assert_eq!(ticket.articles[0].body.as_deref(), Some("Paper jam in tray 2"));
}

#[tokio::test]
async fn get_decodes_loosely_typed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-get"))
        .and(body_partial_json(json!({
            "TicketID": 42,
            "DynamicFields": 1,
            "AllArticles": 1,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ticket": [{
                "TicketID": "42",
                "TicketNumber": 2025091700042_u64,
                "Title": "VPN down",
                "Queue": "Support",
                "QueueID": "2",
                "State": "open",
                "StateID": 4,
                "DynamicField": [{"Name": "Device", "Value": "laptop-7"}],
                "Article": [
                    {"Subject": "VPN down", "Body": "since this morning"},
                    {"Subject": "Re: VPN down", "Body": "rebooting the gateway"},
                ],
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ticket = support_client(&server).get_ticket(42).await.unwrap();
    assert_eq!(ticket.id, 42);
    assert_eq!(ticket.number, "2025091700042");
    let queue = ticket.queue.clone().unwrap();
    assert_eq!(queue.id(), Some(2));
    assert_eq!(queue.name(), Some("Support"));
    assert_eq!(ticket.dynamic_field("Device"), Some("laptop-7"));
    assert_eq!(ticket.articles.len(), 2);
    assert_eq!(ticket.articles[0].body.as_deref(), Some("since this morning"));
    assert_eq!(
        ticket.articles[1].subject.as_deref(),
        Some("Re: VPN down")
    );
}

#[tokio::test]
async fn get_by_number_sends_the_number_instead_of_an_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-get"))
        .and(body_partial_json(json!({"TicketNumber": "2025091700042"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ticket": [wire_ticket(42, "2025091700042", "VPN down")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ticket = support_client(&server)
        .get_ticket_by_number("2025091700042")
        .await
        .unwrap();
    assert_eq!(ticket.id, 42);
    assert_eq!(ticket.title.as_deref(), Some("VPN down"));
}

#[tokio::test]
async fn get_with_zero_tickets_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Ticket": []})))
        .mount(&server)
        .await;

    let err = support_client(&server).get_ticket(9).await.unwrap_err();
    assert!(err.is_transport_error());
    assert!(err.to_string().contains("got 0"), "got: {err}");
}

#[tokio::test]
async fn update_uses_put_and_the_route_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/Webservice/Support/tickets/55"))
        .and(body_partial_json(json!({
            "TicketID": 55,
            "Ticket": {"Title": "New title"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TicketID": 55,
            "Ticket": wire_ticket(55, "2025091700055", "New title"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = support_config(&server)
        .with_operation(TicketOperation::Update, "tickets/:TicketID")
        .with_credentials(Credentials::new("agent", "secret"));
    let client = OtoboClient::new(config).unwrap();

    let update = TicketUpdate::default().with_id(55).with_title("New title");
    let ticket = client.update_ticket(&update).await.unwrap();
    assert_eq!(ticket.id, 55);
    assert_eq!(ticket.title.as_deref(), Some("New title"));
}

#[tokio::test]
async fn route_endpoint_without_an_id_fails_before_sending() {
    let server = MockServer::start().await;

    // An unfillable placeholder must never reach the wire.
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = support_config(&server)
        .with_operation(TicketOperation::Get, "tickets/:TicketID")
        .with_operation(TicketOperation::Update, "tickets/:TicketID")
        .with_credentials(Credentials::new("agent", "secret"));
    let client = OtoboClient::new(config).unwrap();

    // Get by number knows no ticket id to substitute.
    let err = client
        .get_ticket_by_number("2025091700042")
        .await
        .unwrap_err();
    assert!(err.is_config_error());
    assert!(err.to_string().contains("requires a ticket id"), "got: {err}");

    // Same for an update that targets the ticket by number only.
    let update = TicketUpdate::default()
        .with_number("2025091700042")
        .with_title("New title");
    let err = client.update_ticket(&update).await.unwrap_err();
    assert!(err.to_string().contains("requires a ticket id"), "got: {err}");
}

#[tokio::test]
async fn error_envelope_wins_over_http_status() {
    let server = MockServer::start().await;

    // The generic interface reports business errors inside 200 responses.
    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Error": {"ErrorCode": "501", "ErrorMessage": "no ticket"}
        })))
        .mount(&server)
        .await;

    // And sometimes the same envelope with a failure status.
    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-get"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "Error": {"ErrorCode": "TicketGet.AccessDenied", "ErrorMessage": "not allowed"}
        })))
        .mount(&server)
        .await;

    let client = support_client(&server);

    let err = client
        .search_tickets(&TicketSearch::default())
        .await
        .unwrap_err();
    match err {
        OtoboError::Api { code, message } => {
            assert_eq!(code, "501");
            assert_eq!(message, "no ticket");
        }
        other => panic!("expected an API error, got {other:?}"),
    }

    let err = client.get_ticket(1).await.unwrap_err();
    assert!(err.is_api_error(), "envelope should win over the 500: {err}");
}

#[tokio::test]
async fn failure_status_without_envelope_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-search"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = support_client(&server)
        .search_tickets(&TicketSearch::default())
        .await
        .unwrap_err();
    assert!(err.is_transport_error());
    assert!(err.to_string().contains("502"), "got: {err}");
}

#[tokio::test]
async fn search_coerces_string_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-search"))
        .and(body_partial_json(json!({"Queues": ["Support"], "UseSubQueues": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TicketID": [11, "22", 33]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = TicketSearch::default().with_queue(IdName::by_name("Support").unwrap());
    let ids = support_client(&server).search_tickets(&search).await.unwrap();
    assert_eq!(ids, vec![11, 22, 33]);
}

#[tokio::test]
async fn search_with_unexpected_shape_decodes_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TicketID": {"weird": true}
        })))
        .mount(&server)
        .await;

    // Schema mismatches on the happy path are logged, not fatal.
    let ids = support_client(&server)
        .search_tickets(&TicketSearch::default())
        .await
        .unwrap();
    assert_eq!(ids, Vec::<u64>::new());
}

#[tokio::test]
async fn search_and_get_fetches_capped_ids_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TicketID": [11, 22, 33]
        })))
        .expect(1)
        .mount(&server)
        .await;

    for id in [11_u64, 22] {
        Mock::given(method("POST"))
            .and(path("/Webservice/Support/ticket-get"))
            .and(body_partial_json(json!({"TicketID": id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Ticket": [wire_ticket(id, &format!("n-{id}"), "ticket")]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }
    // The cap must keep the third id from ever being fetched.
    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-get"))
        .and(body_partial_json(json!({"TicketID": 33})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Ticket": []})))
        .expect(0)
        .mount(&server)
        .await;

    let tickets = support_client(&server)
        .search_and_get(
            &TicketSearch::default(),
            &SearchAndGet::new().with_max_tickets(2),
        )
        .await
        .unwrap();

    let ids: Vec<u64> = tickets.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![11, 22]);
    assert_eq!(tickets[0].number, "n-11");
    assert_eq!(tickets[1].number, "n-22");
}

#[tokio::test]
async fn search_and_get_with_seed_is_reproducible() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "TicketID": [1, 2, 3, 4, 5, 6]
        })))
        .expect(2)
        .mount(&server)
        .await;

    // Which ids the sample picks depends on the seed, so every id gets a
    // mock and none carries a call-count expectation.
    for id in 1_u64..=6 {
        Mock::given(method("POST"))
            .and(path("/Webservice/Support/ticket-get"))
            .and(body_partial_json(json!({"TicketID": id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Ticket": [wire_ticket(id, &format!("n-{id}"), "ticket")]
            })))
            .mount(&server)
            .await;
    }

    let client = support_client(&server);
    let options = SearchAndGet::new().with_seed(7).with_max_tickets(3);

    let first: Vec<u64> = client
        .search_and_get(&TicketSearch::default(), &options)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();
    let second: Vec<u64> = client
        .search_and_get(&TicketSearch::default(), &options)
        .await
        .unwrap()
        .iter()
        .map(|t| t.id)
        .collect();

    assert_eq!(first, second, "same seed must pick the same tickets");
    assert_eq!(first.len(), 3);
    let mut sorted = first.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 3, "sample must not repeat ids");
    assert!(sorted.iter().all(|id| (1..=6).contains(id)));
}

#[tokio::test]
async fn unconfigured_operations_send_no_request() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    // Only the get endpoint is configured, so search fails up front.
    let config = ClientConfig::new(server.uri(), "Support")
        .unwrap()
        .with_operation(TicketOperation::Get, "ticket-get")
        .with_credentials(Credentials::new("agent", "secret"));
    let client = OtoboClient::new(config).unwrap();

    let err = client
        .search_tickets(&TicketSearch::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OtoboError::NotConfigured {
            operation: TicketOperation::Search
        }
    ));

    // And the inverse: search alone is not enough for search_and_get. The
    // missing get endpoint is detected before the search request is sent.
    let config = ClientConfig::new(server.uri(), "Support")
        .unwrap()
        .with_operation(TicketOperation::Search, "ticket-search")
        .with_credentials(Credentials::new("agent", "secret"));
    let client = OtoboClient::new(config).unwrap();

    let err = client
        .search_and_get(&TicketSearch::default(), &SearchAndGet::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OtoboError::NotConfigured {
            operation: TicketOperation::Get
        }
    ));
}

#[tokio::test]
async fn login_switches_the_credentials_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Webservice/Support/ticket-get"))
        .and(body_partial_json(json!({"UserLogin": "second", "Password": "pw2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Ticket": [wire_ticket(7, "n-7", "after login")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = support_client(&server);
    client.login(Credentials::new("second", "pw2"));

    let ticket = client.get_ticket(7).await.unwrap();
    assert_eq!(ticket.title.as_deref(), Some("after login"));
}
