use provisioning::credentials::{CredentialProvider, SessionCredentials};
use provisioning::model::{ActivationConfig, Integration, ProvisioningStatus, TicketFilter};
use provisioning::poller::{PollOutcome, PollerConfig, ProvisioningPoller, StatusView};
use provisioning::{AdminApiClient, AdminApiError, ProvisioningApi};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, token: Option<&str>) -> (AdminApiClient, Arc<SessionCredentials>) {
    let credentials = Arc::new(match token {
        Some(token) => SessionCredentials::with_token(token),
        None => SessionCredentials::new(),
    });
    let client = AdminApiClient::with_base_url(&server.uri(), credentials.clone()).unwrap();
    (client, credentials)
}

fn status_body(status: &str, flags: [bool; 5], percent: u8) -> Value {
    json!({
        "success": true,
        "data": {
            "id": "prov_1",
            "status": status,
            "workspaceCreated": flags[0],
            "dashboardCreated": flags[1],
            "websiteDeployed": flags[2],
            "dataInitialized": flags[3],
            "credentialsSent": flags[4],
            "currentStep": "DASHBOARD_CREATED",
            "completionPercent": percent,
            "retryCount": 0,
            "store": { "name": "Acme Toys", "subdomain": "acme-toys" }
        }
    })
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/themes"))
        .and(header("authorization", "Bearer tok_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "themes": [{ "id": "t1", "name": "Fresh Market", "slug": "fresh-market" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok_123"));
    let themes = client.get_themes().await.unwrap();

    assert_eq!(themes.len(), 1);
    assert_eq!(themes[0].slug, "fresh-market");
}

#[tokio::test]
async fn test_no_token_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{ "id": "p1", "name": "Starter", "slug": "starter", "price": "19.00" }]
        })))
        .mount(&server)
        .await;

    let (client, _) = client(&server, None);
    let plans = client.get_plans().await.unwrap();
    assert_eq!(plans[0].price.as_deref(), Some("19.00"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_unauthorized_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/brands"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
        )
        .mount(&server)
        .await;

    let (client, credentials) = client(&server, Some("stale"));
    let err = client.get_brands(None).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Token expired");
    assert_eq!(credentials.get(), None);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_error_message_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/provisioning/merchants/store_1/retry-provisioning"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Cannot retry",
            "message": "Can only retry failed provisioning"
        })))
        .mount(&server)
        .await;

    let (client, credentials) = client(&server, Some("tok"));
    let err = client.retry_provisioning("store_1").await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Can only retry failed provisioning");
    // Only a 401 drops the session.
    assert_eq!(credentials.get().as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_unparsable_error_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/brands/b1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok"));
    let err = client.get_brand("b1").await.unwrap_err();

    assert!(matches!(err, AdminApiError::Request { status: 502, .. }));
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/auth/login"))
        .and(body_json(json!({ "email": "ops@orbit360.shop", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok_new" })))
        .mount(&server)
        .await;

    let (client, credentials) = client(&server, None);
    client.login("ops@orbit360.shop", "secret").await.unwrap();

    assert_eq!(credentials.get().as_deref(), Some("tok_new"));

    client.logout();
    assert_eq!(credentials.get(), None);
}

#[tokio::test]
async fn test_login_failure_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string(""))
        .mount(&server)
        .await;

    let (client, _) = client(&server, None);
    let err = client.login("ops@orbit360.shop", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Login failed");
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let (client, credentials) = client(&server, Some("tok_current"));
    let err = client.login("ops@orbit360.shop", "wrong").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(credentials.get().as_deref(), Some("tok_current"));
}

#[tokio::test]
async fn test_activate_sends_full_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/provisioning/merchants/store_1/activate"))
        .and(body_json(json!({
            "themeId": "t1",
            "planId": "p1",
            "subdomain": "acme-toys",
            "category": "E-COMMERCE",
            "integrations": {
                "meta": false, "stripe": true, "payu": false, "cashfree": false,
                "razorpay": false, "phonepe": false, "analytics": true
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Merchant activated successfully",
            "data": { "storeId": "store_1", "merchantId": "M-1001" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ActivationConfig {
        theme_id: "t1".into(),
        plan_id: "p1".into(),
        subdomain: "acme-toys".into(),
        category: "E-COMMERCE".into(),
        ..Default::default()
    };
    config.integrations.set(Integration::Stripe, true);
    config.integrations.set(Integration::Analytics, true);

    let (client, _) = client(&server, Some("tok"));
    let receipt = client.activate_merchant("store_1", &config).await.unwrap();

    assert_eq!(receipt.merchant_id.as_deref(), Some("M-1001"));
    assert_eq!(receipt.message.as_deref(), Some("Merchant activated successfully"));
}

#[tokio::test]
async fn test_status_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/provisioning/merchants/store_1/provisioning-status"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Not found",
            "message": "Provisioning status not found"
        })))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok"));
    assert_eq!(client.get_provisioning_status("store_1").await.unwrap(), None);
}

#[tokio::test]
async fn test_status_record_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/provisioning/merchants/store_1/provisioning-status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body("IN_PROGRESS", [true, true, false, false, false], 40)),
        )
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok"));
    let record = client.get_provisioning_status("store_1").await.unwrap().unwrap();

    assert_eq!(record.status, ProvisioningStatus::InProgress);
    assert_eq!(record.completion_percent, 40);
    assert!(record.dashboard_created);
}

#[tokio::test]
async fn test_rejected_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/provisioning/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Provisioning queue unavailable"
        })))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok"));
    let err = client.get_pending_merchants().await.unwrap_err();

    assert!(matches!(err, AdminApiError::Rejected { .. }));
    assert_eq!(err.to_string(), "Provisioning queue unavailable");
}

#[tokio::test]
async fn test_brand_filter_and_ticket_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/brands"))
        .and(query_param("isActive", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stores": [{ "id": "s1", "name": "Acme Toys", "subdomain": "acme-toys", "isActive": false }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/tickets"))
        .and(query_param("status", "OPEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tickets": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok"));
    let stores = client.get_brands(Some(false)).await.unwrap();
    assert_eq!(stores[0].subdomain, "acme-toys");

    let filter = TicketFilter {
        status: Some("OPEN".into()),
        ..Default::default()
    };
    assert!(client.get_tickets(&filter).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_poller_against_http_backend() {
    let server = MockServer::start().await;
    let status_path = "/api/provisioning/merchants/store_1/provisioning-status";
    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body("IN_PROGRESS", [true, false, false, false, false], 25)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(status_body("COMPLETED", [true; 5], 100)),
        )
        .mount(&server)
        .await;

    let (client, _) = client(&server, Some("tok"));
    let mut poller = ProvisioningPoller::new(
        Arc::new(client),
        "store_1",
        PollerConfig {
            auto_refresh: true,
            interval: Duration::from_millis(20),
        },
    );

    let (_stop, shutdown) = watch::channel(false);
    let outcome = poller.run(shutdown, |_| {}).await;

    assert_eq!(outcome, PollOutcome::Terminal(ProvisioningStatus::Completed));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(matches!(poller.state().view, StatusView::Record(_)));
}
