//! Integration tests for `HttpMailRelay` using wiremock HTTP mocks.

use pricewatch_alerts::{HttpMailRelay, MailNotifier, Notifier, NotifyError};
use pricewatch_core::{BestOffer, MailConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mail_config(server: &MockServer, token: Option<&str>) -> MailConfig {
    MailConfig {
        relay_url: format!("{}/send", server.uri()),
        relay_token: token.map(str::to_string),
        from: "alerts@pricewatch.test".to_string(),
        to: vec!["me@pricewatch.test".to_string()],
    }
}

fn notifier(config: MailConfig) -> MailNotifier<HttpMailRelay> {
    MailNotifier::new(HttpMailRelay::new(config, 5).expect("relay construction should not fail"))
}

fn offer() -> BestOffer {
    BestOffer {
        model: "OLED55C4".to_string(),
        price_num: 849.0,
        price_text: Some("£849.00".to_string()),
        site: "LG UK".to_string(),
        url: Some("https://www.lg.com/uk/tvs/lg-oled55c46la/".to_string()),
        title: Some("LG OLED55C46LA".to_string()),
    }
}

#[tokio::test]
async fn posts_rendered_message_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer relay-secret"))
        .and(body_partial_json(serde_json::json!({
            "from": "alerts@pricewatch.test",
            "to": ["me@pricewatch.test"],
            "subject": "Deals: OLED55C4 £849 @ LG UK",
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    notifier(mail_config(&server, Some("relay-secret")))
        .notify(&[offer()])
        .await
        .expect("relay accepted the message");
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    notifier(mail_config(&server, None))
        .notify(&[offer()])
        .await
        .expect("relay accepted the message");

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn non_success_status_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let err = notifier(mail_config(&server, Some("wrong")))
        .notify(&[offer()])
        .await
        .expect_err("401 must fail the dispatch");

    match err {
        NotifyError::Rejected { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad token");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    notifier(mail_config(&server, None))
        .notify(&[])
        .await
        .expect("empty batch is a no-op");
}
