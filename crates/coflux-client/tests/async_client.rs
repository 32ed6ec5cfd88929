use bytes::Bytes;
use chrono::{TimeZone, Utc};
use coflux_client::{
    AsyncWebClient, ClientRequest, ClientResponse, FnConnector, RequestBodySpec, RequestHeadersSpec,
    ResponseStatusError, UriSpec, WebClient,
};
use coflux_codec::MultiValueMap;
use coflux_core::{BridgeError, Flux, UpstreamError};
use futures_util::TryStreamExt;
use http::header::{ACCEPT, ACCEPT_CHARSET, CONTENT_TYPE, COOKIE, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::{Method, StatusCode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    id: u32,
    owner: String,
}

/// Records every request and answers with `respond`.
struct Recorder {
    requests: Arc<Mutex<Vec<ClientRequest>>>,
    calls: Arc<AtomicUsize>,
    client: AsyncWebClient,
}

fn recorder<F>(respond: F) -> Recorder
where
    F: Fn(&ClientRequest) -> ClientResponse + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let respond = Arc::new(respond);

    let (seen, counter) = (Arc::clone(&requests), Arc::clone(&calls));
    let connector = FnConnector::new(move |request: ClientRequest| {
        let seen = Arc::clone(&seen);
        let counter = Arc::clone(&counter);
        let respond = Arc::clone(&respond);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let response = respond(&request);
            seen.lock().push(request);
            Ok::<_, UpstreamError>(response)
        }
    });

    let client = WebClient::builder()
        .base_url("http://bank.test/api")
        .connector(connector)
        .build()
        .unwrap()
        .into_async();
    Recorder {
        requests,
        calls,
        client,
    }
}

fn json(status: StatusCode, body: &'static str) -> ClientResponse {
    ClientResponse::builder(status)
        .content_type(&mime::APPLICATION_JSON)
        .body(body)
        .build()
}

#[tokio::test]
async fn retrieve_decodes_json_body() {
    let rec = recorder(|_| json(StatusCode::OK, r#"{"id":7,"owner":"ada"}"#));

    let account: Option<Account> = rec
        .client
        .get()
        .uri("/accounts/{id}", &[&7])
        .accept(&[mime::APPLICATION_JSON])
        .retrieve()
        .body()
        .await
        .unwrap();

    assert_eq!(
        account,
        Some(Account {
            id: 7,
            owner: "ada".to_string()
        })
    );
    let requests = rec.requests.lock();
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].uri, "http://bank.test/api/accounts/7");
    assert_eq!(requests[0].headers[ACCEPT], "application/json");
}

#[tokio::test]
async fn builder_sets_conditional_and_cookie_headers() {
    let rec = recorder(|_| ClientResponse::builder(StatusCode::NOT_MODIFIED).build());
    let since = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();

    let response = rec
        .client
        .get()
        .uri("/statements", &[])
        .if_modified_since(since)
        .if_none_match(&["\"v1\"", "\"v2\""])
        .accept_charset(&["utf-8"])
        .cookie("session", "s1")
        .cookies(|jar| {
            jar.insert("theme".to_string(), vec!["dark".to_string()]);
        })
        .exchange()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    let requests = rec.requests.lock();
    let headers = requests[0].wire_headers().unwrap();
    assert_eq!(headers[IF_MODIFIED_SINCE], "Wed, 21 Oct 2015 07:28:00 GMT");
    assert_eq!(headers[IF_NONE_MATCH], "\"v1\", \"v2\"");
    assert_eq!(headers[ACCEPT_CHARSET], "utf-8");
    assert_eq!(headers[COOKIE], "session=s1; theme=dark");
}

#[tokio::test]
async fn named_variables_are_encoded() {
    let rec = recorder(|_| ClientResponse::builder(StatusCode::OK).build());
    let variables = HashMap::from([("q", "a b/c"), ("page", "2")]);

    rec.client
        .get()
        .uri_with_map("/search?q={q}&page={page}", &variables)
        .exchange()
        .await
        .unwrap();

    assert_eq!(
        rec.requests.lock()[0].uri,
        "http://bank.test/api/search?q=a%20b%2Fc&page=2"
    );
}

#[tokio::test]
async fn empty_body_resolves_to_none() {
    let rec = recorder(|_| {
        ClientResponse::builder(StatusCode::OK)
            .content_type(&mime::APPLICATION_JSON)
            .build()
    });

    let account: Option<Account> = rec.client.get().uri("/accounts/1", &[]).retrieve().body().await.unwrap();
    assert!(account.is_none());
}

#[tokio::test]
async fn missing_reader_names_media_type_and_target() {
    let rec = recorder(|_| {
        ClientResponse::builder(StatusCode::OK)
            .content_type(&mime::TEXT_CSV)
            .body("id,owner\n7,ada\n")
            .build()
    });

    let err = rec
        .client
        .get()
        .uri("/accounts.csv", &[])
        .retrieve()
        .body::<Account>()
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::NoReader { .. }));
    let message = err.to_string();
    assert!(message.contains("text/csv"));
    assert!(message.contains("Account"));
}

#[tokio::test]
async fn client_error_status_is_reported_with_body() {
    let rec = recorder(|_| json(StatusCode::NOT_FOUND, r#"{"error":"no such account"}"#));

    let err = rec
        .client
        .delete()
        .uri("/accounts/{id}", &[&404])
        .retrieve()
        .body::<Account>()
        .await
        .unwrap_err();

    let status = ResponseStatusError::from_bridge(&err).expect("status error");
    assert_eq!(status.status, StatusCode::NOT_FOUND);
    assert_eq!(status.method, Method::DELETE);
    assert_eq!(status.body_text(), Some(r#"{"error":"no such account"}"#));
    assert!(status.is_client_error());
}

#[tokio::test]
async fn exchange_does_not_check_status() {
    let rec = recorder(|_| json(StatusCode::INTERNAL_SERVER_ERROR, r#"{"id":0,"owner":""}"#));

    let response = rec.client.get().uri("/flaky", &[]).exchange().await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body::<Account>().await.unwrap().is_some());
}

#[tokio::test]
async fn invalid_header_is_reported_at_terminal_call() {
    let rec = recorder(|_| ClientResponse::builder(StatusCode::OK).build());

    let spec = rec
        .client
        .get()
        .uri("/accounts", &[])
        .header("x-trace", &["line\nbreak"]);
    assert_eq!(rec.calls.load(Ordering::SeqCst), 0);

    let err = spec.exchange().await.unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRequest(_)));
    assert_eq!(rec.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_cookie_is_reported_at_terminal_call() {
    let rec = recorder(|_| ClientResponse::builder(StatusCode::OK).build());

    let err = rec
        .client
        .get()
        .uri("/accounts", &[])
        .cookie("s", "a\nb")
        .exchange()
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRequest(_)));
    assert_eq!(rec.calls.load(Ordering::SeqCst), 0);

    let err = rec
        .client
        .get()
        .uri("/accounts", &[])
        .cookies(|jar| {
            jar.insert("theme".to_string(), vec!["dark\r".to_string()]);
        })
        .retrieve()
        .body::<Account>()
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRequest(_)));
    assert_eq!(rec.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn retrieve_performs_no_io_until_awaited() {
    let rec = recorder(|_| json(StatusCode::OK, r#"{"id":1,"owner":"x"}"#));

    let spec = rec.client.get().uri("/accounts/1", &[]).retrieve();
    tokio::task::yield_now().await;
    assert_eq!(rec.calls.load(Ordering::SeqCst), 0);

    let _: Option<Account> = spec.body().await.unwrap();
    assert_eq!(rec.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn json_and_form_bodies_are_encoded() {
    let rec = recorder(|request| {
        ClientResponse::builder(StatusCode::OK)
            .body(request.body.clone().unwrap_or_default())
            .build()
    });

    let echoed: Option<String> = rec
        .client
        .post()
        .uri("/accounts", &[])
        .json(&Account {
            id: 3,
            owner: "lin".to_string(),
        })
        .retrieve()
        .body()
        .await
        .unwrap();
    assert_eq!(echoed.as_deref(), Some(r#"{"id":3,"owner":"lin"}"#));

    let mut form = MultiValueMap::new();
    form.insert("tag".to_string(), vec!["a".to_string(), "b c".to_string()]);
    let echoed: Option<String> = rec
        .client
        .put()
        .uri("/tags", &[])
        .form(&form)
        .retrieve()
        .body()
        .await
        .unwrap();
    assert_eq!(echoed.as_deref(), Some("tag=a&tag=b+c"));

    let requests = rec.requests.lock();
    assert_eq!(requests[0].headers[CONTENT_TYPE], "application/json");
    assert_eq!(requests[1].headers[CONTENT_TYPE], "application/x-www-form-urlencoded");
}

#[tokio::test]
async fn body_stream_yields_each_line() {
    let rec = recorder(|_| {
        ClientResponse::builder(StatusCode::OK)
            .content_type(&mime::APPLICATION_JSON)
            .body_publisher(Flux::from_iter(vec![
                Bytes::from_static(b"{\"id\":1,\"owner\":\"a\"}\n{\"id\":2,"),
                Bytes::from_static(b"\"owner\":\"b\"}\n"),
            ]))
            .build()
    });

    let accounts: Vec<Account> = rec
        .client
        .get()
        .uri("/accounts/feed", &[])
        .retrieve()
        .body_stream::<Account>()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(accounts.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn form_data_ignores_content_type() {
    let rec = recorder(|_| {
        ClientResponse::builder(StatusCode::OK)
            .content_type(&mime::TEXT_PLAIN)
            .body("a=1&a=2&b=3")
            .build()
    });

    let response = rec.client.get().uri("/form", &[]).exchange().await.unwrap().unwrap();
    let form = response.form_data().await.unwrap().unwrap();
    assert_eq!(form["a"], vec!["1", "2"]);
    assert_eq!(form["b"], vec!["3"]);
}

#[tokio::test]
async fn attributes_reach_the_connector() {
    let rec = recorder(|_| ClientResponse::builder(StatusCode::OK).build());

    rec.client
        .get()
        .uri("/", &[])
        .attribute("tenant", 42_u64)
        .attributes(|attrs| {
            attrs.insert("region".to_string(), Arc::new("eu".to_string()));
        })
        .exchange()
        .await
        .unwrap();

    let requests = rec.requests.lock();
    assert_eq!(requests[0].attribute::<u64>("tenant"), Some(&42));
    assert_eq!(requests[0].attribute::<String>("region").map(String::as_str), Some("eu"));
}

#[tokio::test]
async fn upstream_failure_passes_through() {
    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct Reset;

    let client = WebClient::new(FnConnector::new(|_request| async {
        Err::<ClientResponse, UpstreamError>(Arc::new(Reset))
    }))
    .into_async();

    let err = client
        .get()
        .uri("http://bank.test/", &[])
        .retrieve()
        .body::<String>()
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "connection reset");
    assert!(err.as_upstream().is_some());
}
