mod common;

use pagetext_http::{BlockingHttpClient, FetchOpts, HttpClient, HttpError};
use reqwest::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<p>fallback</p>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(FetchOpts::default()).expect("client");
    let page = client
        .get_page(&format!("{}/missing", server.uri()))
        .await
        .expect("404 is still a page");

    assert_eq!(page.status, StatusCode::NOT_FOUND);
    assert_eq!(page.body, "<p>fallback</p>");
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_client_decodes_declared_charset() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>caf\xe9</p>".to_vec(), "text/html; charset=iso-8859-1"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/latin1", server.uri());
    let page = tokio::task::spawn_blocking(move || {
        BlockingHttpClient::new(FetchOpts::default())?.get_page(&url)
    })
    .await
    .expect("join")
    .expect("fetch");

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, "<p>café</p>");
    assert_eq!(
        page.content_type.as_deref(),
        Some("text/html; charset=iso-8859-1")
    );
}

#[tokio::test]
async fn redirects_are_followed_and_final_url_recorded() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>moved</p>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(FetchOpts::default()).expect("client");
    let page = client
        .get_page(&format!("{}/old", server.uri()))
        .await
        .expect("fetch");

    assert_eq!(page.url, format!("{}/new", server.uri()));
    assert_eq!(page.body, "<p>moved</p>");
}

#[tokio::test]
async fn connection_refused_propagates_client_error() {
    common::init_test_tracing();
    let client = HttpClient::new(FetchOpts::default()).expect("client");

    match client.get_page(&refused_url()).await {
        Err(HttpError::Network(err)) => assert!(err.is_connect(), "unexpected error: {err}"),
        other => panic!("expected a network error, got {other:?}"),
    }
}

#[test]
fn malformed_url_is_an_error_not_a_panic() {
    common::init_test_tracing();
    let client = BlockingHttpClient::new(FetchOpts::default()).expect("client");

    let err = client.get_page("not a url").expect_err("must fail");
    assert!(matches!(err, HttpError::Network(ref e) if e.is_builder()));
}
