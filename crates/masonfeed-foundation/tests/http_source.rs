//! `HttpFeedSource` against a local mock server.

use masonfeed_core::{FetchError, PageToken};
use masonfeed_foundation::feed::FeedDataSource;
use masonfeed_foundation::http::HttpFeedSource;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Starts a server answering `GET /posts?page=<page>` with `response`.
fn serve(rt: &Runtime, page: &str, response: ResponseTemplate) -> MockServer {
    rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("page", page))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    })
}

fn source(server: &MockServer) -> HttpFeedSource {
    HttpFeedSource::new(format!("{}/posts", server.uri())).unwrap()
}

#[test]
fn test_ok_response_decodes_posts() {
    let rt = runtime();
    let body = r#"[
        {"id": 1, "image": "https://img/1.jpg", "title": "Harbor",
         "avatar": "https://img/a.png", "username": "ines", "likes": 4},
        {"id": 2, "image": "https://img/2.jpg", "title": "Ridge",
         "avatar": "https://img/b.png", "username": "lev", "likes": 9}
    ]"#;
    let server = serve(&rt, "1", ResponseTemplate::new(200).set_body_string(body));

    let posts = source(&server).fetch_page(PageToken::FIRST).unwrap();
    assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(posts[1].username, "lev");
}

#[test]
fn test_empty_array_is_an_empty_page() {
    let rt = runtime();
    let server = serve(&rt, "3", ResponseTemplate::new(200).set_body_string("[]"));

    let posts = source(&server).fetch_page(PageToken::new(3)).unwrap();
    assert!(posts.is_empty());
}

#[test]
fn test_not_found_maps_to_not_found() {
    let rt = runtime();
    let server = serve(&rt, "2", ResponseTemplate::new(404));

    let error = source(&server).fetch_page(PageToken::new(2)).unwrap_err();
    assert_eq!(error, FetchError::NotFound(PageToken::new(2)));
    assert!(error.is_end_of_collection());
}

#[test]
fn test_server_error_maps_to_status() {
    let rt = runtime();
    let server = serve(&rt, "1", ResponseTemplate::new(503));

    let error = source(&server).fetch_page(PageToken::FIRST).unwrap_err();
    assert_eq!(
        error,
        FetchError::Status {
            token: PageToken::FIRST,
            status: 503,
        }
    );
    assert!(!error.is_end_of_collection());
}

#[test]
fn test_unreachable_host_is_a_transport_error() {
    // Grab a free port, then close it so nothing is listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let source = HttpFeedSource::new(format!("http://127.0.0.1:{port}/posts")).unwrap();

    let error = source.fetch_page(PageToken::new(5)).unwrap_err();
    assert!(
        matches!(error, FetchError::Transport { token, .. } if token == PageToken::new(5)),
        "unexpected error: {error:?}"
    );
}
