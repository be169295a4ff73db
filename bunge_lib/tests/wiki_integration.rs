use bunge_lib::config::WikiConfig;
use bunge_lib::WikiClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, max_chars: usize) -> WikiClient {
    let config = WikiConfig {
        base_url: server.uri(),
        ..WikiConfig::default()
    };
    WikiClient::new(&config, max_chars).unwrap()
}

#[tokio::test]
async fn summary_is_fetched_once_then_cached() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "title": "Jane Doe",
        "extract": "Jane Doe is a Kenyan politician who represents Westlands.",
        "description": "Kenyan politician",
        "thumbnail": { "source": "https://upload.wikimedia.org/jane.jpg", "width": 320, "height": 400 },
        "content_urls": {
            "desktop": { "page": "https://en.wikipedia.org/wiki/Jane_Doe" },
            "mobile": { "page": "https://en.m.wikipedia.org/wiki/Jane_Doe" }
        }
    });

    Mock::given(method("GET"))
        .and(path("/page/summary/Jane_Doe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let wiki = client(&server, 800);
    let first = wiki.summary("Jane_Doe").await;
    let second = wiki.summary("Jane_Doe").await;

    assert_eq!(first, second);
    assert_eq!(
        first.extract.as_deref(),
        Some("Jane Doe is a Kenyan politician who represents Westlands.")
    );
    assert_eq!(first.description.as_deref(), Some("Kenyan politician"));
    assert_eq!(
        first.thumbnail_url.as_deref(),
        Some("https://upload.wikimedia.org/jane.jpg")
    );
    assert_eq!(first.page_url, "https://en.m.wikipedia.org/wiki/Jane_Doe");
}

#[tokio::test]
async fn long_extract_is_truncated() {
    let server = MockServer::start().await;
    let body = serde_json::json!({ "extract": "x".repeat(50) });

    Mock::given(method("GET"))
        .and(path("/page/summary/Long_Article"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let summary = client(&server, 20).summary("Long_Article").await;
    let extract = summary.extract.unwrap();
    assert_eq!(extract.chars().count(), 20);
    assert!(extract.starts_with("xxxxxxxxxx"));
    assert_eq!(summary.page_url, "https://en.wikipedia.org/wiki/Long_Article");
}

#[tokio::test]
async fn http_error_falls_back_with_description_and_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page/summary/Missing_Person"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let wiki = client(&server, 800);
    let summary = wiki.summary("Missing_Person").await;
    assert_eq!(summary.extract, None);
    assert_eq!(summary.thumbnail_url, None);
    assert_eq!(summary.page_url, "https://en.wikipedia.org/wiki/Missing_Person");
    assert_eq!(
        summary.description.as_deref(),
        Some("Wikipedia article for Missing_Person")
    );

    wiki.summary("Missing_Person").await;
}

#[tokio::test]
async fn unreadable_body_falls_back_without_description() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page/summary/Garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let summary = client(&server, 800).summary("Garbled").await;
    assert_eq!(summary.extract, None);
    assert_eq!(summary.description, None);
    assert_eq!(summary.page_url, "https://en.wikipedia.org/wiki/Garbled");
}
