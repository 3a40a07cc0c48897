use secretary::sources::news::{
    render_news, Article, NewsConfig, NewsError, NewsFetcher, NO_NEWS_PLACEHOLDER,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn articles_json(count: usize) -> serde_json::Value {
    let articles = (1..=count)
        .map(|i| {
            serde_json::json!({
                "source": {"id": null, "name": format!("Source {i}")},
                "author": "Reporter",
                "title": format!("Headline {i}"),
                "url": format!("https://news.example.com/{i}"),
                "publishedAt": "2026-10-15T06:00:00Z"
            })
        })
        .collect::<Vec<_>>();
    serde_json::json!({
        "status": "ok",
        "totalResults": count,
        "articles": articles
    })
}

fn fetcher(base_url: String, page_size: Option<usize>) -> NewsFetcher {
    NewsFetcher::new(
        "news-key",
        NewsConfig {
            query: "Nvidia AND earnings".to_string(),
            language: "en".to_string(),
            page_size,
            base_url,
            timeout_secs: Some(5),
        },
    )
    .expect("Failed to create news fetcher")
}

#[tokio::test]
async fn sends_query_filters_and_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", "Nvidia AND earnings"))
        .and(query_param("language", "en"))
        .and(query_param("sortBy", "publishedAt"))
        .and(query_param("pageSize", "5"))
        .and(header("x-api-key", "news-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_json(2)))
        .mount(&server)
        .await;

    let articles = fetcher(server.uri(), None)
        .fetch()
        .await
        .expect("News fetch failed");

    assert_eq!(
        articles,
        vec![
            Article {
                title: "Headline 1".to_string(),
                source: Some("Source 1".to_string()),
            },
            Article {
                title: "Headline 2".to_string(),
                source: Some("Source 2".to_string()),
            },
        ]
    );
}

#[tokio::test]
async fn truncates_oversized_results_in_provider_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_json(12)))
        .mount(&server)
        .await;

    let articles = fetcher(server.uri(), Some(7))
        .fetch()
        .await
        .expect("News fetch failed");

    let titles = articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>();
    assert_eq!(
        titles,
        vec![
            "Headline 1",
            "Headline 2",
            "Headline 3",
            "Headline 4",
            "Headline 5",
            "Headline 6",
            "Headline 7"
        ]
    );
}

#[tokio::test]
async fn skips_articles_without_titles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                {"source": {"name": "Wire"}, "title": null},
                {"source": {"name": ""}, "title": "  Chipmaker files 8-K  "},
                {"title": "No source at all"}
            ]
        })))
        .mount(&server)
        .await;

    let articles = fetcher(server.uri(), None)
        .fetch()
        .await
        .expect("News fetch failed");

    assert_eq!(
        render_news(&articles),
        "- Chipmaker files 8-K\n- No source at all"
    );
}

#[tokio::test]
async fn empty_result_renders_placeholder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_json(0)))
        .mount(&server)
        .await;

    let articles = fetcher(server.uri(), None)
        .fetch()
        .await
        .expect("News fetch failed");

    assert!(articles.is_empty());
    assert_eq!(render_news(&articles), NO_NEWS_PLACEHOLDER);
    assert!(!render_news(&articles).is_empty());
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&server)
        .await;

    let err = fetcher(server.uri(), None)
        .fetch()
        .await
        .expect_err("Expected news error");

    match err {
        NewsError::ApiStatus { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("apiKeyInvalid"));
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn error_body_with_ok_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "code": "rateLimited",
            "message": "Too many requests"
        })))
        .mount(&server)
        .await;

    let err = fetcher(server.uri(), None)
        .fetch()
        .await
        .expect_err("Expected news error");

    match err {
        NewsError::Api { code, message } => {
            assert_eq!(code, "rateLimited");
            assert_eq!(message, "Too many requests");
        }
        other => panic!("Unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn keeps_path_prefix_of_base_url() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxy/newsapi/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(articles_json(1)))
        .mount(&server)
        .await;

    let articles = fetcher(format!("{}/proxy/newsapi/", server.uri()), None)
        .fetch()
        .await
        .expect("News fetch failed");

    assert_eq!(articles.len(), 1);
}

#[test]
fn rejects_unusable_base_url() {
    let err = NewsFetcher::new(
        "news-key",
        NewsConfig {
            base_url: "mailto:news@example.com".to_string(),
            ..NewsConfig::default()
        },
    )
    .expect_err("Expected invalid base URL");

    assert!(matches!(err, NewsError::InvalidBaseUrl(_)));
}

#[test]
fn renders_one_line_per_article() {
    let articles = vec![
        Article {
            title: "Fed holds rates".to_string(),
            source: Some("Reuters".to_string()),
        },
        Article {
            title: "Insider sells shares".to_string(),
            source: None,
        },
    ];

    assert_eq!(
        render_news(&articles),
        "- Fed holds rates (Reuters)\n- Insider sells shares"
    );
}
