//! End-to-end routing tests through the HTTP front end.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::Value;

mod common;

const LISTING: &str = "jshcms_redirects.json";

#[tokio::test]
async fn test_published_content_rewrites_to_renderer() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;

    let res = common::client()
        .get(format!("http://{}/docs/", router.addr))
        .send()
        .await
        .expect("Router unreachable");

    // A redirect rule also exists for /docs/, content must win
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.text().await.unwrap(),
        "app /cms_support/page_object?url=%2Fdocs%2F"
    );
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_exact_rule_permanent_redirect() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;

    let res = common::client()
        .get(format!("http://{}/old", router.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()["location"],
        format!("http://{}/new", router.addr).as_str()
    );
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_regex_rule_temporary_redirect_with_captures() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/blog/42/hello-world", router.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(
        res.headers()["location"],
        format!("http://{}/posts/hello-world?id=42", router.addr).as_str()
    );

    let res = client
        .get(format!("http://{}/external", router.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "https://other.example.com/landing");
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_passthru_rule_rewrites_internally() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;

    let res = common::client()
        .get(format!("http://{}/LEGACY/area", router.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "app /modern/app");
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_https_passthru_rule_falls_back_to_pass_through() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;

    let res = common::client()
        .get(format!("http://{}/partner?x=1", router.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "app /partner?x=1");
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_double_slash_path_stays_on_application() {
    let app = common::start_mock_app().await;
    let mut config = common::config_for(app, None);
    config.content.content_root = "/".into();
    let router = common::start_router(config).await;

    let res = common::client()
        .get(format!("http://{}//evil.example.com/x", router.addr))
        .send()
        .await
        .unwrap();

    // The content probe reached the application, not the other host
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.text().await.unwrap(),
        "app /cms_support/page_object?url=%2F%2Fevil.example.com%2Fx"
    );
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_request_passes_through() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;

    let res = common::client()
        .get(format!("http://{}/about?ref=home", router.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "app /about?ref=home");
    assert!(res_has_request_id(&common::client(), router.addr).await);
    router.shutdown.trigger();
}

async fn res_has_request_id(client: &reqwest::Client, addr: std::net::SocketAddr) -> bool {
    let res = client.get(format!("http://{}/about", addr)).send().await.unwrap();
    res.headers().contains_key("x-request-id")
}

#[tokio::test]
async fn test_missing_listing_degrades_to_pass_through() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some("missing.json"))).await;

    let res = common::client()
        .get(format!("http://{}/old", router.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "app /old");
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_excluded_prefix_bypasses_routing() {
    let app = common::start_mock_app().await;
    let mut config = common::config_for(app, Some(LISTING));
    config.upstream.excluded_prefixes = vec!["/old".into()];
    let router = common::start_router(config).await;

    let res = common::client()
        .get(format!("http://{}/old", router.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "app /old");
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_page_data_with_editor_script() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;
    let client = common::client();

    let page: Value = client
        .get(format!("http://{}/_cms/page", router.addr))
        .query(&[
            ("url", "/docs/"),
            ("jshcms_token", "token"),
            ("jshcms_url", "https://cms.example.com/"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["title"], "Documentation");
    assert_eq!(page["isInEditor"], true);
    assert_eq!(page["editorScript"], "https://cms.example.com/js/jsHarmonyCMS.js");

    let page: Value = client
        .get(format!("http://{}/_cms/page", router.addr))
        .query(&[
            ("url", "/docs/"),
            ("jshcms_token", "token"),
            ("jshcms_url", "https://evil.example.com/"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["isInEditor"], true);
    assert!(page.get("editorScript").is_none());

    let res = client
        .get(format!("http://{}/_cms/page", router.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_config_reload_enables_redirects() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, None)).await;
    let client = common::client();

    let res = client.get(format!("http://{}/old", router.addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    router
        .updates
        .send(common::config_for(app, Some(LISTING)))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(format!("http://{}/old", router.addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    router.shutdown.trigger();
}

#[tokio::test]
async fn test_config_reload_moves_renderer_and_page_data() {
    let app = common::start_mock_app().await;
    let router = common::start_router(common::config_for(app, Some(LISTING))).await;
    let client = common::client();

    let mut config = common::config_for(app, Some(LISTING));
    config.upstream.renderer_path = "/render".into();
    config.upstream.page_data_path = "/_cms/page-data".into();
    router.updates.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(format!("http://{}/docs/", router.addr)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "app /render?url=%2Fdocs%2F");

    let page: Value = client
        .get(format!("http://{}/_cms/page-data", router.addr))
        .query(&[("url", "/docs/")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["title"], "Documentation");

    let res = client.get(format!("http://{}/_cms/page", router.addr)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "app /_cms/page");
    router.shutdown.trigger();
}
