//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use cms_router::config::CmsConfig;
use cms_router::http::HttpServer;
use cms_router::lifecycle::Shutdown;

pub const PAGE_RECORD: &str = r#"{
    "seo": {"title": "Docs", "keywords": "", "metadesc": "", "canonical_url": ""},
    "title": "Documentation",
    "content": {"body": "<p>Welcome</p>"},
    "page_template_id": "basic"
}"#;

pub const REDIRECTS: &str = r#"[
    {"redirect_key": 1, "redirect_url": "/old", "redirect_url_type": "EXACT", "redirect_dest": "/new", "redirect_http_code": "301"},
    {"redirect_key": 2, "redirect_url": "^/blog/(\\d+)/(.+)$", "redirect_url_type": "REGEX", "redirect_dest": "/posts/$2?id=$1", "redirect_http_code": "302"},
    {"redirect_key": 3, "redirect_url": "/legacy/", "redirect_url_type": "BEGINSICASE", "redirect_dest": "/modern/app", "redirect_http_code": "PASSTHRU"},
    {"redirect_key": 4, "redirect_url": "/docs/", "redirect_url_type": "EXACT", "redirect_dest": "/manual/", "redirect_http_code": "301"},
    {"redirect_key": 5, "redirect_url": "/external", "redirect_url_type": "EXACT", "redirect_dest": "https://other.example.com/landing", "redirect_http_code": "302"},
    {"redirect_key": 6, "redirect_url": "/partner", "redirect_url_type": "EXACT", "redirect_dest": "https://partner.example.com/landing", "redirect_http_code": "PASSTHRU"}
]"#;

async fn mock_app(uri: Uri) -> Response {
    match uri.path() {
        "/cms/docs/index.html" => PAGE_RECORD.into_response(),
        "/cms/jshcms_redirects.json" => REDIRECTS.into_response(),
        path if path.starts_with("/cms/") => StatusCode::NOT_FOUND.into_response(),
        _ => format!("app {}", uri).into_response(),
    }
}

/// Start a mock hosting application that also serves the content export
/// under `/cms/`. Other paths echo `app <uri>`.
pub async fn start_mock_app() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(mock_app);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

pub fn config_for(app: SocketAddr, listing: Option<&str>) -> CmsConfig {
    let mut config = CmsConfig::default();
    config.content.content_root = "/cms".into();
    config.content.redirect_listing_path = listing.map(str::to_string);
    config.content.editor_allow_list = vec!["https://cms.example.com".into()];
    config.upstream.app_url = format!("http://{}", app);
    config.timeouts.probe_secs = 2;
    config
}

/// Running router under test.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<CmsConfig>,
    pub shutdown: Shutdown,
}

pub async fn start_router(config: CmsConfig) -> TestRouter {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestRouter {
        addr,
        updates,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
