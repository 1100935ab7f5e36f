//! Integration tests for the update engine against a real HTTP server.
//!
//! Each test starts its own axum server on an ephemeral port and points an
//! `HttpSource` at it.

use std::fs;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use schoolhouse_update::{
    CheckOutcome, ContentDigest, CycleOutcome, HttpSource, LocalArtifact, Notice, Restarter,
    ShapeCheck, Trigger, UpdateChecker, UpdateError, UpdateSource, UserPrompt,
};

// =============================================================================
// Helpers
// =============================================================================

const REMOTE_BODY: &str = "import b\n";

fn remote_checksum() -> String {
    format!("{}  app.py\n", ContentDigest::of(REMOTE_BODY.as_bytes()))
}

/// Serve the published artifact, a matching manifest, a wrong manifest and
/// an HTML error page.
async fn spawn_server() -> SocketAddr {
    let checksum = remote_checksum();
    let wrong_checksum = format!("{}  app.py\n", ContentDigest::of(b"import c\n"));

    let app = Router::new()
        .route("/app.py", get(|| async { REMOTE_BODY }))
        .route("/app.py.sha256", get(move || async move { checksum }))
        .route("/wrong.sha256", get(move || async move { wrong_checksum }))
        .route(
            "/portal.py",
            get(|| async { "<html><body>Sign in to continue</body></html>" }),
        )
        .route(
            "/broken.py",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "import boom") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn source(url: String, checksum_url: Option<String>) -> HttpSource {
    HttpSource::new(url, checksum_url, Duration::from_secs(5)).unwrap()
}

#[derive(Default)]
struct RecordingPrompt {
    accept: bool,
    notices: Mutex<Vec<Notice>>,
}

#[async_trait]
impl UserPrompt for RecordingPrompt {
    async fn confirm_update(&self, _trigger: Trigger) -> bool {
        self.accept
    }

    async fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Clone, Default)]
struct CountingRestarter(Arc<AtomicUsize>);

impl Restarter for CountingRestarter {
    fn restart(&self) -> Result<(), UpdateError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn checker(
    dir: &std::path::Path,
    source: HttpSource,
    accept: bool,
    restarts: CountingRestarter,
) -> UpdateChecker<HttpSource, RecordingPrompt, CountingRestarter> {
    let path = dir.join("app.py");
    fs::write(&path, "import a\n").unwrap();
    UpdateChecker::new(
        source,
        RecordingPrompt {
            accept,
            ..RecordingPrompt::default()
        },
        restarts,
        LocalArtifact::new(path, true),
        ShapeCheck::default(),
        Duration::from_secs(3600),
    )
}

// =============================================================================
// HttpSource
// =============================================================================

#[tokio::test]
async fn fetch_returns_body() {
    let addr = spawn_server().await;
    let source = source(format!("http://{addr}/app.py"), None);
    assert_eq!(source.fetch().await.unwrap(), REMOTE_BODY.as_bytes());
}

#[tokio::test]
async fn fetch_checksum_parses_manifest() {
    let addr = spawn_server().await;
    let source = source(
        format!("http://{addr}/app.py"),
        Some(format!("http://{addr}/app.py.sha256")),
    );
    let digest = source.fetch_checksum().await.unwrap();
    assert_eq!(digest, Some(ContentDigest::of(REMOTE_BODY.as_bytes())));
}

#[tokio::test]
async fn fetch_error_status_is_network_unavailable() {
    let addr = spawn_server().await;
    let source = source(format!("http://{addr}/broken.py"), None);
    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, UpdateError::NetworkUnavailable(_)));
}

#[tokio::test]
async fn fetch_missing_route_is_network_unavailable() {
    let addr = spawn_server().await;
    let source = source(format!("http://{addr}/nope.py"), None);
    assert!(matches!(
        source.fetch().await.unwrap_err(),
        UpdateError::NetworkUnavailable(_)
    ));
}

#[tokio::test]
async fn fetch_from_closed_port_is_network_unavailable() {
    let addr = closed_addr().await;
    let source = source(format!("http://{addr}/app.py"), None);
    assert!(matches!(
        source.fetch().await.unwrap_err(),
        UpdateError::NetworkUnavailable(_)
    ));
}

// =============================================================================
// Full cycle
// =============================================================================

#[tokio::test]
async fn accepted_update_replaces_artifact_and_restarts_once() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let restarts = CountingRestarter::default();
    let c = checker(
        dir.path(),
        source(
            format!("http://{addr}/app.py"),
            Some(format!("http://{addr}/app.py.sha256")),
        ),
        true,
        restarts.clone(),
    );

    let outcome = c.run_cycle(Trigger::Startup).await;

    assert!(matches!(outcome, CycleOutcome::Restarted), "{outcome:?}");
    assert_eq!(fs::read_to_string(c.artifact().path()).unwrap(), REMOTE_BODY);
    assert_eq!(
        fs::read_to_string(c.artifact().backup_path()).unwrap(),
        "import a\n"
    );
    assert_eq!(restarts.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_is_not_reapplied_once_current() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let restarts = CountingRestarter::default();
    let c = checker(
        dir.path(),
        source(format!("http://{addr}/app.py"), None),
        true,
        restarts.clone(),
    );

    assert!(matches!(
        c.run_cycle(Trigger::Startup).await,
        CycleOutcome::Restarted
    ));
    assert!(matches!(c.check().await.unwrap(), CheckOutcome::UpToDate));
    assert_eq!(restarts.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wrong_checksum_blocks_update() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let restarts = CountingRestarter::default();
    let c = checker(
        dir.path(),
        source(
            format!("http://{addr}/app.py"),
            Some(format!("http://{addr}/wrong.sha256")),
        ),
        true,
        restarts.clone(),
    );

    let outcome = c.run_cycle(Trigger::Startup).await;

    assert!(matches!(
        outcome,
        CycleOutcome::Failed(UpdateError::ChecksumMismatch { .. })
    ));
    assert_eq!(fs::read_to_string(c.artifact().path()).unwrap(), "import a\n");
    assert_eq!(restarts.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn captive_portal_page_is_rejected() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let c = checker(
        dir.path(),
        source(format!("http://{addr}/portal.py"), None),
        true,
        CountingRestarter::default(),
    );

    let outcome = c.run_cycle(Trigger::Timer).await;

    assert!(matches!(
        outcome,
        CycleOutcome::Failed(UpdateError::RemoteContentInvalid(_))
    ));
    assert_eq!(fs::read_to_string(c.artifact().path()).unwrap(), "import a\n");
}

#[tokio::test]
async fn unreachable_server_is_not_up_to_date() {
    let addr = closed_addr().await;
    let dir = tempfile::tempdir().unwrap();
    let c = checker(
        dir.path(),
        source(format!("http://{addr}/app.py"), None),
        true,
        CountingRestarter::default(),
    );

    assert!(matches!(
        c.run_cycle(Trigger::Startup).await,
        CycleOutcome::Unreachable(_)
    ));
}
