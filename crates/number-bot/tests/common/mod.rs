use number_bot::commands::default_handlers;
use number_bot::router::Router;
use number_bot::transport::SignalClient;
use number_inventory::{Inventory, PoolKey};
use relay_engine::{RelayDefaults, RelayEngine, SnapshotStore};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT: &str = "+15550000000";
pub const ADMIN: &str = "+15550009999";
pub const GROUP: &str = "group-otp";

pub struct Harness {
    pub server: MockServer,
    pub engine: Arc<RelayEngine>,
    pub router: Router,
    pub dir: TempDir,
}

impl Harness {
    pub fn snapshot_path(&self) -> std::path::PathBuf {
        self.dir.path().join("user_data.json")
    }

    pub async fn stock(&self, service: &str, country: &str, numbers: &[&str]) {
        self.engine
            .inventory()
            .append(&PoolKey::new(service, country), numbers)
            .await
            .unwrap();
    }
}

/// Engine backed by a temp dir, delivering through a mocked Signal API that
/// accepts every send.
pub async fn harness() -> Harness {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/send"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let inventory = Arc::new(Inventory::new(
        dir.path().join("numbers"),
        dir.path().join("seen"),
    ));
    let signal = SignalClient::new(server.uri(), ACCOUNT).unwrap();

    let engine = Arc::new(
        RelayEngine::open(
            inventory,
            SnapshotStore::file(dir.path().join("user_data.json")),
            RelayDefaults {
                admins: vec![ADMIN.to_string()],
                ..RelayDefaults::default()
            },
            Arc::new(signal),
        )
        .await
        .unwrap()
        .with_seed(11),
    );

    let router = Router::new(
        engine.clone(),
        default_handlers(engine.clone(), Some("https://example.org/support".into())),
        GROUP,
    );

    Harness {
        server,
        engine,
        router,
        dir,
    }
}

/// Bodies of every POST /v2/send the mock server has seen.
pub async fn sent_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/v2/send")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}
