#![allow(dead_code)]

use gamelink_domain::Config;
use gamelink_infra::GameLinkClient;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GAME_KEY: &str = "dev_integration";

/// Mock backend plus a client whose live and stage roots point at it.
pub struct Backend {
    pub server: MockServer,
    pub client: GameLinkClient,
}

impl Backend {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with a config tweak applied before the client is built.
    pub async fn start_with(tweak: impl FnOnce(&mut Config)) -> Self {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        tweak(&mut config);
        let client = GameLinkClient::new(config).expect("client should build");
        Self { server, client }
    }

    /// Requests the server saw on `path`.
    pub async fn hits(&self, path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == path)
            .count()
    }
}

pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::new(GAME_KEY);
    config.endpoints.live.game_url = format!("{}/game", server.uri());
    config.endpoints.live.admin_url = format!("{}/admin", server.uri());
    config.endpoints.stage.game_url = format!("{}/stage/game", server.uri());
    config.endpoints.stage.admin_url = format!("{}/stage/admin", server.uri());
    config.http.timeout_secs = 5;
    config
}

/// Session endpoint handing out `token` once, for `player`.
pub async fn mount_session_once(server: &MockServer, player: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path("/game/v2/session"))
        .and(body_partial_json(serde_json::json!({
            "game_key": GAME_KEY,
            "player_identifier": player,
        })))
        .respond_with(json_response(200, serde_json::json!({ "session_token": token })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

pub fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

pub fn error_response(status: u16, message: &str) -> ResponseTemplate {
    json_response(status, serde_json::json!({ "message": message }))
}
