//! Conversions from external infrastructure errors into domain errors.

use gamelink_domain::GameLinkError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GameLinkError);

impl From<InfraError> for GameLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GameLinkError> for InfraError {
    fn from(value: GameLinkError) -> Self {
        Self(value)
    }
}

trait IntoGameLinkError {
    fn into_gamelink(self) -> GameLinkError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GameLinkError */
/* -------------------------------------------------------------------------- */

impl IntoGameLinkError for HttpError {
    fn into_gamelink(self) -> GameLinkError {
        if self.is_builder() {
            return GameLinkError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_timeout() {
            return GameLinkError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return GameLinkError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => GameLinkError::Auth(message),
                400..=499 => GameLinkError::InvalidInput(message),
                _ => GameLinkError::Network(message),
            };
        }

        GameLinkError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_gamelink())
    }
}

/// Message used for the synthesized status-0 envelope of a request that
/// never got a response.
pub(crate) fn fault_message(err: HttpError) -> String {
    match InfraError::from(err).0 {
        GameLinkError::Network(message) | GameLinkError::InvalidInput(message) => message,
        other => other.to_string(),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: GameLinkError = InfraError::from(error).into();
        match mapped {
            GameLinkError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: GameLinkError = InfraError::from(error).into();
        assert!(mapped.is_retryable());
        assert!(matches!(mapped, GameLinkError::Network(_)));
    }

    #[test]
    fn infra_error_round_trips_domain_error() {
        let original = GameLinkError::Config("bad".into());
        let back: GameLinkError = InfraError::from(original.clone()).into();
        assert_eq!(back, original);
    }
}
