use crate::client::config::{Backend, Config};
use crate::client::consts::{API_KEY_PARAM, AUTHORIZATION_HEADER};
use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

/// Builds the websocket handshake request, attaching credentials the way the backend expects.
pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let secret = config.api_key().expose_secret();
    let endpoint = config.endpoint();

    match config.backend() {
        Backend::DeveloperApi if !secret.is_empty() => {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            format!("{}{}{}={}", endpoint, separator, API_KEY_PARAM, secret).into_client_request()
        }
        Backend::VertexAi { .. } if !secret.is_empty() => {
            let mut request = endpoint.into_client_request()?;
            request
                .headers_mut()
                .insert(AUTHORIZATION_HEADER, format!("Bearer {}", secret).parse()?);
            Ok(request)
        }
        _ => endpoint.into_client_request(),
    }
}
