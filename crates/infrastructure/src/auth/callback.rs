//! Loopback listener receiving the authorization redirect.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use sims_domain::AuthError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};
use url::Url;

const DONE_PAGE: &str = "<html><body><h1>Login complete</h1>\
<p>You can close this window and return to the console.</p></body></html>";
const FAILED_PAGE: &str = "<html><body><h1>Login failed</h1>\
<p>Return to the console for details.</p></body></html>";

/// What the provider sent back to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Authorization code to exchange.
    Code(String),
    /// The provider refused (`error=access_denied` and the like).
    Denied {
        /// OAuth error code.
        error: String,
        /// Optional human-readable detail.
        description: Option<String>,
    },
}

/// One-shot HTTP listener on the redirect port.
#[derive(Debug)]
pub struct CallbackServer {
    listener: TcpListener,
    expected_state: String,
}

impl CallbackServer {
    /// Binds `127.0.0.1:port`; port 0 picks a free one.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound.
    pub async fn bind(port: u16, expected_state: impl Into<String>) -> Result<Self, AuthError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Callback {
                message: format!("cannot listen on {addr}: {e}"),
            })?;
        Ok(Self {
            listener,
            expected_state: expected_state.into(),
        })
    }

    /// Port actually bound.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.listener.local_addr().map_or(0, |addr| addr.port())
    }

    /// Waits for the redirect.
    ///
    /// Requests that carry neither a code nor an error (a browser asking for
    /// `/favicon.ico`) are answered and ignored. Returns `Ok(None)` when
    /// nothing arrives within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `state` parameter does not match or the
    /// connection cannot be read.
    pub async fn wait(self, timeout: Duration) -> Result<Option<CallbackOutcome>, AuthError> {
        match tokio::time::timeout(timeout, self.accept_loop()).await {
            Ok(result) => result.map(Some),
            Err(_) => {
                warn!(?timeout, "No login callback received");
                Ok(None)
            }
        }
    }

    async fn accept_loop(&self) -> Result<CallbackOutcome, AuthError> {
        loop {
            let (stream, peer) = self.listener.accept().await.map_err(|e| AuthError::Callback {
                message: e.to_string(),
            })?;
            debug!(%peer, "Callback connection");
            if let Some(outcome) = self.handle(stream).await? {
                return Ok(outcome);
            }
        }
    }

    async fn handle(&self, stream: TcpStream) -> Result<Option<CallbackOutcome>, AuthError> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::Callback {
                message: e.to_string(),
            })?;

        let parsed = request_target(&request_line)
            .map_or(Ok(None), |target| parse_callback(target, &self.expected_state));
        let page = match &parsed {
            Ok(Some(CallbackOutcome::Code(_))) | Ok(None) => DONE_PAGE,
            Ok(Some(CallbackOutcome::Denied { .. })) | Err(_) => FAILED_PAGE,
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{page}",
            page.len()
        );
        let mut stream = reader.into_inner();
        if let Err(e) = stream.write_all(response.as_bytes()).await {
            debug!(error = %e, "Could not answer callback request");
        }
        let _ = stream.shutdown().await;
        parsed
    }
}

/// `GET /path?query HTTP/1.1` -> `/path?query`.
fn request_target(request_line: &str) -> Option<&str> {
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target),
        _ => None,
    }
}

/// Reads `code`/`error` and checks `state`.
fn parse_callback(
    target: &str,
    expected_state: &str,
) -> Result<Option<CallbackOutcome>, AuthError> {
    let url = Url::parse(&format!("http://localhost{target}")).map_err(|e| AuthError::Callback {
        message: format!("malformed callback: {e}"),
    })?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() {
        return Ok(None);
    }
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::Callback {
            message: "state parameter does not match".to_string(),
        });
    }
    Ok(Some(match (code, error) {
        (_, Some(error)) => CallbackOutcome::Denied { error, description },
        (Some(code), None) => CallbackOutcome::Code(code),
        (None, None) => return Ok(None),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_request_target() {
        assert_eq!(
            request_target("GET /?code=abc&state=xyz HTTP/1.1\r\n"),
            Some("/?code=abc&state=xyz")
        );
        assert_eq!(request_target("POST / HTTP/1.1"), None);
        assert_eq!(request_target(""), None);
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(
            parse_callback("/?state=s1&session_state=x&code=c0de", "s1").unwrap(),
            Some(CallbackOutcome::Code("c0de".to_string()))
        );
    }

    #[test]
    fn test_parse_denied() {
        assert_eq!(
            parse_callback("/?error=access_denied&error_description=no%20way&state=s1", "s1")
                .unwrap(),
            Some(CallbackOutcome::Denied {
                error: "access_denied".to_string(),
                description: Some("no way".to_string()),
            })
        );
    }

    #[test]
    fn test_state_mismatch_rejected() {
        assert!(parse_callback("/?code=c0de&state=forged", "s1").is_err());
        assert!(parse_callback("/?code=c0de", "s1").is_err());
    }

    #[test]
    fn test_unrelated_request_ignored() {
        assert_eq!(parse_callback("/favicon.ico", "s1").unwrap(), None);
    }

    async fn get(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
        stream
            .write_all(format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_server_receives_code_after_noise() {
        let server = CallbackServer::bind(0, "s1").await.unwrap();
        let port = server.port();
        let waiter = tokio::spawn(server.wait(Duration::from_secs(5)));

        let favicon = get(port, "/favicon.ico").await;
        let callback = get(port, "/?state=s1&code=c0de").await;

        assert!(favicon.starts_with("HTTP/1.1 200 OK"));
        assert!(callback.contains("Login complete"));
        assert_eq!(
            waiter.await.unwrap().unwrap(),
            Some(CallbackOutcome::Code("c0de".to_string()))
        );
    }

    #[tokio::test]
    async fn test_server_times_out_without_callback() {
        let server = CallbackServer::bind(0, "s1").await.unwrap();
        assert_eq!(server.wait(Duration::from_millis(20)).await.unwrap(), None);
    }
}
