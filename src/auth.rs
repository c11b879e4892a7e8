use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::sync::Arc;

use crate::models::user::Identity;
use crate::store::users::UserStore;

/// HTTP Basic authentication against the user store. The resolved
/// [`Identity`] is inserted into request extensions for handlers.
#[derive(Clone)]
pub struct BasicAuthLayer {
    users: Arc<UserStore>,
}

impl BasicAuthLayer {
    pub fn new(users: Arc<UserStore>) -> Self {
        Self { users }
    }
}

impl<S> tower::Layer<S> for BasicAuthLayer {
    type Service = BasicAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuthService {
            inner,
            users: self.users.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BasicAuthService<S> {
    inner: S,
    users: Arc<UserStore>,
}

fn decode_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    let body = json!({
        "data": null,
        "error": {
            "code": 401,
            "message": "Invalid or missing credentials"
        }
    });
    (
        StatusCode::UNAUTHORIZED,
        [("WWW-Authenticate", "Basic realm=\"file-depot\"")],
        axum::Json(body),
    )
        .into_response()
}

impl<S, B> tower::Service<axum::http::Request<B>> for BasicAuthService<S>
where
    S: tower::Service<axum::http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let users = self.users.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let credentials = req
                .headers()
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(decode_credentials);

            let Some((username, password)) = credentials else {
                return Ok(unauthorized());
            };

            let Some(user) = users.verify(&username, &password).await else {
                return Ok(unauthorized());
            };

            req.extensions_mut().insert(Identity {
                username: user.username,
                role: user.role,
            });

            inner.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_basic_header() {
        let header = format!("Basic {}", BASE64.encode("alice:s3cret"));
        assert_eq!(
            decode_credentials(&header),
            Some(("alice".into(), "s3cret".into()))
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(decode_credentials("Bearer abc"), None);
        assert_eq!(decode_credentials("Basic !!!"), None);
        let no_colon = format!("Basic {}", BASE64.encode("alice"));
        assert_eq!(decode_credentials(&no_colon), None);
    }
}
