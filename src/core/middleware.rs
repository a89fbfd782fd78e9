use crate::core::session::{Session, SessionCodec};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Whether the `Authorization: Basic` header carries exactly `expected` ("user:pass")
pub fn basic_credentials_match(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded.trim()).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == expected)
}

/// HTTP Basic auth guard for the admin surface and the Swagger UI
pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
    realm: &'static str,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            if basic_credentials_match(req.headers(), &credentials) {
                return Ok(next.run(req).await);
            }

            let mut response = Response::new(Body::from("Acesso negado. Autenticação necessária."));
            *response.status_mut() = StatusCode::UNAUTHORIZED;
            let challenge = format!("Basic realm=\"{}\"", realm);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }

            Err(response)
        })
    }
}

/// Loads the visitor session from the `sid` cookie and writes it back when a
/// handler returns an updated `Session`.
pub async fn session_middleware(
    State(codec): State<Arc<SessionCodec>>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = codec.load(req.headers());
    // Fresh sessions get their cookie on the first response
    let minted = session.is_new().then(|| session.clone());
    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;

    let to_persist = response.extensions_mut().remove::<Session>().or(minted);
    if let Some(updated) = to_persist {
        match codec.set_cookie_header(&updated) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(e) => tracing::error!("Failed to write session cookie: {}", e),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_basic_credentials_match() {
        let encoded = BASE64_STANDARD.encode("admin:s3cret");
        let headers = headers_with(&format!("Basic {}", encoded));

        assert!(basic_credentials_match(&headers, "admin:s3cret"));
        assert!(!basic_credentials_match(&headers, "admin:other"));
    }

    #[test]
    fn test_basic_credentials_reject_other_schemes() {
        assert!(!basic_credentials_match(
            &headers_with("Bearer abc"),
            "admin:s3cret"
        ));
        assert!(!basic_credentials_match(
            &headers_with("Basic !!notbase64"),
            "admin:s3cret"
        ));
        assert!(!basic_credentials_match(&HeaderMap::new(), "admin:s3cret"));
    }
}
