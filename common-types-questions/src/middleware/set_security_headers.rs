use axum::{
    middleware::Next,
    http::{
        Request,
        header::{
            HeaderName,
            HeaderValue,
            STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
            REFERRER_POLICY,
        }
    },
    response::Response,
    body::Body,
};

use crate::Response::ServerResponse;

#[tracing::instrument(skip(req, next))]
pub async fn middleware(req: Request<Body>, next: Next<Body>) -> Result<Response, ServerResponse> {
    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();
    parts.headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    parts.headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    parts.headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    // One year, subdomains included
    parts.headers.insert(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static("max-age=31536000; includeSubDomains"));
    parts.headers.insert(HeaderName::from_static("cross-origin-resource-policy"), HeaderValue::from_static("same-origin"));
    Ok(Response::from_parts(parts, body))
}
