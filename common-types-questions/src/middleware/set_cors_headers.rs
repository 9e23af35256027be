use axum::{
    middleware::Next,
    http::{
        Request,
        Method,
        StatusCode,
        header::{
            HeaderValue,
            ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_MAX_AGE,
        }
    },
    response::{IntoResponse, Response},
    body::Body,
};

use crate::{
    Response::ServerResponse,
    Constants,
};

fn allowed_origin() -> HeaderValue {
    HeaderValue::from_str(&Constants::ORIGIN_URL).unwrap_or_else(|err| {
        tracing::warn!("ORIGIN_URL is not a valid header value, allowing any origin, {err}");
        HeaderValue::from_static("*")
    })
}

// Preflight requests are answered here and never reach a handler
#[tracing::instrument(skip(req, next))]
pub async fn middleware(req: Request<Body>, next: Next<Body>) -> Result<Response, ServerResponse> {
    let response = match *req.method() == Method::OPTIONS {
        true => StatusCode::NO_CONTENT.into_response(),
        false => next.run(req).await,
    };
    let (mut parts, body) = response.into_parts();
    parts.headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin());
    parts.headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET,PUT,POST,OPTIONS,DELETE"));
    parts.headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type,authorization"));
    parts.headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
    Ok(Response::from_parts(parts, body))
}
