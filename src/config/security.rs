use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};

use super::{config, Environment};

const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

/// Response middleware adding the standard hardening headers to every reply
pub async fn set_security_headers(mut response: Response) -> Response {
    let include_hsts = config().environment == Environment::Production;
    apply_security_headers(response.headers_mut(), include_hsts);
    response
}

/// HSTS only makes sense behind TLS, so it is limited to production
pub fn apply_security_headers(headers: &mut HeaderMap, include_hsts: bool) {
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        PERMISSIONS_POLICY,
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    if include_hsts {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
}
