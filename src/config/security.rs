use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use std::env;
use tower_http::set_header::SetResponseHeaderLayer;

const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=()";

fn set_header<S>(
    router: Router<S>,
    name: HeaderName,
    value: &'static str,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(SetResponseHeaderLayer::if_not_present(
        name,
        HeaderValue::from_static(value),
    ))
}

/// Stacks the standard API security headers onto the router. HSTS is added
/// only in production, where the service sits behind TLS.
pub fn apply_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = set_header(router, header::X_CONTENT_TYPE_OPTIONS, "nosniff");
    let router = set_header(router, header::X_FRAME_OPTIONS, "DENY");
    let router = set_header(router, header::X_XSS_PROTECTION, "1; mode=block");
    let router = set_header(router, header::CONTENT_SECURITY_POLICY, CSP_API_VALUE);
    let router = set_header(
        router,
        header::REFERRER_POLICY,
        "strict-origin-when-cross-origin",
    );
    let router = set_header(
        router,
        HeaderName::from_static("permissions-policy"),
        PERMISSIONS_POLICY_VALUE,
    );

    if hsts_enabled() {
        tracing::info!("Security: HSTS header enabled (production mode)");
        set_header(router, header::STRICT_TRANSPORT_SECURITY, HSTS_VALUE)
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
        router
    }
}

fn hsts_enabled() -> bool {
    env::var("RUST_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false)
}
