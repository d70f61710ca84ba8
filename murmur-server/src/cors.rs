use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::extract::SESSION_HEADER;
use crate::config::Cors;

/// Whether a browser origin may call the API with credentials
///
/// Exact matches against the allow-list, plus any host ending in one of the
/// configured suffixes (preview deployments).
pub fn origin_allowed(origin: &str, cors: &Cors) -> bool {
    if cors.allowed_origins.iter().any(|allowed| allowed == origin) {
        return true;
    }

    let host = origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();

    !host.is_empty()
        && cors
            .allowed_origin_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && host.ends_with(suffix.as_str()))
}

pub fn layer(cors: &Cors) -> CorsLayer {
    let cors = cors.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| origin_allowed(origin, &cors))
                .unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(SESSION_HEADER),
        ])
        .allow_credentials(true)
}
