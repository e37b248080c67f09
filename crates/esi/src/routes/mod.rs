//! Route table.

mod accounts;

use axum::extract::Request;
use axum::routing::get;
use axum::{Json, Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, info_span};

use crate::AppState;
use crate::audit::audit_log;
use crate::chain::{ensure_account, load_accounts};
use crate::throttle::limit_requests;

/// Routes listed by `GET /`.
const ROUTES: [&str; 7] = [
    "GET     /",
    "POST    /accounts",
    "GET     /accounts",
    "DELETE  /accounts",
    "PUT     /accounts/:id",
    "GET     /accounts/:id",
    "DELETE  /accounts/:id",
];

/// Build the service as it is served: [`router`] with trailing slashes
/// trimmed from request paths, so `/accounts/` routes like `/accounts`.
pub fn app(state: AppState, audit: bool) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(router(state, audit))
}

/// Build the service router.
///
/// Every `/accounts` route runs behind [`load_accounts`]; the
/// `/accounts/{id}` routes also run behind [`ensure_account`]. HEAD requests
/// are answered by the GET handlers. When the state carries a
/// [`Throttle`](crate::Throttle), every route is rate limited per client.
pub fn router(state: AppState, audit: bool) -> Router {
    let single = Router::new()
        .route(
            "/accounts/{id}",
            get(accounts::get_account)
                .put(accounts::put_account)
                .delete(accounts::delete_account),
        )
        .route_layer(middleware::from_fn(ensure_account));

    let collection = Router::new()
        .route(
            "/accounts",
            get(accounts::list_accounts)
                .post(accounts::create_account)
                .delete(accounts::delete_all_accounts),
        )
        .merge(single)
        .route_layer(middleware::from_fn_with_state(state.clone(), load_accounts));

    let mut router = Router::new().route("/", get(list_routes)).merge(collection);
    if let Some(throttle) = state.throttle().cloned() {
        router = router.layer(middleware::from_fn_with_state(throttle, limit_requests));
    }
    if audit {
        router = router.layer(middleware::from_fn(audit_log));
    }

    router
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn list_routes() -> Json<[&'static str; 7]> {
    Json(ROUTES)
}

fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}
