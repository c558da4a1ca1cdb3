pub mod form;
pub mod middleware;
pub mod routes;

use axum::{
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::AppState;
use middleware::origin::require_trusted_origin;
use routes::{init_db, pages, register};

pub fn router(state: AppState) -> Router {
    // Provisioning needs a trusted origin; the status check does not.
    let init_db_routes = get(init_db::status_handler).merge(
        post(init_db::provision_handler)
            .route_layer(from_fn_with_state(state.clone(), require_trusted_origin)),
    );

    Router::new()
        .route("/", get(|| async { Redirect::to("/register") }))
        .route(
            "/register",
            get(pages::register_page).post(register::register_handler),
        )
        .route("/register/form", post(pages::register_form_handler))
        .route("/init-db", init_db_routes)
        .nest_service("/assets", get_service(ServeDir::new("assets")))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
