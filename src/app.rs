// app.rs
// Router assembly, shared between main and the integration tests.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::{auth, routes, state::AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    // Everything behind the platform gate. Static segments register
    // before the `{id}` captures.
    let gated = Router::new()
        .route(
            "/transactions",
            get(routes::transactions_index).post(routes::transactions_create),
        )
        .route("/transactions/statistics", get(routes::transactions_statistics))
        .route("/transactions/bulk", post(routes::transactions_bulk_create))
        .route(
            "/transactions/{id}",
            get(routes::transactions_show)
                .put(routes::transactions_update)
                .delete(routes::transactions_delete),
        )
        .route(
            "/transactions/{id}/verify-otp",
            patch(routes::transactions_verify_otp),
        )
        .route(
            "/doctors",
            get(routes::doctors_index).post(routes::doctors_create),
        )
        .route(
            "/doctors/{id}",
            get(routes::doctors_show)
                .put(routes::doctors_update)
                .delete(routes::doctors_delete),
        )
        .route(
            "/executives",
            get(routes::executives_index).post(routes::executives_create),
        )
        .route(
            "/executives/{id}",
            get(routes::executives_show)
                .put(routes::executives_update)
                .delete(routes::executives_delete),
        )
        .route(
            "/locations",
            get(routes::locations_index).post(routes::locations_create),
        )
        .route(
            "/locations/{id}",
            get(routes::locations_show)
                .put(routes::locations_update)
                .delete(routes::locations_delete),
        )
        .route("/staff", get(routes::staff_index).post(routes::staff_create))
        .route(
            "/staff/{id}",
            get(routes::staff_show)
                .put(routes::staff_update)
                .delete(routes::staff_delete),
        )
        .route("/logout", post(routes::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_platform,
        ));

    // Platform settings stay reachable when the gate is closed; only
    // authentication applies.
    let authenticated = Router::new()
        .route(
            "/platform-settings",
            get(routes::platform_show).put(routes::platform_update),
        )
        .merge(gated)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/login", post(routes::login))
        .merge(authenticated)
        .with_state(state)
}
