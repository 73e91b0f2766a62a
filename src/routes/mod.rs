use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{self, auth, bookings, catalog, schedules};
use crate::middleware::auth::auth_middleware;
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

/// Application routes. The IP-keyed global limiter and request logging need
/// the peer address and are layered on in `main`.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin));

    let catalog_routes = Router::new()
        .route("/", get(catalog::list_routes))
        .route("/locations", get(catalog::list_locations));

    let schedule_routes = Router::new()
        .route("/search", get(schedules::search))
        .route("/{id}/availability", get(schedules::availability))
        .route("/{id}/seats", get(schedules::seats));

    // Signed-in only; limited per user
    let account_routes = Router::new()
        .route("/my", get(bookings::my_bookings))
        .layer(create_user_governor())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route(
            "/{id}",
            patch(bookings::update_booking).delete(bookings::cancel_booking),
        )
        .route("/{id}/history", get(bookings::booking_history))
        .merge(account_routes);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/routes", catalog_routes)
        .nest("/api/schedules", schedule_routes)
        .nest("/api/bookings", booking_routes)
        .with_state(state)
}
