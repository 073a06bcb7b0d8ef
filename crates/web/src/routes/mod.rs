use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ApiDoc;
use crate::features::{events, monitor, participations};
use crate::middleware::error_details::expose_error_details;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/monitor", monitor::routes::routes())
        .nest("/events", events::routes::routes())
        .nest("/participations", participations::routes::routes());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.debug,
            expose_error_details,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
