use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use storage::{
    dto::participation::{AttemptResponse, ParticipationsQuery, UpdateAttemptRequest},
    services::error::ServiceError,
};
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/participations",
    params(ParticipationsQuery),
    responses(
        (status = 200, description = "Attempts recorded for the event", body = Vec<AttemptResponse>),
        (status = 400, description = "Missing event parameter")
    ),
    tag = "participations"
)]
pub async fn list_participations(
    State(state): State<AppState>,
    Query(query): Query<ParticipationsQuery>,
) -> Result<Json<Vec<AttemptResponse>>, WebError> {
    let event_id = query.event.ok_or(ServiceError::MissingEventParam)?;

    let attempts =
        services::list_participations(&state.participation, event_id, query.bypass_cache())
            .await?;

    Ok(Json(attempts))
}

#[utoipa::path(
    get,
    path = "/api/participations/{id}",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 200, description = "Attempt found", body = AttemptResponse),
        (status = 404, description = "Attempt not found")
    ),
    tag = "participations"
)]
pub async fn get_participation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AttemptResponse>, WebError> {
    let attempt = services::get_participation(&state.participation, id).await?;

    Ok(Json(attempt))
}

#[utoipa::path(
    put,
    path = "/api/participations/{id}",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    request_body = UpdateAttemptRequest,
    responses(
        (status = 204, description = "Attempt corrected"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Unknown event, team or test, or a second running race")
    ),
    tag = "participations"
)]
pub async fn update_participation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAttemptRequest>,
) -> Result<StatusCode, WebError> {
    services::update_participation(&state.participation, id, request).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/participations/{id}",
    params(
        ("id" = Uuid, Path, description = "Attempt ID")
    ),
    responses(
        (status = 204, description = "Attempt deleted"),
        (status = 404, description = "Attempt not found")
    ),
    tag = "participations"
)]
pub async fn delete_participation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    services::delete_participation(&state.participation, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use storage::cache::{AttemptCache, ParticipationsCache};
    use uuid::Uuid;

    use crate::testing::{EVENT, RACE_TEST, SCORED_TEST, TEAM, TestApp};

    async fn register_scored(app: &TestApp, score: i64) {
        app.server
            .post(&format!("/api/monitor/participation/{TEAM}/{SCORED_TEST}"))
            .json(&json!({ "score": score }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    async fn list(app: &TestApp) -> Value {
        app.server
            .get("/api/participations")
            .add_query_param("event", EVENT)
            .await
            .json()
    }

    /// Caches a list for `event_id` and returns its key.
    async fn cached_list(app: &TestApp, event_id: i32) -> String {
        let key = ParticipationsCache::new(app.cache.as_ref())
            .current_key(event_id)
            .await
            .unwrap();
        app.cache.set(&key, "[]", 60).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_event_param_is_required() {
        let app = TestApp::new(3);

        let response = app.server.get("/api/participations").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["errno"], 1018);
    }

    #[tokio::test]
    async fn test_list_is_cached_and_refreshed_by_registrations() {
        let app = TestApp::new(3);
        let lists = ParticipationsCache::new(app.cache.as_ref());
        register_scored(&app, 12).await;

        assert_eq!(list(&app).await.as_array().unwrap().len(), 1);
        let key = lists.current_key(EVENT).await.unwrap();
        assert!(app.cache.contains(&key));

        register_scored(&app, 15).await;
        assert!(!app.cache.contains(&key));
        assert_eq!(list(&app).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_nocache_recomputes() {
        let app = TestApp::new(3);
        register_scored(&app, 12).await;
        // Stale entry left behind by some earlier writer
        cached_list(&app, EVENT).await;

        assert!(list(&app).await.as_array().unwrap().is_empty());

        let body: Value = app
            .server
            .get("/api/participations")
            .add_query_param("event", EVENT)
            .add_query_param("nocache", 1)
            .await
            .json();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["team_id"], TEAM);
    }

    #[tokio::test]
    async fn test_list_read_before_a_registration_is_not_served_after_it() {
        let app = TestApp::new(3);
        let lists = ParticipationsCache::new(app.cache.as_ref());

        // A slow reader resolves its key, a registration lands, then the
        // reader stores what it saw
        let reader_key = lists.current_key(EVENT).await.unwrap();
        register_scored(&app, 12).await;
        app.cache.set(&reader_key, "[]", 60).await.unwrap();

        assert_eq!(list(&app).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_participation() {
        let app = TestApp::new(3);
        app.server
            .post(&format!("/api/monitor/participation/{TEAM}/{RACE_TEST}"))
            .add_query_param("obstacle", -1)
            .await
            .assert_status(StatusCode::CREATED);
        let attempt_id = app.store.all()[0].attempt_id;

        let response = app
            .server
            .get(&format!("/api/participations/{attempt_id}"))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["in_progress"], true);
        assert_eq!(body["test_id"], RACE_TEST);
        assert_eq!(body["result"], json!(Decimal::NEGATIVE_ONE));

        app.server
            .get(&format!("/api/participations/{}", Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_update_moves_attempt_and_drops_both_lists() {
        let app = TestApp::new(3);
        register_scored(&app, 12).await;
        let attempt_id = app.store.all()[0].attempt_id;
        let old_key = cached_list(&app, EVENT).await;
        let new_key = cached_list(&app, 2).await;

        app.server
            .put(&format!("/api/participations/{attempt_id}"))
            .json(&json!({ "event_id": 2, "result": 14 }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        assert!(!app.cache.contains(&old_key));
        assert!(!app.cache.contains(&new_key));

        let stored = &app.store.all()[0];
        assert_eq!(stored.event_id, 2);
        assert_eq!(stored.result, Decimal::from(14));
        assert!(list(&app).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_with_result_closes_running_race() {
        let app = TestApp::new(3);
        app.server
            .post(&format!("/api/monitor/participation/{TEAM}/{RACE_TEST}"))
            .add_query_param("obstacle", -1)
            .await
            .assert_status(StatusCode::CREATED);
        let attempt_id = app.store.all()[0].attempt_id;

        app.server
            .put(&format!("/api/participations/{attempt_id}"))
            .json(&json!({ "result": 95000, "obstacles": [1, -2] }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let body: Value = app
            .server
            .get(&format!("/api/participations/{attempt_id}"))
            .await
            .json();
        assert_eq!(body["in_progress"], false);
        assert_eq!(body["obstacles"], json!([1, -2]));

        app.server
            .put(&format!("/api/participations/{}", Uuid::new_v4()))
            .json(&json!({ "result": 1 }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_delete_participation() {
        let app = TestApp::new(3);
        register_scored(&app, 12).await;
        let attempt_id = app.store.all()[0].attempt_id;
        let key = cached_list(&app, EVENT).await;

        app.server
            .delete(&format!("/api/participations/{attempt_id}"))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(!app.cache.contains(&key));
        assert!(app.store.all().is_empty());

        app.server
            .delete(&format!("/api/participations/{attempt_id}"))
            .await
            .assert_status_not_found();
    }
}
