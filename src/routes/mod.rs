use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod health;
pub mod side_quests;
pub mod submissions;

fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let allow_origin = match allowed {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        tracing::warn!(origin = %value, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    let submissions_routes = Router::new()
        .route(
            "/",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
        .route(
            "/:id",
            get(submissions::get_submission).put(submissions::update_submission),
        )
        .route("/:id/archive", post(submissions::archive_submission))
        .route("/:id/history", get(submissions::submission_history))
        .route("/:id/followups", post(submissions::add_followup_task))
        .route("/:id/links", post(submissions::add_documentation_link));

    let side_quests_routes = Router::new()
        .route(
            "/",
            get(side_quests::list_side_quests).post(side_quests::create_side_quest),
        )
        .route("/:id", get(side_quests::get_side_quest))
        .route("/:id/status", patch(side_quests::update_side_quest_status))
        .route("/:id/followups", post(side_quests::add_side_quest_followup))
        .route("/:id/archive", post(side_quests::archive_side_quest));

    let archive_routes = Router::new()
        .route("/submissions", get(submissions::list_archived_submissions))
        .route("/submissions/:id", get(submissions::get_archived_submission))
        .route("/side-quests", get(side_quests::list_archived_side_quests))
        .route("/side-quests/:id", get(side_quests::get_archived_side_quest));

    Router::new()
        .nest("/api/submissions", submissions_routes)
        .nest("/api/side-quests", side_quests_routes)
        .nest("/api/archive", archive_routes)
        .route("/api/followups/:id", patch(submissions::update_followup_task))
        .route("/api/attachments", post(submissions::create_attachment))
        .route("/api/doc-links", get(submissions::list_doc_links))
        .route("/api/squads", get(submissions::list_squads))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 16))
}
