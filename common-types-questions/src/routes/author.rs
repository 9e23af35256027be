use axum::{
    extract::{State, Path},
    Json,
};
use common_types::Envelope::Response as Envelope;

use crate::{
    Entity::Question,
    Response::{ServerResponse, repository_failure},
    State::AppState,
};

// GET API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/author"))]
pub async fn request(State(appstate): State<AppState>, Path(email): Path<String>) -> Result<Json<Envelope<Vec<Question>>>, ServerResponse> {
    let questions = appstate.questions.by_author(&email).await
        .map_err(|err| repository_failure(err, "Failed to fetch author questions"))?;
    Ok(Json(Envelope::ok("Author questions retrieved successfully", questions)))
}
