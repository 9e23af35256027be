use axum::{
    extract::State,
    Json,
};
use common_types::Envelope::Response as Envelope;

use crate::{
    Repository::QuestionStats,
    Response::{ServerResponse, repository_failure},
    State::AppState,
};

// GET API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/stats"))]
pub async fn request(State(appstate): State<AppState>) -> Result<Json<Envelope<QuestionStats>>, ServerResponse> {
    let stats = appstate.questions.stats().await
        .map_err(|err| repository_failure(err, "Failed to fetch statistics"))?;
    Ok(Json(Envelope::ok("Statistics retrieved successfully", stats)))
}
