use axum::{
    extract::State,
    Json,
};
use common_types::Envelope::Response as Envelope;

use crate::{
    Response::{ServerResponse, repository_failure},
    State::AppState,
};

// GET API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/categories"))]
pub async fn categories(State(appstate): State<AppState>) -> Result<Json<Envelope<Vec<String>>>, ServerResponse> {
    let categories = appstate.questions.distinct_categories().await
        .map_err(|err| repository_failure(err, "Failed to fetch categories"))?;
    Ok(Json(Envelope::ok("Categories retrieved successfully", categories)))
}

// GET API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/tags"))]
pub async fn tags(State(appstate): State<AppState>) -> Result<Json<Envelope<Vec<String>>>, ServerResponse> {
    let tags = appstate.questions.distinct_tags().await
        .map_err(|err| repository_failure(err, "Failed to fetch tags"))?;
    Ok(Json(Envelope::ok("Tags retrieved successfully", tags)))
}
