use axum::{
    extract::{State, Path},
    Json,
};
use common_types::Envelope::Response as Envelope;

use crate::{
    Entity::Question,
    Response::{ServerResponse, not_found, repository_failure},
    State::AppState,
};

async fn set_published(appstate: AppState, id: String, is_published: bool) -> Result<Question, ServerResponse> {
    let question = appstate.questions.set_published(&id, is_published).await
        .map_err(|err| repository_failure(err, "Failed to update question"))?
        .ok_or_else(not_found)?;
    tracing::info!("Set question {id} published to {is_published}");
    Ok(question)
}

// PUT API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/publish"))]
pub async fn publish(State(appstate): State<AppState>, Path(id): Path<String>) -> Result<Json<Envelope<Question>>, ServerResponse> {
    let question = set_published(appstate, id, true).await?;
    Ok(Json(Envelope::ok("Question published successfully", question)))
}

// PUT API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/unpublish"))]
pub async fn unpublish(State(appstate): State<AppState>, Path(id): Path<String>) -> Result<Json<Envelope<Question>>, ServerResponse> {
    let question = set_published(appstate, id, false).await?;
    Ok(Json(Envelope::ok("Question unpublished successfully", question)))
}
