use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    Json,
};
use common_types::Envelope::Response as Envelope;

use crate::{
    Entity::Question,
    Response::{ServerResponse, malformed_body, repository_failure, status_response},
    State::AppState,
    Validation::{validate_complete, QuestionDraft},
};

// POST API endpoint
#[tracing::instrument(skip(appstate, body), fields(request="/api/questions/create"))]
pub async fn request(State(appstate): State<AppState>, body: Result<Json<QuestionDraft>, JsonRejection>) -> Result<(StatusCode, Json<Envelope<Question>>), ServerResponse> {
    let Json(draft) = body.map_err(malformed_body)?;
    if let Err(err) = validate_complete(&draft) {
        tracing::info!("Validation failed with reason: {err}");
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }

    let question = appstate.questions.create(draft).await
        .map_err(|err| repository_failure(err, "Failed to create question"))?;
    tracing::info!("Created question {}", question.id);
    Ok((StatusCode::CREATED, Json(Envelope::ok("Question created successfully", question))))
}
