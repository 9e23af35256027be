use axum::{
    extract::{State, Path, rejection::JsonRejection},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use common_types::Envelope::{FieldError, Response as Envelope};

use crate::{
    Entity::{Question, REQUIRED_FIELDS},
    Response::{ServerResponse, invalid_body, malformed_body, not_found, repository_failure, status_response, validation_failed},
    State::AppState,
    Validation::QuestionDraft,
};

// GET API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/get"))]
pub async fn fetch(State(appstate): State<AppState>, Path(id): Path<String>) -> Result<Json<Envelope<Question>>, ServerResponse> {
    let question = appstate.questions.get_by_id(&id).await
        .map_err(|err| repository_failure(err, "Failed to fetch question"))?
        .ok_or_else(not_found)?;
    Ok(Json(Envelope::ok("Question retrieved successfully", question)))
}

// PUT API endpoint
#[tracing::instrument(skip(appstate, body), fields(request="/api/questions/update"))]
pub async fn update(State(appstate): State<AppState>, Path(id): Path<String>, body: Result<Json<Value>, JsonRejection>) -> Result<Json<Envelope<Question>>, ServerResponse> {
    let Json(body) = body.map_err(malformed_body)?;
    let Value::Object(fields) = body else {
        tracing::info!("Rejected update of {id} with a non-object body");
        return Err(invalid_body("expected a JSON object"));
    };
    // Presence is decided on the raw keys, unknown keys still count
    if fields.is_empty() {
        tracing::info!("Rejected update of {id} without fields");
        return Err(status_response(StatusCode::BAD_REQUEST, "No fields to update"));
    }
    // A null would read as absent and silently keep the stored value
    let cleared = REQUIRED_FIELDS.iter()
        .filter(|field| fields.get(**field).is_some_and(Value::is_null))
        .map(|field| FieldError {
            field: field.to_string(),
            message: format!("{field} is required"),
        })
        .collect::<Vec<FieldError>>();
    if !cleared.is_empty() {
        tracing::info!("Rejected update of {id} clearing required fields");
        return Err(validation_failed(cleared));
    }
    let patch = serde_json::from_value::<QuestionDraft>(Value::Object(fields)).map_err(|err| {
        tracing::info!("Rejected request body, {err}");
        invalid_body(err)
    })?;

    let question = appstate.questions.update(&id, patch).await
        .map_err(|err| repository_failure(err, "Failed to update question"))?
        .ok_or_else(not_found)?;
    tracing::info!("Updated question {id}");
    Ok(Json(Envelope::ok("Question updated successfully", question)))
}

// DELETE API endpoint
#[tracing::instrument(skip(appstate), fields(request="/api/questions/delete"))]
pub async fn delete(State(appstate): State<AppState>, Path(id): Path<String>) -> Result<Json<Envelope<()>>, ServerResponse> {
    let deleted = appstate.questions.delete(&id).await
        .map_err(|err| repository_failure(err, "Failed to delete question"))?;
    if !deleted {
        return Err(not_found());
    }
    tracing::info!("Deleted question {id}");
    Ok(Json(Envelope::message("Question deleted successfully")))
}
