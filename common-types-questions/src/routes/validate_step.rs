use axum::{
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    Json,
};
use common_types::Envelope::Response as Envelope;

use crate::{
    Response::{ServerResponse, malformed_body, status_response},
    Validation::{QuestionDraft, Step},
};

// POST API endpoint, checks one page of the authoring form without storing anything
#[tracing::instrument(skip(body), fields(request="/api/questions/validate"))]
pub async fn request(Path(step): Path<String>, body: Result<Json<QuestionDraft>, JsonRejection>) -> Result<Json<Envelope<()>>, ServerResponse> {
    let step = step.parse::<u8>().ok()
        .and_then(Step::from_number)
        .ok_or_else(|| status_response(StatusCode::NOT_FOUND, "Unknown validation step"))?;
    let Json(draft) = body.map_err(malformed_body)?;

    if let Err(err) = step.validate(&draft) {
        tracing::info!("Step {} failed with reason: {err}", step.number());
        return Err(status_response(StatusCode::BAD_REQUEST, err));
    }
    Ok(Json(Envelope::message(format!("Step {} is valid", step.number()))))
}
