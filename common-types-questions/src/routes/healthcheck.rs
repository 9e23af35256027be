use axum::Json;
use common_types::Envelope::Response as Envelope;

// GET API endpoint
pub async fn request() -> Json<Envelope<()>> {
    Json(Envelope::message("Question service is running"))
}
