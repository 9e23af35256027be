use axum::{
    extract::{State, Query, rejection::QueryRejection},
    http::StatusCode,
    Json,
};
use garde::Validate;
use common_types::Envelope::{Pagination, Response as Envelope};

use crate::{
    Entity::Question,
    Filter::{build_query, QuestionFilters},
    Repository::PageWindow,
    Response::{ServerResponse, repository_failure, status_response},
    State::AppState,
};

mod db;
use db::ListQuery;

fn malformed_query(rejection: QueryRejection) -> ServerResponse {
    tracing::info!("Rejected query string, {rejection}");
    status_response(StatusCode::BAD_REQUEST, "Invalid query parameters")
}

// GET API endpoint
#[tracing::instrument(skip(appstate, paging, filters), fields(request="/api/questions/list"))]
pub async fn request(State(appstate): State<AppState>, paging: Result<Query<ListQuery>, QueryRejection>, filters: Result<Query<QuestionFilters>, QueryRejection>) -> Result<Json<Envelope<Vec<Question>>>, ServerResponse> {
    let Query(paging) = paging.map_err(malformed_query)?;
    let Query(filters) = filters.map_err(malformed_query)?;

    let page_request = paging.page_request();
    if let Err(report) = page_request.validate(&()) {
        tracing::info!("Validation failed with reason: {report}");
        let message = report.iter()
            .next()
            .map(|(_, error)| error.to_string())
            .unwrap_or_else(|| report.to_string());
        return Err(status_response(StatusCode::BAD_REQUEST, message));
    }
    let window = PageWindow {
        page: u32::try_from(page_request.page).unwrap_or(u32::MAX),
        limit: page_request.limit as u32,
    };

    let query = build_query(&filters);
    let page = appstate.questions.list(&query, window).await
        .map_err(|err| repository_failure(err, "Failed to fetch questions"))?;
    tracing::info!("Returning {} of {} questions", page.questions.len(), page.total);

    let pagination = Pagination::new(window.page, window.limit, page.total);
    Ok(Json(Envelope::ok("Questions retrieved successfully", page.questions).with_pagination(pagination)))
}
