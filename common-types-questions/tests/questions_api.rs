use ::std::time::Duration;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common_types_questions::{
    Middleware::rate_limit::RateLimiter,
    Repository::MemoryRepository,
    Routes::router,
    State::with_repository,
};

fn app() -> Router {
    app_with_limit(1_000)
}

fn app_with_limit(max_requests: u32) -> Router {
    let appstate = with_repository(MemoryRepository::new(), RateLimiter::new(max_requests, Duration::from_secs(900)));
    router(appstate)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = match bytes.is_empty() {
        true => Value::Null,
        false => serde_json::from_slice(&bytes).unwrap(),
    };
    (status, body)
}

fn mcq() -> Value {
    json!({
        "title": "Capital of France",
        "type": "Single Choice MCQ",
        "difficulty": "Easy",
        "category": "Geography",
        "visibility": "Public",
        "author": "Grace",
        "authorEmail": "grace@example.com",
        "tags": ["europe", "capitals"],
        "content": "Which city is the capital of France?",
        "options": ["Paris", "Lyon", "Nice"],
        "correctAnswer": "Paris",
        "points": 2,
        "estimatedTime": 1
    })
}

fn with(mut base: Value, overrides: Value) -> Value {
    if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/api/questions", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[tokio::test]
async fn created_question_is_readable_by_id() {
    let app = app();
    let created = create(&app, mcq()).await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["isPublished"], false);

    let (status, body) = send(&app, Method::GET, &format!("/api/questions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], created);
}

#[tokio::test]
async fn short_title_is_rejected_with_step_message() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/questions", Some(with(mcq(), json!({ "title": "Quiz" })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Question title must be at least 5 characters long" }));
}

#[tokio::test]
async fn single_option_mcq_is_rejected() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/questions", Some(with(mcq(), json!({ "options": ["Paris"] })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least 2 options are required for MCQ questions");
}

#[tokio::test]
async fn entity_violations_are_listed_in_details() {
    let app = app();
    let draft = with(mcq(), json!({
        "type": "Match Following",
        "options": [],
        "correctAnswer": null,
        "matchPairs": [
            { "columnA": "Fe", "columnB": "Iron" },
            { "columnA": "Cu", "columnB": "" }
        ]
    }));
    let (status, body) = send(&app, Method::POST, "/api/questions", Some(draft)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "matchPairs");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/questions")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn list_is_paginated() {
    let app = app();
    for n in 0..12 {
        create(&app, with(mcq(), json!({ "title": format!("Capital question {n}") }))).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/questions?page=3&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Questions retrieved successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"], json!({ "page": 3, "limit": 5, "total": 12, "totalPages": 3 }));

    let (_, body) = send(&app, Method::GET, "/api/questions?limit=0&page=abc", None).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn out_of_range_paging_is_rejected() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/questions?page=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Page must be greater than 0");

    let (status, body) = send(&app, Method::GET, "/api/questions?limit=101", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Limit must be between 1 and 100");
}

#[tokio::test]
async fn tag_filter_intersects() {
    let app = app();
    create(&app, with(mcq(), json!({ "tags": ["algebra"] }))).await;
    create(&app, with(mcq(), json!({ "tags": ["equations", "roots"] }))).await;
    create(&app, with(mcq(), json!({ "tags": ["geometry"] }))).await;

    let (status, body) = send(&app, Method::GET, "/api/questions?tags=algebra,equations", None).await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["data"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for question in questions {
        let tags = question["tags"].as_array().unwrap();
        assert!(tags.iter().any(|tag| tag == "algebra" || tag == "equations"));
    }
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn scalar_filters_combine() {
    let app = app();
    create(&app, mcq()).await;
    create(&app, with(mcq(), json!({ "difficulty": "Hard", "authorEmail": "ada@example.com" }))).await;

    let (_, body) = send(&app, Method::GET, "/api/questions?difficulty=Hard&category=Geography", None).await;
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = send(&app, Method::GET, "/api/questions?difficulty=Impossible", None).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(&app, Method::GET, "/api/questions?myQuestionsOnly=true&authorEmail=ada@example.com", None).await;
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = send(&app, Method::GET, "/api/questions?myQuestionsOnly=true", None).await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = send(&app, Method::GET, "/api/questions?isPublished=false", None).await;
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn empty_update_is_rejected_and_nothing_changes() {
    let app = app();
    let created = create(&app, mcq()).await;
    let uri = format!("/api/questions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"], created);
}

#[tokio::test]
async fn update_with_only_unknown_keys_keeps_the_stored_fields() {
    let app = app();
    let created = create(&app, mcq()).await;
    let uri = format!("/api/questions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "foo": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Question updated successfully");
    assert_eq!(body["data"]["title"], created["title"]);
    assert_eq!(body["data"]["points"], created["points"]);
}

#[tokio::test]
async fn update_cannot_null_a_required_field() {
    let app = app();
    let created = create(&app, mcq()).await;
    let uri = format!("/api/questions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "title": null, "explanation": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"], json!([{ "field": "title", "message": "title is required" }]));

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!(["title"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"], created);
}

#[tokio::test]
async fn update_merges_and_revalidates() {
    let app = app();
    let created = create(&app, mcq()).await;
    let uri = format!("/api/questions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "points": 5, "tags": ["france"] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["points"], 5.0);
    assert_eq!(body["data"]["tags"], json!(["france"]));
    assert_eq!(body["data"]["title"], created["title"]);

    let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "visibility": "Secret" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["field"], "visibility");
}

#[tokio::test]
async fn missing_and_malformed_ids() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/questions/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid question ID format");

    let (status, body) = send(&app, Method::GET, "/api/questions/67e55044-10b1-426f-9247-bb680e5fe0c8", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Question not found");

    let (status, _) = send(&app, Method::PUT, "/api/questions/67e55044-10b1-426f-9247-bb680e5fe0c8", Some(json!({ "points": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_twice_is_not_found_the_second_time() {
    let app = app();
    let created = create(&app, mcq()).await;
    let uri = format!("/api/questions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Question deleted successfully");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_follow_publishing() {
    let app = app();
    let created = create(&app, mcq()).await;
    create(&app, mcq()).await;
    create(&app, with(mcq(), json!({ "isPublished": true }))).await;

    let id = created["id"].as_str().unwrap();
    let (status, body) = send(&app, Method::PUT, &format!("/api/questions/{id}/publish"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isPublished"], true);

    let (_, body) = send(&app, Method::GET, "/api/questions/stats", None).await;
    assert_eq!(body["data"], json!({ "total": 3, "published": 2, "draft": 1 }));

    send(&app, Method::PUT, &format!("/api/questions/{id}/unpublish"), None).await;
    let (_, body) = send(&app, Method::GET, "/api/questions/stats", None).await;
    let stats = &body["data"];
    assert_eq!(stats["published"], 1);
    assert_eq!(stats["total"].as_u64(), Some(stats["published"].as_u64().unwrap() + stats["draft"].as_u64().unwrap()));
}

#[tokio::test]
async fn facets_and_author_listing() {
    let app = app();
    create(&app, mcq()).await;
    create(&app, with(mcq(), json!({ "category": "History", "tags": ["europe", "wars"], "authorEmail": "ada@example.com" }))).await;

    let (_, body) = send(&app, Method::GET, "/api/questions/categories", None).await;
    let mut categories: Vec<String> = serde_json::from_value(body["data"].clone()).unwrap();
    categories.sort();
    assert_eq!(categories, vec!["Geography", "History"]);

    let (_, body) = send(&app, Method::GET, "/api/questions/tags", None).await;
    let mut tags: Vec<String> = serde_json::from_value(body["data"].clone()).unwrap();
    tags.sort();
    assert_eq!(tags, vec!["capitals", "europe", "wars"]);

    let (status, body) = send(&app, Method::GET, "/api/questions/author/ada@example.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["category"], "History");
}

#[tokio::test]
async fn single_steps_can_be_validated() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/questions/validate/2", Some(json!({
        "type": "Single Choice MCQ",
        "content": "Which city is the capital of France?",
        "options": ["Paris"]
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "At least 2 options are required for MCQ questions");

    let (status, body) = send(&app, Method::POST, "/api/questions/validate/3", Some(json!({ "points": 0, "estimatedTime": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, Method::POST, "/api/questions/validate/4", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let app = app_with_limit(2);
    for _ in 0..2 {
        let (status, _) = send(&app, Method::GET, "/api/questions/stats", None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, Method::GET, "/api/questions/stats", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests, please try again later.");

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_hardening_headers() {
    let app = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("strict-transport-security"));
    assert!(headers.contains_key("access-control-allow-origin"));

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/questions")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn unknown_routes_use_the_envelope() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/answers", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
