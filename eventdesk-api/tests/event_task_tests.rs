/// Integration tests for events, tasks and the past-flag cascade

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_cancelling_event_marks_tasks_past() {
    let ctx = TestContext::new().await;

    let event_id = ctx
        .create_event(json!({ "title": "Concert", "date": "2025-06-01", "is_past": false }))
        .await;

    let (status, task) = ctx
        .post(
            "/api/tasks/",
            &ctx.editor,
            json!({ "task": "Rent speakers", "event": event_id, "executors": [ctx.viewer.id] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);
    assert_eq!(task["is_past"], false);
    assert_eq!(task["creator"], ctx.editor.id);
    assert_eq!(task["status"], 2);
    let task_uri = format!("/api/task/{}/", task["id"]);

    let (status, event) = ctx
        .put(
            &format!("/api/event/{}/", event_id),
            &ctx.editor,
            json!({ "is_cancelled": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", event);
    assert_eq!(event["is_cancelled"], true);

    let (status, task) = ctx.get(&task_uri, &ctx.viewer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["is_past"], true);

    let (status, _) = ctx
        .delete(&format!("/api/event/{}/", event_id), &ctx.admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get(&task_uri, &ctx.viewer).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_on_past_event_starts_past() {
    let ctx = TestContext::new().await;
    let past = ctx
        .create_event(json!({ "title": "Last year", "date": "2024-01-01", "is_past": true }))
        .await;
    let upcoming = ctx
        .create_event(json!({ "title": "Next year", "date": "2026-01-01" }))
        .await;

    let (_, task) = ctx
        .post("/api/tasks/", &ctx.editor, json!({ "task": "Archive photos", "event": past, "is_past": false }))
        .await;
    assert_eq!(task["is_past"], true);

    // Moving to a live event recomputes the flag
    let (status, moved) = ctx
        .put(
            &format!("/api/task/{}/", task["id"]),
            &ctx.editor,
            json!({ "event": upcoming, "status": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", moved);
    assert_eq!(moved["event"], upcoming);
    assert_eq!(moved["is_past"], false);
    assert_eq!(moved["status"], 1);
}

#[tokio::test]
async fn test_reopening_event_clears_task_flag() {
    let ctx = TestContext::new().await;
    let event_id = ctx
        .create_event(json!({ "title": "Retreat", "date": "2025-07-01", "is_cancelled": true }))
        .await;
    let (_, task) = ctx
        .post("/api/tasks/", &ctx.editor, json!({ "task": "Book bus", "event": event_id }))
        .await;
    assert_eq!(task["is_past"], true);

    ctx.put(
        &format!("/api/event/{}/", event_id),
        &ctx.editor,
        json!({ "is_cancelled": false }),
    )
    .await;

    let (_, task) = ctx
        .get(&format!("/api/task/{}/", task["id"]), &ctx.viewer)
        .await;
    assert_eq!(task["is_past"], false);
}

#[tokio::test]
async fn test_event_permissions() {
    let ctx = TestContext::new().await;
    let body = json!({ "title": "Gala", "date": "2025-12-01" });

    let (status, _) = ctx.post("/api/events/", &ctx.viewer, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let event_id = ctx.create_event(body).await;
    let uri = format!("/api/event/{}/", event_id);

    let (status, _) = ctx.get(&uri, &ctx.viewer).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.put(&uri, &ctx.viewer, json!({ "title": "Renamed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.delete(&uri, &ctx.editor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.delete(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get(&uri, &ctx.viewer).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_relations_round_trip() {
    let ctx = TestContext::new().await;
    let project_id = ctx.create_project("Stage", None).await;

    let event_id = ctx
        .create_event(json!({
            "title": "Festival",
            "date": "2025-08-15",
            "organizers": [ctx.editor.id],
            "participants": [ctx.viewer.id, ctx.admin.id],
            "projects": [project_id]
        }))
        .await;

    let (_, event) = ctx
        .get(&format!("/api/event/{}/", event_id), &ctx.viewer)
        .await;
    assert_eq!(event["organizers"], json!([ctx.editor.id]));
    assert_eq!(event["projects"], json!([project_id]));
    assert_eq!(event["participants"].as_array().unwrap().len(), 2);

    let (_, event) = ctx
        .put(
            &format!("/api/event/{}/", event_id),
            &ctx.editor,
            json!({ "participants": [] }),
        )
        .await;
    assert_eq!(event["participants"], json!([]));
    assert_eq!(event["organizers"], json!([ctx.editor.id]));
}

#[tokio::test]
async fn test_event_validation() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .post("/api/events/", &ctx.editor, json!({ "title": "", "date": "2025-01-01" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post(
            "/api/events/",
            &ctx.editor,
            json!({ "title": "Ghosts", "date": "2025-01-01", "organizers": [0] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .put("/api/event/0/", &ctx.editor, json!({ "title": "Nothing" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_filters_and_errors() {
    let ctx = TestContext::new().await;
    let first = ctx.create_event(json!({ "title": "A", "date": "2025-03-01" })).await;
    let second = ctx.create_event(json!({ "title": "B", "date": "2025-03-02" })).await;

    ctx.post(
        "/api/tasks/",
        &ctx.editor,
        json!({ "task": "Mine", "event": first, "executors": [ctx.viewer.id] }),
    )
    .await;
    ctx.post("/api/tasks/", &ctx.editor, json!({ "task": "Other", "event": second }))
        .await;

    let (_, tasks) = ctx
        .get(&format!("/api/tasks/?event_id={}", first), &ctx.viewer)
        .await;
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["task"], "Mine");

    let (_, tasks) = ctx
        .get(&format!("/api/tasks/?user_id={}", ctx.viewer.id), &ctx.viewer)
        .await;
    assert!(tasks
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["executors"].as_array().unwrap().contains(&json!(ctx.viewer.id))));

    let (status, body) = ctx
        .post("/api/tasks/", &ctx.editor, json!({ "task": "Orphan", "event": 0 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Event not found");

    let (status, _) = ctx
        .post("/api/tasks/", &ctx.viewer, json!({ "task": "Nope", "event": first }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.delete("/api/task/0/", &ctx.editor).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_delete_by_editor() {
    let ctx = TestContext::new().await;
    let event_id = ctx.create_event(json!({ "title": "Fair", "date": "2025-05-05" })).await;
    let (_, task) = ctx
        .post("/api/tasks/", &ctx.editor, json!({ "task": "Tables", "event": event_id, "deadline": "2025-05-01" }))
        .await;
    assert_eq!(task["deadline"], "2025-05-01");
    let uri = format!("/api/task/{}/", task["id"]);

    let (_, cleared) = ctx.put(&uri, &ctx.editor, json!({ "deadline": null })).await;
    assert!(cleared["deadline"].is_null());

    let (status, _) = ctx.delete(&uri, &ctx.viewer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.delete(&uri, &ctx.editor).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, event) = ctx
        .get(&format!("/api/event/{}/", event_id), &ctx.viewer)
        .await;
    assert_eq!(event["tasks"], json!([]));
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let ctx = TestContext::new().await;
    let event_id = ctx.create_event(json!({ "title": "Expo", "date": "2025-02-02" })).await;

    let (status, body) = ctx
        .post("/api/events/", &ctx.editor, json!({ "date": "2025-01-01" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));

    let (status, body) = ctx
        .post(
            "/api/tasks/",
            &ctx.editor,
            json!({ "task": "Badges", "event": event_id, "status": 9 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = ctx.get("/api/tasks/?event_id=abc", &ctx.viewer).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = ctx
        .put(&format!("/api/event/{}/", event_id), &ctx.editor, json!({ "date": "soon" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
