mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{read_json, TestApp};
use govtrack::squads;
use serde_json::{json, Value};

fn payload(name: &str, impact: i32) -> Value {
    json!({
        "quest_name": name,
        "instruction": "Pull the Q1 incident numbers for the steering deck",
        "requestor": "CTO office",
        "executor": "dimas",
        "request_date": "2026-02-16",
        "due_date": "2099-03-02",
        "impact_score": impact
    })
}

async fn create(app: &TestApp, body: &Value) -> Result<Value> {
    let response = app.post_json("/api/side-quests", body).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn create_assigns_ticket_code_and_flags_strategy() -> Result<()> {
    let app = TestApp::new().await?;
    let created = create(&app, &payload("Incident numbers", 4)).await?;

    let code = created["ticket_code"].as_str().unwrap();
    assert!(code.starts_with("SQ-"));
    assert_eq!(code.len(), "SQ-20260216-ABCD".len());
    assert_eq!(created["status"], "Submitted");
    assert_eq!(created["is_strategic"], true);
    assert_eq!(created["sla_status"], "Safe");

    let minor = create(&app, &payload("Rename channel", 2)).await?;
    assert_eq!(minor["is_strategic"], false);
    assert_ne!(minor["ticket_code"], created["ticket_code"]);
    Ok(())
}

#[tokio::test]
async fn impact_score_out_of_range_is_rejected() -> Result<()> {
    let app = TestApp::new().await?;
    for impact in [0, 6] {
        let response = app
            .post_json("/api/side-quests", &payload("Out of range", impact))
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    Ok(())
}

#[tokio::test]
async fn done_stamps_finish_date_and_reopening_clears_it() -> Result<()> {
    let app = TestApp::new().await?;
    let created = create(&app, &payload("Stamp", 3)).await?;
    let id = created["id"].as_str().unwrap();
    assert!(created["finish_date"].is_null());

    let done: Value = read_json(
        app.patch_json(&format!("/api/side-quests/{id}/status"), &json!({ "status": "Done" }))
            .await?,
    )
    .await?;
    assert_eq!(done["outcome"], "updated");
    assert_eq!(done["data"]["status"], "Done");
    assert!(done["data"]["finish_date"].is_string());
    assert_eq!(done["data"]["sla_status"], "Completed");

    let reopened: Value = read_json(
        app.patch_json(
            &format!("/api/side-quests/{id}/status"),
            &json!({ "status": "In Progress" }),
        )
        .await?,
    )
    .await?;
    assert_eq!(reopened["data"]["status"], "In Progress");
    assert!(reopened["data"]["finish_date"].is_null());

    let response = app
        .patch_json(&format!("/api/side-quests/{id}/status"), &json!({ "status": "Finished" }))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn legacy_status_label_is_accepted() -> Result<()> {
    let app = TestApp::new().await?;
    let mut body = payload("Legacy", 1);
    body["status"] = json!("Submited");
    let created = create(&app, &body).await?;
    assert_eq!(created["status"], "Submitted");
    Ok(())
}

#[tokio::test]
async fn archive_via_status_moves_followups_and_attachments() -> Result<()> {
    let app = TestApp::new().await?;
    let mut body = payload("Archive me", 5);
    body["attachments"] = json!([{ "filename": "brief.docx", "storage_path": "/uploads/brief.docx" }]);
    let created = create(&app, &body).await?;
    let id = created["id"].as_str().unwrap();

    let response = app
        .post_json(
            &format!("/api/side-quests/{id}/followups"),
            &json!({
                "action": "Sent draft to requestor",
                "entry_date": "2026-02-17",
                "attachments": [{ "filename": "draft.pdf", "storage_path": "/uploads/draft.pdf" }]
            }),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let outcome: Value = read_json(
        app.patch_json(&format!("/api/side-quests/{id}/status"), &json!({ "status": "Archived" }))
            .await?,
    )
    .await?;
    assert_eq!(outcome["outcome"], "archived");
    assert_eq!(outcome["data"]["followups"], 1);
    assert_eq!(outcome["data"]["attachments"], 2);

    let response = app.get(&format!("/api/side-quests/{id}")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let archived: Value =
        read_json(app.get(&format!("/api/archive/side-quests/{id}")).await?).await?;
    assert_eq!(archived["status"], "Archived");
    assert_eq!(archived["ticket_code"], created["ticket_code"]);
    assert_eq!(archived["attachments"].as_array().unwrap().len(), 1);
    let followups = archived["followups"].as_array().unwrap();
    assert_eq!(followups.len(), 1);
    assert_eq!(followups[0]["action"], "Sent draft to requestor");
    assert_eq!(followups[0]["attachments"].as_array().unwrap().len(), 1);

    let response = app
        .post_json(&format!("/api/side-quests/{id}/archive"), &json!({}))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_filters_by_status() -> Result<()> {
    let app = TestApp::new().await?;
    let first = create(&app, &payload("First", 2)).await?;
    create(&app, &payload("Second", 2)).await?;

    let id = first["id"].as_str().unwrap();
    let response = app
        .patch_json(&format!("/api/side-quests/{id}/status"), &json!({ "status": "Pending" }))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let pending: Vec<Value> =
        read_json(app.get("/api/side-quests?status=Pending").await?).await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["quest_name"], "First");

    let all: Vec<Value> = read_json(app.get("/api/side-quests").await?).await?;
    assert_eq!(all.len(), 2);

    let response = app.get("/api/side-quests?status=Shipped").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn seeding_squads_is_idempotent() -> Result<()> {
    let app = TestApp::new().await?;

    let (first, second) = app.with_conn(|conn| {
        let first = squads::seed_squads(conn, squads::DEFAULT_SQUADS)?;
        let second = squads::seed_squads(conn, squads::DEFAULT_SQUADS)?;
        Ok((first, second))
    })?;
    assert_eq!(first, squads::DEFAULT_SQUADS.len());
    assert_eq!(second, 0);

    let listed: Vec<Value> = read_json(app.get("/api/squads").await?).await?;
    assert_eq!(listed.len(), squads::DEFAULT_SQUADS.len());
    assert_eq!(listed[0]["name"], "AO - Claim");
    Ok(())
}
