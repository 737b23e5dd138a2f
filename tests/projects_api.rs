mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::json;

use common::{add_member, create_project, create_task, register, send};
use task_manager::app::build_app;

#[actix_web::test]
async fn owner_creates_and_lists_projects_with_stats() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let project_id = create_project(&app, &owner, "Website").await;
    create_task(&app, &owner, project_id, json!({ "title": "Draft copy" })).await;

    let (status, body) = send(&app, &owner, test::TestRequest::get().uri("/api/projects")).await;
    assert_eq!(status, StatusCode::OK);
    let projects = body.as_array().expect("project list");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Website");
    assert_eq!(projects[0]["owner_id"], owner.id);
    assert_eq!(projects[0]["stats"]["total_tasks"], 1);
    assert_eq!(projects[0]["stats"]["pending"], 1);
    assert_eq!(projects[0]["stats"]["completion_rate"], 0.0);
}

#[actix_web::test]
async fn outsiders_cannot_see_a_project() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let outsider = register(&app, "outsider").await;
    let project_id = create_project(&app, &owner, "Private").await;

    let uri = format!("/api/projects/{project_id}");
    let (status, body) = send(&app, &outsider, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = send(&app, &outsider, test::TestRequest::get().uri("/api/projects/9999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn update_is_limited_to_owner_and_admins() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let admin = register(&app, "admin").await;
    let member = register(&app, "member").await;
    let project_id = create_project(&app, &owner, "Roadmap").await;
    add_member(&app, &owner, project_id, admin.id, "admin").await;
    add_member(&app, &owner, project_id, member.id, "member").await;
    let uri = format!("/api/projects/{project_id}");

    let (status, _) = send(
        &app,
        &member,
        test::TestRequest::put().uri(&uri).set_json(json!({ "name": "Mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        &admin,
        test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "name": "Roadmap 2025", "description": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Roadmap 2025");
    assert!(body["description"].is_null());
}

#[actix_web::test]
async fn only_the_owner_deletes_and_deleted_projects_disappear() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let admin = register(&app, "admin").await;
    let project_id = create_project(&app, &owner, "Old").await;
    add_member(&app, &owner, project_id, admin.id, "admin").await;
    let uri = format!("/api/projects/{project_id}");

    let (status, body) = send(&app, &admin, test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only project owner can delete project");

    let (status, _) = send(&app, &owner, test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, &owner, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, &owner, test::TestRequest::get().uri("/api/projects")).await;
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn membership_lifecycle() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let viewer = register(&app, "viewer").await;
    let project_id = create_project(&app, &owner, "Team").await;
    let members_uri = format!("/api/projects/{project_id}/members");

    let (status, body) = send(
        &app,
        &owner,
        test::TestRequest::post()
            .uri(&members_uri)
            .set_json(json!({ "user_id": viewer.id, "role": "viewer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "viewer");
    assert_eq!(body["user_name"], "viewer Tester");

    let (status, _) = send(
        &app,
        &owner,
        test::TestRequest::post()
            .uri(&members_uri)
            .set_json(json!({ "user_id": viewer.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        &owner,
        test::TestRequest::post()
            .uri(&members_uri)
            .set_json(json!({ "user_id": 4242 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        &viewer,
        test::TestRequest::post()
            .uri(&members_uri)
            .set_json(json!({ "user_id": owner.id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, &viewer, test::TestRequest::get().uri(&members_uri)).await;
    assert_eq!(status, StatusCode::OK);
    let members = body.as_array().expect("members");
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["role"], "owner");
    assert_eq!(members[0]["user_id"], owner.id);

    let member_uri = format!("{members_uri}/{}", viewer.id);
    let (status, body) = send(
        &app,
        &owner,
        test::TestRequest::put().uri(&member_uri).set_json(json!({ "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "member");

    let owner_uri = format!("{members_uri}/{}", owner.id);
    let (status, _) = send(&app, &owner, test::TestRequest::delete().uri(&owner_uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, &owner, test::TestRequest::delete().uri(&member_uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, &viewer, test::TestRequest::get().uri(&members_uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn owner_role_cannot_be_granted() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let other = register(&app, "other").await;
    let project_id = create_project(&app, &owner, "Team").await;

    let (status, body) = send(
        &app,
        &owner,
        test::TestRequest::post()
            .uri(&format!("/api/projects/{project_id}/members"))
            .set_json(json!({ "user_id": other.id, "role": "owner" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
}

#[actix_web::test]
async fn analytics_summarise_tasks_and_members() {
    let app = test::init_service(build_app(common::state().await)).await;
    let owner = register(&app, "owner").await;
    let member = register(&app, "member").await;
    let project_id = create_project(&app, &owner, "Metrics").await;
    add_member(&app, &owner, project_id, member.id, "member").await;
    create_task(&app, &owner, project_id, json!({ "title": "One" })).await;
    create_task(&app, &member, project_id, json!({ "title": "Two" })).await;

    let (status, body) = send(
        &app,
        &member,
        test::TestRequest::get().uri(&format!("/api/projects/{project_id}/analytics")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project_id"], project_id);
    assert_eq!(body["project_name"], "Metrics");
    assert_eq!(body["task_statistics"]["total_tasks"], 2);
    assert_eq!(body["member_count"], 2);
    assert_eq!(body["project_age_days"], 0);
}
