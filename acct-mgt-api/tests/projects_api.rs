mod common;

use acct_mgt_api::kubernetes::{ResourceKey, ResourceKind};
use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn project_lifecycle() {
    let app = TestApp::new();

    let (status, body) = app.call("GET", "/projects/p1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "project does not exist (p1)");

    let (status, body) = app.call("PUT", "/projects/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "project created (p1)");

    let (status, body) = app.call("PUT", "/projects/p1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "project currently exist (p1)");

    let (status, _) = app.call("GET", "/projects/p1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("DELETE", "/projects/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "project deleted (p1)");

    let (status, _) = app.call("DELETE", "/projects/p1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_project_name_gets_suggestion() {
    let app = TestApp::new();

    let (status, body) = app.call("PUT", "/projects/My_Project").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["suggested name"], "my-project");
    assert!(body["msg"]
        .as_str()
        .unwrap()
        .contains("[a-z0-9]([-a-z0-9]*[a-z0-9])?"));
    assert!(app.cluster.calls().await.is_empty());
}

#[tokio::test]
async fn owner_and_display_name_are_recorded() {
    let app = TestApp::new();

    let (status, _) = app
        .call_json(
            "PUT",
            "/projects/p1/owner/alice",
            json!({"displayName": "Project One"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let project = app
        .cluster
        .object(ResourceKind::Project, &ResourceKey::cluster("p1"))
        .await
        .expect("project");
    let annotations = &project["metadata"]["annotations"];
    assert_eq!(annotations["openshift.io/display-name"], "Project One");
    assert_eq!(annotations["openshift.io/requester"], "alice");
}

#[tokio::test]
async fn role_binding_lifecycle() {
    let app = TestApp::new().with_project("p1").await;

    let (status, body) = app.call("GET", "/users/alice/projects/p1/roles/Admin").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "user role does not exist (p1,alice,admin)");

    let (status, body) = app.call("PUT", "/users/alice/projects/p1/roles/Admin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "rolebinding created (p1,alice,admin)");

    let (status, _) = app.call("GET", "/users/alice/projects/p1/roles/admin").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("PUT", "/users/alice/projects/p1/roles/Admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "user role already exists (p1,alice,admin)");

    let (status, _) = app.call("DELETE", "/users/alice/projects/p1/roles/Admin").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("DELETE", "/users/alice/projects/p1/roles/Admin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn member_role_binds_edit() {
    let app = TestApp::new().with_project("p1").await;
    app.call("PUT", "/users/bob/projects/p1/roles/Member").await;

    let binding = app
        .cluster
        .object(ResourceKind::RoleBinding, &ResourceKey::namespaced("p1", "edit"))
        .await
        .expect("binding");
    assert_eq!(binding["userNames"], json!(["bob"]));
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let app = TestApp::new().with_project("p1").await;

    let (status, body) = app.call("PUT", "/users/alice/projects/p1/roles/Owner").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].as_str().unwrap().contains("Owner"));
    assert!(app.cluster.calls().await.is_empty());
}
