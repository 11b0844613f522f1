use acct_mgt_api::kubernetes::credentials::TokenSource;
use acct_mgt_api::kubernetes::{ClusterApi, K8sClient, K8sError, ResourceKey, ResourceKind};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> K8sClient {
    K8sClient::new(&server.uri(), TokenSource::Static("t0ken".to_string())).unwrap()
}

#[tokio::test]
async fn fetch_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/user.openshift.io/v1/users/alice"))
        .and(header("authorization", "Bearer t0ken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"metadata": {"name": "alice"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let user = client(&server)
        .fetch(ResourceKind::User, &ResourceKey::cluster("alice"))
        .await
        .unwrap()
        .expect("user");
    assert_eq!(user["metadata"]["name"], "alice");
}

#[tokio::test]
async fn not_found_probe_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/project.openshift.io/v1/projects/p1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "Status",
            "status": "Failure",
            "reason": "NotFound"
        })))
        .mount(&server)
        .await;

    let exists = client(&server)
        .exists(ResourceKind::Project, &ResourceKey::cluster("p1"))
        .await
        .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn server_error_probe_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/namespaces/p1/resourcequotas/compute"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch(
            ResourceKind::ResourceQuota,
            &ResourceKey::namespaced("p1", "compute"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, K8sError::UnexpectedStatus { status: 500, .. }));
}

#[tokio::test]
async fn create_posts_to_collection() {
    let server = MockServer::start().await;
    let manifest = json!({"kind": "RoleBinding", "metadata": {"name": "admin"}});
    Mock::given(method("POST"))
        .and(path("/apis/authorization.openshift.io/v1/namespaces/p1/rolebindings"))
        .and(body_json(&manifest))
        .respond_with(ResponseTemplate::new(201).set_body_json(&manifest))
        .expect(1)
        .mount(&server)
        .await;

    let mutation = client(&server)
        .create(
            ResourceKind::RoleBinding,
            &ResourceKey::namespaced("p1", "admin"),
            &manifest,
        )
        .await
        .unwrap();
    assert_eq!(mutation.status, 201);
    assert!(mutation.is_success());
}

#[tokio::test]
async fn rejected_mutation_keeps_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/apis/user.openshift.io/v1/users/alice"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "kind": "Status",
            "status": "Failure",
            "message": "users is forbidden",
            "code": 403
        })))
        .mount(&server)
        .await;

    let mutation = client(&server)
        .delete(ResourceKind::User, &ResourceKey::cluster("alice"))
        .await
        .unwrap();
    assert_eq!(mutation.status, 403);
    assert!(!mutation.is_success());
    assert_eq!(mutation.message(), "users is forbidden");
}

#[tokio::test]
async fn token_file_is_read_per_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer rotated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer original"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    std::fs::write(&token_path, "original\n").unwrap();
    let client = K8sClient::new(&server.uri(), TokenSource::File(token_path.clone())).unwrap();

    let key = ResourceKey::cluster("alice");
    client.fetch(ResourceKind::User, &key).await.unwrap();
    std::fs::write(&token_path, "rotated\n").unwrap();
    client.fetch(ResourceKind::User, &key).await.unwrap();
}

#[tokio::test]
async fn unusable_token_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client =
        K8sClient::new(&server.uri(), TokenSource::Static("bad\ntoken".to_string())).unwrap();
    let err = client
        .fetch(ResourceKind::User, &ResourceKey::cluster("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, K8sError::InvalidToken));
}
