use drivetree::models::{EntryFilter, NodeStatus, FOLDER_MIME_TYPE};
use drivetree::services::drive::{ArchiveService, ConcurrencyConfig, DriveClient, DriveConfig, StorageClient};
use drivetree::DriveError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(server_url: &str) -> DriveConfig {
    DriveConfig::new("test-token").with_base_url(server_url)
}

fn create_test_client(server_url: &str) -> DriveClient {
    DriveClient::new(create_test_config(server_url)).expect("Failed to create drive client")
}

#[tokio::test]
async fn test_list_children_sends_query_and_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("q", "'parent-1' in parents and trashed = false"))
        .and(query_param("orderBy", "folder,name"))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "id": "f1", "name": "2024", "mimeType": FOLDER_MIME_TYPE },
                {
                    "id": "d1",
                    "name": "invoice.pdf",
                    "mimeType": "application/pdf",
                    "webViewLink": "https://drive.google.com/file/d/d1/view",
                    "createdTime": "2024-03-01T10:00:00.000Z"
                }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let page = client
        .list_children("parent-1", EntryFilter::All, None)
        .await
        .expect("listing should succeed");

    assert_eq!(page.entries.len(), 2);
    assert!(page.entries[0].is_folder());
    assert_eq!(page.entries[1].web_view_link.as_deref(), Some("https://drive.google.com/file/d/d1/view"));
    assert!(page.entries[1].created_time.is_some());
    assert_eq!(page.continuation(), None);
}

#[tokio::test]
async fn test_file_listing_asks_for_newest_first() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param(
            "q",
            "'month-1' in parents and trashed = false and mimeType != 'application/vnd.google-apps.folder'",
        ))
        .and(query_param("orderBy", "createdTime desc"))
        .and(query_param("pageToken", "cursor-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let page = client
        .list_children("month-1", EntryFilter::Files, Some("cursor-2"))
        .await
        .unwrap();

    assert!(page.entries.is_empty());
}

#[tokio::test]
async fn test_metadata_not_found_maps_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/missing-id"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "File not found: missing-id." }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client.get_metadata("missing-id").await.unwrap_err();

    assert!(matches!(err, DriveError::NotFound { ref id } if id == "missing-id"));
    assert_eq!(err.status_code().as_u16(), 404);
}

#[tokio::test]
async fn test_error_envelope_message_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "The user does not have sufficient permissions." }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client
        .list_children("parent-1", EntryFilter::Folders, None)
        .await
        .unwrap_err();

    match err {
        DriveError::RemoteApi { status, ref message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "The user does not have sufficient permissions.");
        }
        other => panic!("expected RemoteApi, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/abc"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let err = client.get_metadata("abc").await.unwrap_err();

    assert!(matches!(err, DriveError::RemoteApi { status: 502, ref message } if message == "upstream exploded"));
    assert_eq!(err.error_code(), "DRIVE_REMOTE_API_ERROR");
}

#[tokio::test]
async fn test_create_folder_posts_name_type_and_parent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/files"))
        .and(query_param("fields", "id"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "name": "2025",
            "mimeType": FOLDER_MIME_TYPE,
            "parents": ["facturas-id"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "new-folder-id" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let id = client.create_folder("2025", "facturas-id").await.unwrap();

    assert_eq!(id, "new-folder-id");
}

#[tokio::test]
async fn test_find_folder_uses_name_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param(
            "q",
            "name = 'O\\'Neil' and 'root' in parents and trashed = false and mimeType = 'application/vnd.google-apps.folder'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{ "id": "first" }, { "id": "second" }]
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri());
    let found = client.find_folder("root", "O'Neil").await.unwrap();

    assert_eq!(found.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_file_listing_follows_continuation_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "id": "a", "name": "a.pdf", "mimeType": "application/pdf", "createdTime": "2024-01-02T00:00:00Z" }
            ]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "id": "b", "name": "b.pdf", "mimeType": "application/pdf", "createdTime": "2024-01-01T00:00:00Z" },
                { "id": "c", "name": "c.pdf", "mimeType": "application/pdf", "createdTime": "2024-01-03T00:00:00Z" }
            ],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = ArchiveService::from_drive_config(
        create_test_config(&mock_server.uri()),
        ConcurrencyConfig::default(),
    )
    .unwrap();
    let files = service.list_folder_files("month-1").await.unwrap();

    let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_tree_over_http_never_fetches_the_root() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "root", "name": "My Drive", "mimeType": FOLDER_MIME_TYPE
        })))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/facturas-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "facturas-id", "name": "facturas", "mimeType": FOLDER_MIME_TYPE
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", "'root' in parents and trashed = false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{ "id": "facturas-id", "name": "facturas", "mimeType": FOLDER_MIME_TYPE }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("q", "'facturas-id' in parents and trashed = false"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .mount(&mock_server)
        .await;

    let service = ArchiveService::from_drive_config(
        create_test_config(&mock_server.uri()),
        ConcurrencyConfig::default(),
    )
    .unwrap();
    let tree = service.build_tree("root", 3).await.unwrap();

    assert_eq!(tree.name, "Root");
    assert_eq!(tree.status, Some(NodeStatus::Complete));
    let facturas = &tree.children()[0];
    assert_eq!(facturas.name, "facturas");
    assert_eq!(facturas.status, Some(NodeStatus::Errored));
    assert_eq!(facturas.children, Some(Vec::new()));
}
