#![allow(clippy::unwrap_used)]
// Data table and edit modal driven against a wiremock admin server.

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adminkit_api::{ApiClient, admin_schema};
use adminkit_core::modal::record;
use adminkit_core::{
    CoreError, ModalState, Screen, ShowOptions, SortDirection, SortInfo, TableChange,
    TableOptions,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::builder(Url::parse(&server.uri()).unwrap())
        .schema(admin_schema().unwrap())
        .http(reqwest::Client::new())
        .build()
        .unwrap();
    (server, client)
}

fn rows(ids: &[i64]) -> Value {
    Value::Array(ids.iter().map(|id| json!({"id": id, "title": format!("post {id}")})).collect())
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

// ── Table ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_mount_fetches_first_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "10"))
        .and(query_param("sorting", ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[1, 2, 3]), "total": 23})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut table = Screen::posts().table(&client, TableOptions::default());
    table.mount().await.unwrap();

    assert_eq!(ids(table.rows()), vec![1, 2, 3]);
    assert_eq!(table.total(), 23);
    assert_eq!(table.page_count(), 3);
}

#[tokio::test]
async fn test_change_sends_sort_filters_and_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "20"))
        .and(query_param("sorting", "createdAt desc"))
        .and(query_param("authorId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "total": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let mut table = Screen::posts().table(&client, TableOptions::default());
    table
        .change(TableChange {
            page: Some(2),
            size: Some(20),
            filters: BTreeMap::from([("authorId".to_string(), Some(vec![json!(7)]))]),
            sort: Some(SortInfo::new("createdAt", SortDirection::Desc)),
        })
        .await
        .unwrap();

    let params = table.params();
    assert_eq!(params.page_info.page, 2);
    assert_eq!(params.sort_info.unwrap().field, "createdAt");
}

#[tokio::test]
async fn test_fetch_retries_once() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[9]), "total": 1})))
        .mount(&server)
        .await;

    let mut table = Screen::users().table(&client, TableOptions::default());
    table.fetch_data().await.unwrap();
    assert_eq!(ids(table.rows()), vec![9]);
}

#[tokio::test]
async fn test_malformed_list_body_is_not_retried() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let mut table = Screen::users().table(&client, TableOptions::default());
    assert!(table.fetch_data().await.is_err());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(table.rows().is_empty());
}

#[tokio::test]
async fn test_clearing_sort_sends_empty_sorting() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .and(query_param("sorting", "title asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[2, 1]), "total": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .and(query_param("sorting", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[1, 2]), "total": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let mut table = Screen::posts().table(&client, TableOptions::default());
    table
        .set_sort(Some(SortInfo::new("title", SortDirection::Asc)))
        .await
        .unwrap();
    assert_eq!(table.query()["sorting"], json!("title asc"));

    table.set_sort(None).await.unwrap();
    assert_eq!(table.query()["sorting"], json!(""));
    assert_eq!(ids(table.rows()), vec![1, 2]);
}

#[tokio::test]
async fn test_failed_fetch_keeps_rows() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[1, 2]), "total": 4})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jaq/api/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut table = Screen::users().table(&client, TableOptions::default());
    table.mount().await.unwrap();
    let err = table.set_page(2, 10).await.unwrap_err();

    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    assert_eq!(ids(table.rows()), vec![1, 2]);
}

#[tokio::test]
async fn test_drop_row_reorders_then_posts() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[1, 2, 3]), "total": 3})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jaq/api/posts/sort"))
        .and(body_json(json!({"id": 1, "dir": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .expect(1)
        .mount(&server)
        .await;

    let mut table = Screen::posts().table(&client, TableOptions::default());
    table.mount().await.unwrap();
    assert!(table.drop_row(&json!(1), &json!(3)).await.unwrap());
    assert_eq!(ids(table.rows()), vec![2, 3, 1]);
}

#[tokio::test]
async fn test_failed_reorder_is_not_rolled_back() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": rows(&[1, 2, 3]), "total": 3})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jaq/api/posts/sort"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let mut table = Screen::posts().table(&client, TableOptions::default());
    table.mount().await.unwrap();
    assert!(table.drop_row(&json!(3), &json!(1)).await.is_err());
    assert_eq!(ids(table.rows()), vec![3, 1, 2]);
}

#[tokio::test]
async fn test_search_and_base_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/jaq/api/posts"))
        .and(query_param("title", "rust"))
        .and(query_param("authorId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [], "total": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let options = TableOptions {
        base_query: record(json!({"authorId": 2})),
        ..TableOptions::default()
    };
    let mut table = Screen::posts().table(&client, options);
    table
        .submit_search(record(json!({"title": "rust", "authorId": 5})))
        .await
        .unwrap();
    assert_eq!(table.params().query["authorId"], json!(5));
}

// ── Modal ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_modal_edit_puts_to_item_route() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/jaq/api/users/5"))
        .and(body_json(json!({"name": "Bo", "email": "bo@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut modal = Screen::users().modal(&client);
    modal.show(
        record(json!({"id": 5, "name": "Ann", "email": "ann@example.com"})),
        ShowOptions::default(),
    );
    assert_eq!(modal.title(), "Edit user");
    modal
        .submit(record(json!({"name": "Bo", "email": "bo@example.com"})))
        .await
        .unwrap();
    assert_eq!(modal.state(), &ModalState::Closed);
}

#[tokio::test]
async fn test_modal_create_posts_to_collection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/jaq/api/posts"))
        .and(body_json(json!({"title": "T", "content": "C", "authorId": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"code": 201, "data": {"id": 1}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut modal = Screen::posts().modal(&client);
    modal.show(true, ShowOptions::default());
    assert_eq!(modal.title(), "New post");
    modal
        .submit(record(json!({"title": "T", "content": "C", "authorId": 1})))
        .await
        .unwrap();
    assert!(!modal.is_open());
}

#[tokio::test]
async fn test_modal_server_rejection_keeps_form_open() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/jaq/api/posts"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"code": 404, "message": "Author not found", "data": null})),
        )
        .mount(&server)
        .await;

    let mut modal = Screen::posts().modal(&client);
    modal.show(true, ShowOptions::default());
    let err = modal
        .submit(record(json!({"title": "T", "content": "C", "authorId": 99})))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { ref message } if message == "Author not found"));
    assert!(modal.is_open());
    assert_eq!(modal.values()["authorId"], json!(99));
}
