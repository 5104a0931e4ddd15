//! End-to-end envelope behavior against in-process mock backends.

use std::net::SocketAddr;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use kennel_api::{ApiClient, UploadFile};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return its address.
async fn spawn_backend(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

fn kennel_backend() -> Router {
    Router::new()
        .route(
            "/api/dogs/",
            get(|| async { Json(json!([{ "id": 1, "name": "Biscuit" }])) }).post(
                |Json(body): Json<Value>| async move {
                    (StatusCode::CREATED, Json(json!({ "id": 2, "name": body["name"] })))
                },
            ),
        )
        .route(
            "/api/dogs/{id}/",
            get(|Path(id): Path<u32>| async move {
                if id == 404 {
                    (StatusCode::NOT_FOUND, Json(json!({ "error": "Dog not found" })))
                } else {
                    (StatusCode::OK, Json(json!({ "id": id })))
                }
            })
            .put(|Path(id): Path<u32>, Json(body): Json<Value>| async move {
                Json(json!({ "id": id, "name": body["name"] }))
            })
            .delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/api/litters/",
            get(|Query(q): Query<std::collections::HashMap<String, String>>| async move {
                Json(json!({ "dam": q.get("dam") }))
            }),
        )
        .route(
            "/api/broken/",
            get(|| async { (StatusCode::OK, "<html>not json</html>") }),
        )
        .route(
            "/api/crash/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Traceback ...") }),
        )
        .route(
            "/api/uploads/",
            post(|mut multipart: Multipart| async move {
                let mut kind = None;
                let mut file_name = None;
                let mut size = 0;
                while let Some(field) = multipart.next_field().await.unwrap() {
                    let name = field.name().map(str::to_string);
                    match name.as_deref() {
                        Some("type") => kind = Some(field.text().await.unwrap()),
                        Some("file") => {
                            file_name = field.file_name().map(str::to_string);
                            size = field.bytes().await.unwrap().len();
                        }
                        _ => {}
                    }
                }
                Json(json!({ "type": kind, "filename": file_name, "size": size }))
            }),
        )
}

#[tokio::test]
async fn test_get_success_carries_parsed_body() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let res = client.get("dogs").await;
    assert!(res.ok);
    assert_eq!(res.data, Some(json!([{ "id": 1, "name": "Biscuit" }])));
    assert_eq!(res.error, None);
}

#[tokio::test]
async fn test_post_put_delete() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let created = client.post("dogs", &json!({ "name": "Maple" })).await;
    assert!(created.ok);
    assert_eq!(created.data, Some(json!({ "id": 2, "name": "Maple" })));

    let updated = client.put("dogs/2", &json!({ "name": "Maple II" })).await;
    assert!(updated.ok);
    assert_eq!(updated.data, Some(json!({ "id": 2, "name": "Maple II" })));

    let deleted = client.delete("dogs/2/").await;
    assert!(deleted.ok);
    assert_eq!(deleted.data, Some(Value::Null));
}

#[tokio::test]
async fn test_query_params() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let res = client.get_with_params("litters", &[("dam", "7")]).await;
    assert!(res.ok);
    assert_eq!(res.data, Some(json!({ "dam": "7" })));
}

#[tokio::test]
async fn test_backend_error_message_extracted() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let res = client.get("dogs/404").await;
    assert!(!res.ok);
    assert_eq!(res.error.as_deref(), Some("Dog not found"));
    assert_eq!(res.data, None);
}

#[tokio::test]
async fn test_unstructured_error_gets_generic_message() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let res = client.get("crash").await;
    assert!(!res.ok);
    assert_eq!(
        res.error.as_deref(),
        Some("Request failed with status 500 Internal Server Error")
    );
}

#[tokio::test]
async fn test_malformed_success_body_is_failure() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let res = client.get("broken").await;
    assert!(!res.ok);
    assert!(res.error.unwrap().starts_with("Invalid response from server"));
}

#[tokio::test]
async fn test_unreachable_backend_is_failure_not_panic() {
    let addr = dead_addr().await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    for res in [
        client.get("dogs").await,
        client.post("dogs", &json!({})).await,
        client.put("dogs/1", &json!({})).await,
        client.delete("dogs/1").await,
        client.upload(UploadFile::new("a.png", vec![1u8]), "image").await,
    ] {
        assert!(!res.ok);
        let error = res.error.expect("error message");
        assert!(error.starts_with("Network error"), "got {}", error);
    }
}

#[tokio::test]
async fn test_upload_sends_file_and_type() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let file = UploadFile::new("puppy.png", vec![0u8; 64]).with_mime("image/png");
    let res = client.upload(file, "image").await;

    assert!(res.ok, "upload failed: {:?}", res.error);
    assert_eq!(
        res.data,
        Some(json!({ "type": "image", "filename": "puppy.png", "size": 64 }))
    );
}

#[tokio::test]
async fn test_invalid_mime_is_failure() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let file = UploadFile::new("x.bin", vec![1u8]).with_mime("not a mime");
    let res = client.upload(file, "document").await;
    assert!(!res.ok);
    assert!(res.error.unwrap().starts_with("Failed to encode request"));
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let addr = spawn_backend(kennel_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    let (good, bad) = tokio::join!(client.get("dogs"), client.get("dogs/404"));
    assert!(good.ok);
    assert!(!bad.ok);

    let c1 = client.clone();
    let c2 = client.clone();
    let t1 = tokio::spawn(async move { c1.get("dogs/5").await });
    let t2 = tokio::spawn(async move { c2.get("crash").await });

    let (r1, r2) = (t1.await.unwrap(), t2.await.unwrap());
    assert!(r1.ok);
    assert_eq!(r1.data, Some(json!({ "id": 5 })));
    assert!(!r2.ok);
}

/// Backend that reports the path and query each request arrived with.
fn path_echo_backend() -> Router {
    Router::new().fallback(|uri: axum::http::Uri| async move {
        Json(json!({ "path": uri.path(), "query": uri.query() }))
    })
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let addr = spawn_backend(path_echo_backend()).await;

    let client = ApiClient::new(&format!("http://{}/kennel/", addr)).unwrap();
    let res = client.get("dogs").await;
    assert!(res.ok, "request failed: {:?}", res.error);
    assert_eq!(res.data.unwrap()["path"], "/kennel/api/dogs/");

    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();
    let res = client.get("dogs").await;
    assert_eq!(res.data.unwrap()["path"], "/api/dogs/");
}

#[tokio::test]
async fn test_resource_path_cannot_escape_api_root() {
    let addr = spawn_backend(path_echo_backend()).await;
    let client = ApiClient::new(&format!("http://{}", addr)).unwrap();

    for (resource, expected) in [
        ("../admin", "/api/admin/"),
        ("dogs/../../x", "/api/dogs/x/"),
        ("dogs#x", "/api/dogs/"),
        ("%2e%2e/admin", "/api/admin/"),
    ] {
        let res = client.get(resource).await;
        assert!(res.ok, "{}: {:?}", resource, res.error);
        assert_eq!(res.data.unwrap()["path"], expected, "resource {}", resource);
    }

    let res = client.get_with_params("../dogs", &[("sex", "F")]).await;
    let data = res.data.unwrap();
    assert_eq!(data["path"], "/api/dogs/");
    assert_eq!(data["query"], "sex=F");
}
