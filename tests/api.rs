//! Black-box tests: a real server on an ephemeral port, driven over HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};
use stockroom::{AppState, DEFAULT_BODY_LIMIT, Server, Store, app};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

const KEY: &str = "integration-key";

struct TestServer {
    addr: SocketAddr,
    base_url: String,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_key(Some(KEY)).await
    }

    async fn spawn_with_key(key: Option<&str>) -> Self {
        let router = app::router(AppState::new(Store::seeded()), key.map(str::to_owned));
        let server = Server::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server
                .serve_with_shutdown(router, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).header("x-api-key", KEY)
    }

    fn post(&self, path: &str, body: &Value) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).header("x-api-key", KEY).json(body)
    }

    fn put(&self, path: &str, body: &Value) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).header("x-api-key", KEY).json(body)
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).header("x-api-key", KEY)
    }

    /// Sends a raw request head with no body bytes and returns the status
    /// line of the answer.
    async fn raw_status_line(&self, head: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(head.as_bytes()).await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        tokio::time::timeout(Duration::from_secs(5), async {
            while !buf.windows(2).any(|w| w == b"\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before a status line");
                buf.extend_from_slice(&chunk[..n]);
            }
        })
        .await
        .expect("no response before the timeout");

        let text = String::from_utf8_lossy(&buf);
        text.lines().next().unwrap_or_default().to_owned()
    }

    async fn products(&self) -> Vec<Value> {
        let res = self.get("/api/products").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

fn mouse() -> Value {
    json!({
        "name": "Mouse",
        "description": "Wireless",
        "price": 25,
        "category": "electronics",
        "inStock": true
    })
}

#[tokio::test]
async fn root_returns_welcome_text() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().starts_with("Welcome to the Product API!"));
}

#[tokio::test]
async fn seeded_store_lists_three_products() {
    let srv = TestServer::spawn().await;
    let products = srv.products().await;
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["id"], "1");
    assert_eq!(products[0]["name"], "Laptop");
    assert_eq!(products[2]["inStock"], false);
}

#[tokio::test]
async fn create_mouse_then_list_has_four() {
    let srv = TestServer::spawn().await;

    let res = srv.post("/api/products", &mouse()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], "4");

    assert_eq!(srv.products().await.len(), 4);
}

#[tokio::test]
async fn get_after_create_returns_submitted_fields() {
    let srv = TestServer::spawn().await;
    let created: Value = srv
        .post("/api/products", &mouse())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let res = srv.get(&format!("/api/products/{id}")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();

    let mut expected = mouse();
    expected["id"] = json!(id);
    assert_eq!(fetched, expected);
}

#[tokio::test]
async fn created_ids_stay_unique_across_deletes() {
    let srv = TestServer::spawn().await;
    let mut seen: Vec<String> = srv
        .products()
        .await
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_owned())
        .collect();

    for round in 0..3 {
        let created: Value = srv
            .post("/api/products", &mouse())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_owned();
        assert!(!seen.contains(&id), "id {id} reused in round {round}");
        seen.push(id);

        let res = srv.delete("/api/products/1").send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn unknown_id_is_404_with_message() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/api/products/999").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "Product not found"}));
}

#[tokio::test]
async fn partial_put_changes_only_given_field() {
    let srv = TestServer::spawn().await;
    let before = srv.products().await[0].clone();

    let res = srv
        .put("/api/products/1", &json!({"inStock": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();

    let mut expected = before;
    expected["inStock"] = json!(false);
    assert_eq!(updated, expected);
    assert_eq!(srv.products().await[0], expected);
}

#[tokio::test]
async fn put_price_only_keeps_other_fields() {
    let srv = TestServer::spawn().await;
    let res = srv
        .put("/api/products/2", &json!({"price": 750}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["price"], 750);
    assert_eq!(updated["name"], "Smartphone");
    assert_eq!(updated["inStock"], true);
}

#[tokio::test]
async fn put_unknown_id_is_404() {
    let srv = TestServer::spawn().await;
    let res = srv
        .put("/api/products/999", &json!({"price": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_id_still_succeeds() {
    let srv = TestServer::spawn().await;
    let res = srv.delete("/api/products/999").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"message": "Product deleted successfully"}));
    assert_eq!(srv.products().await.len(), 3);
}

#[tokio::test]
async fn delete_removes_product() {
    let srv = TestServer::spawn().await;
    let res = srv.delete("/api/products/2").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.get("/api/products/2").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.products().await.len(), 2);
}

#[tokio::test]
async fn writes_without_valid_key_are_401_and_do_not_mutate() {
    let srv = TestServer::spawn().await;

    let missing = srv
        .client
        .post(srv.url("/api/products"))
        .json(&mouse())
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body, json!({"message": "Unauthorized: Invalid API key"}));

    let wrong = srv
        .client
        .delete(srv.url("/api/products/1"))
        .header("x-api-key", "not-the-key")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let wrong_put = srv
        .client
        .put(srv.url("/api/products/1"))
        .header("x-api-key", "not-the-key")
        .json(&json!({"price": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_put.status(), StatusCode::UNAUTHORIZED);

    let products = srv.products().await;
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["price"], 1200);
}

#[tokio::test]
async fn reads_also_require_key() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/api/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn no_configured_key_rejects_everything() {
    let srv = TestServer::spawn_with_key(None).await;
    let res = srv.get("/").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn text_price_is_400_and_does_not_mutate() {
    let srv = TestServer::spawn().await;
    let mut body = mouse();
    body["price"] = json!("50");

    let res = srv.post("/api/products", &body).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let msg: Value = res.json().await.unwrap();
    assert_eq!(msg, json!({"message": "Price must be a number"}));

    let res = srv
        .put("/api/products/1", &json!({"price": "50"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let products = srv.products().await;
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["price"], 1200);
}

#[tokio::test]
async fn create_with_missing_field_is_400() {
    let srv = TestServer::spawn().await;
    let res = srv
        .post("/api/products", &json!({"name": "Mouse", "price": 25}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let msg: Value = res.json().await.unwrap();
    assert_eq!(msg, json!({"message": "All fields are required"}));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/api/products"))
        .header("x-api-key", KEY)
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(srv.products().await.len(), 3);
}

#[tokio::test]
async fn wrong_method_on_known_path_is_405_envelope() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .patch(srv.url("/api/products/1"))
        .header("x-api-key", KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn oversized_body_is_413_envelope_and_does_not_mutate() {
    let srv = TestServer::spawn().await;
    let name = "x".repeat(DEFAULT_BODY_LIMIT);
    let res = srv
        .post(
            "/api/products",
            &json!({"name": name, "description": "d", "price": 1, "category": "c", "inStock": true}),
        )
        .send()
        .await;

    // The server may close the connection before the client finishes
    // sending; only a response that did arrive is inspected.
    if let Ok(res) = res {
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        if let Ok(body) = res.json::<Value>().await {
            assert_eq!(body["status"], "error");
        }
    }

    let head = format!(
        "POST /api/products HTTP/1.1\r\nhost: localhost\r\nx-api-key: {KEY}\r\n\
         content-type: application/json\r\ncontent-length: {}\r\n\r\n",
        64 * 1024 * 1024
    );
    assert!(srv.raw_status_line(&head).await.starts_with("HTTP/1.1 413"));
    assert_eq!(srv.products().await.len(), 3);
}

#[tokio::test]
async fn oversized_body_without_key_is_401_before_reading() {
    let srv = TestServer::spawn().await;
    let head = format!(
        "POST /api/products HTTP/1.1\r\nhost: localhost\r\n\
         content-type: application/json\r\ncontent-length: {}\r\n\r\n",
        64 * 1024 * 1024
    );
    assert!(srv.raw_status_line(&head).await.starts_with("HTTP/1.1 401"));
}

#[tokio::test]
async fn unknown_method_is_authenticated_before_405() {
    let srv = TestServer::spawn().await;
    let purge = reqwest::Method::from_bytes(b"PURGE").unwrap();

    let res = srv.client.request(purge.clone(), srv.url("/api/products/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .request(purge, srv.url("/api/products/1"))
        .header("x-api-key", KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Method not allowed"}));
}
