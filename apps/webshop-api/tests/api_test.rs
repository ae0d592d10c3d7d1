//! End-to-end tests: the router served on an ephemeral port, driven with
//! raw HTTP/1.1 requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use webshop_api::notify::Mailer;
use webshop_api::{build_router, ApiConfig, AppState, MemoryMailer};
use webshop_core::notification::EmailMessage;
use webshop_db::{Database, DbConfig};

struct TestApp {
    addr: SocketAddr,
    mailer: Arc<MemoryMailer>,
}

async fn spawn_app() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = ApiConfig::from_lookup(|_| None).unwrap();
    let mailer = Arc::new(MemoryMailer::new());
    let state = AppState::new(db, config, mailer.clone() as Arc<dyn Mailer>);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    TestApp { addr, mailer }
}

impl TestApp {
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let payload = body.map(|b| b.to_string()).unwrap_or_default();
        let mut req = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        if !payload.is_empty() {
            req.push_str("Content-Type: application/json\r\n");
        }
        req.push_str(&format!("Content-Length: {}\r\n\r\n{payload}", payload.len()));
        stream.write_all(req.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8(raw).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        let status: u16 = head.split_whitespace().nth(1).unwrap().parse().unwrap();
        let body = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
        };
        (status, body)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        self.request("GET", path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        self.request("POST", path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> (u16, Value) {
        self.request("PATCH", path, Some(body)).await
    }

    async fn webshop(&self) -> i64 {
        let (status, shop) = self
            .post("/api/webshop", json!({"name": "Yoga Studio", "active": true}))
            .await;
        assert_eq!(status, 201);
        shop["id"].as_i64().unwrap()
    }

    async fn wait_for_emails(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let sent = self.mailer.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.mailer.sent()
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn webshop_detail_counts_catalog() {
    let app = spawn_app().await;
    let shop = app.webshop().await;

    let (status, category) = app
        .post("/api/category", json!({"webshop_id": shop, "name": "Mats"}))
        .await;
    assert_eq!(status, 201);
    app.post(
        "/api/product",
        json!({"webshop_id": shop, "name": "Travel mat", "category_id": category["id"]}),
    )
    .await;

    let (status, detail) = app.get(&format!("/api/webshop/{shop}")).await;
    assert_eq!(status, 200);
    assert_eq!(detail["num_products"], 1);
    assert_eq!(detail["num_categories"], 1);

    let (status, _) = app.request("DELETE", &format!("/api/webshop/{shop}"), None).await;
    assert_eq!(status, 204);
    let (status, body) = app.get(&format!("/api/webshop/{shop}")).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn prices_are_derived_on_create() {
    let app = spawn_app().await;
    let shop = app.webshop().await;

    let (status, tea) = app
        .post(
            "/api/product",
            json!({"webshop_id": shop, "name": "Green tea", "vat": 6, "price_excl_vat": "1.3456"}),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(tea["price"], "1.43");
    assert_eq!(tea["vat"], 6);

    let (_, mat) = app
        .post(
            "/api/product",
            json!({"webshop_id": shop, "name": "Studio mat", "vat": 21, "price": "100.00"}),
        )
        .await;
    assert_eq!(mat["price_excl_vat"], "82.64");

    // Re-pricing with only `price` makes it the source again
    let (status, mat) = app
        .patch(&format!("/api/product/{}", mat["id"]), json!({"price": "121.00"}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(mat["price"], "121.00");
    assert_eq!(mat["price_excl_vat"], "100.00");
}

#[tokio::test]
async fn oversized_prices_are_rejected() {
    let app = spawn_app().await;
    let shop = app.webshop().await;

    let (status, body) = app
        .post(
            "/api/product",
            json!({"webshop_id": shop, "name": "Gold", "price_excl_vat": "79228162514264337593543950335"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "price_excl_vat must not exceed 999999.99");

    let (status, gold) = app
        .post("/api/product", json!({"webshop_id": shop, "name": "Gold", "price": "999999.99"}))
        .await;
    assert_eq!(status, 201);
    let (status, body) = app
        .patch(&format!("/api/product/{}", gold["id"]), json!({"price": "1000000.00"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "price must not exceed 999999.99");

    let (status, body) = app
        .post("/api/order", json!({"total": "1000000.00"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "total must not exceed 999999.99");
}

#[tokio::test]
async fn structure_rules_reject_invalid_writes() {
    let app = spawn_app().await;
    let shop = app.webshop().await;

    let (status, body) = app
        .post("/api/product", json!({"webshop_id": shop, "structure": "child", "name": "M"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "A child product needs a parent.");

    let (status, body) = app
        .post(
            "/api/product",
            json!({"webshop_id": shop, "structure": "parent", "name": "Course", "price": "10.00"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "A parent product can't have stock records or a price.");

    let (status, body) = app
        .post(
            "/api/product",
            json!({"webshop_id": shop, "structure": "parent", "name": "Course", "price_excl_vat": "10.00"}),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "A parent product can't have stock records or a price.");

    let (status, body) = app.post("/api/product", json!({"webshop_id": shop})).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Your product must have a title.");

    let (status, body) = app
        .post("/api/product", json!({"webshop_id": shop, "name": "Mat", "vat": 19}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .post("/api/product", json!({"webshop_id": 9999, "name": "Orphan"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Invalid reference");
}

#[tokio::test]
async fn children_inherit_and_follow_their_parent() {
    let app = spawn_app().await;
    let shop = app.webshop().await;
    let (_, category) = app
        .post("/api/category", json!({"webshop_id": shop, "name": "Courses"}))
        .await;

    let (status, course) = app
        .post(
            "/api/product",
            json!({
                "webshop_id": shop, "structure": "parent", "name": "Yoga course",
                "vat": 21, "barcode": "8711", "category_id": category["id"],
                "is_discountable": false
            }),
        )
        .await;
    assert_eq!(status, 201);
    let course_id = course["id"].as_i64().unwrap();

    let mut days = Vec::new();
    for barcode in ["", "9001"] {
        let (status, day) = app
            .post(
                "/api/product",
                json!({
                    "webshop_id": shop, "structure": "child", "parent_id": course_id,
                    "barcode": barcode, "pcs_in_stock": 12, "price": "15.00"
                }),
            )
            .await;
        assert_eq!(status, 201, "{day}");
        days.push(day);
    }

    let monday = &days[0];
    assert_eq!(monday["title"], "Yoga course");
    assert_eq!(monday["vat"], 21);
    assert_eq!(monday["barcode"], "8711");
    assert_eq!(monday["is_discountable"], false);
    assert_eq!(monday["category"]["name"], "Courses");
    assert_eq!(days[1]["barcode"], "9001");

    let (_, course) = app.get(&format!("/api/product/{course_id}")).await;
    assert_eq!(course["has_children"], true);

    // Renaming the parent renames its children
    let (status, _) = app
        .patch(&format!("/api/product/{course_id}"), json!({"name": "Evening yoga"}))
        .await;
    assert_eq!(status, 200);
    let (_, monday) = app.get(&format!("/api/product/{}", days[0]["id"])).await;
    assert_eq!(monday["name"], "Evening yoga");

    // Deleting one of two children keeps the parent, the last one demotes it
    app.request("DELETE", &format!("/api/product/{}", days[0]["id"]), None).await;
    let (_, course) = app.get(&format!("/api/product/{course_id}")).await;
    assert_eq!(course["structure"], "parent");

    app.request("DELETE", &format!("/api/product/{}", days[1]["id"]), None).await;
    let (_, course) = app.get(&format!("/api/product/{course_id}")).await;
    assert_eq!(course["structure"], "standalone");
    assert_eq!(course["has_children"], false);
}

#[tokio::test]
async fn product_listing_paginates_and_filters() {
    let app = spawn_app().await;
    let shop = app.webshop().await;

    for i in 0..11 {
        app.post(
            "/api/product",
            json!({"webshop_id": shop, "name": format!("Mat {i}"), "featured": i % 2 == 0}),
        )
        .await;
    }

    let (status, page) = app
        .get(&format!("/api/product?webshop={shop}&page_size=5&page=3"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(page["count"], 11);
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert_eq!(page["previous"], 2);
    assert_eq!(page["next"], Value::Null);

    let (_, first) = app.get(&format!("/api/product?webshop={shop}")).await;
    assert_eq!(first["page_size"], 9);
    assert_eq!(first["results"].as_array().unwrap().len(), 9);

    let (_, ids) = app
        .get(&format!("/api/idonly/product?webshop={shop}&featured=true"))
        .await;
    assert_eq!(ids.as_array().unwrap().len(), 6);

    let (status, _) = app.get("/api/product?structure=bundle").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn orders_snapshot_items_and_send_status_emails() {
    let app = spawn_app().await;
    let shop = app.webshop().await;

    let (_, mat) = app
        .post(
            "/api/product",
            json!({"webshop_id": shop, "name": "Yoga mat", "vat": 21, "price_excl_vat": "20.00"}),
        )
        .await;
    assert_eq!(mat["price"], "24.20");

    let (status, order) = app
        .post(
            "/api/order",
            json!({
                "customer_id": 7, "webshop_id": shop, "email": "jane@example.com",
                "subtotal": "20.00", "vat": "4.20", "total": "24.20"
            }),
        )
        .await;
    assert_eq!(status, 201);
    let order_id = order["id"].as_i64().unwrap();

    let sent = app.wait_for_emails(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, format!("Order #{order_id}"));
    assert_eq!(sent[0].recipients, vec!["jane@example.com".to_string()]);

    let (status, item) = app
        .post(
            &format!("/api/order/{order_id}/items"),
            json!({"product_id": mat["id"], "quantity": 2}),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(item["name"], "Yoga mat");
    assert_eq!(item["price"], "24.20");

    // Later product edits leave the line frozen
    app.patch(
        &format!("/api/product/{}", mat["id"]),
        json!({"name": "Old mat", "price": "30.00"}),
    )
    .await;
    let (status, detail) = app.get(&format!("/api/order/{order_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(detail["webshop"]["id"], shop);
    assert_eq!(detail["items"][0]["name"], "Yoga mat");
    assert_eq!(detail["items"][0]["price"], "24.20");
    assert_eq!(detail["items"][0]["price_without_vat"], "20.00");

    // Only paid/shipped changes notify
    app.patch(&format!("/api/order/{order_id}"), json!({"address": "Main street 2"}))
        .await;
    let (status, order) = app
        .patch(&format!("/api/order/{order_id}"), json!({"paid": true}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(order["paid"], true);

    let sent = app.wait_for_emails(2).await;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].text_body.contains("We have received your payment."));

    let (_, orders) = app.get("/api/order?customer=7").await;
    assert_eq!(orders, json!([{"id": order_id, "paid": true, "shipped": false}]));
}

#[tokio::test]
async fn order_errors() {
    let app = spawn_app().await;

    let (status, body) = app
        .post("/api/order", json!({"email": "not-an-address"}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .post("/api/order/42/items", json!({"product_id": 1}))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Order not found: 42");

    let (status, order) = app.post("/api/order", json!({})).await;
    assert_eq!(status, 201);
    let items = format!("/api/order/{}/items", order["id"]);

    let (status, body) = app.post(&items, json!({"product_id": 99})).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Product not found: 99");

    let shop = app.webshop().await;
    let (_, mat) = app
        .post("/api/product", json!({"webshop_id": shop, "name": "Mat", "price": "10.00"}))
        .await;
    let (status, body) = app
        .post(&items, json!({"product_id": mat["id"], "quantity": 0}))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "quantity must be positive");

    // No price anywhere: not purchasable
    let (_, free) = app
        .post("/api/product", json!({"webshop_id": shop, "name": "Sample"}))
        .await;
    let (status, body) = app.post(&items, json!({"product_id": free["id"]})).await;
    assert_eq!(status, 400, "{body}");

    let (status, body) = app.request("POST", "/api/order", None).await;
    assert_eq!(status, 400, "{body}");
    assert!(app.mailer.sent().is_empty());
}
