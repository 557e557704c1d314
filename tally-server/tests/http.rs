use {
    hyper::{Method, StatusCode, header::{HeaderMap, HeaderValue}},
    http_body_util::BodyExt,
    serde_json::json,
    tokio::net::TcpListener,
    tally_core::{AttributeValue, CounterRecord, Item},
    tally_store::{BoxedTable, MemoryTable, Table, TableRegistry, WithItem},
    tally_handler::{CounterHandler, HandlerConfig},
    tally_server::CounterServer,
};

const TABLE_NAME: &str = "counter-table";
const API_KEY: &str = "secret-key";

fn server_with(table: MemoryTable, api_key: Option<&str>) -> CounterServer {
    let tables = TableRegistry::new().with_table(TABLE_NAME, BoxedTable::new(table)).unwrap();
    CounterServer::new(CounterHandler::new(tables, HandlerConfig::new(TABLE_NAME)), api_key.map(|v| v.to_owned())).unwrap()
}

fn seeded(counter: u64) -> MemoryTable {
    MemoryTable::new().with_item(&CounterRecord::key(), CounterRecord::new(counter)).unwrap()
}

fn api_key_headers(key: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_static(key));
    headers
}

async fn body_string(response: hyper::Response<http_body_util::Full<hyper::body::Bytes>>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn counter_route_increments() {
    let table = seeded(10);
    let server = server_with(table.clone(), Some(API_KEY));

    let response = server.route(&Method::GET, "/counter", &api_key_headers(API_KEY));

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!("application/json", response.headers()["content-type"]);
    assert_eq!(
        json!({"message": "Success", "data": "11"}),
        serde_json::from_str::<serde_json::Value>(&body_string(response).await).unwrap(),
    );
    assert_eq!(1, server.metrics().invocations());
}

#[tokio::test]
async fn missing_or_wrong_api_key_is_forbidden() {
    let table = seeded(0);
    let server = server_with(table.clone(), Some(API_KEY));

    for headers in [HeaderMap::new(), api_key_headers("wrong")] {
        let response = server.route(&Method::GET, "/counter", &headers);
        assert_eq!(StatusCode::FORBIDDEN, response.status());
        assert_eq!(r#"{"message":"Forbidden"}"#, body_string(response).await);
    }

    assert_eq!(0, server.metrics().invocations());
    assert_eq!(Some(Item::from(CounterRecord::new(0))), table.get_item(&CounterRecord::key()).unwrap());
}

#[tokio::test]
async fn no_api_key_configured_allows_everyone() {
    let server = server_with(seeded(0), None);
    let response = server.route(&Method::GET, "/counter", &HeaderMap::new());
    assert_eq!(StatusCode::OK, response.status());
}

#[tokio::test]
async fn handler_failure_is_forwarded() {
    let table = MemoryTable::new()
        .with_item(&CounterRecord::key(), Item::new().with_attribute("counter", AttributeValue::string("test")))
        .unwrap();
    let server = server_with(table, None);

    let response = server.route(&Method::GET, "/counter", &HeaderMap::new());

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
    assert!(response.headers().get("content-type").is_none());
    assert!(body_string(response).await.starts_with("Error details: "));
    assert_eq!(1, server.metrics().invocation_failures());
}

#[tokio::test]
async fn other_routes() {
    let server = server_with(seeded(0), None);

    assert_eq!(StatusCode::NOT_FOUND, server.route(&Method::GET, "/", &HeaderMap::new()).status());
    assert_eq!(StatusCode::METHOD_NOT_ALLOWED, server.route(&Method::POST, "/counter", &HeaderMap::new()).status());

    let metrics = server.route(&Method::GET, "/metrics", &HeaderMap::new());
    assert_eq!(StatusCode::OK, metrics.status());
    assert!(body_string(metrics).await.contains("http_requests_total"));
}

#[tokio::test]
async fn dispatch_runs_on_worker_pool() {
    let server = server_with(seeded(1), None);
    let response = server.dispatch(Method::GET, "/counter".to_owned(), HeaderMap::new()).await;
    assert_eq!(StatusCode::OK, response.status());
    assert!(body_string(response).await.contains(r#""data":"2""#));
}

#[tokio::test]
async fn serve_over_http() {
    let table = seeded(0);
    let server = server_with(table.clone(), Some(API_KEY));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = tokio::spawn({
        let server = server.clone();
        async move { server.serve(listener).await }
    });

    let client = reqwest::Client::new();
    for expected in 1..=3 {
        let response = client.get(format!("http://{addr}/counter"))
            .header("x-api-key", API_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(200, response.status().as_u16());
        let body: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(json!({"message": "Success", "data": expected.to_string()}), body);
    }

    let forbidden = client.get(format!("http://{addr}/counter")).send().await.unwrap();
    assert_eq!(403, forbidden.status().as_u16());

    serving.abort();
    assert_eq!(Some(Item::from(CounterRecord::new(3))), table.get_item(&CounterRecord::key()).unwrap());
}
