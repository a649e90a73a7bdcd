//! Integration tests for the OmniAPI Server.
//!
//! Each test starts an in-memory, seeded server on an ephemeral port and
//! uses reqwest to exercise one protocol end to end.

use reqwest::Client;
use serde_json::{Value, json};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Boots an in-memory server on an OS-assigned port.
/// Returns the base URL (e.g. "http://127.0.0.1:12345").
async fn spawn_server() -> String {
    spawn_with(omniapi_http::AppState::new_in_memory()).await
}

async fn spawn_with(state: omniapi_http::AppState) -> String {
    let app = omniapi_http::router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn strict_server() -> String {
    let service = omniapi_service::ServiceState::new(&omniapi_service::ServiceConfig {
        odata_strict: true,
        ..omniapi_service::ServiceConfig::default()
    });
    spawn_with(omniapi_http::AppState::new(service, vec![])).await
}

fn soap_envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    {body}
  </soap:Body>
</soap:Envelope>"#
    )
}

// ---------------------------------------------------------------------------
// Health and middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_record_counts() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
    assert!(body["records"]["pets"].as_u64().unwrap() >= 3);
    assert!(body["records"]["movies"].as_u64().unwrap() >= 5);
}

#[tokio::test]
async fn request_id_generated_when_absent() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    let id = resp
        .headers()
        .get("x-request-id")
        .expect("missing x-request-id")
        .to_str()
        .unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn request_id_preserved_on_rejection() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/swagger/dinosaurs"))
        .header("x-request-id", "my-custom-id-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.headers()["x-request-id"], "my-custom-id-123");
}

#[derive(Clone, Default)]
struct LogCapture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn rejected_requests_are_traced() {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let base = spawn_server().await;
    let resp = Client::new()
        .get(format!("{base}/swagger/dinosaurs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("finished processing request"), "{logs}");
    assert!(logs.contains("status=401"), "{logs}");
}

// ---------------------------------------------------------------------------
// OpenAPI-style REST
// ---------------------------------------------------------------------------

#[tokio::test]
async fn openapi_list_pets_with_limit() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/openapi/pets?limit=5"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let pets: Vec<Value> = resp.json().await.unwrap();
    assert!(!pets.is_empty() && pets.len() <= 5);
    let first = &pets[0];
    assert!(first["owner"]["name"].is_string());
    assert!(!first["medical"].as_array().unwrap().is_empty());
    assert!(!first["tags"].as_array().unwrap().is_empty());

    let resp = client
        .get(format!("{base}/openapi/pets?limit=1"))
        .send()
        .await
        .unwrap();
    let pets: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(pets.len(), 1);
}

#[tokio::test]
async fn openapi_pet_crud_cycle() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/openapi/pets"))
        .json(&json!({"name": "Buddy (Beagle)"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["name"], "Buddy");
    assert_eq!(created["breed"], "Beagle");

    let resp = client
        .get(format!("{base}/openapi/pets/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let pet: Value = resp.json().await.unwrap();
    assert_eq!(pet["id"], "1");
    assert_eq!(pet["name"], "Max");

    let resp = client
        .put(format!("{base}/openapi/pets/1"))
        .json(&json!({"name": "Max Updated (Golden Retriever)"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["id"], "1");
    assert_eq!(updated["name"], "Max Updated");
    assert_eq!(updated["breed"], "Golden Retriever");
    assert_eq!(updated["owner"], pet["owner"]);

    let resp = client
        .delete(format!("{base}/openapi/pets/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{base}/openapi/pets/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn openapi_errors() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/openapi/unicorns"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{base}/openapi/cars?limit=lots"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");

    let resp = client
        .post(format!("{base}/openapi/cars"))
        .header("content-type", "application/json")
        .body("{broken")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let before: Vec<Value> = client
        .get(format!("{base}/openapi/pets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let resp = client
        .post(format!("{base}/openapi/pets"))
        .json(&json!({"name": 5, "age": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");

    let resp = client
        .put(format!("{base}/openapi/pets/1"))
        .json(&json!({"name": {"first": "Max"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let after: Vec<Value> = client
        .get(format!("{base}/openapi/pets"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after, before);
}

// ---------------------------------------------------------------------------
// Swagger-style REST (bearer)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn swagger_requires_bearer_token() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/swagger/dinosaurs"))
        .bearer_auth("dino-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let dinos: Vec<Value> = resp.json().await.unwrap();
    let before = dinos.len();
    assert!(dinos[0]["species"].is_string());
    assert!(dinos[0]["discovered"]["year"].is_i64());
    assert!(!dinos[0]["features"].as_array().unwrap().is_empty());

    let resp = client
        .post(format!("{base}/swagger/dinosaurs"))
        .json(&json!({"name": "Ghost (Unknown)"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let resp = client
        .get(format!("{base}/swagger/dinosaurs"))
        .bearer_auth("dino-token")
        .send()
        .await
        .unwrap();
    let dinos: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(dinos.len(), before);

    let resp = client
        .get(format!("{base}/swagger/dinosaurs"))
        .header("authorization", "bearer dino-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn swagger_create_dinosaur() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/swagger/dinosaurs"))
        .bearer_auth("dino-token")
        .json(&json!({"name": "Spinosaurus (Spinosaurus aegyptiacus)"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let dino: Value = resp.json().await.unwrap();
    assert_eq!(dino["name"], "Spinosaurus");
    assert_eq!(dino["species"], "Spinosaurus aegyptiacus");
}

#[tokio::test]
async fn configured_bearer_token_must_match() {
    let service = omniapi_service::ServiceState::new(&omniapi_service::ServiceConfig {
        bearer_token: Some("s3cret".into()),
        ..omniapi_service::ServiceConfig::default()
    });
    let base = spawn_with(omniapi_http::AppState::new(service, vec![])).await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/swagger/cars"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{base}/swagger/cars"))
        .bearer_auth("s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

#[tokio::test]
async fn graphql_list_cars() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/graphql"))
        .basic_auth("graphql-user", Some("graphql-pass"))
        .json(&json!({"query": "query{listCars(limit:5){id name}}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let cars = body["data"]["listCars"].as_array().unwrap();
    assert_eq!(cars.len(), 5);
    for car in cars {
        assert_eq!(car.as_object().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn graphql_create_car() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/graphql"))
        .basic_auth("graphql-user", Some("graphql-pass"))
        .json(&json!({"query": r#"mutation{createCar(name:"Porsche 911"){id name}}"#}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["createCar"]["name"], "Porsche 911");
    assert!(body["data"]["createCar"]["id"].is_string());
}

#[tokio::test]
async fn graphql_unknown_mutation_is_error_envelope() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/graphql"))
        .basic_auth("graphql-user", Some("graphql-pass"))
        .json(&json!({"query": r#"mutation { createUnicorn(name: "x") { id } }"#}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(!body["errors"].as_array().unwrap().is_empty());
    assert!(body.get("data").is_none_or(|d| d.get("createUnicorn").is_none()));
}

#[tokio::test]
async fn graphql_rejects_bad_credentials() {
    let base = spawn_server().await;
    let client = Client::new();

    for auth in [None, Some("wrong-pass")] {
        let mut req = client
            .post(format!("{base}/graphql"))
            .json(&json!({"query": "{ listCars { id } }"}));
        if let Some(pass) = auth {
            req = req.basic_auth("graphql-user", Some(pass));
        }
        let resp = req.send().await.unwrap();
        assert_eq!(resp.status(), 401);
        assert!(resp.headers().contains_key("www-authenticate"));
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["errors"][0]["extensions"]["code"], "unauthorized");
    }
}

#[tokio::test]
async fn graphql_malformed_body_is_400() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/graphql"))
        .basic_auth("graphql-user", Some("graphql-pass"))
        .header("content-type", "application/json")
        .body("{\"nope\": 1}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["errors"].is_array());
}

// ---------------------------------------------------------------------------
// OData
// ---------------------------------------------------------------------------

async fn odata_movies(client: &Client, base: &str, params: &[(&str, &str)]) -> Vec<Value> {
    let resp = client
        .get(format!("{base}/odata/Movies"))
        .query(params)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["value"].as_array().unwrap().clone()
}

#[tokio::test]
async fn odata_list_movies() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client.get(format!("{base}/odata/Movies")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["@odata.context"], "$metadata#Movies");
    assert!(body["value"].as_array().unwrap().len() >= 5);
}

#[tokio::test]
async fn odata_filter_and_order() {
    let base = spawn_server().await;
    let client = Client::new();

    let recent = odata_movies(&client, &base, &[("$filter", "Year gt 2010")]).await;
    assert!(!recent.is_empty());
    assert!(recent.iter().all(|m| m["Year"].as_i64().unwrap() > 2010));

    let top = odata_movies(&client, &base, &[("$orderby", "Rating desc"), ("$top", "3")]).await;
    assert_eq!(top.len(), 3);
    let ratings: Vec<f64> = top.iter().map(|m| m["Rating"].as_f64().unwrap()).collect();
    assert!(ratings.windows(2).all(|w| w[0] >= w[1]));

    let both = odata_movies(
        &client,
        &base,
        &[("$filter", "Genre eq 'Sci-Fi' or Genre eq 'Action'"), ("$orderby", "Year")],
    )
    .await;
    let years: Vec<i64> = both.iter().map(|m| m["Year"].as_i64().unwrap()).collect();
    assert_eq!(years, [2008, 2010, 2015, 2021]);
}

#[tokio::test]
async fn odata_lenient_and_strict_modes() {
    let client = Client::new();

    let base = spawn_server().await;
    let all = odata_movies(&client, &base, &[]).await;
    let lenient = odata_movies(&client, &base, &[("$filter", "Year greater 2010")]).await;
    assert_eq!(lenient.len(), all.len());

    let base = strict_server().await;
    let resp = client
        .get(format!("{base}/odata/Movies"))
        .query(&[("$filter", "Year greater 2010")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn odata_entity_lifecycle() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/odata/Movies"))
        .json(&json!({
            "Title": "Interstellar",
            "Year": 2014,
            "Genre": "Sci-Fi",
            "Rating": 8.6,
            "Director": "Christopher Nolan"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let movie: Value = resp.json().await.unwrap();
    assert_eq!(movie["Title"], "Interstellar");
    let id = movie["ID"].as_str().unwrap().to_owned();

    let resp = client
        .patch(format!("{base}/odata/Movies('{id}')"))
        .json(&json!({"Rating": 8.7}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let movie: Value = resp.json().await.unwrap();
    assert_eq!(movie["Rating"], 8.7);
    assert_eq!(movie["Title"], "Interstellar");

    let resp = client
        .delete(format!("{base}/odata/Movies({id})"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .get(format!("{base}/odata/Movies('{id}')"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn odata_unknown_entity_set() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client.get(format!("{base}/odata/Unicorns")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client.get(format!("{base}/odata/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["value"].as_array().unwrap().len(), 5);
}

// ---------------------------------------------------------------------------
// SOAP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn soap_list_plants() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/wdsl"))
        .header("content-type", "text/xml")
        .bearer_auth("mock-token")
        .body(soap_envelope(
            r#"<ListPlants xmlns="http://example.com/plants"><Limit>5</Limit></ListPlants>"#,
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/xml")
    );
    let xml = resp.text().await.unwrap();
    assert!(xml.contains("<soap:Envelope"));
    assert!(xml.contains("<ListPlantsResponse"));
    assert!(xml.contains("<Plant>"));
}

#[tokio::test]
async fn soap_create_plant() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/wdsl/soap"))
        .header("content-type", "text/xml")
        .bearer_auth("mock-token")
        .body(soap_envelope(
            r#"<CreatePlant xmlns="http://example.com/plants"><name>Bamboo</name></CreatePlant>"#,
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let xml = resp.text().await.unwrap();
    assert!(xml.contains("Bamboo"));
    assert!(!xml.contains("soap:Fault"));
}

#[tokio::test]
async fn soap_faults_are_in_band() {
    let base = spawn_server().await;
    let client = Client::new();

    for body in [soap_envelope(""), "not xml <".to_owned()] {
        let resp = client
            .post(format!("{base}/wdsl"))
            .header("content-type", "text/xml")
            .bearer_auth("mock-token")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let xml = resp.text().await.unwrap();
        assert!(xml.contains("<soap:Fault>"));
        assert!(xml.contains("soap:Client"));
    }

    let resp = client
        .post(format!("{base}/wdsl"))
        .header("content-type", "application/json")
        .bearer_auth("mock-token")
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("<soap:Fault>"));
}

#[tokio::test]
async fn soap_requires_bearer_token() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .post(format!("{base}/wdsl"))
        .header("content-type", "text/xml")
        .body(soap_envelope("<ListPlants/>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let xml = resp.text().await.unwrap();
    assert!(xml.contains("<soap:Fault>"));
    assert!(xml.contains("<code>unauthorized</code>"));
}

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

async fn rpc(client: &Client, base: &str, body: Value) -> Value {
    let resp = client
        .post(format!("{base}/jsonrpc"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn jsonrpc_calculator() {
    let base = spawn_server().await;
    let client = Client::new();

    for (method, a, b, expected) in [("add", 5, 3, 8.0), ("multiply", 4, 7, 28.0), ("divide", 10, 2, 5.0)] {
        let body = rpc(
            &client,
            &base,
            json!({"jsonrpc": "2.0", "method": method, "params": {"a": a, "b": b}, "id": 1}),
        )
        .await;
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"].as_f64(), Some(expected), "{method}");
        assert!(body.get("error").is_none());
    }
}

#[tokio::test]
async fn jsonrpc_divide_by_zero() {
    let base = spawn_server().await;
    let client = Client::new();

    let body = rpc(
        &client,
        &base,
        json!({"jsonrpc": "2.0", "method": "divide", "params": {"a": 10, "b": 0}, "id": 4}),
    )
    .await;
    assert!(body.get("result").is_none());
    assert_eq!(body["error"]["code"], -32000);
    assert_eq!(body["error"]["message"], "division by zero");
    assert_eq!(body["id"], 4);
}

#[tokio::test]
async fn jsonrpc_protocol_errors_still_200() {
    let base = spawn_server().await;
    let client = Client::new();

    let body = rpc(&client, &base, json!({"jsonrpc": "2.0", "method": "sqrt", "id": 2})).await;
    assert_eq!(body["error"]["code"], -32601);

    let resp = client
        .post(format!("{base}/jsonrpc"))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);

    let body = rpc(
        &client,
        &base,
        json!([
            {"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": "a"},
            {"jsonrpc": "2.0", "method": "getPet", "params": {"id": "999"}, "id": "b"},
        ]),
    )
    .await;
    assert_eq!(body[0]["result"], 3);
    assert_eq!(body[1]["error"]["code"], -32001);
}

// ---------------------------------------------------------------------------
// Schema documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn schema_documents_need_no_credentials() {
    let base = spawn_server().await;
    let client = Client::new();

    let resp = client
        .get(format!("{base}/openapi/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let doc: Value = resp.json().await.unwrap();
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert!(doc["paths"].get("/openapi/{kind}").is_some());

    let resp = client
        .get(format!("{base}/swagger/swagger.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let doc: Value = resp.json().await.unwrap();
    assert!(doc["paths"].get("/swagger/{kind}/{id}").is_some());
    assert!(doc["components"]["securitySchemes"].get("bearer").is_some());

    let sdl = client
        .get(format!("{base}/graphql/schema"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(sdl.contains("listCars(limit: Int)"));

    for path in ["/wdsl", "/wdsl/wsdl"] {
        let resp = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert!(resp.text().await.unwrap().contains("wsdl:definitions"));
    }

    let resp = client
        .get(format!("{base}/jsonrpc/openrpc.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let doc: Value = resp.json().await.unwrap();
    assert!(
        doc["methods"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m["name"] == "divide")
    );
}
