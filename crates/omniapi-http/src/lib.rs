//! OmniAPI HTTP: the protocol router.
//!
//! Binds every API paradigm to its paths:
//! - `/openapi/{kind}` and `/swagger/{kind}`: resource-style JSON CRUD
//! - `/graphql`: GraphQL queries and mutations
//! - `/odata/{Set}`: OData entity sets with `$filter`, `$orderby`, `$top`
//! - `/wdsl`, `/wdsl/soap`: SOAP 1.1 envelopes
//! - `/jsonrpc`: JSON-RPC 2.0 calls and batches
//! - schema documents, health, Swagger UI, request-ID and auth middleware

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post};
use omniapi_service::types::{Car, Dinosaur, Discovery, MedicalRecord, Movie, Owner, Pet, Plant};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use error::ErrorBody;
use routes::system::HealthResponse;

pub use state::AppState;

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

/// Record CRUD paths, mounted under both `/openapi` and `/swagger`.
#[derive(OpenApi)]
#[openapi(paths(
    routes::rest::list_records,
    routes::rest::create_record,
    routes::rest::get_record,
    routes::rest::update_record,
    routes::rest::delete_record,
))]
struct RecordsApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OmniAPI Records",
        description = "Resource-style access to pets, dinosaurs, cars, movies and plants.\n\nA `name` of the form `\"Buddy (Beagle)\"` sets both the record's name and its secondary attribute.",
        version = "0.3.0",
        license(name = "Apache-2.0"),
    ),
    nest((path = "/openapi", api = RecordsApi)),
    paths(routes::system::health),
    components(schemas(
        Pet, Owner, MedicalRecord, Dinosaur, Discovery, Car, Movie, Plant,
        ErrorBody, HealthResponse,
    )),
    tags(
        (name = "Records", description = "Create, read, update and delete records"),
        (name = "System", description = "System and health endpoints"),
    )
)]
struct OpenApiDoc;

/// Bearer-authenticated variant of the same resource API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OmniAPI Records (bearer)",
        description = "The record API behind `Authorization: Bearer <token>`.",
        version = "0.3.0",
        license(name = "Apache-2.0"),
    ),
    nest((path = "/swagger", api = RecordsApi)),
    components(schemas(
        Pet, Owner, MedicalRecord, Dinosaur, Discovery, Car, Movie, Plant, ErrorBody,
    )),
    modifiers(&BearerAuth),
    security(("bearer" = [])),
    tags((name = "Records", description = "Create, read, update and delete records"))
)]
struct SwaggerDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the HTTP router with every protocol mounted.
pub fn router(state: AppState) -> Router {
    use routes::{graphql, jsonrpc, odata, rest, soap, system};

    let docs = SwaggerUi::new("/api/docs")
        .url("/openapi/openapi.json", OpenApiDoc::openapi())
        .url("/swagger/swagger.json", SwaggerDoc::openapi());

    let app = Router::new()
        // Resource-style REST (open and bearer variants share handlers)
        .route("/openapi/{kind}", get(rest::list_records).post(rest::create_record))
        .route(
            "/openapi/{kind}/{id}",
            get(rest::get_record).put(rest::update_record).delete(rest::delete_record),
        )
        .route("/swagger/{kind}", get(rest::list_records).post(rest::create_record))
        .route(
            "/swagger/{kind}/{id}",
            get(rest::get_record).put(rest::update_record).delete(rest::delete_record),
        )
        // GraphQL
        .route("/graphql", post(graphql::execute))
        .route("/graphql/schema", get(graphql::schema))
        // OData
        .route("/odata", get(odata::service_document))
        .route("/odata/", get(odata::service_document))
        .route(
            "/odata/{resource}",
            get(odata::get_resource)
                .post(odata::create_entity)
                .patch(odata::patch_entity)
                .delete(odata::delete_entity),
        )
        // SOAP (GET on the endpoint returns the WSDL)
        .route("/wdsl", get(soap::wsdl).post(soap::call))
        .route("/wdsl/soap", post(soap::call))
        .route("/wdsl/wsdl", get(soap::wsdl))
        // JSON-RPC
        .route("/jsonrpc", post(jsonrpc::call))
        .route("/jsonrpc/openrpc.json", get(jsonrpc::openrpc))
        // System
        .route("/health", get(system::health))
        .merge(docs)
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ));

    app.layer(cors_layer(&state)).with_state(state)
}

/// Serve the HTTP router on the given listener with graceful shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins = state.cors_origins();

    // No origins configured → no CORS headers (deny cross-origin by default).
    if origins.is_empty() {
        return CorsLayer::new();
    }

    let x_request_id = middleware::request_id::X_REQUEST_ID.clone();
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("soapaction"),
            x_request_id.clone(),
        ])
        .expose_headers([x_request_id]);

    if origins.len() == 1 && origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard origin, all cross-origin requests allowed");
        base.allow_origin(tower_http::cors::Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        base.allow_origin(parsed)
    }
}
