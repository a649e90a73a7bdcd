//! JSON-RPC 2.0 dispatcher.
//!
//! Every outcome, including malformed JSON, is a JSON-RPC response object;
//! the transport always answers 200.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::ServiceError;
use crate::store::EntityStore;
use crate::types::EntityKind;

/// Standard JSON-RPC 2.0 error codes plus the server-defined range.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub const SERVER_ERROR: i32 = -32000;
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn parse_error(details: impl std::fmt::Display) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {details}"))
    }

    pub fn invalid_request(details: impl std::fmt::Display) -> Self {
        Self::new(codes::INVALID_REQUEST, format!("Invalid request: {details}"))
    }
}

impl From<ServiceError> for RpcError {
    fn from(e: ServiceError) -> Self {
        let code = match &e {
            ServiceError::BadRequest(_) => codes::INVALID_PARAMS,
            ServiceError::NotFound(_) => codes::RESOURCE_NOT_FOUND,
            ServiceError::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            ServiceError::Domain(_) | ServiceError::Unauthorized => codes::SERVER_ERROR,
            ServiceError::Internal(_) => codes::INTERNAL_ERROR,
        };
        Self::new(code, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(error),
            id,
        }
    }
}

type Handler = fn(&EntityStore, Option<EntityKind>, &Map<String, Value>) -> Result<Value, ServiceError>;

struct Method {
    kind: Option<EntityKind>,
    /// Names assigned to positional (array) params, in order.
    positional: &'static [&'static str],
    handler: Handler,
}

/// Fixed method table: arithmetic plus per-kind CRUD.
pub struct Dispatcher {
    methods: HashMap<String, Method>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut methods = HashMap::new();
        let arithmetic: [(&str, Handler); 4] = [
            ("add", add as Handler),
            ("subtract", subtract as Handler),
            ("multiply", multiply as Handler),
            ("divide", divide as Handler),
        ];
        for (name, handler) in arithmetic {
            methods.insert(
                name.to_owned(),
                Method {
                    kind: None,
                    positional: &["a", "b"],
                    handler,
                },
            );
        }

        for kind in EntityKind::ALL {
            let crud: [(String, &'static [&'static str], Handler); 5] = [
                (format!("list{}", kind.plural()), &["limit"], list as Handler),
                (format!("get{}", kind.singular()), &["id"], get as Handler),
                (format!("create{}", kind.singular()), &[], create as Handler),
                (format!("update{}", kind.singular()), &[], update as Handler),
                (format!("delete{}", kind.singular()), &["id"], delete as Handler),
            ];
            for (name, positional, handler) in crud {
                methods.insert(
                    name,
                    Method {
                        kind: Some(kind),
                        positional,
                        handler,
                    },
                );
            }
        }
        Self { methods }
    }

    /// Handles a raw request body: a single call or a batch.
    pub fn handle(&self, store: &EntityStore, body: &[u8]) -> Value {
        let parsed: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => return to_json(&RpcResponse::failure(Value::Null, RpcError::parse_error(e))),
        };

        match parsed {
            Value::Array(calls) if calls.is_empty() => to_json(&RpcResponse::failure(
                Value::Null,
                RpcError::invalid_request("empty batch"),
            )),
            Value::Array(calls) => Value::Array(
                calls
                    .into_iter()
                    .map(|call| to_json(&self.call(store, call)))
                    .collect(),
            ),
            call => to_json(&self.call(store, call)),
        }
    }

    /// Executes one request object.
    pub fn call(&self, store: &EntityStore, request: Value) -> RpcResponse {
        let Value::Object(mut request) = request else {
            return RpcResponse::failure(Value::Null, RpcError::invalid_request("expected an object"));
        };

        let id = request.remove("id").unwrap_or(Value::Null);
        if !matches!(id, Value::Null | Value::String(_) | Value::Number(_)) {
            return RpcResponse::failure(
                Value::Null,
                RpcError::invalid_request("id must be a string, number or null"),
            );
        }
        if request.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return RpcResponse::failure(id, RpcError::invalid_request("jsonrpc must be \"2.0\""));
        }
        let Some(Value::String(method_name)) = request.remove("method") else {
            return RpcResponse::failure(id, RpcError::invalid_request("method must be a string"));
        };

        let Some(method) = self.methods.get(&method_name) else {
            tracing::debug!(method = %method_name, "unknown json-rpc method");
            return RpcResponse::failure(id, ServiceError::MethodNotFound(method_name).into());
        };

        let params = match named_params(request.remove("params"), method.positional) {
            Ok(params) => params,
            Err(e) => return RpcResponse::failure(id, e.into()),
        };

        match (method.handler)(store, method.kind, &params) {
            Ok(result) => RpcResponse::success(id, result),
            Err(e) => {
                tracing::debug!(method = %method_name, error = %e, "json-rpc call failed");
                RpcResponse::failure(id, e.into())
            }
        }
    }
}

fn to_json(response: &RpcResponse) -> Value {
    serde_json::to_value(response).unwrap_or(Value::Null)
}

/// Normalizes `params` into a named mapping.
fn named_params(
    params: Option<Value>,
    positional: &[&str],
) -> Result<Map<String, Value>, ServiceError> {
    match params {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Array(items)) if items.len() <= positional.len() => Ok(positional
            .iter()
            .map(|name| (*name).to_owned())
            .zip(items)
            .collect()),
        Some(Value::Array(_)) => Err(ServiceError::bad_request("too many positional params")),
        Some(_) => Err(ServiceError::bad_request("params must be an object or an array")),
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

fn operand<'a>(params: &'a Map<String, Value>, name: &str) -> Result<&'a Number, ServiceError> {
    match params.get(name) {
        Some(Value::Number(n)) => Ok(n),
        Some(_) => Err(ServiceError::bad_request(format!("param '{name}' must be a number"))),
        None => Err(ServiceError::bad_request(format!("missing param '{name}'"))),
    }
}

fn operands(params: &Map<String, Value>) -> Result<(&Number, &Number), ServiceError> {
    Ok((operand(params, "a")?, operand(params, "b")?))
}

fn float_result(value: f64) -> Result<Value, ServiceError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ServiceError::Domain("result is not a finite number".into()))
}

/// Integer arithmetic when both operands are integers and the result fits,
/// floating point otherwise.
fn arithmetic(
    params: &Map<String, Value>,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, ServiceError> {
    let (a, b) = operands(params)?;
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64())
        && let Some(result) = int_op(x, y)
    {
        return Ok(Value::from(result));
    }
    let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
    float_result(float_op(x, y))
}

fn add(_: &EntityStore, _: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    arithmetic(params, i64::checked_add, |x, y| x + y)
}

fn subtract(_: &EntityStore, _: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    arithmetic(params, i64::checked_sub, |x, y| x - y)
}

fn multiply(_: &EntityStore, _: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    arithmetic(params, i64::checked_mul, |x, y| x * y)
}

fn divide(_: &EntityStore, _: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    let (_, b) = operands(params)?;
    if b.as_f64() == Some(0.0) {
        return Err(ServiceError::Domain("division by zero".into()));
    }
    // exact integer quotients stay integers
    arithmetic(
        params,
        |x, y| x.checked_rem(y).filter(|r| *r == 0).and_then(|_| x.checked_div(y)),
        |x, y| x / y,
    )
}

// ---------------------------------------------------------------------------
// Entity CRUD
// ---------------------------------------------------------------------------

fn entity_kind(kind: Option<EntityKind>) -> Result<EntityKind, ServiceError> {
    kind.ok_or_else(|| ServiceError::Internal("entity method registered without a kind".into()))
}

fn id_param(params: &Map<String, Value>) -> Result<String, ServiceError> {
    match params.get("id") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_u64() => Ok(n.to_string()),
        Some(_) => Err(ServiceError::bad_request("param 'id' must be a string")),
        None => Err(ServiceError::bad_request("missing param 'id'")),
    }
}

fn list(store: &EntityStore, kind: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    let limit = match params.get("limit") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| ServiceError::bad_request("param 'limit' must be a non-negative integer"))?,
        ),
    };
    let records = store.list(entity_kind(kind)?)?;
    Ok(Value::Array(crate::store::apply_limit(records, limit)))
}

fn get(store: &EntityStore, kind: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    store.get(entity_kind(kind)?, &id_param(params)?)
}

fn create(store: &EntityStore, kind: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    let kind = entity_kind(kind)?;
    let fields = store.declared_fields(kind, params, &[])?;
    store.create(kind, fields)
}

fn update(store: &EntityStore, kind: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    let kind = entity_kind(kind)?;
    let id = id_param(params)?;
    let fields = store.declared_fields(kind, params, &["id"])?;
    store.update(kind, &id, fields)
}

fn delete(store: &EntityStore, kind: Option<EntityKind>, params: &Map<String, Value>) -> Result<Value, ServiceError> {
    store.delete(entity_kind(kind)?, &id_param(params)?)?;
    Ok(Value::Bool(true))
}
