//! SOAP 1.1 envelope codec and operation dispatch.
//!
//! Decoding looks only at local names, so any namespace prefix works for
//! `Envelope`, `Body` and the operation element. Parameters stay strings
//! until the operation handler coerces them against the record template.

use std::fmt::Write as _;

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::escape::{escape, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};
use serde_json::{Number, Value};

use crate::error::ServiceError;
use crate::store::{EntityStore, Fields};
use crate::types::EntityKind;

pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// A decoded SOAP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapRequest {
    /// Local name of the first element inside `Body`.
    pub operation: String,
    /// Default namespace declared on the operation element, if any.
    pub namespace: Option<String>,
    /// Child elements of the operation, in document order.
    pub params: IndexMap<String, String>,
}

impl SoapRequest {
    /// Case-insensitive parameter lookup.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Whether a `Content-Type` value denotes an XML payload.
pub fn is_xml_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/xml" || mime == "application/xml" || mime.ends_with("+xml")
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn malformed(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::bad_request(format!("malformed XML: {e}"))
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn default_namespace(start: &BytesStart<'_>) -> Result<Option<String>, ServiceError> {
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        if attr.key.as_ref() == b"xmlns" {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

/// Decodes an envelope into operation name and string parameters.
pub fn decode(xml: &str) -> Result<SoapRequest, ServiceError> {
    let mut reader = Reader::from_str(xml);

    // Element local names from the document root down to the current node.
    let mut stack: Vec<String> = Vec::new();
    let mut request: Option<SoapRequest> = None;
    let mut current_param: Option<(String, String)> = None;
    let mut saw_body = false;

    loop {
        let event = reader.read_event().map_err(malformed)?;
        match event {
            Event::Start(ref start) | Event::Empty(ref start) => {
                let name = local_name(start);
                let is_empty = matches!(event, Event::Empty(_));
                match stack.len() {
                    0 if name != "Envelope" => {
                        return Err(ServiceError::bad_request("root element must be soap:Envelope"));
                    }
                    1 if name == "Body" => saw_body = true,
                    2 if stack[1] == "Body" && request.is_none() => {
                        request = Some(SoapRequest {
                            operation: name.clone(),
                            namespace: default_namespace(start)?,
                            params: IndexMap::new(),
                        });
                    }
                    3 if stack[1] == "Body" && is_operation_open(&stack, request.as_ref()) => {
                        if is_empty {
                            if let Some(req) = request.as_mut() {
                                req.params.insert(name.clone(), String::new());
                            }
                        } else {
                            current_param = Some((name.clone(), String::new()));
                        }
                    }
                    n if n > 3 && current_param.is_some() && stack[1] == "Body" => {
                        return Err(ServiceError::bad_request(
                            "nested parameter elements are not supported",
                        ));
                    }
                    _ => {}
                }
                if !is_empty {
                    stack.push(name);
                }
            }
            Event::End(_) => {
                if stack.len() == 4
                    && let Some((name, value)) = current_param.take()
                    && let Some(req) = request.as_mut()
                {
                    req.params.insert(name, value.trim().to_owned());
                }
                stack.pop();
            }
            Event::Text(text) => {
                if let Some((_, value)) = current_param.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&text));
                }
            }
            Event::CData(data) => {
                if let Some((_, value)) = current_param.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(entity) => {
                if let Some((_, value)) = current_param.as_mut() {
                    if let Some(ch) = entity.resolve_char_ref().map_err(malformed)? {
                        value.push(ch);
                    } else {
                        let name = String::from_utf8_lossy(&entity);
                        let resolved = resolve_predefined_entity(&name)
                            .ok_or_else(|| malformed(format!("unknown entity '&{name};'")))?;
                        value.push_str(resolved);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }
    if !saw_body {
        return Err(ServiceError::bad_request("missing soap:Body"));
    }
    request.ok_or_else(|| ServiceError::bad_request("missing operation element in soap:Body"))
}

/// True while the element at depth 3 is the captured operation element.
fn is_operation_open(stack: &[String], request: Option<&SoapRequest>) -> bool {
    request.is_some_and(|req| stack.get(2) == Some(&req.operation))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soap:Envelope xmlns:soap="{ENVELOPE_NS}"><soap:Body>{body}</soap:Body></soap:Envelope>"#
    )
}

/// Encodes a JSON value as XML children of an element.
fn write_value(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null => {
            let _ = write!(out, "<{name}/>");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<{name}>{b}</{name}>");
        }
        Value::Number(n) => {
            let _ = write!(out, "<{name}>{n}</{name}>");
        }
        Value::String(s) => {
            let _ = write!(out, "<{name}>{}</{name}>", escape(s.as_str()));
        }
        Value::Array(items) => {
            let _ = write!(out, "<{name}>");
            for item in items {
                write_value(out, "item", item);
            }
            let _ = write!(out, "</{name}>");
        }
        Value::Object(fields) => {
            let _ = write!(out, "<{name}>");
            for (key, field) in fields {
                write_value(out, key, field);
            }
            let _ = write!(out, "</{name}>");
        }
    }
}

/// Encodes a successful result as `<{operation}Response>`.
///
/// Record arrays become one element per record named after the kind.
pub fn encode_response(request: &SoapRequest, kind: EntityKind, result: &Value) -> String {
    let namespace = request
        .namespace
        .clone()
        .unwrap_or_else(|| format!("http://example.com/{}", kind.path_segment()));
    let mut body = format!(
        r#"<{}Response xmlns="{}">"#,
        request.operation,
        escape(namespace.as_str())
    );
    match result {
        Value::Array(records) => {
            for record in records {
                write_value(&mut body, kind.singular(), record);
            }
        }
        Value::Bool(success) => {
            let _ = write!(body, "<Success>{success}</Success>");
        }
        record => write_value(&mut body, kind.singular(), record),
    }
    let _ = write!(body, "</{}Response>", request.operation);
    envelope(&body)
}

/// Encodes an error as a `soap:Fault`.
pub fn encode_fault(error: &ServiceError) -> String {
    let faultcode = match error {
        ServiceError::Internal(_) => "soap:Server",
        _ => "soap:Client",
    };
    envelope(&format!(
        "<soap:Fault><faultcode>{faultcode}</faultcode><faultstring>{}</faultstring><detail><code>{}</code></detail></soap:Fault>",
        escape(error.to_string().as_str()),
        error.code()
    ))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Action {
    const ALL: [Action; 5] = [
        Action::List,
        Action::Get,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    fn operation_name(self, kind: EntityKind) -> String {
        match self {
            Self::List => format!("List{}", kind.plural()),
            Self::Get => format!("Get{}", kind.singular()),
            Self::Create => format!("Create{}", kind.singular()),
            Self::Update => format!("Update{}", kind.singular()),
            Self::Delete => format!("Delete{}", kind.singular()),
        }
    }
}

fn resolve_operation(name: &str) -> Option<(Action, EntityKind)> {
    EntityKind::ALL
        .into_iter()
        .flat_map(|kind| Action::ALL.into_iter().map(move |action| (action, kind)))
        .find(|(action, kind)| action.operation_name(*kind) == name)
}

/// Decodes, executes and encodes one SOAP call. Every failure becomes a fault.
pub fn handle(store: &EntityStore, xml: &str) -> String {
    let request = match decode(xml) {
        Ok(req) => req,
        Err(e) => {
            tracing::debug!(error = %e, "rejected soap envelope");
            return encode_fault(&e);
        }
    };
    match execute(store, &request) {
        Ok((kind, result)) => encode_response(&request, kind, &result),
        Err(e) => {
            tracing::debug!(operation = %request.operation, error = %e, "soap operation failed");
            encode_fault(&e)
        }
    }
}

fn execute(store: &EntityStore, request: &SoapRequest) -> Result<(EntityKind, Value), ServiceError> {
    let (action, kind) = resolve_operation(&request.operation)
        .ok_or_else(|| ServiceError::MethodNotFound(request.operation.clone()))?;
    tracing::debug!(operation = %request.operation, "soap call");

    let result = match action {
        Action::List => {
            let limit = request
                .param("Limit")
                .map(|raw| {
                    raw.trim()
                        .parse::<usize>()
                        .map_err(|_| ServiceError::bad_request(format!("invalid Limit '{raw}'")))
                })
                .transpose()?;
            Value::Array(crate::store::apply_limit(store.list(kind)?, limit))
        }
        Action::Get => store.get(kind, required_id(request)?)?,
        Action::Create => store.create(kind, coerce_params(store, kind, request, false)?)?,
        Action::Update => {
            let id = required_id(request)?;
            store.update(kind, id, coerce_params(store, kind, request, true)?)?
        }
        Action::Delete => {
            store.delete(kind, required_id(request)?)?;
            Value::Bool(true)
        }
    };
    Ok((kind, result))
}

fn required_id(request: &SoapRequest) -> Result<&str, ServiceError> {
    request
        .param("Id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServiceError::bad_request("missing required parameter 'Id'"))
}

/// Maps string parameters onto declared fields, converting each value to
/// the type of the field in the record template.
fn coerce_params(
    store: &EntityStore,
    kind: EntityKind,
    request: &SoapRequest,
    skip_id: bool,
) -> Result<Fields, ServiceError> {
    let template = store.collection(kind).template()?;
    let Value::Object(template) = template else {
        return Err(ServiceError::Internal(format!("{kind} template is not an object")));
    };

    let mut fields = Fields::new();
    for (param, raw) in &request.params {
        if skip_id && param.eq_ignore_ascii_case("id") {
            continue;
        }
        let (field, declared) = template
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(param) && *name != kind.id_field())
            .ok_or_else(|| {
                ServiceError::bad_request(format!("unknown parameter '{param}' for {kind}"))
            })?;
        fields.insert(field.clone(), coerce(field, raw, declared)?);
    }
    Ok(fields)
}

fn coerce(field: &str, raw: &str, declared: &Value) -> Result<Value, ServiceError> {
    let invalid = |expected: &str| {
        ServiceError::bad_request(format!("parameter '{field}' expects {expected}, got '{raw}'"))
    };
    let trimmed = raw.trim();
    match declared {
        Value::String(_) => Ok(Value::String(raw.to_owned())),
        Value::Bool(_) => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid("a boolean")),
        },
        Value::Number(n) if n.is_f64() => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("a number")),
        Value::Number(_) => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("an integer")),
        Value::Array(_) | Value::Object(_) | Value::Null => {
            serde_json::from_str(trimmed).map_err(|_| invalid("a JSON value"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_with(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    {body}
  </soap:Body>
</soap:Envelope>"#
        )
    }

    #[test]
    fn decodes_operation_and_params() {
        let req = decode(&envelope_with(
            r#"<ListPlants xmlns="http://example.com/plants"><Limit>5</Limit></ListPlants>"#,
        ))
        .unwrap();
        assert_eq!(req.operation, "ListPlants");
        assert_eq!(req.namespace.as_deref(), Some("http://example.com/plants"));
        assert_eq!(req.param("limit"), Some("5"));
    }

    #[test]
    fn prefix_agnostic_and_unescapes_text() {
        let xml = r#"<env:Envelope xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Header><Trace>1</Trace></env:Header>
  <env:Body><p:CreatePlant xmlns:p="urn:x"><p:name>Rose &amp; Thorn</p:name><empty/></p:CreatePlant></env:Body>
</env:Envelope>"#;
        let req = decode(xml).unwrap();
        assert_eq!(req.operation, "CreatePlant");
        assert_eq!(req.namespace, None);
        assert_eq!(req.param("name"), Some("Rose & Thorn"));
        assert_eq!(req.param("empty"), Some(""));
    }

    #[test]
    fn decode_failures() {
        assert!(decode("not xml at all <").is_err());
        assert!(decode("<Other><Body/></Other>").is_err());
        assert!(decode(r#"<soap:Envelope xmlns:soap="x"></soap:Envelope>"#).is_err());
        assert!(decode(&envelope_with("")).is_err());
        assert!(decode(&envelope_with("<CreatePet><owner><name>x</name></owner></CreatePet>")).is_err());
        assert!(decode(&envelope_with("<ListPets><Limit>5</ListPets>")).is_err());
    }

    #[test]
    fn list_respects_limit_and_names_items() {
        let store = EntityStore::seeded();
        let xml = handle(
            &store,
            &envelope_with(r#"<ListPlants xmlns="http://example.com/plants"><Limit>2</Limit></ListPlants>"#),
        );
        assert!(xml.contains(r#"<ListPlantsResponse xmlns="http://example.com/plants">"#));
        assert_eq!(xml.matches("<Plant>").count(), 2);
        assert!(xml.contains("<name>Monstera</name>"));
    }

    #[test]
    fn create_coerces_by_field_type() {
        let store = EntityStore::new();
        let xml = handle(
            &store,
            &envelope_with(
                "<CreatePlant><name>Bamboo</name><WATERING_DAYS>3</WATERING_DAYS></CreatePlant>",
            ),
        );
        assert!(xml.contains("<CreatePlantResponse xmlns=\"http://example.com/plants\">"));
        assert!(xml.contains("<name>Bamboo</name>"));
        let plant = store.plants().get("1").unwrap();
        assert_eq!(plant.watering_days, 3);

        let xml = handle(
            &store,
            &envelope_with("<CreateCar><price>12.5</price><electric>true</electric><year>2020</year></CreateCar>"),
        );
        assert!(!xml.contains("soap:Fault"), "{xml}");
        let car = store.cars().get("1").unwrap();
        assert!(car.electric);
        assert_eq!(car.year, 2020);
    }

    #[test]
    fn update_get_delete_cycle() {
        let store = EntityStore::seeded();
        let xml = handle(&store, &envelope_with("<UpdateMovie><Id>2</Id><rating>9.1</rating></UpdateMovie>"));
        assert!(xml.contains("<Rating>9.1</Rating>"), "{xml}");

        let xml = handle(&store, &envelope_with("<DeleteMovie><Id>2</Id></DeleteMovie>"));
        assert!(xml.contains("<Success>true</Success>"));

        let xml = handle(&store, &envelope_with("<GetMovie><Id>2</Id></GetMovie>"));
        assert!(xml.contains("<faultcode>soap:Client</faultcode>"));
        assert!(xml.contains("<code>not_found</code>"));
    }

    #[test]
    fn faults_for_bad_calls() {
        let store = EntityStore::seeded();
        for body in [
            "<ListUnicorns/>",
            "<ListPlants><Limit>lots</Limit></ListPlants>",
            "<GetPlant/>",
            "<CreatePlant><wings>2</wings></CreatePlant>",
            "<CreateCar><electric>maybe</electric></CreateCar>",
        ] {
            let xml = handle(&store, &envelope_with(body));
            assert!(xml.contains("<soap:Fault>"), "{body}");
            assert!(xml.contains("soap:Client"), "{body}");
        }
        assert_eq!(store.plants().len(), 4);
    }

    #[test]
    fn fault_escapes_message() {
        let xml = encode_fault(&ServiceError::bad_request("bad <input>"));
        assert!(xml.contains("bad &lt;input&gt;"));
        let xml = encode_fault(&ServiceError::Internal("boom".into()));
        assert!(xml.contains("soap:Server"));
    }

    #[test]
    fn xml_content_types() {
        assert!(is_xml_content_type("text/xml; charset=utf-8"));
        assert!(is_xml_content_type("application/soap+xml"));
        assert!(!is_xml_content_type("application/json"));
    }
}
