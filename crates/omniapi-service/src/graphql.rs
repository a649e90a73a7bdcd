//! Minimal GraphQL executor.
//!
//! Supports one operation per document (`query`, `mutation`, or the `{ ... }`
//! shorthand) whose root fields take `key: value` arguments and a flat
//! selection set of scalar field names. Each root field is resolved through
//! a name → resolver table built per entity kind.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Number, Value, json};

use crate::error::ServiceError;
use crate::store::EntityStore;
use crate::types::EntityKind;

/// Body of a GraphQL-over-HTTP request.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
}

/// A parsed document: one operation with its root field calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationType,
    pub name: Option<String>,
    pub fields: Vec<FieldCall>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCall {
    pub name: String,
    pub arguments: Map<String, Value>,
    /// Requested scalar fields; empty means the whole record.
    pub selection: Vec<String>,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Variable(String),
    Punct(char),
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn lex(src: &str) -> Result<Vec<Token>, ServiceError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            // Commas are insignificant in GraphQL.
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            '#' => {
                while chars.next_if(|&ch| ch != '\n').is_some() {}
            }
            '{' | '}' | '(' | ')' | ':' | '[' | ']' | '!' | '=' => {
                chars.next();
                tokens.push(Token::Punct(c));
            }
            '$' => {
                chars.next();
                let mut name = String::new();
                while let Some(ch) = chars.next_if(|&ch| is_name_continue(ch)) {
                    name.push(ch);
                }
                if name.is_empty() {
                    return Err(ServiceError::bad_request("expected variable name after '$'"));
                }
                tokens.push(Token::Variable(name));
            }
            '"' => {
                chars.next();
                tokens.push(Token::Str(lex_string(&mut chars)?));
            }
            c if c == '-' || c.is_ascii_digit() => {
                let mut text = String::new();
                while let Some(ch) = chars.next_if(|&ch| {
                    ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E')
                }) {
                    text.push(ch);
                }
                let is_float = text.contains(['.', 'e', 'E']);
                let token = if is_float {
                    text.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(Token::Float)
                } else {
                    text.parse::<i64>().ok().map(Token::Int)
                };
                tokens.push(
                    token.ok_or_else(|| ServiceError::bad_request(format!("invalid number '{text}'")))?,
                );
            }
            c if is_name_start(c) => {
                let mut name = String::new();
                while let Some(ch) = chars.next_if(|&ch| is_name_continue(ch)) {
                    name.push(ch);
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(ServiceError::bad_request(format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

fn lex_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, ServiceError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None | Some('\n') => return Err(ServiceError::bad_request("unterminated string")),
            Some('"') => return Ok(out),
            Some('\\') => {
                let escaped = match chars.next() {
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some('/') => '/',
                    Some('b') => '\u{8}',
                    Some('f') => '\u{c}',
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('u') => {
                        let hex: String = chars.by_ref().take(4).collect();
                        u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| {
                                ServiceError::bad_request(format!("invalid unicode escape '\\u{hex}'"))
                            })?
                    }
                    other => {
                        return Err(ServiceError::bad_request(format!(
                            "invalid escape sequence {other:?}"
                        )));
                    }
                };
                out.push(escaped);
            }
            Some(ch) => out.push(ch),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    variables: &'a Map<String, Value>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: char) -> Result<(), ServiceError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(ServiceError::bad_request(format!(
                "expected '{punct}', found {}",
                describe(self.peek())
            )))
        }
    }

    fn name(&mut self) -> Result<String, ServiceError> {
        match self.next() {
            Some(Token::Name(name)) => Ok(name),
            other => Err(ServiceError::bad_request(format!(
                "expected name, found {}",
                describe(other.as_ref())
            ))),
        }
    }

    fn operation(&mut self) -> Result<Operation, ServiceError> {
        let kind = match self.peek() {
            Some(Token::Punct('{')) => OperationType::Query,
            Some(Token::Name(word)) if word == "query" => OperationType::Query,
            Some(Token::Name(word)) if word == "mutation" => OperationType::Mutation,
            Some(Token::Name(word)) if word == "subscription" => {
                return Err(ServiceError::bad_request("subscriptions are not supported"));
            }
            other => {
                return Err(ServiceError::bad_request(format!(
                    "expected operation, found {}",
                    describe(other)
                )));
            }
        };

        let mut name = None;
        if !matches!(self.peek(), Some(Token::Punct('{'))) {
            self.pos += 1;
            if let Some(Token::Name(_)) = self.peek() {
                name = Some(self.name()?);
            }
            if self.eat('(') {
                self.skip_variable_definitions()?;
            }
        }

        self.expect('{')?;
        let mut fields = Vec::new();
        while !self.eat('}') {
            fields.push(self.field()?);
        }
        if fields.is_empty() {
            return Err(ServiceError::bad_request("empty selection set"));
        }
        if self.peek().is_some() {
            return Err(ServiceError::bad_request(
                "only a single operation per document is supported",
            ));
        }

        Ok(Operation { kind, name, fields })
    }

    /// Variable values come from the request body; declared types and
    /// defaults are not checked.
    fn skip_variable_definitions(&mut self) -> Result<(), ServiceError> {
        loop {
            match self.next() {
                Some(Token::Punct(')')) => return Ok(()),
                Some(_) => {}
                None => return Err(ServiceError::bad_request("unterminated variable definitions")),
            }
        }
    }

    fn field(&mut self) -> Result<FieldCall, ServiceError> {
        let name = self.name()?;

        let mut arguments = Map::new();
        if self.eat('(') {
            while !self.eat(')') {
                let key = self.name()?;
                self.expect(':')?;
                let value = self.value()?;
                arguments.insert(key, value);
            }
        }

        let mut selection = Vec::new();
        if self.eat('{') {
            while !self.eat('}') {
                selection.push(self.name()?);
                if matches!(self.peek(), Some(Token::Punct('{' | '('))) {
                    return Err(ServiceError::bad_request(
                        "nested selections and field arguments are not supported",
                    ));
                }
            }
        }

        Ok(FieldCall {
            name,
            arguments,
            selection,
        })
    }

    fn value(&mut self) -> Result<Value, ServiceError> {
        match self.next() {
            Some(Token::Int(i)) => Ok(Value::from(i)),
            Some(Token::Float(f)) => Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| ServiceError::bad_request("invalid float")),
            Some(Token::Str(s)) => Ok(Value::String(s)),
            Some(Token::Name(word)) => Ok(match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                // enum values travel as strings
                _ => Value::String(word),
            }),
            Some(Token::Variable(name)) => self
                .variables
                .get(&name)
                .cloned()
                .ok_or_else(|| ServiceError::bad_request(format!("variable '${name}' not provided"))),
            Some(Token::Punct('[')) => {
                let mut items = Vec::new();
                while !self.eat(']') {
                    items.push(self.value()?);
                }
                Ok(Value::Array(items))
            }
            Some(Token::Punct('{')) => {
                let mut object = Map::new();
                while !self.eat('}') {
                    let key = self.name()?;
                    self.expect(':')?;
                    object.insert(key, self.value()?);
                }
                Ok(Value::Object(object))
            }
            other => Err(ServiceError::bad_request(format!(
                "expected value, found {}",
                describe(other.as_ref())
            ))),
        }
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of document".to_owned(),
        Some(Token::Name(n)) => format!("'{n}'"),
        Some(Token::Punct(c)) => format!("'{c}'"),
        Some(other) => format!("{other:?}"),
    }
}

/// Parses a document into its single operation.
pub fn parse(src: &str, variables: &Map<String, Value>) -> Result<Operation, ServiceError> {
    let mut parser = Parser {
        tokens: lex(src)?,
        pos: 0,
        variables,
    };
    parser.operation()
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

type Resolver = fn(&EntityStore, EntityKind, &Map<String, Value>) -> Result<Value, ServiceError>;

struct ResolverEntry {
    operation: OperationType,
    kind: EntityKind,
    /// Whether the result is a record (or list of records) the selection applies to.
    returns_records: bool,
    resolve: Resolver,
}

/// Root field table: `list<Plural>`, `get<Singular>` (queries) and
/// `create/update/delete<Singular>` (mutations) for every kind.
pub struct Schema {
    resolvers: HashMap<String, ResolverEntry>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        let mut resolvers = HashMap::new();
        for kind in EntityKind::ALL {
            let entries: [(String, OperationType, bool, Resolver); 5] = [
                (format!("list{}", kind.plural()), OperationType::Query, true, resolve_list as Resolver),
                (format!("get{}", kind.singular()), OperationType::Query, true, resolve_get as Resolver),
                (format!("create{}", kind.singular()), OperationType::Mutation, true, resolve_create as Resolver),
                (format!("update{}", kind.singular()), OperationType::Mutation, true, resolve_update as Resolver),
                (format!("delete{}", kind.singular()), OperationType::Mutation, false, resolve_delete as Resolver),
            ];
            for (name, operation, returns_records, resolve) in entries {
                resolvers.insert(
                    name,
                    ResolverEntry {
                        operation,
                        kind,
                        returns_records,
                        resolve,
                    },
                );
            }
        }
        Self { resolvers }
    }

    /// Executes a request and returns the `{data}` / `{errors}` envelope.
    ///
    /// Never fails: parse, lookup and store errors become error entries.
    pub fn execute(&self, store: &EntityStore, request: &GraphQlRequest) -> Value {
        let empty = Map::new();
        let variables = request.variables.as_ref().unwrap_or(&empty);

        let operation = match parse(&request.query, variables) {
            Ok(op) => op,
            Err(e) => return error_response(&e),
        };
        if let (Some(wanted), Some(actual)) = (&request.operation_name, &operation.name)
            && wanted != actual
        {
            let e = ServiceError::bad_request(format!("operation '{wanted}' not found in document"));
            return error_response(&e);
        }

        let mut data = Map::new();
        let mut errors = Vec::new();
        for field in &operation.fields {
            match self.resolve_field(store, operation.kind, field) {
                Ok(value) => {
                    data.insert(field.name.clone(), value);
                }
                Err(e) => {
                    tracing::debug!(field = %field.name, error = %e, "graphql field failed");
                    errors.push(error_entry(&e, Some(&field.name)));
                }
            }
        }

        let mut envelope = Map::new();
        if !data.is_empty() {
            envelope.insert("data".into(), Value::Object(data));
        }
        if !errors.is_empty() {
            envelope.insert("errors".into(), Value::Array(errors));
        }
        Value::Object(envelope)
    }

    fn resolve_field(
        &self,
        store: &EntityStore,
        operation: OperationType,
        field: &FieldCall,
    ) -> Result<Value, ServiceError> {
        let entry = self
            .resolvers
            .get(&field.name)
            .filter(|e| e.operation == operation)
            .ok_or_else(|| ServiceError::MethodNotFound(field.name.clone()))?;

        if !entry.returns_records {
            return (entry.resolve)(store, entry.kind, &field.arguments);
        }

        let template = store.collection(entry.kind).template()?;
        if let Some(unknown) = field
            .selection
            .iter()
            .find(|f| *f != "__typename" && template.get(f.as_str()).is_none())
        {
            return Err(ServiceError::bad_request(format!(
                "field '{unknown}' is not defined on {}",
                entry.kind
            )));
        }

        let result = (entry.resolve)(store, entry.kind, &field.arguments)?;
        Ok(project(result, &field.selection, entry.kind))
    }
}

/// Envelope for a request rejected before execution (bad body, credentials).
pub fn error_response(error: &ServiceError) -> Value {
    json!({ "errors": [error_entry(error, None)] })
}

fn error_entry(error: &ServiceError, path: Option<&str>) -> Value {
    let mut entry = json!({
        "message": error.to_string(),
        "extensions": { "code": error.code() },
    });
    if let Some(path) = path {
        entry["path"] = json!([path]);
    }
    entry
}

/// Keeps only the selected fields of each record; unselected fields are
/// omitted entirely.
fn project(value: Value, selection: &[String], kind: EntityKind) -> Value {
    if selection.is_empty() {
        return value;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| project(item, selection, kind))
                .collect(),
        ),
        Value::Object(mut record) => Value::Object(
            selection
                .iter()
                .filter_map(|name| {
                    if name == "__typename" {
                        return Some((name.clone(), Value::String(kind.singular().to_owned())));
                    }
                    record.remove(name).map(|v| (name.clone(), v))
                })
                .collect(),
        ),
        other => other,
    }
}

fn reject_unknown_args(
    args: &Map<String, Value>,
    allowed: &[&str],
    kind: EntityKind,
) -> Result<(), ServiceError> {
    match args.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(ServiceError::bad_request(format!(
            "unknown argument '{key}' for {kind} operation"
        ))),
        None => Ok(()),
    }
}

fn id_arg(args: &Map<String, Value>) -> Result<String, ServiceError> {
    match args.get("id") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) if n.is_u64() => Ok(n.to_string()),
        Some(_) => Err(ServiceError::bad_request("argument 'id' must be an ID")),
        None => Err(ServiceError::bad_request("missing required argument 'id'")),
    }
}

fn resolve_list(
    store: &EntityStore,
    kind: EntityKind,
    args: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    reject_unknown_args(args, &["limit"], kind)?;
    let limit = match args.get("limit") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_u64().ok_or_else(|| {
            ServiceError::bad_request("argument 'limit' must be a non-negative integer")
        })? as usize),
    };
    let records = crate::store::apply_limit(store.list(kind)?, limit);
    Ok(Value::Array(records))
}

fn resolve_get(
    store: &EntityStore,
    kind: EntityKind,
    args: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    reject_unknown_args(args, &["id"], kind)?;
    store.get(kind, &id_arg(args)?)
}

fn resolve_create(
    store: &EntityStore,
    kind: EntityKind,
    args: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    let fields = store.declared_fields(kind, args, &[])?;
    store.create(kind, fields)
}

fn resolve_update(
    store: &EntityStore,
    kind: EntityKind,
    args: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    let id = id_arg(args)?;
    let fields = store.declared_fields(kind, args, &["id"])?;
    store.update(kind, &id, fields)
}

fn resolve_delete(
    store: &EntityStore,
    kind: EntityKind,
    args: &Map<String, Value>,
) -> Result<Value, ServiceError> {
    reject_unknown_args(args, &["id"], kind)?;
    store.delete(kind, &id_arg(args)?)?;
    Ok(Value::Bool(true))
}
