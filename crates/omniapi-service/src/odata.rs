//! OData query engine: a small, safe subset of `$filter`, `$orderby` and
//! `$top` evaluated over JSON records.
//!
//! `$filter` accepts `<field> <op> <literal>` clauses joined by `and` /
//! `or` (no parentheses). `and` binds tighter than `or`, so a filter is a
//! disjunction of conjunctions. Field paths may name nested properties
//! with `/` (`owner/name`).
//!
//! In lenient mode malformed clauses are dropped (logged at `debug`);
//! strict mode rejects them as `BadRequest`.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Value, json};

use crate::error::ServiceError;
use crate::store::EntityStore;
use crate::types::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
    fn parse(word: &str) -> Option<Self> {
        Some(match word.to_ascii_lowercase().as_str() {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            _ => return None,
        })
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// One `<field> <op> <literal>` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: Vec<String>,
    pub op: Comparator,
    pub literal: Literal,
}

impl Comparison {
    /// Type mismatches and missing fields never match.
    pub fn matches(&self, record: &Value) -> bool {
        let field = resolve(record, &self.path);
        match (&self.literal, field) {
            (Literal::Null, field) => {
                let is_null = field.is_none_or(Value::is_null);
                match self.op {
                    Comparator::Eq => is_null,
                    Comparator::Ne => !is_null,
                    _ => false,
                }
            }
            (_, None) => false,
            (literal, Some(value)) => {
                compare_literal(value, literal).is_some_and(|ord| self.op.accepts(ord))
            }
        }
    }
}

/// Parsed `$filter`: any of the conjunctions must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub any_of: Vec<Vec<Comparison>>,
}

impl Filter {
    pub fn matches(&self, record: &Value) -> bool {
        self.any_of
            .iter()
            .any(|all_of| all_of.iter().all(|c| c.matches(record)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub path: Vec<String>,
    pub direction: Direction,
}

/// A parsed OData query: filter, then sort, then truncate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataQuery {
    pub filter: Option<Filter>,
    pub order_by: Vec<SortKey>,
    pub top: Option<usize>,
}

impl ODataQuery {
    /// Builds a query from decoded URL parameters. `limit` is accepted as
    /// an alias of `$top`.
    pub fn from_params(params: &HashMap<String, String>, strict: bool) -> Result<Self, ServiceError> {
        let mut query = Self::default();

        if let Some(raw) = params.get("$filter").filter(|s| !s.trim().is_empty()) {
            match parse_filter(raw) {
                Ok(filter) => query.filter = Some(filter),
                Err(e) if strict => return Err(e),
                Err(e) => tracing::debug!(filter = %raw, error = %e, "ignoring malformed $filter"),
            }
        }

        if let Some(raw) = params.get("$orderby") {
            for item in raw.split(',').filter(|s| !s.trim().is_empty()) {
                match parse_sort_key(item) {
                    Ok(key) => query.order_by.push(key),
                    Err(e) if strict => return Err(e),
                    Err(e) => tracing::debug!(key = %item, error = %e, "ignoring malformed $orderby key"),
                }
            }
        }

        if let Some(raw) = params.get("$top").or_else(|| params.get("limit")) {
            match raw.trim().parse::<usize>() {
                Ok(top) => query.top = Some(top),
                Err(_) if strict => {
                    return Err(ServiceError::bad_request(format!("invalid $top '{raw}'")));
                }
                Err(_) => tracing::debug!(top = %raw, "ignoring malformed $top"),
            }
        }

        Ok(query)
    }

    /// Filters, stably sorts and truncates `records`.
    pub fn apply(&self, mut records: Vec<Value>) -> Vec<Value> {
        if let Some(filter) = &self.filter {
            records.retain(|r| filter.matches(r));
        }

        if !self.order_by.is_empty() {
            // `sort_by` is stable: ties keep insertion order.
            records.sort_by(|a, b| {
                for key in &self.order_by {
                    let ord = compare_values(resolve(a, &key.path), resolve(b, &key.path));
                    let ord = match key.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(top) = self.top {
            records.truncate(top);
        }
        records
    }
}

/// Evaluates `query` over a kind's collection and wraps the result in the
/// `{"value": [...]}` envelope.
pub fn query_collection(
    store: &EntityStore,
    kind: EntityKind,
    query: &ODataQuery,
) -> Result<Value, ServiceError> {
    let records = query.apply(store.list(kind)?);
    Ok(json!({
        "@odata.context": format!("$metadata#{}", kind.plural()),
        "value": records,
    }))
}

/// Splits a resource segment such as `Movies`, `Movies(3)` or
/// `Movies('3')` into the entity kind and optional key.
pub fn parse_resource(segment: &str) -> Result<(EntityKind, Option<String>), ServiceError> {
    let (set, key) = match segment.split_once('(') {
        Some((set, rest)) => {
            let inner = rest
                .strip_suffix(')')
                .ok_or_else(|| ServiceError::bad_request(format!("malformed key in '{segment}'")))?;
            let key = inner
                .strip_prefix('\'')
                .and_then(|k| k.strip_suffix('\''))
                .unwrap_or(inner);
            if key.is_empty() {
                return Err(ServiceError::bad_request(format!("empty key in '{segment}'")));
            }
            (set, Some(key.to_owned()))
        }
        None => (segment, None),
    };

    let kind = EntityKind::from_entity_set(set)
        .ok_or_else(|| ServiceError::not_found(format!("entity set '{set}' not found")))?;
    Ok((kind, key))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, ServiceError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    // '' is an escaped quote inside a string literal
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        text.push('\'');
                    }
                    Some('\'') => break,
                    Some(ch) => text.push(ch),
                    None => return Err(ServiceError::bad_request("unterminated string literal")),
                }
            }
            tokens.push(Token::Quoted(text));
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(Token::Word(word));
        }
    }
    Ok(tokens)
}

fn parse_path(word: &str) -> Result<Vec<String>, ServiceError> {
    let segments: Vec<String> = word.split('/').map(str::to_owned).collect();
    let valid = segments.iter().all(|s| {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if valid {
        Ok(segments)
    } else {
        Err(ServiceError::bad_request(format!("invalid property '{word}'")))
    }
}

fn parse_literal(token: Token) -> Result<Literal, ServiceError> {
    let word = match token {
        Token::Quoted(text) => return Ok(Literal::String(text)),
        Token::Word(word) => word,
    };
    match word.as_str() {
        "true" => return Ok(Literal::Bool(true)),
        "false" => return Ok(Literal::Bool(false)),
        "null" => return Ok(Literal::Null),
        _ => {}
    }
    let numeric = word
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    match word.parse::<f64>() {
        Ok(n) if numeric && n.is_finite() => Ok(Literal::Number(n)),
        _ => Err(ServiceError::bad_request(format!("invalid literal '{word}'"))),
    }
}

/// Parses a `$filter` expression.
pub fn parse_filter(input: &str) -> Result<Filter, ServiceError> {
    let mut tokens = tokenize(input)?.into_iter();
    let mut any_of = Vec::new();
    let mut all_of = Vec::new();

    loop {
        let field = match tokens.next() {
            Some(Token::Word(word)) => parse_path(&word)?,
            _ => return Err(ServiceError::bad_request("expected property name")),
        };
        let op = match tokens.next() {
            Some(Token::Word(word)) => Comparator::parse(&word)
                .ok_or_else(|| ServiceError::bad_request(format!("unknown operator '{word}'")))?,
            _ => return Err(ServiceError::bad_request("expected comparison operator")),
        };
        let literal = tokens
            .next()
            .ok_or_else(|| ServiceError::bad_request("expected literal"))
            .and_then(parse_literal)?;
        all_of.push(Comparison {
            path: field,
            op,
            literal,
        });

        match tokens.next() {
            None => break,
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("and") => {}
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("or") => {
                any_of.push(std::mem::take(&mut all_of));
            }
            Some(other) => {
                return Err(ServiceError::bad_request(format!(
                    "expected 'and' or 'or', found {other:?}"
                )));
            }
        }
    }

    any_of.push(all_of);
    Ok(Filter { any_of })
}

/// Parses one `$orderby` item: `<field> [asc|desc]`.
pub fn parse_sort_key(item: &str) -> Result<SortKey, ServiceError> {
    let mut parts = item.split_whitespace();
    let path = parse_path(parts.next().unwrap_or_default())?;
    let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => Direction::Asc,
        Some("desc") => Direction::Desc,
        Some(other) => {
            return Err(ServiceError::bad_request(format!("invalid sort direction '{other}'")));
        }
    };
    if parts.next().is_some() {
        return Err(ServiceError::bad_request(format!("malformed $orderby item '{item}'")));
    }
    Ok(SortKey { path, direction })
}

// ---------------------------------------------------------------------------
// Evaluation helpers
// ---------------------------------------------------------------------------

fn resolve<'a>(record: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(record, |value, segment| value.get(segment))
}

fn compare_literal(value: &Value, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (Value::Number(n), Literal::Number(x)) => n.as_f64()?.partial_cmp(x),
        (Value::String(s), Literal::String(x)) => Some(s.as_str().cmp(x.as_str())),
        (Value::Bool(b), Literal::Bool(x)) => Some(b.cmp(x)),
        _ => None,
    }
}

/// Total order used for sorting: missing/null < bool < number < string < other.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&y.as_f64().unwrap_or_default()),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
