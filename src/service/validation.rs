//! Composable record validation: rules run before every write.
//!
//! A rule classifies a record (plus the identity when updating) and yields a message when it
//! fails. Rules only check presence-conditional constraints: an absent or null field never
//! fails anything except [`required`].

use crate::datetime::parse_date_time;
use crate::error::AppError;
use crate::message;
use crate::resource::Record;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};

type Predicate = Arc<dyn Fn(&Record, Option<&Value>) -> bool + Send + Sync>;
type MessageFn = Arc<dyn Fn(&Record, Option<&Value>) -> String + Send + Sync>;

/// `#rgb` or `#rrggbb`.
pub const HEX_COLOR_PATTERN: &str = r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$";

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HEX_COLOR_PATTERN).expect("hex color pattern compiles"));

#[derive(Clone)]
enum ErrorMessage {
    Static(String),
    Computed(MessageFn),
}

/// One validation rule: a predicate and the message reported when it does not hold.
#[derive(Clone)]
pub struct Validation {
    predicate: Predicate,
    message: ErrorMessage,
}

impl Validation {
    pub fn new<F>(predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Record, Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Validation {
            predicate: Arc::new(predicate),
            message: ErrorMessage::Static(message.into()),
        }
    }

    /// Rule whose message depends on the rejected record.
    pub fn with_message_fn<F, M>(predicate: F, message: M) -> Self
    where
        F: Fn(&Record, Option<&Value>) -> bool + Send + Sync + 'static,
        M: Fn(&Record, Option<&Value>) -> String + Send + Sync + 'static,
    {
        Validation {
            predicate: Arc::new(predicate),
            message: ErrorMessage::Computed(Arc::new(message)),
        }
    }

    /// None when the record passes, the failure message otherwise.
    pub fn evaluate(&self, record: &Record, id: Option<&Value>) -> Option<String> {
        if (self.predicate)(record, id) {
            return None;
        }
        Some(match &self.message {
            ErrorMessage::Static(s) => s.clone(),
            ErrorMessage::Computed(f) => f(record, id),
        })
    }
}

impl std::fmt::Debug for Validation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.message {
            ErrorMessage::Static(ref s) => s.as_str(),
            ErrorMessage::Computed(_) => "<computed message>",
        };
        f.debug_tuple("Validation").field(&kind).finish()
    }
}

pub struct RequestValidator;

impl RequestValidator {
    /// Run every rule in declaration order and report all failures at once.
    pub fn check_validations(
        rules: &[Validation],
        record: &Record,
        id: Option<&Value>,
    ) -> Result<(), AppError> {
        let failures: Vec<String> = rules
            .iter()
            .filter_map(|rule| rule.evaluate(record, id))
            .collect();
        if failures.is_empty() {
            return Ok(());
        }
        let mut msg = message::validation_failed(failures.len());
        for failure in &failures {
            msg.push('\n');
            msg.push_str(failure);
        }
        Err(AppError::validation(msg))
    }
}

/// Field value, treating null as absent.
fn present<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Field must be present and non-empty. When updating (identity given), a field that is not
/// sent at all is left alone; sending it empty still fails.
pub fn required(field: &str) -> Validation {
    let column = field.to_string();
    Validation::new(
        move |record, id| match record.get(&column) {
            None => id.is_some(),
            Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        },
        message::required_field(field),
    )
}

pub fn required_all(fields: &[&str]) -> Vec<Validation> {
    fields.iter().map(|f| required(f)).collect()
}

pub fn max_length(field: &str, max: usize) -> Validation {
    let column = field.to_string();
    Validation::new(
        move |record, _| match present(record, &column) {
            Some(Value::String(s)) => s.chars().count() <= max,
            Some(Value::Number(n)) => n.to_string().chars().count() <= max,
            _ => true,
        },
        message::max_length_exceeded(field, max),
    )
}

pub fn valid_date(field: &str) -> Validation {
    let column = field.to_string();
    Validation::new(
        move |record, _| match present(record, &column) {
            None => true,
            Some(v) => v.as_str().and_then(parse_date_time).is_some(),
        },
        message::invalid_date(field),
    )
}

pub fn in_list<I, V>(field: &str, allowed: I) -> Validation
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let column = field.to_string();
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    let listed = allowed
        .iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(", ");
    Validation::new(
        move |record, _| match present(record, &column) {
            None => true,
            Some(v) => allowed.iter().any(|a| value_eq(v, a)),
        },
        message::invalid_selection(field, &listed),
    )
}

/// Field must match `regex` when present. `expected` describes the format in the message.
pub fn matching(field: &str, regex: Regex, expected: &str) -> Validation {
    let column = field.to_string();
    Validation::new(
        move |record, _| match present(record, &column) {
            None => true,
            Some(Value::String(s)) => regex.is_match(s),
            Some(Value::Number(n)) => regex.is_match(&n.to_string()),
            Some(_) => false,
        },
        message::invalid_format(field, expected),
    )
}

/// Like [`matching`], compiling the pattern first. A bad pattern is the resource author's bug.
pub fn pattern(field: &str, pattern: &str, expected: &str) -> Result<Validation, AppError> {
    let regex = Regex::new(pattern)
        .map_err(|e| AppError::internal(format!("invalid pattern for {}", field), e))?;
    Ok(matching(field, regex, expected))
}

pub fn valid_color(field: &str) -> Validation {
    matching(field, HEX_COLOR.clone(), HEX_COLOR_PATTERN)
}

/// `later` must be strictly after `earlier`. Missing or unparsable dates are left to
/// [`required`] and [`valid_date`].
pub fn later_than(later: &str, earlier: &str) -> Validation {
    let (l, e) = (later.to_string(), earlier.to_string());
    Validation::new(
        move |record, _| {
            let parse = |f: &str| present(record, f).and_then(Value::as_str).and_then(parse_date_time);
            match (parse(&l), parse(&e)) {
                (Some(a), Some(b)) => a > b,
                _ => true,
            }
        },
        message::not_greater_than(later, earlier),
    )
}
