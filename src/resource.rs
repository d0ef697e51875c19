//! Resource descriptor: the whitelisted columns, defaults, read transforms and validations
//! bound to one backing table. Built once at startup, immutable afterwards.

use crate::case::{route_name, table_name, to_snake_case};
use crate::error::{AppError, ConfigError};
use crate::message;
use crate::service::validation::Validation;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One row as seen by the API: field name -> value, in insertion order.
pub type Record = Map<String, Value>;

pub const DEFAULT_ID_FIELD: &str = "id";

/// How a captured path segment is turned into an identity value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdKind {
    #[default]
    Integer,
    Text,
    Uuid,
}

impl IdKind {
    pub fn parse(&self, raw: &str, resource: &str) -> Result<Value, AppError> {
        let invalid = || AppError::request(message::invalid_identity(raw, resource));
        Ok(match self {
            IdKind::Integer => {
                let n: i64 = raw.parse().map_err(|_| invalid())?;
                Value::Number(n.into())
            }
            IdKind::Uuid => {
                let u = uuid::Uuid::parse_str(raw).map_err(|_| invalid())?;
                Value::String(u.to_string())
            }
            IdKind::Text => Value::String(raw.to_string()),
        })
    }
}

/// Value merged into an insert payload when the field is missing.
#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    /// Computed from the record as it was received.
    Computed(Arc<dyn Fn(&Record) -> Value + Send + Sync>),
}

impl DefaultValue {
    fn resolve(&self, record: &Record) -> Value {
        match self {
            DefaultValue::Static(v) => v.clone(),
            DefaultValue::Computed(f) => f(record),
        }
    }
}

/// Read-time rewrite of one field's stored value.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct Resource {
    type_name: String,
    route: String,
    table: String,
    id_field: String,
    id_kind: IdKind,
    /// Declared fields, identity first.
    fields: Vec<String>,
    /// Snake-cased whitelist.
    columns: HashSet<String>,
    defaults: Vec<(String, DefaultValue)>,
    transforms: HashMap<String, Transform>,
    validations: Vec<Validation>,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("type_name", &self.type_name)
            .field("route", &self.route)
            .field("table", &self.table)
            .field("id_field", &self.id_field)
            .field("fields", &self.fields)
            .field("validations", &self.validations.len())
            .finish()
    }
}

impl Resource {
    /// Start declaring a resource from its type name, e.g. `WidgetsResource`.
    pub fn builder(type_name: impl Into<String>) -> ResourceBuilder {
        ResourceBuilder {
            type_name: type_name.into(),
            table: None,
            id_field: DEFAULT_ID_FIELD.to_string(),
            id_kind: IdKind::default(),
            fields: Vec::new(),
            defaults: Vec::new(),
            transforms: HashMap::new(),
            validations: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name used in error messages and route matching.
    pub fn name(&self) -> &str {
        &self.route
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn id_column(&self) -> String {
        to_snake_case(&self.id_field)
    }

    pub fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn validations(&self) -> &[Validation] {
        &self.validations
    }

    /// Whether the (already snake-cased) column is whitelisted.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Every declared column, snake-cased, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = String> + '_ {
        self.fields.iter().map(|f| to_snake_case(f))
    }

    /// Merge default values for fields the record does not carry.
    pub fn add_default_values(&self, record: &mut Record) {
        let received = record.clone();
        for (field, default) in &self.defaults {
            if !record.contains_key(field) {
                record.insert(field.clone(), default.resolve(&received));
            }
        }
    }

    /// Storage rows -> API records over the declared fields. Missing columns become null.
    pub fn translate_rows(&self, rows: Vec<Record>) -> Vec<Record> {
        rows.into_iter().map(|row| self.translate_row(&row)).collect()
    }

    fn translate_row(&self, row: &Record) -> Record {
        let mut out = Record::new();
        for field in &self.fields {
            let value = row.get(&to_snake_case(field)).cloned().unwrap_or(Value::Null);
            let value = match self.transforms.get(field) {
                Some(transform) => transform(value),
                None => value,
            };
            out.insert(field.clone(), value);
        }
        out
    }
}

pub struct ResourceBuilder {
    type_name: String,
    table: Option<String>,
    id_field: String,
    id_kind: IdKind,
    fields: Vec<String>,
    defaults: Vec<(String, DefaultValue)>,
    transforms: HashMap<String, Transform>,
    validations: Vec<Validation>,
}

impl ResourceBuilder {
    /// Override the table derived from the type name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn id_kind(mut self, kind: IdKind) -> Self {
        self.id_kind = kind;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn default_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.push((field.into(), DefaultValue::Static(value.into())));
        self
    }

    pub fn default_with<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.defaults.push((field.into(), DefaultValue::Computed(Arc::new(f))));
        self
    }

    pub fn transform<F>(mut self, field: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transforms.insert(field.into(), Arc::new(f));
        self
    }

    pub fn validate(mut self, rule: Validation) -> Self {
        self.validations.push(rule);
        self
    }

    pub fn validate_all(mut self, rules: impl IntoIterator<Item = Validation>) -> Self {
        self.validations.extend(rules);
        self
    }

    pub fn build(self) -> Result<Resource, ConfigError> {
        let route = route_name(&self.type_name);
        if route.is_empty() || route.contains('/') {
            return Err(ConfigError::InvalidResource(format!(
                "type name '{}' does not yield a route",
                self.type_name
            )));
        }
        let mut fields = vec![self.id_field.clone()];
        for f in self.fields {
            if !fields.contains(&f) {
                fields.push(f);
            }
        }
        for (field, _) in &self.defaults {
            if !fields.contains(field) {
                return Err(ConfigError::InvalidResource(format!(
                    "default for undeclared field '{}' on {}",
                    field, self.type_name
                )));
            }
        }
        let columns = fields.iter().map(|f| to_snake_case(f)).collect();
        Ok(Resource {
            table: self.table.unwrap_or_else(|| table_name(&self.type_name)),
            route,
            type_name: self.type_name,
            id_field: self.id_field,
            id_kind: self.id_kind,
            fields,
            columns,
            defaults: self.defaults,
            transforms: self.transforms,
            validations: self.validations,
        })
    }
}
