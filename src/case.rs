//! Name conversion between the API and storage: camelCase fields -> snake_case columns,
//! declared type names -> route and table names.

/// Suffixes stripped from a declared type name before deriving its route.
pub const TYPE_SUFFIXES: &[&str] = &["Resource", "Model", "Controller"];

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "startDate" -> "start_date", "externalId" -> "external_id"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Declared type name without its trailing suffix. "WidgetsResource" -> "Widgets".
pub fn type_stem(type_name: &str) -> &str {
    TYPE_SUFFIXES
        .iter()
        .find_map(|suffix| type_name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(type_name)
}

/// Externally visible route name. "ConstructionStagesResource" -> "constructionstages".
pub fn route_name(type_name: &str) -> String {
    type_stem(type_name).to_lowercase()
}

/// Backing table name. "ConstructionStagesResource" -> "construction_stages".
pub fn table_name(type_name: &str) -> String {
    to_snake_case(type_stem(type_name))
}
