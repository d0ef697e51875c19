//! User-facing message catalog. Every error text the API can emit is built here.

pub const NOT_FOUND_ROUTE: &str = "No such route";
pub const SERVER_ERROR: &str = "The request could not be processed due to an unexpected error";
pub const STORAGE_ERROR: &str = "Storage error";
pub const BODY_NOT_OBJECT: &str = "The request body must be a JSON object";
pub const BODY_TOO_LARGE: &str = "The request body exceeds the size limit";
pub const UNFILTERED_DELETE: &str = "Refusing to delete without a filter for resource";

pub fn validation_failed(count: usize) -> String {
    format!("There are {} error(s) in the request", count)
}

pub fn required_field(field: &str) -> String {
    format!("The field [{}] is required", field)
}

pub fn max_length_exceeded(field: &str, max: usize) -> String {
    format!("The field [{}] has max length of {}", field, max)
}

pub fn invalid_format(field: &str, expected: &str) -> String {
    format!("The field [{}] does not match the expected format: {}", field, expected)
}

pub fn invalid_date(field: &str) -> String {
    format!("The field [{}] is not a valid ISO8601 datetime format", field)
}

pub fn invalid_selection(field: &str, allowed: &str) -> String {
    format!("The field [{}] must be one of these values: {}", field, allowed)
}

pub fn not_greater_than(later: &str, earlier: &str) -> String {
    format!("The field [{}] must be greater than [{}]", later, earlier)
}

pub fn not_found(value: &str, resource: &str) -> String {
    format!(
        "The requested resource was not found, for value {} and resource {}",
        value, resource
    )
}

pub fn no_such_method(verb: &str, resource: &str) -> String {
    format!("No such method for verb: {} and resource: {}", verb, resource)
}

pub fn bad_column(column: &str, resource: &str) -> String {
    format!("Can not find column: {} for resource: {}", column, resource)
}

pub fn bad_filter(column: &str, resource: &str) -> String {
    format!("Can not find filter: {} for resource: {}", column, resource)
}

pub fn empty_update(resource: &str) -> String {
    format!("Update request is empty for resource: {}", resource)
}

pub fn invalid_identity(value: &str, resource: &str) -> String {
    format!("Invalid identity value: {} for resource: {}", value, resource)
}
