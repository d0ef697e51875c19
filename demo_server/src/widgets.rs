use resource_api::service::validation::{max_length, required, valid_color};
use resource_api::{ConfigError, Resource};

pub fn resource() -> Result<Resource, ConfigError> {
    Resource::builder("WidgetsResource")
        .fields(["name", "color"])
        .validate(required("name"))
        .validate(max_length("name", 5))
        .validate(valid_color("color"))
        .build()
}
