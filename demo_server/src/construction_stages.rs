//! Construction stages: dated work items whose `duration` is derived from their date span.

use async_trait::async_trait;
use resource_api::datetime::{hours_between, normalize_date_time};
use resource_api::handlers::{default_add, default_edit, require_id};
use resource_api::service::validation::{
    in_list, later_than, max_length, required_all, valid_color, valid_date,
};
use resource_api::{AppError, ConfigError, Controller, CrudService, Record, Resource, Storage};
use serde_json::{json, Value};

pub const STATUSES: [&str; 3] = ["NEW", "PLANNED", "DELETED"];
pub const DURATION_UNITS: [&str; 3] = ["HOURS", "DAYS", "WEEKS"];

/// Fields whose change requires `duration` to be recomputed.
const DURATION_INPUTS: [&str; 3] = ["startDate", "endDate", "durationUnit"];

pub fn resource() -> Result<Resource, ConfigError> {
    Resource::builder("ConstructionStagesResource")
        .fields([
            "name",
            "startDate",
            "endDate",
            "duration",
            "durationUnit",
            "color",
            "externalId",
            "status",
        ])
        .default_value("durationUnit", "DAYS")
        .default_value("status", "NEW")
        .transform("startDate", normalize_date_time)
        .transform("endDate", normalize_date_time)
        .validate_all(required_all(&["name", "startDate", "durationUnit", "status"]))
        .validate(max_length("name", 255))
        .validate(valid_date("startDate"))
        .validate(valid_date("endDate"))
        .validate(later_than("endDate", "startDate"))
        .validate(in_list("status", STATUSES))
        .validate(in_list("durationUnit", DURATION_UNITS))
        .validate(valid_color("color"))
        .validate(max_length("externalId", 255))
        .build()
}

/// Span between `startDate` and `endDate` in the record's `durationUnit`, never negative.
/// Null when there is no end date; unknown units count in hours.
pub fn duration(record: &Record) -> Value {
    let text = |f: &str| record.get(f).and_then(Value::as_str);
    let Some(hours) = hours_between(text("endDate"), text("startDate")) else {
        return Value::Null;
    };
    let factor = match text("durationUnit") {
        Some("DAYS") => 24.0,
        Some("WEEKS") => 24.0 * 7.0,
        _ => 1.0,
    };
    json!(hours.abs() as f64 / factor)
}

pub struct ConstructionStagesController {
    resource: Resource,
}

impl ConstructionStagesController {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(ConstructionStagesController {
            resource: resource()?,
        })
    }

    /// Recompute `duration` when a duration input is sent, merging the stored row for the
    /// inputs that were not. Otherwise a client-sent `duration` is dropped.
    async fn with_duration(
        &self,
        storage: &dyn Storage,
        mut request: Record,
    ) -> Result<Record, AppError> {
        if !DURATION_INPUTS.iter().any(|f| request.contains_key(*f)) {
            request.remove("duration");
            return Ok(request);
        }
        let id = require_id(&self.resource, &request)?;
        let mut inputs = CrudService::get_by_id(storage, &self.resource, &id)
            .await?
            .swap_remove(0);
        for field in DURATION_INPUTS {
            if let Some(v) = request.get(field) {
                inputs.insert(field.to_string(), v.clone());
            }
        }
        request.insert("duration".to_string(), duration(&inputs));
        Ok(request)
    }
}

#[async_trait]
impl Controller for ConstructionStagesController {
    fn resource(&self) -> &Resource {
        &self.resource
    }

    async fn add(&self, storage: &dyn Storage, mut request: Record) -> Result<Vec<Record>, AppError> {
        self.resource.add_default_values(&mut request);
        CrudService::check_validations(&self.resource, &request, None)?;
        let computed = duration(&request);
        request.insert("duration".to_string(), computed);
        default_add(&self.resource, storage, request).await
    }

    async fn edit(&self, storage: &dyn Storage, request: Record) -> Result<Vec<Record>, AppError> {
        let request = self.with_duration(storage, request).await?;
        default_edit(&self.resource, storage, request).await
    }

    /// Soft delete: the row stays, marked DELETED, and is returned.
    async fn delete(&self, storage: &dyn Storage, mut request: Record) -> Result<Vec<Record>, AppError> {
        require_id(&self.resource, &request)?;
        request.insert("status".to_string(), json!("DELETED"));
        self.edit(storage, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn duration_follows_the_unit() {
        let mut r = rec(json!({
            "startDate": "2024-01-01T00:00:00Z",
            "endDate": "2024-01-15T00:00:00Z",
            "durationUnit": "DAYS"
        }));
        assert_eq!(duration(&r), json!(14.0));
        r.insert("durationUnit".into(), json!("WEEKS"));
        assert_eq!(duration(&r), json!(2.0));
        r.insert("durationUnit".into(), json!("HOURS"));
        assert_eq!(duration(&r), json!(336.0));
    }

    #[test]
    fn end_before_start_still_yields_a_positive_span() {
        let r = rec(json!({
            "startDate": "2024-01-15T00:00:00Z",
            "endDate": "2024-01-01T00:00:00Z",
            "durationUnit": "DAYS"
        }));
        assert_eq!(duration(&r), json!(14.0));
    }

    #[test]
    fn open_ended_stage_has_no_duration() {
        let r = rec(json!({"startDate": "2024-01-01T00:00:00Z", "durationUnit": "DAYS"}));
        assert_eq!(duration(&r), Value::Null);
    }

    #[test]
    fn end_before_start_fails_validation() {
        let resource = resource().unwrap();
        let r = rec(json!({
            "name": "dig",
            "startDate": "2024-02-01T00:00:00Z",
            "endDate": "2024-01-01T00:00:00Z",
            "durationUnit": "DAYS",
            "status": "NEW"
        }));
        let err = CrudService::check_validations(&resource, &r, None).unwrap_err();
        assert!(err.to_string().contains("The field [endDate] must be greater than [startDate]"));
    }
}
