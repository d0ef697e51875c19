//! Generic CRUD over a resource: builder + storage + validation + row translation.

use crate::error::AppError;
use crate::message;
use crate::resource::{Record, Resource};
use crate::service::validation::RequestValidator;
use crate::sql::builder;
use crate::store::Storage;
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// Rows matching every filter condition. `fields = None` reads all declared fields.
    pub async fn get(
        storage: &dyn Storage,
        resource: &Resource,
        filter: &[(String, Value)],
        fields: Option<&[String]>,
    ) -> Result<Vec<Record>, AppError> {
        let q = builder::select(resource, filter, fields)?;
        let rows = storage.execute(&q).await?;
        Ok(resource.translate_rows(rows))
    }

    /// The single row with this identity, or a not-found request error.
    pub async fn get_by_id(
        storage: &dyn Storage,
        resource: &Resource,
        id: &Value,
    ) -> Result<Vec<Record>, AppError> {
        let filter = [(resource.id_field().to_string(), id.clone())];
        let data = Self::get(storage, resource, &filter, None).await?;
        if data.is_empty() {
            return Err(not_found(resource, id));
        }
        Ok(data)
    }

    /// Apply defaults, validate, then insert. Returns the stored record.
    pub async fn insert(
        storage: &dyn Storage,
        resource: &Resource,
        mut record: Record,
    ) -> Result<Vec<Record>, AppError> {
        resource.add_default_values(&mut record);
        Self::check_validations(resource, &record, None)?;
        strip_identity(resource, &mut record);

        let q = builder::insert(resource, &record)?;
        let (rows, id) = storage.execute_insert(&q).await?;
        if rows.is_empty() {
            if let Some(id) = id {
                return Self::get_by_id(storage, resource, &id).await;
            }
        }
        Ok(resource.translate_rows(rows))
    }

    /// Partial update: only the fields sent are written. Returns the whole updated record.
    pub async fn update(
        storage: &dyn Storage,
        resource: &Resource,
        mut record: Record,
        id: &Value,
    ) -> Result<Vec<Record>, AppError> {
        strip_identity(resource, &mut record);
        Self::check_validations(resource, &record, Some(id))?;
        if record.is_empty() {
            return Err(AppError::request(message::empty_update(resource.name())));
        }

        let q = builder::update(resource, &record, id)?;
        let data = resource.translate_rows(storage.execute(&q).await?);
        if data.is_empty() {
            return Err(not_found(resource, id));
        }
        Ok(data)
    }

    /// Delete the row with this identity. Deleting a missing row is not an error.
    pub async fn delete_by_id(
        storage: &dyn Storage,
        resource: &Resource,
        id: &Value,
    ) -> Result<(), AppError> {
        let filter = [(resource.id_field().to_string(), id.clone())];
        Self::delete(storage, resource, &filter).await
    }

    /// Delete every row matching the filter. The filter must not be empty.
    pub async fn delete(
        storage: &dyn Storage,
        resource: &Resource,
        filter: &[(String, Value)],
    ) -> Result<(), AppError> {
        let q = builder::delete(resource, filter)?;
        storage.execute(&q).await?;
        Ok(())
    }

    pub fn check_validations(
        resource: &Resource,
        record: &Record,
        id: Option<&Value>,
    ) -> Result<(), AppError> {
        RequestValidator::check_validations(resource.validations(), record, id)
    }
}

fn strip_identity(resource: &Resource, record: &mut Record) {
    let id_field = resource.id_field();
    record.retain(|k, _| k != id_field);
}

fn not_found(resource: &Resource, id: &Value) -> AppError {
    let shown = match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    AppError::not_found(message::not_found(&shown, resource.name()))
}
