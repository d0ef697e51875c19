//! Controllers: the per-resource operation table the dispatcher calls into.
//!
//! Every operation has a default implementation; a resource-specific controller overrides only
//! what it needs and can still reach the default through the `default_*` functions.

use crate::error::{status, AppError};
use crate::message;
use crate::resource::{Record, Resource};
use crate::service::CrudService;
use crate::store::Storage;
use async_trait::async_trait;
use serde_json::Value;

/// What an HTTP verb maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Get,
    Add,
    Edit,
    Delete,
}

impl Operation {
    /// `verb` is expected lower-cased.
    pub fn for_verb(verb: &str) -> Option<Self> {
        match verb {
            "get" => Some(Operation::Get),
            "post" => Some(Operation::Add),
            "put" | "patch" => Some(Operation::Edit),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }

    pub fn success_status(self) -> u16 {
        match self {
            Operation::Add => status::SUCCESSFULLY_ADDED,
            _ => status::SUCCESS,
        }
    }
}

#[async_trait]
pub trait Controller: Send + Sync {
    fn resource(&self) -> &Resource;

    /// GET: one record when the identity was sent, otherwise all of them.
    async fn get(&self, storage: &dyn Storage, request: Record) -> Result<Vec<Record>, AppError> {
        default_get(self.resource(), storage, request).await
    }

    /// POST: insert and return the new record.
    async fn add(&self, storage: &dyn Storage, request: Record) -> Result<Vec<Record>, AppError> {
        default_add(self.resource(), storage, request).await
    }

    /// PUT / PATCH: partial update of the record named by the identity.
    async fn edit(&self, storage: &dyn Storage, request: Record) -> Result<Vec<Record>, AppError> {
        default_edit(self.resource(), storage, request).await
    }

    /// DELETE: remove the record named by the identity. Returns no data.
    async fn delete(&self, storage: &dyn Storage, request: Record) -> Result<Vec<Record>, AppError> {
        default_delete(self.resource(), storage, request).await
    }
}

/// A controller with no overrides.
pub struct DefaultController {
    resource: Resource,
}

impl DefaultController {
    pub fn new(resource: Resource) -> Self {
        DefaultController { resource }
    }
}

impl Controller for DefaultController {
    fn resource(&self) -> &Resource {
        &self.resource
    }
}

/// Identity carried by the request, treating null as absent.
pub fn request_id(resource: &Resource, request: &Record) -> Option<Value> {
    request.get(resource.id_field()).filter(|v| !v.is_null()).cloned()
}

/// Mutating verbs need an identity; without one the route does not exist.
pub fn require_id(resource: &Resource, request: &Record) -> Result<Value, AppError> {
    request_id(resource, request).ok_or_else(|| AppError::not_found(message::NOT_FOUND_ROUTE))
}

pub async fn default_get(
    resource: &Resource,
    storage: &dyn Storage,
    request: Record,
) -> Result<Vec<Record>, AppError> {
    match request_id(resource, &request) {
        Some(id) => CrudService::get_by_id(storage, resource, &id).await,
        None => CrudService::get(storage, resource, &[], None).await,
    }
}

pub async fn default_add(
    resource: &Resource,
    storage: &dyn Storage,
    request: Record,
) -> Result<Vec<Record>, AppError> {
    CrudService::insert(storage, resource, request).await
}

pub async fn default_edit(
    resource: &Resource,
    storage: &dyn Storage,
    request: Record,
) -> Result<Vec<Record>, AppError> {
    let id = require_id(resource, &request)?;
    CrudService::update(storage, resource, request, &id).await
}

pub async fn default_delete(
    resource: &Resource,
    storage: &dyn Storage,
    request: Record,
) -> Result<Vec<Record>, AppError> {
    let id = require_id(resource, &request)?;
    CrudService::delete_by_id(storage, resource, &id).await?;
    Ok(Vec::new())
}
