//! CrudService: generic CRUD using the safe SQL builder, plus the validation framework.

mod crud;
pub mod validation;
pub use crud::CrudService;
pub use validation::{RequestValidator, Validation};
