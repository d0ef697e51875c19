//! Safe SQL builder: identifiers from the resource whitelist only, values as parameters.

pub mod builder;
pub mod params;
pub use builder::{parse_filter_key, QueryBuf, OPERATORS};
pub use params::*;
