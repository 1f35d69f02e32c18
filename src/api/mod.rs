//! API response types, pagination and request extractors

pub mod json;
pub mod pagination;
pub mod response;

pub use json::{ValidJson, ValidPath, ValidQuery};
pub use pagination::{Paginated, PaginationParams};
pub use response::{Created, DataResponse};
