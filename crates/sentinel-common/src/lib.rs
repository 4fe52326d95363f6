//! Common types shared across the sentinel-gis services.

pub mod bbox;
pub mod error;
pub mod layer;

pub use bbox::BoundingBox;
pub use error::{ApiError, ApiResult};
pub use layer::{LayerConfig, LayerKind};
