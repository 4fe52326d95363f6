//! Minimal Google Earth Engine REST client.
//!
//! Covers exactly what the sentinel-api service needs:
//! - service-account credential loading and the OAuth2 jwt-bearer grant
//! - building serialized expression graphs (the wire form of the
//!   computation DAG that Earth Engine evaluates server-side)
//! - `projects.maps.create` for tile-serving identifiers
//! - `projects.value.compute` for synchronous scalar/array queries
//!
//! No computation happens locally; every operation in an expression is a
//! named server-side Earth Engine algorithm.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod expression;

pub use client::{GeeClient, MapId, VisRange, VisualizationOptions};
pub use credentials::{ServiceAccountKey, CREDENTIALS_ENV};
pub use error::{GeeError, GeeResult};
pub use expression::{Expression, ExpressionBuilder, NodeRef};
