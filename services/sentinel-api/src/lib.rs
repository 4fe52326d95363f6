//! Sentinel imagery API service.
//!
//! Translates map-client HTTP requests into Earth Engine expression graphs
//! and relays tile-serving identifiers back. All filtering, masking, and
//! compositing executes remotely.

pub mod handlers;
pub mod imagery;
pub mod state;
