//! HTTP interface
//!
//! - `common`: response envelope, error mapping, validated JSON extractor
//! - `modules`: handlers grouped by resource (webhook, parking, health, metrics)
//! - `router`: route table and OpenAPI document

pub mod common;
pub mod modules;
pub mod router;

pub use common::ApiResponse;
pub use router::{create_api_router, ApiDoc, ApiState};
