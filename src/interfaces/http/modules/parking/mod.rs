//! Read-only status queries: plates, spots, revenue, garage layout

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
