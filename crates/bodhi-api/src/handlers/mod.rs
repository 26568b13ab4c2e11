//! HTTP handlers, grouped by resource.

pub mod assets;
pub mod auth;
pub mod catalog;
pub mod images;
