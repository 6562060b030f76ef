//! # Blog Core
//!
//! The domain layer of the blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the post visibility and ownership policy, listing queries, ports,
//! and the use cases built on top of them.

pub mod domain;
pub mod error;
pub mod listing;
pub mod policy;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use policy::{Guarded, Viewer};
pub use service::BlogService;
