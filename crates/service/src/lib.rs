//! Remote management service bindings for cmsweep.
//!
//! This crate provides:
//! - The [`CoreService`] and [`StreamDownload`] capabilities
//! - A JSON-over-HTTP backend for both
//! - The per-invocation [`Session`] with lazy handles and guaranteed release
//! - Translation of service faults into [`cmsweep_core::Error`]

pub mod error;
pub mod http;
pub mod session;
pub mod traits;

pub use error::{ServiceError, ServiceResult};
pub use http::{HttpConnector, HttpCoreService, HttpStreamDownload};
pub use session::Session;
pub use traits::{ByteStream, Connector, CoreService, StreamDownload};
