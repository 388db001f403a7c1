//! Transport-agnostic request routing for the Updraft HTTP surface.
//!
//! A host server converts its native request into a [`Request`], awaits
//! [`Router::handle`], and writes the returned [`Response`] back.

mod payload;
mod request;
mod router;

pub use payload::{ErrorPayload, OverviewPayload, UpdatePayload, VersionPayload};
pub use request::{Request, Response};
pub use router::Router;
