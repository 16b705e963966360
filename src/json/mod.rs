//! Generic JSON value trees built from push-style parse events.
//!
//! Schema-driven readers hand any content they do not recognize (vendor
//! extensions, `extras`, experimental properties) to a [`ValueBuilder`],
//! which turns the reader's event stream into a dynamically-typed
//! [`JsonValue`] tree. Object key order is preserved.

mod builder;
mod value;

pub use builder::{BuildError, ValueBuilder};
pub use value::JsonValue;
