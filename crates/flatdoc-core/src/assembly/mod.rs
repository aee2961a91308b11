//! Object and array assembly buffers
//!
//! [`Scratch`] is mutable staging memory reused across siblings; [`Frozen`]
//! is append-only memory that finished nodes point into. The two are
//! distinct types and only `Frozen` produces [`FrozenSpan`](crate::FrozenSpan)s.

pub mod frozen;
pub mod scratch;

pub use frozen::Frozen;
pub use scratch::Scratch;
