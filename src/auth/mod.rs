//! Caller identity for document operations.

mod extractor;

pub use extractor::ActorIdentity;
