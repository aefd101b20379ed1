//! Access control and request defenses.

mod access_control;
mod defense;

pub use access_control::{AccessControl, Resource, ResourceAction};
pub use defense::{EmbeddingProtector, InjectionDetector, VectorAnomalyDetector};
