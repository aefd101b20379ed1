//! Job engine, dispatcher, and worker.

mod engine;
mod worker;

pub use engine::{ChannelDispatcher, JobEngine};
pub use worker::{JobWorker, collect_corpus};
