//! Vector store provider implementations.

#[cfg(feature = "vectorstore-memory")]
mod memory;
#[cfg(feature = "vectorstore-qdrant")]
mod qdrant;

#[cfg(feature = "vectorstore-memory")]
pub use memory::InMemoryVectorStore;
#[cfg(feature = "vectorstore-qdrant")]
pub use qdrant::{QdrantConfig, QdrantVectorStore};
