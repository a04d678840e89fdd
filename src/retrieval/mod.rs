// Retrieval module
// Exact vector index plus the query-side retriever

pub mod index;
pub mod retriever;

pub use index::{IndexError, Neighbor, VectorIndex, squared_l2};
pub use retriever::{RetrievedChunk, Retriever};
