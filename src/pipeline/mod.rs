//! The retrieval-and-dispatch pipeline: embedding collaborators, the
//! condition index, and the staged response dispatcher.

pub mod dispatch;
pub mod embedding;
pub mod retrieval;
