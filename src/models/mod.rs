//! Wire models exchanged with the generation backend.

mod request;
mod result;

pub use request::GenerateRequest;
pub use result::{GenerationPaths, GenerationResult, GenerationScores};
