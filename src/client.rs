//! Client for the AI translation and summarization endpoints.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;
pub mod operation;

pub use builder::PostAiClientBuilder;
pub use self::core::PostAiClient;
pub use operation::{
    OperationKind, OperationOutput, OperationRequest, ResultOrigin, SummarizeOptions,
};
