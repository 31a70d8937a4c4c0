//! Service layer.
//!
//! Single-capability components. Each one handles one concern and knows
//! nothing about flow order:
//! - `normalizer` - canonicalizes raw document text
//! - `extractor` - heuristic structural parsing, no AI
//! - `validator` - AI response validation and repair
//! - `coordinator` - request deduplication and bounded retry
//! - `prompts` - prompt construction for the single-shot calls

pub mod coordinator;
pub mod extractor;
pub mod normalizer;
pub mod prompts;
pub mod validator;

pub use coordinator::{RequestCoordinator, RequestKey, RetryPolicy};
