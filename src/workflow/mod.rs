//! Workflow layer.
//!
//! The multi-agent question workflow: a directed state graph of five agent
//! roles with conditional routing and one bounded feedback loop. Owns no
//! resources; depends only on the transport capability.

pub mod agents;
pub mod graph;
pub mod state;

pub use agents::AgentRole;
pub use graph::{next_state, QuestionWorkflow, WorkflowState};
pub use state::{AgentMessage, AgentState, StateUpdate};
