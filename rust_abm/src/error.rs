use thiserror::Error;

use crate::ids::AgentId;

/// Errors raised while configuring or populating a simulation.
///
/// Per-tick behaviour never produces these: an empty board, a failed search
/// draw or an absent peer are ordinary branches of the worker state machine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AbmError {
    #[error("Unknown agent type '{0}'")]
    UnknownAgentType(String),

    #[error("Agent type '{0}' already registered")]
    DuplicateAgentType(String),

    #[error("Missing parameter '{key}' for agent type '{agent}'")]
    MissingParameter { agent: String, key: String },

    #[error("Invalid parameter '{key}' for agent type '{agent}': {reason}")]
    InvalidParameter {
        agent: String,
        key: String,
        reason: String,
    },

    #[error("Agent {0} does not exist or has the wrong type")]
    UnknownAgent(AgentId),

    #[error("Job board {0} does not exist")]
    UnknownBoard(usize),
}

pub type Result<T> = std::result::Result<T, AbmError>;
