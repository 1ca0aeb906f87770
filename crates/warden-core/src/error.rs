//! Kernel-level error taxonomy.
//!
//! Very little in Warden is an `Err`: structural validation problems are
//! reported as [`crate::dag::TopologyReport`] entries, policy denials are
//! ordinary [`crate::policy::PolicyDecision`]s, and CRV failures are ordinary
//! [`crate::crv::GateOutcome`]s. Errors are reserved for collaborator-contract
//! violations — a validator that faults, a ledger write that fails, a sandbox
//! adapter that errors out.

use warden_state::StorageError;

/// Warden kernel errors.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    #[error("validator {validator} faulted: {message}")]
    ValidatorFault { validator: String, message: String },

    #[error("event log error: {0}")]
    Ledger(#[from] StorageError),

    #[error("sandbox execution failed for tool {tool}: {message}")]
    Sandbox { tool: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for kernel operations.
pub type KernelResult<T> = std::result::Result<T, KernelError>;
