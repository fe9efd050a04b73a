//! Index provisioning
//!
//! Ensures the target index exists with the required schema before any
//! record is written. Provisioning never raises: every backend error is
//! logged and reported as [`ProvisionOutcome::Failed`].

use crate::storage::{CreateOutcome, IndexSchema, SearchBackend};
use std::fmt;
use std::sync::Arc;

/// Result of an `ensure` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The index did not exist and was created
    Created,

    /// The index was already present; nothing was written
    AlreadyExisted,

    /// The existence check or the creation failed
    Failed,
}

impl ProvisionOutcome {
    /// Returns true if the index can be written to
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Created | Self::AlreadyExisted)
    }
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::AlreadyExisted => "already_existed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Creates the target index on demand
#[derive(Clone)]
pub struct IndexProvisioner {
    backend: Arc<dyn SearchBackend>,
}

impl IndexProvisioner {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Ensures `index` exists, creating it with `schema` if missing
    ///
    /// Calling this any number of times has the same effect as calling it
    /// once: an existing index is never touched.
    pub async fn ensure(&self, index: &str, schema: &IndexSchema) -> ProvisionOutcome {
        match self.backend.index_exists(index).await {
            Ok(true) => {
                tracing::debug!("Index {} already exists", index);
                return ProvisionOutcome::AlreadyExisted;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to check whether index {} exists: {}", index, e);
                return ProvisionOutcome::Failed;
            }
        }

        match self.backend.create_index(index, schema).await {
            Ok(CreateOutcome::Created) => {
                tracing::info!("Created index {}", index);
                ProvisionOutcome::Created
            }
            Ok(CreateOutcome::AlreadyExists) => {
                tracing::debug!("Index {} was created concurrently", index);
                ProvisionOutcome::AlreadyExisted
            }
            Err(e) => {
                tracing::error!("Failed to create index {}: {}", index, e);
                ProvisionOutcome::Failed
            }
        }
    }
}
