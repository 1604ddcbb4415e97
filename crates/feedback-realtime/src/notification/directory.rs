//! Operator lookup for notification mirroring.

use std::fmt::Debug;

use feedback_core::types::PrincipalId;

/// Source of the operator accounts that receive mirrored ticket activity.
///
/// Implementations must be cheap to call; the notifier queries the directory
/// once per mirrored event.
pub trait OperatorDirectory: Send + Sync + Debug {
    /// Principal IDs of every operator.
    fn operator_ids(&self) -> Vec<PrincipalId>;
}

/// Fixed operator list, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticOperators {
    ids: Vec<PrincipalId>,
}

impl StaticOperators {
    /// Directory over the given IDs. Duplicates are removed, order is kept.
    pub fn new(ids: impl IntoIterator<Item = impl Into<PrincipalId>>) -> Self {
        let mut unique: Vec<PrincipalId> = Vec::new();
        for id in ids {
            let id = id.into();
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self { ids: unique }
    }
}

impl OperatorDirectory for StaticOperators {
    fn operator_ids(&self) -> Vec<PrincipalId> {
        self.ids.clone()
    }
}
