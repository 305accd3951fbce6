use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Qualifier;

/// An entry of the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub uuid: String,
    /// Audited area (e.g. "component")
    pub category: String,
    /// The operation performed (e.g. "delete")
    pub operation: String,
    pub entity_uuid: String,
    pub entity_key: String,
    pub entity_name: String,
    pub qualifier: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a deleted top-level entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedEntity {
    pub uuid: String,
    pub key: String,
    pub name: String,
    pub qualifier: Qualifier,
}

/// Input for creating an audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditEntry {
    pub category: String,
    pub operation: String,
    pub entity_uuid: String,
    pub entity_key: String,
    pub entity_name: String,
    pub qualifier: String,
    pub created_at: DateTime<Utc>,
}

impl CreateAuditEntry {
    /// Audit entry for the deletion of a top-level component.
    pub fn component_deleted(entity: &DeletedEntity, deleted_at: DateTime<Utc>) -> Self {
        Self {
            category: "component".to_string(),
            operation: "delete".to_string(),
            entity_uuid: entity.uuid.clone(),
            entity_key: entity.key.clone(),
            entity_name: entity.name.clone(),
            qualifier: entity.qualifier.to_string(),
            created_at: deleted_at,
        }
    }
}
