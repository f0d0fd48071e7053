//! Queue-transport payload.

use serde::{Deserialize, Serialize};

/// The message enqueued per processing attempt.
///
/// Ephemeral: exists only in transit, never persisted beyond delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditJobMessage {
    /// Id of the audit record to process.
    #[serde(rename = "auditId")]
    pub audit_id: String,
}

impl AuditJobMessage {
    pub fn new(audit_id: impl Into<String>) -> Self {
        Self {
            audit_id: audit_id.into(),
        }
    }

    /// A well-formed message carries a non-empty audit id.
    pub fn is_valid(&self) -> bool {
        !self.audit_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_audit_id_key() {
        let message = AuditJobMessage::new("abc-123");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"auditId":"abc-123"}"#);

        let parsed: AuditJobMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn blank_audit_id_is_invalid() {
        assert!(!AuditJobMessage::new("").is_valid());
        assert!(!AuditJobMessage::new("   ").is_valid());
        assert!(AuditJobMessage::new("a").is_valid());
    }
}
