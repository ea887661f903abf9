// ── Core identity type ──
//
// ResourceId is the key of every collection. Rows from the data API carry
// integer, UUID, or free-form string primary keys; optimistic creates carry
// a temporary key until the server assigns the real one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const TEMPORARY_PREFIX: &str = "tmp-";

/// Canonical identifier for any portfolio resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Uuid(Uuid),
    Text(String),
}

impl ResourceId {
    /// A fresh client-side id for an optimistic create.
    pub fn temporary() -> Self {
        Self::Text(format!("{TEMPORARY_PREFIX}{}", Uuid::new_v4()))
    }

    /// Whether this id was minted locally and has not been confirmed.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Text(s) if s.starts_with(TEMPORARY_PREFIX))
    }

    /// Extract the id from a JSON row (`{"id": ...}`).
    ///
    /// Goes through the same serde path as typed rows so both agree on the key.
    pub fn from_record(record: &serde_json::Value) -> Option<Self> {
        match record.get("id")? {
            serde_json::Value::Null => None,
            id => serde_json::from_value(id.clone()).ok(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<Uuid> for ResourceId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        if let Ok(n) = s.parse::<i64>() {
            return Self::Int(n);
        }
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_int_uuid_and_text() {
        assert_eq!(ResourceId::from("42"), ResourceId::Int(42));
        let u = Uuid::new_v4();
        assert_eq!(ResourceId::from(u.to_string()), ResourceId::Uuid(u));
        assert_eq!(ResourceId::from("github"), ResourceId::Text("github".into()));
    }

    #[test]
    fn temporary_ids_are_unique_and_flagged() {
        let a = ResourceId::temporary();
        let b = ResourceId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(!ResourceId::Int(1).is_temporary());
    }

    #[test]
    fn untagged_serde_round_trips_wire_shapes() {
        let int: ResourceId = serde_json::from_str("7").unwrap();
        assert_eq!(int, ResourceId::Int(7));
        assert_eq!(serde_json::to_string(&int).unwrap(), "7");
    }

    #[test]
    fn from_record_reads_id_field() {
        let row = serde_json::json!({ "id": 3, "name": "x" });
        assert_eq!(ResourceId::from_record(&row), Some(ResourceId::Int(3)));
        assert_eq!(ResourceId::from_record(&serde_json::json!({ "name": "x" })), None);
    }
}
