//! User and attribute identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier for a tracked user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Name of a boolean attribute flag (e.g. `"enterprise"`, `"from_ad"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeKey(pub String);

impl AttributeKey {
    pub fn new(key: impl Into<String>) -> Self {
        AttributeKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AttributeKey {
    fn from(key: &str) -> Self {
        AttributeKey(key.to_string())
    }
}

impl From<String> for AttributeKey {
    fn from(key: String) -> Self {
        AttributeKey(key)
    }
}

impl Borrow<str> for AttributeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_user_id_serializes_transparently() {
        let id = UserId::new("user-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-42\"");
        let back: UserId = serde_json::from_str("\"user-42\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_attribute_key_borrow_lookup() {
        let mut counts: HashMap<AttributeKey, u64> = HashMap::new();
        counts.insert(AttributeKey::from("enterprise"), 3);
        assert_eq!(counts.get("enterprise"), Some(&3));
    }

    #[test]
    fn test_display() {
        assert_eq!(UserId::from("u1").to_string(), "u1");
        assert_eq!(AttributeKey::from("attr1").to_string(), "attr1");
    }
}
