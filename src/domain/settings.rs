//! Per-user key/value settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name of the setting holding a user's default sidekick nick.
pub const SIDEKICK_SETTING: &str = "sidekick";

/// One named setting owned by a user. `(uid, name)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Setting {
    /// Owning user.
    pub uid: String,
    /// Setting name.
    pub name: String,
    /// Arbitrary JSON value.
    pub value: serde_json::Value,
    /// Last write timestamp.
    pub updated: DateTime<Utc>,
}

impl Setting {
    /// Builds a setting stamped with the current time.
    #[must_use]
    pub fn new(uid: &str, name: &str, value: serde_json::Value) -> Self {
        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            value,
            updated: Utc::now(),
        }
    }

    /// Interprets the value as a string.
    ///
    /// Older clients stored JSON-encoded text inside the value (`"\"nick\""`),
    /// so a string that itself parses as a JSON string is unwrapped once.
    #[must_use]
    pub fn value_as_str(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(serde_json::Value::String(inner)) => Some(inner),
                _ => Some(raw.clone()),
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_as_str_plain() {
        let s = Setting::new("u1", SIDEKICK_SETTING, json!("brave-owl"));
        assert_eq!(s.value_as_str().as_deref(), Some("brave-owl"));
    }

    #[test]
    fn value_as_str_unwraps_encoded_string() {
        let s = Setting::new("u1", SIDEKICK_SETTING, json!("\"brave-owl\""));
        assert_eq!(s.value_as_str().as_deref(), Some("brave-owl"));
    }

    #[test]
    fn value_as_str_rejects_non_strings() {
        let s = Setting::new("u1", "var1", json!([1, 2]));
        assert!(s.value_as_str().is_none());
    }
}
