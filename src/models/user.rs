use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user payload carried inside the session cookie.
///
/// An open JSON object. `id`, `email`, `name` and `roles` are recognized and have
/// typed accessors, but any other keys are kept as-is and no schema is enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(Map<String, Value>);

impl UserRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The user's identifier.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// The user's email address.
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    /// The user's display name. `null` reads as `None`.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// The user's roles, in order. Non-string entries are skipped.
    pub fn roles(&self) -> Option<Vec<&str>> {
        self.0
            .get("roles")
            .and_then(Value::as_array)
            .map(|roles| roles.iter().filter_map(Value::as_str).collect())
    }

    /// Reads an arbitrary field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with("id", Value::String(id.into()))
    }

    pub fn with_email(self, email: impl Into<String>) -> Self {
        self.with("email", Value::String(email.into()))
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with("name", Value::String(name.into()))
    }

    pub fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = roles.into_iter().map(|r| Value::String(r.into())).collect();
        self.with("roles", Value::Array(roles))
    }

    /// Sets an arbitrary field.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognized_fields_have_typed_accessors() {
        let user = UserRecord::new()
            .with_id("u1")
            .with_email("a@b.com")
            .with_name("Ada")
            .with_roles(["admin", "user"]);

        assert_eq!(user.id(), Some("u1"));
        assert_eq!(user.email(), Some("a@b.com"));
        assert_eq!(user.name(), Some("Ada"));
        assert_eq!(user.roles(), Some(vec!["admin", "user"]));
    }

    #[test]
    fn unknown_fields_survive_serde() {
        let value = json!({
            "id": "u1",
            "name": null,
            "plan": { "tier": "pro", "seats": 3 },
        });
        let user: UserRecord = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(user.name(), None);
        assert_eq!(user.get("plan"), Some(&json!({ "tier": "pro", "seats": 3 })));
        assert_eq!(serde_json::to_value(&user).unwrap(), value);
    }

    #[test]
    fn only_objects_are_records() {
        assert!(UserRecord::from_value(json!({ "id": "u1" })).is_some());
        assert!(UserRecord::from_value(json!([1, 2, 3])).is_none());
        assert!(UserRecord::from_value(json!("u1")).is_none());
        assert!(UserRecord::from_value(Value::Null).is_none());
    }

    #[test]
    fn recognized_fields_of_the_wrong_type_read_as_none() {
        let user = UserRecord::from_value(json!({ "id": 42, "roles": "admin" })).unwrap();
        assert_eq!(user.id(), None);
        assert_eq!(user.roles(), None);
        assert_eq!(user.get("id"), Some(&json!(42)));
    }
}
