use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a user record. Backends send integers, some send strings;
/// anything else is carried as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    Text(String),
    Other(Value),
}

impl UserId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            UserId::Int(id) => Some(*id),
            UserId::Text(id) => id.parse().ok(),
            UserId::Other(_) => None,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Int(id) => write!(f, "{}", id),
            UserId::Text(id) => f.write_str(id),
            UserId::Other(id) => write!(f, "{}", id),
        }
    }
}

/// The authenticated user as reported by the backend.
///
/// Treated as an opaque server record: the fields the client displays are
/// typed, everything else is carried through untouched in `extra` so a
/// persisted snapshot round-trips without loss. No field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(" ");
        }
        match (&self.email, &self.id) {
            (Some(email), _) => email.clone(),
            (None, Some(id)) => format!("User #{}", id),
            (None, None) => "Unknown user".to_string(),
        }
    }

    /// True when at least one identifying field is present
    pub fn is_identified(&self) -> bool {
        self.id.is_some()
            || self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.role.is_some()
    }

    /// Numeric id, when the backend sent one
    pub fn numeric_id(&self) -> Option<i64> {
        self.id.as_ref().and_then(UserId::as_int)
    }

    /// Name with role, as shown in the navigation bar
    pub fn display_name(&self) -> String {
        match self.role.as_deref() {
            Some(role) if !role.is_empty() => format!("{} ({})", self.full_name(), role),
            _ => self.full_name(),
        }
    }
}

/// Body of `GET /api/auth/me`.
///
/// Deployed backends wrap the user as `{"employee": {...}, "organization": ...}`
/// while the minimal contract returns the bare user record. Both are accepted;
/// a bare object carrying none of the user fields (e.g. `{"msg": ...}`) is not.
#[derive(Debug, Clone)]
pub(crate) enum MeResponse {
    Wrapped { employee: User },
    Bare(User),
}

impl<'de> Deserialize<'de> for MeResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut body = Map::<String, Value>::deserialize(deserializer)?;
        if let Some(Value::Object(employee)) = body.remove("employee") {
            let employee = User::deserialize(Value::Object(employee)).map_err(de::Error::custom)?;
            return Ok(MeResponse::Wrapped { employee });
        }
        let user = User::deserialize(Value::Object(body)).map_err(de::Error::custom)?;
        if !user.is_identified() {
            return Err(de::Error::custom("body carries no user fields"));
        }
        Ok(MeResponse::Bare(user))
    }
}

impl MeResponse {
    pub(crate) fn into_user(self) -> User {
        match self {
            MeResponse::Wrapped { employee } => employee,
            MeResponse::Bare(user) => user,
        }
    }
}
