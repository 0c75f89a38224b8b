use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Who authored a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A question typed by the person driving the session.
    User,
    /// An answer produced by the retrieval backend.
    Assistant,
}

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Identifier for a conversation turn.
///
/// Minted by the timeline's own counter, so ids are unique and strictly
/// increasing within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurnId(pub u64);

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in seconds since epoch.
///
/// Compared by value. Two Timestamps with the same inner value are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Newtype Wrappers - String
// =============================================================================

/// Display identity of the loaded document, doubling as the backend routing
/// key (`doc_id` on the wire).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentName(pub String);

impl DocumentName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DocumentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Entity Structs (defined in docchat-core for shared use)
// =============================================================================

/// A single conversation turn.
///
/// `references` carries the supporting excerpts returned by the backend and
/// is only ever non-empty on assistant turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub references: Vec<String>,
}

impl Turn {
    /// A question turn. User turns never carry references.
    pub fn user(id: TurnId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            references: Vec::new(),
        }
    }

    /// An answer turn with its supporting excerpts.
    pub fn assistant(id: TurnId, text: impl Into<String>, references: Vec<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            text: text.into(),
            created_at: Utc::now(),
            references,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
