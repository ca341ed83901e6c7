//! Task-source credentials kept in the same key/value store as grants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, ValidationError};
use crate::store::KeyValueStore;

pub const API_TOKEN_KEY: &str = "notion_api_token";
pub const DATABASE_ID_KEY: &str = "notion_db_id";

pub const MSG_MISSING_FIELDS: &str = "Please fill in all fields";
pub const MSG_SAVED: &str = "Settings saved successfully!";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub api_token: String,
    pub database_id: String,
}

/// Why a save did not happen.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SaveError {
    /// The status line a settings form shows for this failure.
    pub fn status_message(&self) -> String {
        match self {
            SaveError::Invalid(_) => MSG_MISSING_FIELDS.to_string(),
            SaveError::Store(e) => format!("Error saving settings: {e}"),
        }
    }
}

impl Settings {
    pub fn new(api_token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            database_id: database_id.into(),
        }
    }

    /// Read both values; missing keys come back empty.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            api_token: store.get_string(API_TOKEN_KEY)?.unwrap_or_default(),
            database_id: store.get_string(DATABASE_ID_KEY)?.unwrap_or_default(),
        })
    }

    pub fn is_complete(&self) -> bool {
        !self.api_token.is_empty() && !self.database_id.is_empty()
    }

    /// Trim, validate and persist. Returns the trimmed values that were stored.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<Self, SaveError> {
        let trimmed = Self::new(self.api_token.trim(), self.database_id.trim());
        if trimmed.api_token.is_empty() {
            return Err(ValidationError::EmptyField {
                field: API_TOKEN_KEY.to_string(),
            }
            .into());
        }
        if trimmed.database_id.is_empty() {
            return Err(ValidationError::EmptyField {
                field: DATABASE_ID_KEY.to_string(),
            }
            .into());
        }
        store.set(API_TOKEN_KEY, Value::from(trimmed.api_token.as_str()))?;
        store.set(DATABASE_ID_KEY, Value::from(trimmed.database_id.as_str()))?;
        Ok(trimmed)
    }

    /// Token with all but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.api_token.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{visible}", "*".repeat(chars.len() - 4))
    }
}
