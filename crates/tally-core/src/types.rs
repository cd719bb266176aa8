//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty (after trimming).
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A time entry must cover at least one whole second.
    #[error("duration must be at least one second")]
    ZeroDuration,

    /// The identifier was not a valid UUID.
    #[error("invalid {field}: {value}")]
    MalformedId { field: &'static str, value: String },
}

/// Trims `value` and rejects it if nothing is left.
pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

/// Generates a random UUID identifier newtype with common trait implementations.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// The first eight hex digits, used to address items interactively.
            pub fn short(&self) -> String {
                let mut short = self.0.to_string();
                short.truncate(8);
                short
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::MalformedId {
                        field: $field_name,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_uuid_id!(
    /// Identifier of a recorded time entry.
    ///
    /// Random (v4) so rapid creation never collides.
    EntryId, "entry ID"
);

define_uuid_id!(
    /// Identifier of a project.
    ProjectId, "project ID"
);
