use std::fmt;

use crate::category::{Category, PersonaStyle};

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// No response bucket for this `(style, category)` pair.
    NotFound {
        style: PersonaStyle,
        category: Category,
    },
    /// Rejected input; state was not touched.
    Validation(String),
    Persistence(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::NotFound { style, category } => {
                write!(f, "no responses for style '{style}' and category '{category}'")
            }
            CoreError::Validation(msg) => write!(f, "validation failed: {msg}"),
            CoreError::Persistence(msg) => write!(f, "persistence failed: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Persistence(format!("invalid profile JSON: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
