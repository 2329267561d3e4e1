//! Result and error types for filtermock.

use thiserror::Error;

/// Result type for filtermock operations
pub type MockResult<T> = Result<T, MockError>;

/// Errors that can occur while resolving, synthesizing or calling classes
#[derive(Debug, Error)]
pub enum MockError {
    /// No class is registered under the name, even after autoloading
    #[error("Class '{name}' not found")]
    ClassNotFound {
        /// Requested class name
        name: String,
    },

    /// A class with this name is already registered
    #[error("Cannot redeclare class '{name}'")]
    RegistrationConflict {
        /// Conflicting class name
        name: String,
    },

    /// A template token had no substitution value
    #[error("Unresolved token '{{:{token}}}' in {role} ingredient '{ingredient}' for member '{member}'")]
    TemplateRender {
        /// Generated type role (facade or delegate)
        role: String,
        /// Ingredient key
        ingredient: String,
        /// Member being rendered (empty for class-level ingredients)
        member: String,
        /// Token name without delimiters
        token: String,
    },

    /// Method lookup failed
    #[error("Call to undefined method {class}::{method}()")]
    UndefinedMethod {
        /// Class searched
        class: String,
        /// Method name
        method: String,
    },

    /// Property lookup failed
    #[error("Undefined property {class}::${property}")]
    UndefinedProperty {
        /// Class of the instance
        class: String,
        /// Property name
        property: String,
    },

    /// Non-public member called from outside the class
    #[error("Call to {visibility} method {class}::{method}() from outside the class")]
    Visibility {
        /// Class declaring the method
        class: String,
        /// Method name
        method: String,
        /// Declared visibility
        visibility: String,
    },

    /// Call shape is not valid for the target member
    #[error("Invalid call to {class}::{method}(): {message}")]
    InvalidCall {
        /// Class name
        class: String,
        /// Method name
        method: String,
        /// Error message
        message: String,
    },

    /// Invalid state error (object used before it was wired up)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl MockError {
    /// Create a class-not-found error
    #[must_use]
    pub fn class_not_found(name: impl Into<String>) -> Self {
        Self::ClassNotFound { name: name.into() }
    }

    /// Create an undefined-method error
    #[must_use]
    pub fn undefined_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UndefinedMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Create an invalid-call error
    #[must_use]
    pub fn invalid_call(
        class: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidCall {
            class: class.into(),
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means "the type could not be resolved"
    #[must_use]
    pub const fn is_class_not_found(&self) -> bool {
        matches!(self, Self::ClassNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_class_not_found() {
        let err = MockError::class_not_found("app.models.Mock");
        assert_eq!(err.to_string(), "Class 'app.models.Mock' not found");
        assert!(err.is_class_not_found());
    }

    #[test]
    fn error_display_template_render() {
        let err = MockError::TemplateRender {
            role: "delegate".to_string(),
            ingredient: "method".to_string(),
            member: "paint".to_string(),
            token: "args".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("{:args}"));
        assert!(text.contains("delegate ingredient 'method'"));
        assert!(text.contains("'paint'"));
    }

    #[test]
    fn error_display_visibility() {
        let err = MockError::Visibility {
            class: "ns.Widget".to_string(),
            method: "_secret".to_string(),
            visibility: "protected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Call to protected method ns.Widget::_secret() from outside the class"
        );
        assert!(!err.is_class_not_found());
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MockError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
