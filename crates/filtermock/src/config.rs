//! Mocker configuration.
//!
//! Defaults reproduce the fixed conventions; every field can be overridden
//! from YAML or JSON.
//!
//! ```yaml
//! separator: "::"
//! denylist:
//!   - __destruct
//!   - teardown
//! ```

use crate::object::{DESTRUCTOR, GET, OBJECT, STATIC_OBJECT};
use crate::result::{MockError, MockResult};
use serde::{Deserialize, Serialize};

/// Token shared by every static-method call routed through a facade
pub const DEFAULT_STATIC_TOKEN: &str = "1f3870be274f6c49b3e31a0c6728957f";

/// Field on a facade holding its delegate
pub const MOCKER_FIELD: &str = "mocker";

/// Field on a facade listing the fields its constructor keeps
pub const SAFE_FIELDS_FIELD: &str = "_safe_vars";

/// Member names never proxied: lifecycle hooks, dynamic-dispatch hooks and
/// the filter machinery itself
pub const DEFAULT_DENYLIST: &[&str] = &[
    DESTRUCTOR,
    "__call",
    "__call_static",
    "_parents",
    GET,
    "__set",
    "__isset",
    "__unset",
    "__sleep",
    "__wakeup",
    "__to_string",
    "__clone",
    "__invoke",
    "_stop",
    "_init",
    "apply_filter",
    "invoke_method",
    "__set_state",
    "_instance",
    "_filter",
];

/// Configuration for [`Mocker`](crate::Mocker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockerConfig {
    /// Namespace separator in class names
    pub separator: String,
    /// Final segment that marks a mock request
    pub mock_suffix: String,
    /// Final segment of the generated delegate's name
    pub delegate_suffix: String,
    /// Member names never proxied
    pub denylist: Vec<String>,
    /// Facade fields kept when the facade constructor clears its state
    pub safe_fields: Vec<String>,
    /// Token appended to static-method calls
    pub static_token: String,
    /// Base classes a target must descend from to be mockable
    pub mockable_bases: Vec<String>,
}

impl Default for MockerConfig {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
            mock_suffix: "Mock".to_string(),
            delegate_suffix: "MockDelegate".to_string(),
            denylist: DEFAULT_DENYLIST.iter().map(|s| (*s).to_string()).collect(),
            safe_fields: vec![
                "_classes".to_string(),
                MOCKER_FIELD.to_string(),
                SAFE_FIELDS_FIELD.to_string(),
            ],
            static_token: DEFAULT_STATIC_TOKEN.to_string(),
            mockable_bases: vec![OBJECT.to_string(), STATIC_OBJECT.to_string()],
        }
    }
}

impl MockerConfig {
    /// Create the default config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> MockResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> MockResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> MockResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check the config is usable
    pub fn validate(&self) -> MockResult<()> {
        if self.separator.is_empty() {
            return Err(MockError::config("separator must not be empty"));
        }
        for (field, suffix) in [
            ("mock_suffix", &self.mock_suffix),
            ("delegate_suffix", &self.delegate_suffix),
        ] {
            if suffix.is_empty() {
                return Err(MockError::config(format!("{field} must not be empty")));
            }
            if suffix.contains(&self.separator) {
                return Err(MockError::config(format!(
                    "{field} '{suffix}' contains the separator '{}'",
                    self.separator
                )));
            }
        }
        if self.mock_suffix == self.delegate_suffix {
            return Err(MockError::config(
                "mock_suffix and delegate_suffix must differ",
            ));
        }
        if self.static_token.is_empty() {
            return Err(MockError::config("static_token must not be empty"));
        }
        if self.mockable_bases.is_empty() {
            return Err(MockError::config("at least one mockable base is required"));
        }
        if !self.safe_fields.iter().any(|f| f == MOCKER_FIELD) {
            return Err(MockError::config(format!(
                "safe_fields must include '{MOCKER_FIELD}'"
            )));
        }
        Ok(())
    }

    /// Whether a member name is on the denylist
    #[must_use]
    pub fn is_denied(&self, name: &str) -> bool {
        self.denylist.iter().any(|denied| denied == name)
    }

    /// Whether a facade field survives construction
    #[must_use]
    pub fn is_safe_field(&self, name: &str) -> bool {
        self.safe_fields.iter().any(|safe| safe == name)
    }

    /// Set the namespace separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Add a name to the denylist
    #[must_use]
    pub fn with_denied(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.is_denied(&name) {
            self.denylist.push(name);
        }
        self
    }

    /// Keep an extra facade field
    #[must_use]
    pub fn with_safe_field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.is_safe_field(&name) {
            self.safe_fields.push(name);
        }
        self
    }

    /// Set the static-method token
    #[must_use]
    pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
        self.static_token = token.into();
        self
    }

    /// Accept another base class as mockable
    #[must_use]
    pub fn with_mockable_base(mut self, base: impl Into<String>) -> Self {
        self.mockable_bases.push(base.into());
        self
    }
}
