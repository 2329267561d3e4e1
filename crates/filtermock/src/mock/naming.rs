//! Mock identifiers and the names derived from them.
//!
//! `app.models.post.Mock` asks for a mock of `app.models.Post`: the
//! namespace is everything before the mock suffix, and the target is the
//! namespace's parent plus its capitalized last segment.

use crate::config::MockerConfig;
use crate::result::{MockError, MockResult};
use regex::Regex;

/// A resolved mock request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    /// Identifier as requested; also the facade's name
    pub identifier: String,
    /// Namespace the generated types live in
    pub namespace: String,
    /// Class being mocked
    pub target: String,
    /// Generated facade class
    pub facade: String,
    /// Generated delegate class
    pub delegate: String,
}

/// Derives namespaces and class names from mock identifiers
#[derive(Debug, Clone)]
pub struct MockNaming {
    separator: String,
    mock_suffix: String,
    delegate_suffix: String,
    namespace_pattern: Regex,
    target_pattern: Regex,
}

impl MockNaming {
    /// Compile the patterns for a config
    pub fn new(config: &MockerConfig) -> MockResult<Self> {
        let sep = regex::escape(&config.separator);
        let suffix = regex::escape(&config.mock_suffix);
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|e| MockError::config(format!("bad name pattern: {e}")))
        };
        Ok(Self {
            separator: config.separator.clone(),
            mock_suffix: config.mock_suffix.clone(),
            delegate_suffix: config.delegate_suffix.clone(),
            namespace_pattern: compile(format!(r"^(.*){sep}{suffix}$"))?,
            target_pattern: compile(format!(r"^(.*){sep}(.+?){sep}{suffix}$"))?,
        })
    }

    /// Namespace separator
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Whether the identifier ends in the mock suffix
    #[must_use]
    pub fn is_mock_identifier(&self, identifier: &str) -> bool {
        self.namespace_pattern.is_match(identifier)
    }

    /// Everything before the mock suffix
    #[must_use]
    pub fn namespace(&self, identifier: &str) -> Option<String> {
        self.namespace_pattern
            .captures(identifier)
            .map(|caps| caps[1].to_string())
    }

    /// The class a mock identifier stands in for
    #[must_use]
    pub fn target(&self, identifier: &str) -> Option<String> {
        let caps = self.target_pattern.captures(identifier)?;
        let segment = &caps[2];
        if segment.contains(self.separator.as_str()) {
            return None;
        }
        Some(format!(
            "{}{}{}",
            &caps[1],
            self.separator,
            capitalize_first(segment)
        ))
    }

    /// Delegate class name for a namespace
    #[must_use]
    pub fn delegate_name(&self, namespace: &str) -> String {
        format!("{namespace}{}{}", self.separator, self.delegate_suffix)
    }

    /// Facade class name for a namespace
    #[must_use]
    pub fn facade_name(&self, namespace: &str) -> String {
        format!("{namespace}{}{}", self.separator, self.mock_suffix)
    }

    /// Last segment of a qualified name
    #[must_use]
    pub fn short_name<'a>(&self, qualified: &'a str) -> &'a str {
        qualified
            .rsplit_once(self.separator.as_str())
            .map_or(qualified, |(_, short)| short)
    }

    /// Derive every name for a mock identifier, or `None` if it is not one
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> Option<MockRequest> {
        let namespace = self.namespace(identifier)?;
        let target = self.target(identifier)?;
        Some(MockRequest {
            identifier: identifier.to_string(),
            facade: self.facade_name(&namespace),
            delegate: self.delegate_name(&namespace),
            namespace,
            target,
        })
    }
}

fn capitalize_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
