//! `{:name}` token substitution.

use crate::mock::ingredients::{Ingredient, Role};
use crate::result::{MockError, MockResult};
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Values for the tokens of one ingredient
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    values: BTreeMap<String, String>,
}

impl TokenMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value
    #[must_use]
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(token.into(), value.into());
        self
    }

    /// Value of a token
    #[must_use]
    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }
}

/// Renders ingredients by replacing each `{:name}` with its value.
///
/// Substitution is a single pass: values are never rescanned, so a value
/// that itself looks like a token is emitted as is.
#[derive(Debug, Clone)]
pub struct Renderer {
    pattern: Regex,
}

impl Renderer {
    /// Compile the token pattern
    pub fn new() -> MockResult<Self> {
        let pattern = Regex::new(r"\{:([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| MockError::invalid_state(format!("token pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Render `ingredient`'s lines joined with newlines, plus a trailing newline.
    ///
    /// `member` names the member being rendered and is only used in errors.
    pub fn render(
        &self,
        role: Role,
        ingredient: &Ingredient,
        member: &str,
        tokens: &TokenMap,
    ) -> MockResult<String> {
        let mut out = String::new();
        for line in ingredient.lines {
            if let Some(missing) = self
                .pattern
                .captures_iter(line)
                .map(|caps| caps[1].to_string())
                .find(|name| tokens.get(name).is_none())
            {
                return Err(MockError::TemplateRender {
                    role: role.to_string(),
                    ingredient: ingredient.key.to_string(),
                    member: member.to_string(),
                    token: missing,
                });
            }
            let rendered = self.pattern.replace_all(line, |caps: &Captures<'_>| {
                tokens.get(&caps[1]).unwrap_or_default().to_string()
            });
            out.push_str(&rendered);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ingredients::IngredientKey;

    const SAMPLE: Ingredient = Ingredient {
        key: IngredientKey::Method,
        lines: &["fn {:method}({:args}) {", "    {:method}:{:token}", "}"],
    };

    #[test]
    fn test_render_substitutes_every_token() {
        let renderer = Renderer::new().unwrap();
        let tokens = TokenMap::new()
            .with("method", "paint")
            .with("args", "color")
            .with("token", "abc");
        let out = renderer.render(Role::Facade, &SAMPLE, "paint", &tokens).unwrap();
        assert_eq!(out, "fn paint(color) {\n    paint:abc\n}\n");
    }

    #[test]
    fn test_unresolved_token_names_role_ingredient_and_member() {
        let renderer = Renderer::new().unwrap();
        let tokens = TokenMap::new().with("method", "paint").with("args", "");
        let err = renderer
            .render(Role::Delegate, &SAMPLE, "paint", &tokens)
            .unwrap_err();
        match err {
            MockError::TemplateRender {
                role,
                ingredient,
                member,
                token,
            } => {
                assert_eq!(role, "delegate");
                assert_eq!(ingredient, "method");
                assert_eq!(member, "paint");
                assert_eq!(token, "token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let renderer = Renderer::new().unwrap();
        let tokens = TokenMap::new()
            .with("method", "{:token}")
            .with("args", "")
            .with("token", "t");
        let out = renderer.render(Role::Facade, &SAMPLE, "x", &tokens).unwrap();
        assert!(out.starts_with("fn {:token}() {\n"));
    }

    #[test]
    fn test_text_without_tokens_is_untouched() {
        let renderer = Renderer::new().unwrap();
        let end = Ingredient {
            key: IngredientKey::EndClass,
            lines: &["}", "{not a token} {:}"],
        };
        let out = renderer.render(Role::Facade, &end, "", &TokenMap::new()).unwrap();
        assert_eq!(out, "}\n{not a token} {:}\n");
    }
}
