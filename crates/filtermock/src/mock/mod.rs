//! On-demand mock synthesis.
//!
//! Asking a [`ClassRegistry`] for `app.widget.Mock` (after
//! [`Mocker::register`]) synthesizes two classes:
//!
//! - `app.widget.MockDelegate` extends `app.Widget` and runs the real code
//! - `app.widget.Mock` extends the delegate and routes every member through
//!   the filter chain
//!
//! ```rust,ignore
//! let registry = ClassRegistry::new();
//! Mocker::new(MockerConfig::default())?.register(&registry);
//!
//! let mock = registry.instantiate("app.widget.Mock", vec![])?;
//! registry.apply_filter(&mock, "paint", filter(|_, _, _| Ok(Value::from("stubbed"))));
//! assert_eq!(registry.call(&mock, "paint", vec!["red".into()])?, Value::from("stubbed"));
//! ```

pub mod descriptor;
pub mod ingredients;
pub mod naming;
mod routing;
#[cfg(any(test, feature = "proptest"))]
pub mod strategies;
mod synth;
pub mod template;

pub use descriptor::{MemberDescriptor, MemberKind};
pub use ingredients::{Ingredient, IngredientKey, Role};
pub use naming::{MockNaming, MockRequest};
pub use synth::{GeneratedType, Synthesis};

use crate::config::MockerConfig;
use crate::object::{ClassDef, ClassRegistry};
use crate::result::{MockError, MockResult};
use std::sync::Arc;
use template::Renderer;
use tracing::{debug, warn};

/// Key the mocker's autoload hook is registered under
pub const AUTOLOADER_KEY: &str = "filtermock.mocker";

/// Synthesizes mock classes for a registry
#[derive(Debug, Clone)]
pub struct Mocker {
    config: Arc<MockerConfig>,
    naming: MockNaming,
    renderer: Renderer,
}

impl Mocker {
    /// Create a mocker from a validated config
    pub fn new(config: MockerConfig) -> MockResult<Self> {
        config.validate()?;
        Ok(Self {
            naming: MockNaming::new(&config)?,
            renderer: Renderer::new()?,
            config: Arc::new(config),
        })
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &MockerConfig {
        &self.config
    }

    /// Name derivation rules
    #[must_use]
    pub const fn naming(&self) -> &MockNaming {
        &self.naming
    }

    /// Install [`Self::create`] as an autoload hook.
    ///
    /// Returns false if a mocker is already registered with `registry`.
    pub fn register(&self, registry: &ClassRegistry) -> bool {
        let mocker = self.clone();
        registry.register_autoloader(
            AUTOLOADER_KEY,
            Arc::new(move |registry, name| {
                mocker.create(registry, name);
            }),
        )
    }

    /// Check whether `identifier` should be synthesized.
    ///
    /// It must not name an existing class, must carry the mock suffix, and
    /// its target must descend from a mockable base.
    #[must_use]
    pub fn validate(&self, registry: &ClassRegistry, identifier: &str) -> Option<MockRequest> {
        if registry.exists(identifier) {
            return None;
        }
        let request = self.naming.resolve(identifier)?;
        self.config
            .mockable_bases
            .iter()
            .any(|base| registry.is_subclass_of(&request.target, base))
            .then_some(request)
    }

    /// Render and build both classes without registering them.
    ///
    /// `Ok(None)` means the identifier is not a mock request.
    pub fn synthesize(
        &self,
        registry: &ClassRegistry,
        identifier: &str,
    ) -> MockResult<Option<Synthesis>> {
        match self.validate(registry, identifier) {
            Some(request) => {
                synth::synthesize(registry, &self.config, &self.renderer, request).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Synthesize and register the mock, returning the facade class.
    ///
    /// A mock registered concurrently by someone else is returned as is.
    pub fn try_create(
        &self,
        registry: &ClassRegistry,
        identifier: &str,
    ) -> MockResult<Option<Arc<ClassDef>>> {
        let Some(synthesis) = self.synthesize(registry, identifier)? else {
            return Ok(None);
        };
        match registry.define_all(synthesis.classes()) {
            Ok(()) => {
                debug!(mock = identifier, "registered mock");
                Ok(Some(Arc::clone(synthesis.facade_class())))
            }
            Err(err @ MockError::RegistrationConflict { .. }) => match registry.find(identifier) {
                Some(existing) => {
                    debug!(mock = identifier, "mock already registered");
                    Ok(Some(existing))
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// [`Self::try_create`] for the autoload hook: failures are logged and
    /// leave the class undefined.
    pub fn create(&self, registry: &ClassRegistry, identifier: &str) -> Option<Arc<ClassDef>> {
        match self.try_create(registry, identifier) {
            Ok(facade) => facade,
            Err(err) => {
                warn!(mock = identifier, error = %err, "mock synthesis failed");
                None
            }
        }
    }
}
