//! Rendering and building the facade/delegate pair.

use crate::config::{MockerConfig, MOCKER_FIELD, SAFE_FIELDS_FIELD};
use crate::mock::descriptor::{self, MemberDescriptor, MemberKind};
use crate::mock::ingredients::{IngredientKey, Role};
use crate::mock::naming::MockRequest;
use crate::mock::routing::Routes;
use crate::mock::template::{Renderer, TokenMap};
use crate::object::{ClassBuilder, ClassDef, ClassRegistry, MethodDef, DESTRUCTOR, GET};
use crate::result::{MockError, MockResult};
use crate::value::Value;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Listing of one generated class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedType {
    /// Facade or delegate
    pub role: Role,
    /// Fully qualified class name
    pub name: String,
    /// Rendered listing
    pub source: String,
    /// Member names in rendering order
    pub members: Vec<String>,
}

/// Both generated classes, built but not registered
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Names the classes were derived from
    pub request: MockRequest,
    /// Delegate listing
    pub delegate: GeneratedType,
    /// Facade listing
    pub facade: GeneratedType,
    delegate_class: Arc<ClassDef>,
    facade_class: Arc<ClassDef>,
}

impl Synthesis {
    /// Built delegate class
    #[must_use]
    pub const fn delegate_class(&self) -> &Arc<ClassDef> {
        &self.delegate_class
    }

    /// Built facade class
    #[must_use]
    pub const fn facade_class(&self) -> &Arc<ClassDef> {
        &self.facade_class
    }

    /// Both classes in registration order
    #[must_use]
    pub fn classes(&self) -> Vec<Arc<ClassDef>> {
        vec![
            Arc::clone(&self.delegate_class),
            Arc::clone(&self.facade_class),
        ]
    }
}

/// Accumulates one class's listing, member names and method bodies in step
struct TypeWriter<'a> {
    role: Role,
    renderer: &'a Renderer,
    source: String,
    members: Vec<String>,
    builder: ClassBuilder,
}

impl<'a> TypeWriter<'a> {
    fn new(role: Role, renderer: &'a Renderer, builder: ClassBuilder) -> Self {
        Self {
            role,
            renderer,
            source: String::new(),
            members: Vec::new(),
            builder,
        }
    }

    fn render(&mut self, key: IngredientKey, member: &str, tokens: &TokenMap) -> MockResult<()> {
        let ingredient = self.role.ingredient(key).ok_or_else(|| {
            MockError::invalid_state(format!("no '{key}' ingredient for the {}", self.role))
        })?;
        let text = self.renderer.render(self.role, ingredient, member, tokens)?;
        self.source.push_str(&text);
        Ok(())
    }

    fn section(&mut self, key: IngredientKey, tokens: &TokenMap) -> MockResult<()> {
        self.render(key, "", tokens)
    }

    fn member(
        &mut self,
        key: IngredientKey,
        name: &str,
        tokens: &TokenMap,
        method: MethodDef,
    ) -> MockResult<()> {
        self.render(key, name, tokens)?;
        self.members.push(name.to_string());
        self.builder.push_method(method);
        Ok(())
    }

    fn finish(self, registry: &ClassRegistry) -> MockResult<(GeneratedType, Arc<ClassDef>)> {
        let name = self.builder.name().to_string();
        let class = registry.build(self.builder.source(self.source.clone()))?;
        Ok((
            GeneratedType {
                role: self.role,
                name,
                source: self.source,
                members: self.members,
            },
            class,
        ))
    }
}

const fn ingredient_for(kind: MemberKind) -> IngredientKey {
    match kind {
        MemberKind::Constructor => IngredientKey::Constructor,
        MemberKind::InstanceMethod => IngredientKey::Method,
        MemberKind::StaticMethod => IngredientKey::StaticMethod,
    }
}

fn member_tokens(class_tokens: &TokenMap, member: &MemberDescriptor) -> TokenMap {
    class_tokens
        .clone()
        .with("method", member.name.as_str())
        .with("modifiers", member.modifiers.as_str())
        .with("args", member.args.as_str())
}

/// Render both listings for `request` and build their classes.
///
/// The target must already be known to be mockable.
pub(crate) fn synthesize(
    registry: &ClassRegistry,
    config: &MockerConfig,
    renderer: &Renderer,
    request: MockRequest,
) -> MockResult<Synthesis> {
    debug!(mock = %request.identifier, target = %request.target, "synthesizing mock");
    let target = registry.load(&request.target)?;
    let members = descriptor::extract(registry, &request.target, config)?;
    let routes = Routes::new(&request, &config.static_token, &config.safe_fields);

    let quoted_safe_fields = config
        .safe_fields
        .iter()
        .map(|field| format!("\"{field}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let class_tokens = TokenMap::new()
        .with("namespace", request.namespace.as_str())
        .with("mocker", request.target.as_str())
        .with("delegate", request.delegate.as_str())
        .with("facade", request.facade.as_str())
        .with("token", config.static_token.as_str())
        .with("safe_fields", quoted_safe_fields);

    let mut delegate = TypeWriter::new(
        Role::Delegate,
        renderer,
        ClassBuilder::new(request.delegate.as_str()).extends_class(target),
    );
    delegate.section(IngredientKey::StartClass, &class_tokens)?;
    for member in &members {
        let method = match member.kind {
            MemberKind::Constructor => Routes::delegate_constructor(member),
            MemberKind::InstanceMethod => Routes::delegate_method(member),
            MemberKind::StaticMethod => routes.delegate_static_method(member),
        };
        let tokens = member_tokens(&class_tokens, member);
        delegate.member(ingredient_for(member.kind), &member.name, &tokens, method)?;
    }
    delegate.section(IngredientKey::EndClass, &class_tokens)?;
    let (delegate, delegate_class) = delegate.finish(registry)?;

    let safe_fields: Vec<Value> = config.safe_fields.iter().map(|field| Value::from(field.as_str())).collect();
    let mut facade = TypeWriter::new(
        Role::Facade,
        renderer,
        ClassBuilder::new(request.facade.as_str())
            .extends_class(Arc::clone(&delegate_class))
            .property(MOCKER_FIELD, Value::Null)
            .property(SAFE_FIELDS_FIELD, Value::Array(safe_fields)),
    );
    facade.section(IngredientKey::StartClass, &class_tokens)?;
    for member in &members {
        let method = match member.kind {
            MemberKind::Constructor => routes.facade_constructor(member),
            MemberKind::InstanceMethod => routes.facade_method(member),
            MemberKind::StaticMethod => routes.facade_static_method(member),
        };
        let tokens = member_tokens(&class_tokens, member);
        facade.member(ingredient_for(member.kind), &member.name, &tokens, method)?;
    }
    facade.member(IngredientKey::Get, GET, &class_tokens, Routes::facade_get())?;
    facade.member(
        IngredientKey::Destructor,
        DESTRUCTOR,
        &class_tokens,
        Routes::facade_destructor(),
    )?;
    facade.section(IngredientKey::EndClass, &class_tokens)?;
    let (facade, facade_class) = facade.finish(registry)?;

    debug!(
        mock = %request.identifier,
        members = members.len(),
        "synthesized mock"
    );
    Ok(Synthesis {
        request,
        delegate,
        facade,
        delegate_class,
        facade_class,
    })
}
