//! Reflecting a target class into member descriptors.

use crate::config::MockerConfig;
use crate::object::{ClassRegistry, DefaultValue, MethodDef, MethodInfo, ParamDef, Visibility, CONSTRUCTOR};
use crate::result::MockResult;
use serde::Serialize;

/// How a member is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// The `__construct` method
    Constructor,
    /// Method with a receiver
    InstanceMethod,
    /// Method without a receiver
    StaticMethod,
}

/// One reflected member of a target class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Routing kind
    pub kind: MemberKind,
    /// Visibility declared on the target
    pub visibility: Visibility,
    /// Whether the name is on the denylist.
    ///
    /// Only [`MemberDescriptor::describe`] can report `true`; [`extract`]
    /// drops denylisted members, so its output always carries `false`.
    pub denylisted: bool,
    /// Rendered modifiers, visibility widened to public
    pub modifiers: String,
    /// Rendered parameter list
    pub args: String,
    /// Formal parameters
    pub params: Vec<ParamDef>,
    /// Class that declares the member
    pub declaring_class: String,
}

impl MemberDescriptor {
    /// Describe one reflected method
    #[must_use]
    pub fn describe(info: &MethodInfo, config: &MockerConfig) -> Self {
        let method = &info.method;
        let kind = if method.name == CONSTRUCTOR {
            MemberKind::Constructor
        } else if method.is_static {
            MemberKind::StaticMethod
        } else {
            MemberKind::InstanceMethod
        };
        Self {
            name: method.name.clone(),
            kind,
            visibility: method.visibility,
            denylisted: config.is_denied(&method.name),
            modifiers: render_modifiers(method),
            args: render_params(&method.params),
            params: method.params.clone(),
            declaring_class: info.declaring_class.clone(),
        }
    }
}

/// Descriptors of every non-denylisted member of `target`, in reflection order
pub fn extract(
    registry: &ClassRegistry,
    target: &str,
    config: &MockerConfig,
) -> MockResult<Vec<MemberDescriptor>> {
    Ok(registry
        .reflect(target)?
        .iter()
        .map(|info| MemberDescriptor::describe(info, config))
        .filter(|member| !member.denylisted)
        .collect())
}

/// `abstract`/`final`, then visibility (always `public`), then `static`
#[must_use]
pub fn render_modifiers(method: &MethodDef) -> String {
    let mut parts = Vec::with_capacity(3);
    if method.is_abstract {
        parts.push("abstract");
    }
    if method.is_final {
        parts.push("final");
    }
    parts.push(Visibility::Public.as_str());
    if method.is_static {
        parts.push("static");
    }
    parts.join(" ")
}

/// Comma-separated `[type ]name[ = default]` list
#[must_use]
pub fn render_params(params: &[ParamDef]) -> String {
    params
        .iter()
        .map(render_param)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_param(param: &ParamDef) -> String {
    let mut out = String::new();
    if let Some(type_hint) = &param.type_hint {
        out.push_str(type_hint.trim_start_matches('?'));
        out.push(' ');
    }
    if param.variadic {
        out.push_str("...");
    }
    out.push_str(&param.name);
    if let Some(default) = &param.default {
        out.push_str(" = ");
        out.push_str(&render_default(default));
    }
    out
}

fn render_default(default: &DefaultValue) -> String {
    match default {
        DefaultValue::Null => "null".to_string(),
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Int(i) => i.to_string(),
        DefaultValue::Float(x) => format!("{x:?}"),
        DefaultValue::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        DefaultValue::EmptyArray => "[]".to_string(),
        DefaultValue::Constant(name) => name.clone(),
    }
}
