//! Listing templates for the two generated classes.
//!
//! Each ingredient is a short run of listing lines with `{:name}` tokens.
//! The delegate extends the target and decides, per call, whether to run
//! the real implementation or bounce the call back to the facade. The
//! facade extends the delegate and wraps every member in its filter chain.

use serde::Serialize;
use std::fmt;

/// Which generated class a template belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Public mock class that runs filters
    Facade,
    /// Hidden subclass of the target that runs the real code
    Delegate,
}

impl Role {
    /// Lowercase role name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facade => "facade",
            Self::Delegate => "delegate",
        }
    }

    /// Ingredient catalogue for this role
    #[must_use]
    pub const fn catalogue(self) -> &'static [Ingredient] {
        match self {
            Self::Facade => FACADE,
            Self::Delegate => DELEGATE,
        }
    }

    /// Look an ingredient up in this role's catalogue
    #[must_use]
    pub fn ingredient(self, key: IngredientKey) -> Option<&'static Ingredient> {
        self.catalogue().iter().find(|ingredient| ingredient.key == key)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingredient names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IngredientKey {
    /// Class header
    StartClass,
    /// Constructor
    Constructor,
    /// Instance method
    Method,
    /// Static method
    StaticMethod,
    /// Catch-all property read (facade only)
    Get,
    /// No-op finalizer (facade only)
    Destructor,
    /// Class footer
    EndClass,
}

impl IngredientKey {
    /// Key as written in error reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartClass => "startClass",
            Self::Constructor => "constructor",
            Self::Method => "method",
            Self::StaticMethod => "staticMethod",
            Self::Get => "get",
            Self::Destructor => "destructor",
            Self::EndClass => "endClass",
        }
    }
}

impl fmt::Display for IngredientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named run of template lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient {
    /// Ingredient name
    pub key: IngredientKey,
    /// Template lines
    pub lines: &'static [&'static str],
}

/// Delegate catalogue
pub const DELEGATE: &[Ingredient] = &[
    Ingredient {
        key: IngredientKey::StartClass,
        lines: &[
            "// namespace {:namespace}",
            "class {:delegate} extends {:mocker} {",
            "    owner: weak {:facade};",
        ],
    },
    Ingredient {
        key: IngredientKey::Constructor,
        lines: &[
            "    {:modifiers} fn {:method}({:args}) {",
            "        let facade = args.pop();",
            "        self.owner = weak(facade);",
            "        facade.mocker = self;",
            "        parent::{:method}(...args);",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::Method,
        lines: &[
            "    {:modifiers} fn {:method}({:args}) {",
            "        if args.last() != token(self) {",
            "            return self.owner.{:method}(...args);",
            "        }",
            "        args.pop();",
            "        return parent::{:method}(...args);",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::StaticMethod,
        lines: &[
            "    {:modifiers} fn {:method}({:args}) {",
            "        if args.last() != \"{:token}\" {",
            "            return {:facade}::{:method}(...args);",
            "        }",
            "        args.pop();",
            "        return parent::{:method}(...args);",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::EndClass,
        lines: &["}"],
    },
];

/// Facade catalogue
pub const FACADE: &[Ingredient] = &[
    Ingredient {
        key: IngredientKey::StartClass,
        lines: &[
            "// namespace {:namespace}",
            "class {:facade} extends {:delegate} {",
            "    public mocker;",
            "    protected _safe_vars = [{:safe_fields}];",
        ],
    },
    Ingredient {
        key: IngredientKey::Constructor,
        lines: &[
            "    {:modifiers} fn {:method}({:args}) {",
            "        args.push(self);",
            "        self.clear_fields_except(self._safe_vars);",
            "        new {:delegate}(...args);",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::Method,
        lines: &[
            "    {:modifiers} fn {:method}({:args}) {",
            "        args.push(token(self.mocker));",
            "        return self.filter(\"{:method}\", args, |args| self.mocker.{:method}(...args));",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::StaticMethod,
        lines: &[
            "    {:modifiers} fn {:method}({:args}) {",
            "        args.push(\"{:token}\");",
            "        return static::filter(\"{:method}\", args, |args| {:delegate}::{:method}(...args));",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::Get,
        lines: &[
            "    public fn __get(key) {",
            "        return self.mocker[key];",
            "    }",
        ],
    },
    Ingredient {
        key: IngredientKey::Destructor,
        lines: &["    public fn __destruct() {}"],
    },
    Ingredient {
        key: IngredientKey::EndClass,
        lines: &["}"],
    },
];
