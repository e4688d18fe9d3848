//! The macro table: names mapped to push-down stacks of definitions.

use std::collections::HashMap;

use crate::builtins::BuiltinId;

/// The body of a macro: either a text template with positional
/// parameters or a binding to a builtin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Text(String),
    Builtin(BuiltinId),
}

/// A collected macro argument.
///
/// Arguments are usually text, but `defn` can turn a builtin into an
/// opaque handle that travels through argument collection. Builtins
/// without `groks_macro_args` see handles coerced to empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Builtin(BuiltinId),
}

impl ArgValue {
    /// Text view of the argument; builtin handles read as empty.
    pub fn as_text(&self) -> &str {
        match self {
            ArgValue::Text(text) => text,
            ArgValue::Builtin(_) => "",
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, ArgValue::Builtin(_))
    }
}

/// A named definition together with its per-definition flags.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub def: Definition,
    pub traced: bool,
    /// Comment lines captured just before the definition; shown by
    /// `dumpdef`.
    pub doc: Option<String>,
}

impl Macro {
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Macro {
            name: name.into(),
            def: Definition::Text(body.into()),
            traced: false,
            doc: None,
        }
    }

    pub fn builtin(name: impl Into<String>, id: BuiltinId) -> Self {
        Macro {
            name: name.into(),
            def: Definition::Builtin(id),
            traced: false,
            doc: None,
        }
    }
}

/// Name to most-recent-first definition stack.
#[derive(Debug, Default)]
pub struct MacroTable {
    map: HashMap<String, Vec<Macro>>,
}

impl MacroTable {
    pub fn new() -> Self {
        MacroTable::default()
    }

    /// Replaces the entire stack for the macro's name with this
    /// definition.
    pub fn insert(&mut self, mac: Macro) {
        self.map.insert(mac.name.clone(), vec![mac]);
    }

    /// Prepends a definition, creating the stack if absent.
    pub fn pushdef(&mut self, mac: Macro) {
        self.map.entry(mac.name.clone()).or_default().insert(0, mac);
    }

    /// Removes the newest definition; the name disappears with its last
    /// one.
    pub fn popdef(&mut self, name: &str) {
        if let Some(stack) = self.map.get_mut(name) {
            stack.remove(0);
            if stack.is_empty() {
                self.map.remove(name);
            }
        }
    }

    /// Removes the name entirely.
    pub fn undefine(&mut self, name: &str) {
        self.map.remove(name);
    }

    /// The newest definition for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Macro> {
        self.map.get(name).and_then(|stack| stack.first())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Marks every definition currently stacked under `name`; returns
    /// false when the name is undefined.
    pub fn set_traced(&mut self, name: &str, on: bool) -> bool {
        match self.map.get_mut(name) {
            Some(stack) => {
                for mac in stack {
                    mac.traced = on;
                }
                true
            }
            None => false,
        }
    }

    /// All defined names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
