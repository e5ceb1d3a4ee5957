//! Capabilities the console consumes from its host.
//!
//! The interpreter, the list of importable globals and the editor selection
//! are all supplied through these traits; the console itself knows nothing
//! about any particular scripting language.

pub use crate::error::ScriptError;
use crate::handle::ConsoleHandle;

/// An object the host lets scripts refer to, such as the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneObject {
    pub id: u64,
    pub name: String,
}

impl SceneObject {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A value the console binds into a scope.
#[derive(Debug, Clone)]
pub enum ScriptValue {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Names(Vec<String>),
    Object(SceneObject),
    Console(ConsoleHandle),
}

impl From<Option<SceneObject>> for ScriptValue {
    fn from(object: Option<SceneObject>) -> Self {
        object.map_or(ScriptValue::Unit, ScriptValue::Object)
    }
}

/// An interpreter able to run code against a persistent scope.
pub trait ScriptEngine {
    type Scope;

    fn create_scope(&mut self) -> Self::Scope;

    /// Run `code` against `scope`. State it leaves behind must be visible to
    /// later calls with the same scope.
    fn execute(&mut self, code: &str, scope: &mut Self::Scope) -> Result<(), ScriptError>;

    fn set_variable(&mut self, scope: &mut Self::Scope, name: &str, value: ScriptValue);

    /// Statement importing `symbols` into a fresh scope, if the language
    /// needs one.
    fn import_statement(&self, symbols: &[String]) -> Option<String> {
        let _ = symbols;
        None
    }
}

/// Lists the publicly visible top-level symbols a fresh scope may import.
pub trait SymbolCatalog {
    fn global_symbols(&self) -> Vec<String>;
}

impl SymbolCatalog for Vec<String> {
    fn global_symbols(&self) -> Vec<String> {
        self.clone()
    }
}

/// Editor-side object selection.
pub trait SelectionSource {
    fn selected(&self) -> Option<SceneObject>;
    fn select(&mut self, object: Option<SceneObject>);
}
