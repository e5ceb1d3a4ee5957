//! Script scope manager: one persistent scope per console.

use tracing::debug;

use crate::engine::{ScriptEngine, ScriptValue, SymbolCatalog};
use crate::error::{ConsoleError, ScriptError};
use crate::handle::ConsoleHandle;

pub struct ScopeManager<E: ScriptEngine> {
    engine: E,
    scope: Option<E::Scope>,
    symbols: Box<dyn SymbolCatalog>,
    bootstrap: String,
}

impl<E: ScriptEngine> ScopeManager<E> {
    pub fn new(engine: E, bootstrap: impl Into<String>) -> Self {
        Self {
            engine,
            scope: None,
            symbols: Box::new(Vec::new()),
            bootstrap: bootstrap.into(),
        }
    }

    pub fn set_symbols(&mut self, symbols: Box<dyn SymbolCatalog>) {
        self.symbols = symbols;
    }

    pub fn has_scope(&self) -> bool {
        self.scope.is_some()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Create the scope unless one already exists.
    ///
    /// A fresh scope gets `console` and `globals` (the importable symbol names)
    /// bound, then runs the bootstrap script plus the engine's import
    /// statement. The scope is kept even when bootstrapping fails, so this is
    /// never retried. Returns whether a scope was created.
    pub fn ensure_scope(&mut self, console: &ConsoleHandle) -> Result<bool, ConsoleError> {
        if self.scope.is_some() {
            return Ok(false);
        }

        let mut scope = self.engine.create_scope();
        self.engine
            .set_variable(&mut scope, "console", ScriptValue::Console(console.clone()));

        let symbols = self.symbols.global_symbols();
        let mut script = self.bootstrap.clone();
        if let Some(import) = self.engine.import_statement(&symbols) {
            script.push('\n');
            script.push_str(&import);
        }
        debug!(target: "console", symbols = symbols.len(), "creating script scope");
        self.engine
            .set_variable(&mut scope, "globals", ScriptValue::Names(symbols));

        let result = if script.trim().is_empty() {
            Ok(())
        } else {
            self.engine.execute(&script, &mut scope)
        };
        self.scope = Some(scope);
        result.map(|()| true).map_err(ConsoleError::Bootstrap)
    }

    pub fn execute(&mut self, code: &str) -> Result<(), ScriptError> {
        match self.scope.as_mut() {
            Some(scope) => self.engine.execute(code, scope),
            None => Err(ScriptError::new("no script scope")),
        }
    }

    /// Rebind `name` in the scope. Ignored while no scope exists.
    pub fn set_variable(&mut self, name: &str, value: ScriptValue) {
        if let Some(scope) = self.scope.as_mut() {
            self.engine.set_variable(scope, name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{Palette, ScrollConfig};
    use crate::transcript::Transcript;

    /// Records every call; scopes are plain maps of rendered values.
    #[derive(Default)]
    struct Recorder {
        scopes_created: usize,
        executed: Vec<String>,
    }

    impl ScriptEngine for Recorder {
        type Scope = HashMap<String, String>;

        fn create_scope(&mut self) -> Self::Scope {
            self.scopes_created += 1;
            HashMap::new()
        }

        fn execute(&mut self, code: &str, scope: &mut Self::Scope) -> Result<(), ScriptError> {
            self.executed.push(code.to_string());
            if code.contains("fail") {
                return Err(ScriptError::new("bootstrap exploded"));
            }
            scope.insert("last".into(), code.into());
            Ok(())
        }

        fn set_variable(&mut self, scope: &mut Self::Scope, name: &str, value: ScriptValue) {
            let rendered = match value {
                ScriptValue::Names(names) => names.join(","),
                ScriptValue::Console(_) => "<console>".into(),
                other => format!("{other:?}"),
            };
            scope.insert(name.into(), rendered);
        }

        fn import_statement(&self, symbols: &[String]) -> Option<String> {
            (!symbols.is_empty()).then(|| format!("import {}", symbols.join(",")))
        }
    }

    fn handle() -> ConsoleHandle {
        ConsoleHandle::new(Transcript::new(ScrollConfig::default()), Palette::default(), false)
    }

    #[test]
    fn scope_is_created_once() {
        let mut manager = ScopeManager::new(Recorder::default(), "");
        assert!(manager.ensure_scope(&handle()).unwrap());
        assert!(!manager.ensure_scope(&handle()).unwrap());
        assert_eq!(manager.engine().scopes_created, 1);
    }

    #[test]
    fn bootstrap_includes_import_line() {
        let mut manager = ScopeManager::new(Recorder::default(), "setup()");
        manager.set_symbols(Box::new(vec!["Player".to_string(), "World".to_string()]));
        manager.ensure_scope(&handle()).unwrap();

        assert_eq!(manager.engine().executed, ["setup()\nimport Player,World"]);
    }

    #[test]
    fn empty_bootstrap_is_not_executed() {
        let mut manager = ScopeManager::new(Recorder::default(), "");
        manager.ensure_scope(&handle()).unwrap();
        assert!(manager.engine().executed.is_empty());
    }

    #[test]
    fn failed_bootstrap_keeps_scope() {
        let mut manager = ScopeManager::new(Recorder::default(), "fail");
        let err = manager.ensure_scope(&handle()).unwrap_err();
        assert!(matches!(err, ConsoleError::Bootstrap(_)));
        assert!(manager.has_scope());
        assert!(manager.execute("x = 1").is_ok());
    }

    #[test]
    fn execute_without_scope_fails() {
        let mut manager = ScopeManager::new(Recorder::default(), "");
        assert!(manager.execute("x").is_err());
    }
}
