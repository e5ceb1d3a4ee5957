//! Rhai-backed script engine.
//!
//! Scripts see:
//! - `console.write(text)`, `console.clear()`, `console.show_log()`,
//!   `console.hide_log()`, `console.select(object)` (or `()` to deselect);
//!   plain `print(x)` also goes to `console.write`
//! - `selection` - the current `SceneObject` (with `id` and `name`) or `()`
//! - `globals` - names of the host modules, each callable as `name::item`
//! - `log_info(msg)`, `log_warn(msg)`, `log_error(msg)` - emit application
//!   log events under the `script` target
//!
//! Top-level `let` bindings and `fn` definitions persist from one command to
//! the next: variables live in the Rhai `Scope`, and each run's functions are
//! folded into a library AST that is merged in front of the next command.

use rhai::{AST, Array, Dynamic, Engine, EvalAltResult, Module, Scope};
use tracing::{debug, error, info, warn};

use crate::engine::{SceneObject, ScriptEngine, ScriptValue};
use crate::error::ScriptError;
use crate::handle::ConsoleHandle;

/// Persistent state of one console scope.
pub struct RhaiScope {
    vars: Scope<'static>,
    functions: AST,
}

impl RhaiScope {
    pub fn vars(&self) -> &Scope<'static> {
        &self.vars
    }
}

pub struct RhaiEngine {
    engine: Engine,
    modules: Vec<String>,
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        register_console_api(&mut engine);
        register_log_api(&mut engine);
        engine.on_debug(|text, source, pos| {
            debug!(target: "script", source = source.unwrap_or("console"), %pos, "{text}");
        });
        Self {
            engine,
            modules: Vec::new(),
        }
    }

    /// Make `module` reachable from every scope as `name::item`.
    pub fn register_module(&mut self, name: &str, module: Module) {
        self.engine.register_static_module(name, module.into());
        self.modules.push(name.to_string());
    }

    /// Names of the registered host modules.
    pub fn module_names(&self) -> Vec<String> {
        self.modules.clone()
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl ScriptEngine for RhaiEngine {
    type Scope = RhaiScope;

    fn create_scope(&mut self) -> RhaiScope {
        RhaiScope {
            vars: Scope::new(),
            functions: AST::empty(),
        }
    }

    fn execute(&mut self, code: &str, scope: &mut RhaiScope) -> Result<(), ScriptError> {
        let ast = self
            .engine
            .compile_with_scope(&scope.vars, code)
            .map_err(|err| ScriptError::new(err.to_string()))?;
        let program = scope.functions.merge(&ast);
        self.engine
            .run_ast_with_scope(&mut scope.vars, &program)
            .map_err(|err| ScriptError::new(err.to_string()))?;
        scope.functions = program.clone_functions_only();
        Ok(())
    }

    fn set_variable(&mut self, scope: &mut RhaiScope, name: &str, value: ScriptValue) {
        if scope.vars.is_constant(name) == Some(true) {
            warn!(target: "console", name, "not rebinding script constant");
            return;
        }
        match value {
            ScriptValue::Unit => scope.vars.set_value(name, ()),
            ScriptValue::Bool(b) => scope.vars.set_value(name, b),
            ScriptValue::Int(i) => scope.vars.set_value(name, i),
            ScriptValue::Float(f) => scope.vars.set_value(name, f),
            ScriptValue::Text(s) => scope.vars.set_value(name, s),
            ScriptValue::Names(names) => {
                let array: Array = names.into_iter().map(Dynamic::from).collect();
                scope.vars.set_value(name, array)
            }
            ScriptValue::Object(object) => scope.vars.set_value(name, object),
            ScriptValue::Console(handle) => {
                let printer = handle.clone();
                self.engine.on_print(move |text| printer.write(text));
                scope.vars.set_value(name, handle)
            }
        };
    }

    // Host modules are registered as static modules, so nothing needs
    // importing.
}

fn register_console_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<ConsoleHandle>("Console")
        .register_fn("write", |console: &mut ConsoleHandle, text: &str| {
            console.write(text)
        })
        .register_fn("clear", |console: &mut ConsoleHandle| console.clear())
        .register_fn("show_log", |console: &mut ConsoleHandle| console.show_log())
        .register_fn("hide_log", |console: &mut ConsoleHandle| console.hide_log())
        .register_fn("select", |console: &mut ConsoleHandle, object: SceneObject| {
            console.select(Some(object))
        })
        .register_fn("select", |console: &mut ConsoleHandle, _: ()| console.select(None));

    engine
        .register_type_with_name::<SceneObject>("SceneObject")
        .register_get("id", |object: &mut SceneObject| -> Result<i64, Box<EvalAltResult>> {
            i64::try_from(object.id)
                .map_err(|_| format!("object id {} is out of script integer range", object.id).into())
        })
        .register_get("name", |object: &mut SceneObject| object.name.clone())
        .register_fn("to_string", |object: &mut SceneObject| {
            format!("{} (#{})", object.name, object.id)
        });
}

fn register_log_api(engine: &mut Engine) {
    engine
        .register_fn("log_info", |message: &str| info!(target: "script", "{message}"))
        .register_fn("log_warn", |message: &str| warn!(target: "script", "{message}"))
        .register_fn("log_error", |message: &str| error!(target: "script", "{message}"));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
