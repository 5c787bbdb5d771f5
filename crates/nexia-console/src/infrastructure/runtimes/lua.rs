use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use mlua::Function;
use mlua::Lua;
use mlua::Table;
use mlua::Thread;
use mlua::Value;
use mlua::Variadic;

use crate::domain::models::ExecutionError;
use crate::domain::models::RunBridge;
use crate::domain::models::RunId;
use crate::domain::models::Runtime;
use crate::domain::models::RuntimeBox;
use crate::domain::models::RuntimeLoader;
use crate::domain::models::RuntimeName;

#[cfg(test)]
#[path = "lua_test.rs"]
mod tests;

const CHUNK_NAME: &str = "=main";

/// Host functions and libraries the console does not expose to guest code.
const BLOCKED: &[(&str, &str)] = &[
    ("os", "exit"),
    ("os", "execute"),
    ("os", "remove"),
    ("os", "rename"),
    ("os", "tmpname"),
    ("io", "open"),
    ("io", "popen"),
    ("io", "lines"),
    ("io", "input"),
    ("io", "output"),
    ("io", "close"),
    ("package", "loadlib"),
];

const BLOCKED_GLOBALS: &[&str] = &["dofile", "loadfile", "require"];

/// The run currently executing, if any.
///
/// The guest-visible hooks are installed once at load and look the run up
/// here on every call, so each write and input request lands on the run that
/// made it.
type ActiveBridge = Rc<RefCell<Option<ActiveState>>>;

#[derive(Clone)]
struct ActiveState {
    bridge: RunBridge,
    /// The Lua thread the chunk runs on. Input can only suspend this one.
    thread: Thread,
}

struct ActiveRun {
    slot: ActiveBridge,
    run: RunId,
}

impl ActiveRun {
    fn enter(slot: &ActiveBridge, bridge: RunBridge, thread: Thread) -> ActiveRun {
        let run = bridge.run();
        *slot.borrow_mut() = Some(ActiveState { bridge, thread });
        ActiveRun {
            slot: slot.clone(),
            run,
        }
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        // A newer run may already own the slot.
        if slot.as_ref().map(|state| state.bridge.run()) == Some(self.run) {
            slot.take();
        }
    }
}

#[derive(Default)]
pub struct LuaLoader {}

#[async_trait(?Send)]
impl RuntimeLoader for LuaLoader {
    fn name(&self) -> RuntimeName {
        RuntimeName::Lua
    }

    async fn load(&self) -> Result<RuntimeBox, ExecutionError> {
        let runtime = LuaRuntime::new().map_err(|err| ExecutionError::Load(err.to_string()))?;
        tracing::debug!(version = %runtime.version, "lua runtime loaded");
        Ok(Rc::new(runtime))
    }
}

pub struct LuaRuntime {
    lua: Lua,
    active: ActiveBridge,
    version: String,
}

impl LuaRuntime {
    pub fn new() -> mlua::Result<LuaRuntime> {
        let lua = Lua::new();
        let active: ActiveBridge = Rc::new(RefCell::new(None));

        sandbox(&lua)?;
        install_streams(&lua, &active)?;
        install_input(&lua, &active)?;

        let version = lua
            .globals()
            .get::<Option<String>>("_VERSION")?
            .unwrap_or_else(|| "Lua".to_string());

        Ok(LuaRuntime {
            lua,
            active,
            version,
        })
    }
}

#[async_trait(?Send)]
impl Runtime for LuaRuntime {
    fn name(&self) -> RuntimeName {
        RuntimeName::Lua
    }

    fn description(&self) -> String {
        self.version.clone()
    }

    fn supports_input(&self) -> bool {
        true
    }

    async fn execute(&self, source: &str, bridge: RunBridge) -> Result<(), ExecutionError> {
        let run = bridge.run();
        let chunk = self
            .lua
            .load(source)
            .set_name(CHUNK_NAME)
            .into_function()
            .map_err(|err| execution_error(&err))?;
        let thread = self
            .lua
            .create_thread(chunk)
            .map_err(|err| execution_error(&err))?;
        let _active = ActiveRun::enter(&self.active, bridge, thread.clone());

        tracing::debug!(run = %run, "executing lua chunk");
        thread
            .into_async::<()>(())
            .await
            .map_err(|err| execution_error(&err))
    }
}

fn io_table(lua: &Lua) -> mlua::Result<Table> {
    let globals = lua.globals();
    if let Some(io) = globals.get::<Option<Table>>("io")? {
        return Ok(io);
    }

    let io = lua.create_table()?;
    globals.set("io", io.clone())?;
    Ok(io)
}

fn sandbox(lua: &Lua) -> mlua::Result<()> {
    let globals = lua.globals();

    for (library, name) in BLOCKED {
        if let Some(table) = globals.get::<Option<Table>>(*library)? {
            table.set(*name, blocked_function(lua, &format!("{library}.{name}"))?)?;
        }
    }

    for name in BLOCKED_GLOBALS {
        globals.set(*name, blocked_function(lua, name)?)?;
    }

    Ok(())
}

fn blocked_function(lua: &Lua, name: &str) -> mlua::Result<Function> {
    let message = format!("{name} is not available in the console");
    lua.create_function(move |_, _: Variadic<Value>| {
        Err::<(), _>(mlua::Error::RuntimeError(message.clone()))
    })
}

fn write_to(active: &ActiveBridge, stderr: bool, text: &str) {
    match active.borrow().as_ref() {
        Some(state) if stderr => state.bridge.stderr(text),
        Some(state) => state.bridge.stdout(text),
        None => tracing::warn!(text = %text, "guest write outside of a run"),
    }
}

fn concat(parts: Variadic<mlua::String>) -> String {
    parts
        .iter()
        .map(|part| part.to_string_lossy().to_string())
        .collect::<Vec<String>>()
        .join("")
}

/// Redirects `print`, `io.write`, `io.stdout`, `io.stderr` and `warn`.
fn install_streams(lua: &Lua, active: &ActiveBridge) -> mlua::Result<()> {
    let globals = lua.globals();
    let io = io_table(lua)?;

    let print_active = active.clone();
    let print = lua.create_function(move |lua, values: Variadic<Value>| {
        let tostring: Function = lua.globals().get("tostring")?;
        let mut parts = Vec::with_capacity(values.len());
        for value in values.iter() {
            parts.push(tostring.call::<String>(value.clone())?);
        }
        write_to(&print_active, false, &format!("{}\n", parts.join("\t")));
        Ok(())
    })?;
    globals.set("print", print)?;

    let write_active = active.clone();
    let write = lua.create_function(move |_, parts: Variadic<mlua::String>| {
        write_to(&write_active, false, &concat(parts));
        Ok(())
    })?;
    io.set("write", write)?;

    for (name, stderr) in [("stdout", false), ("stderr", true)] {
        let file = lua.create_table()?;
        let file_active = active.clone();
        let file_write = lua.create_function(
            move |_, (this, parts): (Value, Variadic<mlua::String>)| {
                write_to(&file_active, stderr, &concat(parts));
                Ok(this)
            },
        )?;
        file.set("write", file_write)?;
        file.set("flush", lua.create_function(|_, this: Value| Ok(this))?)?;
        io.set(name, file)?;
    }

    let warn_active = active.clone();
    let warn = lua.create_function(move |_, parts: Variadic<mlua::String>| {
        let message = concat(parts);
        // "@on"/"@off" style control messages are not output.
        if message.starts_with('@') {
            return Ok(());
        }
        write_to(&warn_active, true, &format!("Lua warning: {message}\n"));
        Ok(())
    })?;
    globals.set("warn", warn)?;

    Ok(())
}

/// The bridge to read input through, when `lua` is running on the run's own
/// thread. A nested coroutine cannot suspend the run, so the call fails before
/// any input request is made.
fn current_bridge(active: &ActiveBridge, lua: &Lua, name: &str) -> mlua::Result<RunBridge> {
    let Some(state) = active.borrow().clone() else {
        return Err(mlua::Error::RuntimeError(format!(
            "{name} is only available while code runs"
        )));
    };
    if lua.current_thread() != state.thread {
        return Err(mlua::Error::RuntimeError(format!(
            "{name} is not available inside a coroutine"
        )));
    }
    Ok(state.bridge)
}

/// Installs the guest `input([prompt])` builtin and `io.read`.
///
/// Both are async host functions: calling them yields the run's thread until
/// the console resumes the pending request with a line.
fn install_input(lua: &Lua, active: &ActiveBridge) -> mlua::Result<()> {
    let input_active = active.clone();
    let input = lua.create_async_function(move |lua, prompt: Option<String>| {
        let bridge = current_bridge(&input_active, &lua, "input()");
        async move {
            let prompt = prompt.filter(|prompt| !prompt.is_empty());
            bridge?
                .read_line(prompt)
                .await
                .map_err(mlua::Error::external)
        }
    })?;
    lua.globals().set("input", input)?;

    let read_active = active.clone();
    let read = lua.create_async_function(move |lua, format: Option<String>| {
        let bridge = current_bridge(&read_active, &lua, "io.read()");
        async move {
            let line = bridge?
                .read_line(None)
                .await
                .map_err(mlua::Error::external)?;

            let value = match format.as_deref().unwrap_or("l").trim_start_matches('*') {
                "n" => line
                    .trim()
                    .parse::<f64>()
                    .map(Value::Number)
                    .unwrap_or(Value::Nil),
                "L" => Value::String(lua.create_string(format!("{line}\n"))?),
                _ => Value::String(lua.create_string(&line)?),
            };
            Ok(value)
        }
    })?;
    io_table(lua)?.set("read", read)?;

    Ok(())
}

fn find_execution_error(err: &mlua::Error) -> Option<&ExecutionError> {
    match err {
        mlua::Error::ExternalError(inner) => inner.as_ref().downcast_ref::<ExecutionError>(),
        mlua::Error::CallbackError { cause, .. } => find_execution_error(cause),
        mlua::Error::WithContext { cause, .. } => find_execution_error(cause),
        _ => None,
    }
}

fn guest_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::CallbackError { cause, .. } => guest_message(cause),
        other => other.to_string(),
    }
}

fn execution_error(err: &mlua::Error) -> ExecutionError {
    if let Some(err) = find_execution_error(err) {
        return err.clone();
    }

    ExecutionError::Guest(guest_message(err))
}
