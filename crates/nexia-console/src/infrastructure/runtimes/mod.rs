pub mod lua;
pub mod remote;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::RuntimeLoaderBox;
use crate::domain::models::RuntimeName;

pub struct RuntimeManager {}

impl RuntimeManager {
    pub fn get(name: RuntimeName) -> Result<RuntimeLoaderBox> {
        match name {
            RuntimeName::Lua => return Ok(Box::<lua::LuaLoader>::default()),
            RuntimeName::Remote => return Ok(Box::<remote::RemoteLoader>::default()),
        }
    }

    /// The loader for the runtime named in the `runtime` config key.
    pub fn from_config() -> Result<RuntimeLoaderBox> {
        let value = Config::get(ConfigKey::Runtime);
        if let Some(name) = RuntimeName::parse(&value) {
            return RuntimeManager::get(name);
        }

        bail!(format!("No runtime implemented for '{value}'"))
    }
}
