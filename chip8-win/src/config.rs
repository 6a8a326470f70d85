//! Application configuration file.
use chip8::Chip8Conf;
use serde::Deserialize;

use crate::error::AppError;

/// Application settings, loaded from YAML.
///
/// ```yaml
/// vm:
///   logic_resets_flag: true
///   key_wait_timers: false
///   strict: false
///   seed: 1234
/// ```
///
/// Every field is optional and falls back to its default.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConf {
    pub vm: Chip8Conf,
}

impl AppConf {
    pub fn from_file(filepath: &str) -> Result<Self, AppError> {
        let file = std::fs::File::open(filepath)?;
        let conf: AppConf = serde_yaml::from_reader(file)?;
        log::debug!("loaded config: {:#?}", conf);
        Ok(conf)
    }

    pub fn from_yaml(source: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(source)?)
    }
}
