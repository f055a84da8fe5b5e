use super::ConfigError;
use std::path::PathBuf;

use crate::path::PathExpander;

pub const RC_FILE: &str = ".myshellrc";

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub rc_path: PathBuf,
    /// Set when the path came from `--config`; such a file must exist.
    pub explicit: bool,
}

impl ConfigPaths {
    pub fn new(override_path: Option<&str>) -> Result<Self, ConfigError> {
        match override_path {
            Some(path) => Ok(ConfigPaths {
                rc_path: PathExpander::new().expand(path)?,
                explicit: true,
            }),
            None => {
                let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
                Ok(ConfigPaths {
                    rc_path: home.join(RC_FILE),
                    explicit: false,
                })
            }
        }
    }
}
