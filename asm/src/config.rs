use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Columns per nesting level in structured dumps
    pub indent: usize,
    /// Colored diagnostics
    pub color: bool,
    /// Stop recording errors after this many
    pub max_errors: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            indent: 1,
            color: true,
            max_errors: None,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &str) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::ConfigRead(path.to_string(), e))?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }
}
