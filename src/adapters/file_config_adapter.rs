//! INI file configuration adapter.

use crate::domain::error::TradebenchError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradebenchError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TradebenchError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradebenchError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradebenchError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

/// Drops a trailing ` ; comment` or ` # comment` and surrounding blanks.
fn strip_inline_comment(value: &str) -> &str {
    let cut = [" ;", "\t;", " #", "\t#"]
        .iter()
        .filter_map(|marker| value.find(marker))
        .min()
        .unwrap_or(value.len());
    value[..cut].trim()
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| strip_inline_comment(&v).to_string())
    }

    fn section_entries(&self, section: &str) -> Vec<(String, String)> {
        let section = section.to_lowercase();
        self.config
            .get_map_ref()
            .get(&section)
            .map(|keys| {
                keys.iter()
                    .filter_map(|(k, v)| {
                        v.as_deref()
                            .map(|v| (k.clone(), strip_inline_comment(v).to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
