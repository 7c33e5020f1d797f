//! Strategy parameters, sweep grids and parameter hashing.

use crate::domain::error::TradebenchError;
use sha2::{Digest, Sha256};

/// Separator between the candidate values of one key in a sweep.
pub const SWEEP_SEPARATOR: char = '|';

/// Ordered `key = value` pairs handed to a strategy factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyParams {
    pairs: Vec<(String, String)>,
}

impl StrategyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.insert(k, v);
        }
        params
    }

    /// Inserts or overwrites `key`, keeping its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get_f64(&self, key: &str, default: f64) -> Result<f64, TradebenchError> {
        match self.get_str(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    TradebenchError::invalid_parameter(key, format!("'{raw}' is not a number"))
                }),
        }
    }

    /// Accepts integral floats such as `200.0`.
    pub fn get_usize(&self, key: &str, default: usize) -> Result<usize, TradebenchError> {
        let Some(raw) = self.get_str(key) else {
            return Ok(default);
        };
        if let Ok(v) = raw.parse::<usize>() {
            return Ok(v);
        }
        match raw.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as usize),
            _ => Err(TradebenchError::invalid_parameter(
                key,
                format!("'{raw}' is not a non-negative integer"),
            )),
        }
    }

    /// Comma separated list, empty items dropped.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get_str(key).map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    /// Short stable fingerprint: first 8 hex chars of SHA-256 over the
    /// sorted `key=value` list.
    pub fn hash(&self) -> String {
        let mut sorted: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        sorted.sort();
        let digest = Sha256::digest(sorted.join(";").as_bytes());
        hex::encode(digest)[..8].to_string()
    }
}

/// One key and its candidate values.
pub type GridAxis = (String, Vec<String>);

/// Splits `a = 1|2` style values into sweep axes. Values without the
/// separator are single-valued axes.
pub fn grid_from_params(params: &StrategyParams) -> Vec<GridAxis> {
    params
        .iter()
        .map(|(k, v)| {
            let values = v
                .split(SWEEP_SEPARATOR)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            (k.to_string(), values)
        })
        .collect()
}

/// Cartesian product of the axes. Keys keep their order and the last axis
/// varies fastest.
pub fn generate_param_grid(axes: &[GridAxis]) -> Vec<StrategyParams> {
    let mut grid = vec![StrategyParams::new()];
    for (key, values) in axes {
        if values.is_empty() {
            continue;
        }
        grid = grid
            .into_iter()
            .flat_map(|base| {
                values.iter().map(move |value| {
                    let mut combo = base.clone();
                    combo.insert(key.clone(), value.clone());
                    combo
                })
            })
            .collect();
    }
    grid
}
