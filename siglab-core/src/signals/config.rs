//! `StrategyConfig`: the raw, serializable parameter set for one strategy.
//!
//! A config is just a type name plus a name → value map. `Strategy::from_config`
//! turns it into a typed strategy, rejecting missing, unexpected or
//! out-of-range parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// A single parameter value: numeric, or text (used for `band_type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Number(v) => write!(f, "{v}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Strategy type name plus its parameters. Immutable once built for a run.
///
/// TOML shape:
/// ```toml
/// [strategy]
/// type = "ema_crossover"
///
/// [strategy.params]
/// fast_window = 10
/// slow_window = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub strategy_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl StrategyConfig {
    pub fn new(strategy_type: impl Into<String>) -> Self {
        Self {
            strategy_type: strategy_type.into(),
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Reader that validates this config against a variant's key set.
    pub(crate) fn reader<'a>(
        &'a self,
        strategy: &'static str,
        keys: &[&'static str],
    ) -> Result<ParamReader<'a>, ValidationError> {
        if let Some(missing) = keys.iter().find(|k| !self.params.contains_key(**k)) {
            return Err(ValidationError::MissingParameter {
                strategy: strategy.to_string(),
                param: missing.to_string(),
            });
        }
        if let Some(extra) = self.params.keys().find(|k| !keys.contains(&k.as_str())) {
            return Err(ValidationError::UnexpectedParameter {
                strategy: strategy.to_string(),
                param: extra.clone(),
            });
        }
        Ok(ParamReader {
            config: self,
            strategy,
        })
    }
}

/// Typed access to a key-checked config.
pub(crate) struct ParamReader<'a> {
    config: &'a StrategyConfig,
    strategy: &'static str,
}

impl ParamReader<'_> {
    fn invalid(&self, param: &str, reason: impl Into<String>) -> ValidationError {
        ValidationError::InvalidParameter {
            strategy: self.strategy.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    fn value(&self, param: &str) -> Result<&ParamValue, ValidationError> {
        self.config
            .get(param)
            .ok_or_else(|| ValidationError::MissingParameter {
                strategy: self.strategy.to_string(),
                param: param.to_string(),
            })
    }

    /// Finite number.
    pub fn number(&self, param: &str) -> Result<f64, ValidationError> {
        let v = self
            .value(param)?
            .as_number()
            .ok_or_else(|| self.invalid(param, "must be a number"))?;
        if !v.is_finite() {
            return Err(self.invalid(param, format!("must be finite, got {v}")));
        }
        Ok(v)
    }

    /// Whole number >= `min`.
    pub fn window(&self, param: &str, min: usize) -> Result<usize, ValidationError> {
        let v = self.number(param)?;
        if v.fract() != 0.0 {
            return Err(self.invalid(param, format!("must be an integer, got {v}")));
        }
        if v < min as f64 {
            return Err(self.invalid(param, format!("must be >= {min}, got {v}")));
        }
        Ok(v as usize)
    }

    pub fn text(&self, param: &str) -> Result<&str, ValidationError> {
        self.value(param)?
            .as_text()
            .ok_or_else(|| self.invalid(param, "must be text"))
    }

    /// Reject a parameter with a custom reason.
    pub fn reject(&self, param: &str, reason: impl Into<String>) -> ValidationError {
        self.invalid(param, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_toml_shape() {
        let toml_str = r#"
type = "bollinger_breakout"

[params]
window = 20
alpha = 2.0
band_type = "SMA"
"#;
        let config: StrategyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.strategy_type, "bollinger_breakout");
        assert_eq!(config.get("window"), Some(&ParamValue::Number(20.0)));
        assert_eq!(config.get("band_type"), Some(&ParamValue::Text("SMA".into())));
    }

    #[test]
    fn reader_reports_first_missing_key() {
        let config = StrategyConfig::new("ema_crossover").with_param("fast_window", 5usize);
        let err = config
            .reader("ema_crossover", &["fast_window", "slow_window"])
            .err()
            .unwrap();
        assert_eq!(
            err,
            ValidationError::MissingParameter {
                strategy: "ema_crossover".into(),
                param: "slow_window".into(),
            }
        );
    }

    #[test]
    fn reader_rejects_unknown_key() {
        let config = StrategyConfig::new("momentum")
            .with_param("num_days", 5usize)
            .with_param("threshold", 0.1);
        let err = config.reader("momentum", &["num_days"]).err().unwrap();
        assert_eq!(err.parameter(), Some("threshold"));
    }

    #[test]
    fn window_rejects_fractions_and_small_values() {
        let config = StrategyConfig::new("momentum").with_param("num_days", 2.5);
        let reader = config.reader("momentum", &["num_days"]).unwrap();
        assert!(reader.window("num_days", 1).is_err());

        let config = StrategyConfig::new("momentum").with_param("num_days", 0.0);
        let reader = config.reader("momentum", &["num_days"]).unwrap();
        assert!(reader.window("num_days", 1).is_err());
    }

    #[test]
    fn text_where_number_expected() {
        let config = StrategyConfig::new("momentum").with_param("num_days", "ten");
        let reader = config.reader("momentum", &["num_days"]).unwrap();
        let err = reader.window("num_days", 1).unwrap_err();
        assert!(err.to_string().contains("must be a number"));
    }
}
