use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AbmError, Result};
use crate::scheduler::OrderingKind;

/// Configuration parameters for a labour-market run.
///
/// Behavioural hyperparameters live on the agent specs and have no defaults;
/// only run-level settings do.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub seed: u64,
    pub days_per_week: u64,
    pub iterations: u64,
    pub ordering: OrderingKind,
    pub boards: Vec<BoardSpec>,
    pub population: Vec<AgentSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: 42,
            days_per_week: 7,
            iterations: 365,
            ordering: OrderingKind::Insertion,
            boards: Vec::new(),
            population: Vec::new(),
        }
    }
}

/// One job board to create at start-up.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoardSpec {
    #[serde(default)]
    pub popularity: Option<f64>,
}

/// `count` agents of type `name`, all built from the same parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentSpec {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Count")]
    pub count: usize,
    #[serde(alias = "Parameters", default)]
    pub parameters: Parameters,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, count: usize, parameters: Parameters) -> Self {
        AgentSpec {
            name: name.into(),
            count,
            parameters,
        }
    }
}

/// A single named hyperparameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::List(v.into_iter().map(Into::into).collect())
    }
}

pub type Parameters = BTreeMap<String, ParamValue>;

/// Build a [`Parameters`] map from `key => value` pairs.
#[macro_export]
macro_rules! params {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::config::Parameters::new();
        $(map.insert($key.to_string(), $crate::config::ParamValue::from($value));)*
        map
    }};
}

/// Typed access to an agent's parameters, producing errors that name the
/// agent type and key.
pub struct ParamReader<'a> {
    agent: &'a str,
    params: &'a Parameters,
}

impl<'a> ParamReader<'a> {
    pub fn new(agent: &'a str, params: &'a Parameters) -> Self {
        ParamReader { agent, params }
    }

    fn missing(&self, key: &str) -> AbmError {
        AbmError::MissingParameter {
            agent: self.agent.to_string(),
            key: key.to_string(),
        }
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> AbmError {
        AbmError::InvalidParameter {
            agent: self.agent.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    fn value(&self, key: &str) -> Result<&'a ParamValue> {
        self.params.get(key).ok_or_else(|| self.missing(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn float(&self, key: &str) -> Result<f64> {
        match self.value(key)? {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(self.invalid(key, format!("expected a number, got {other:?}"))),
        }
    }

    /// A finite, non-negative number.
    pub fn non_negative(&self, key: &str) -> Result<f64> {
        let v = self.float(key)?;
        if !v.is_finite() || v < 0.0 {
            return Err(self.invalid(key, format!("{v} must be finite and non-negative")));
        }
        Ok(v)
    }

    /// A probability in `[0, 1]`.
    pub fn rate(&self, key: &str) -> Result<f64> {
        let v = self.float(key)?;
        if !(0.0..=1.0).contains(&v) {
            return Err(self.invalid(key, format!("{v} is not within [0, 1]")));
        }
        Ok(v)
    }

    pub fn unsigned(&self, key: &str) -> Result<u64> {
        match self.value(key)? {
            ParamValue::Int(v) if *v >= 0 => Ok(*v as u64),
            other => Err(self.invalid(key, format!("expected a non-negative integer, got {other:?}"))),
        }
    }

    pub fn text(&self, key: &str) -> Result<&'a str> {
        match self.value(key)? {
            ParamValue::Text(v) => Ok(v.as_str()),
            other => Err(self.invalid(key, format!("expected text, got {other:?}"))),
        }
    }

    /// Parse a text (or integer) parameter through `FromStr`.
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr<Err = String>,
    {
        match self.value(key)? {
            ParamValue::Text(v) => v.parse().map_err(|e| self.invalid(key, e)),
            ParamValue::Int(v) => v.to_string().parse().map_err(|e| self.invalid(key, e)),
            other => Err(self.invalid(key, format!("expected a name, got {other:?}"))),
        }
    }

    /// Optional list of non-negative integers; absent means empty.
    pub fn unsigned_list(&self, key: &str) -> Result<Vec<u64>> {
        let Some(value) = self.params.get(key) else {
            return Ok(Vec::new());
        };
        match value {
            ParamValue::List(items) => items
                .iter()
                .map(|item| match item {
                    ParamValue::Int(v) if *v >= 0 => Ok(*v as u64),
                    other => Err(self.invalid(key, format!("bad list entry {other:?}"))),
                })
                .collect(),
            ParamValue::Int(v) if *v >= 0 => Ok(vec![*v as u64]),
            other => Err(self.invalid(key, format!("expected a list of integers, got {other:?}"))),
        }
    }

    /// Optional list of names parsed through `FromStr`; absent means empty.
    pub fn parsed_list<T>(&self, key: &str) -> Result<Vec<T>>
    where
        T: FromStr<Err = String>,
    {
        let Some(value) = self.params.get(key) else {
            return Ok(Vec::new());
        };
        match value {
            ParamValue::List(items) => items
                .iter()
                .map(|item| match item {
                    ParamValue::Text(v) => v.parse().map_err(|e| self.invalid(key, e)),
                    other => Err(self.invalid(key, format!("bad list entry {other:?}"))),
                })
                .collect(),
            ParamValue::Text(v) => Ok(vec![v.parse().map_err(|e| self.invalid(key, e))?]),
            other => Err(self.invalid(key, format!("expected a list of names, got {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::Specialisation;

    #[test]
    fn reader_reports_missing_and_invalid() {
        let params = params! {
            "alpha" => 0.5,
            "search_max" => -3i64,
            "search_rate" => 1.5,
        };
        let reader = ParamReader::new("Worker", &params);

        assert_eq!(reader.float("alpha"), Ok(0.5));
        assert_eq!(
            reader.float("pi"),
            Err(AbmError::MissingParameter {
                agent: "Worker".into(),
                key: "pi".into()
            })
        );
        assert!(matches!(
            reader.unsigned("search_max"),
            Err(AbmError::InvalidParameter { .. })
        ));
        assert!(matches!(
            reader.rate("search_rate"),
            Err(AbmError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn integers_read_as_floats() {
        let params = params! { "reservation_wage" => 12i64 };
        let reader = ParamReader::new("Worker", &params);
        assert_eq!(reader.non_negative("reservation_wage"), Ok(12.0));
    }

    #[test]
    fn lists_are_optional() {
        let params = params! {
            "friends" => vec![1u64, 4],
            "specialisations" => vec!["Driver", "Cleaner"],
        };
        let reader = ParamReader::new("Household", &params);
        assert_eq!(reader.unsigned_list("friends"), Ok(vec![1, 4]));
        assert_eq!(reader.unsigned_list("boards"), Ok(vec![]));
        assert_eq!(
            reader.parsed_list::<Specialisation>("specialisations"),
            Ok(vec![Specialisation::Driver, Specialisation::Cleaner])
        );
    }

    #[test]
    fn agent_spec_accepts_capitalised_keys() {
        let json = r#"[{"Name": "Household", "Count": 2, "Parameters": {"friends": [0]}}]"#;
        let specs: Vec<AgentSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs[0].name, "Household");
        assert_eq!(specs[0].count, 2);
        assert_eq!(
            specs[0].parameters.get("friends"),
            Some(&ParamValue::List(vec![ParamValue::Int(0)]))
        );
    }
}
