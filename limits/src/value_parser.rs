//! Line-oriented, section-delimited configuration documents.
//!
//! Blank lines and `#` comments are skipped, `[name]` opens a section and
//! every other line is split at its first whitespace run into a parameter
//! and a value. Values that look like a parenthesised list of numbers or of
//! identifiers are parsed as such; anything else stays a raw string, so a
//! malformed list is a type-detection miss rather than an error.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::LimitsError;

pub const GLOBAL_SECTION: &str = "GLOBAL";

static NUMBER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\(\s*-?\d+(?:\.\d+)?(?:\s+-?\d+(?:\.\d+)?)*\s*\)$",
    )
    .expect("number list pattern")
});

static IDENTIFIER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*[A-Za-z_][A-Za-z0-9_]*(?:\s+[A-Za-z_][A-Za-z0-9_]*)*\s*\)$")
        .expect("identifier list pattern")
});

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Numbers(Vec<f64>),
    Identifiers(Vec<String>),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    pub section: String,
    pub parameter: String,
    pub raw: String,
    pub parsed: ParsedValue,
}

/// Classify a raw value.
pub fn parse_value(raw: &str) -> ParsedValue {
    if NUMBER_LIST.is_match(raw) {
        let numbers: Result<Vec<f64>, _> = list_items(raw).map(str::parse::<f64>).collect();
        if let Ok(numbers) = numbers {
            return ParsedValue::Numbers(numbers);
        }
    }
    if IDENTIFIER_LIST.is_match(raw) {
        return ParsedValue::Identifiers(list_items(raw).map(str::to_string).collect());
    }
    ParsedValue::Raw(raw.to_string())
}

fn list_items(raw: &str) -> impl Iterator<Item = &str> {
    raw[1..raw.len() - 1].split_whitespace()
}

/// Parse a whole document into records, in document order.
pub fn parse_str(text: &str) -> Vec<ConfigValue> {
    let mut section = GLOBAL_SECTION.to_string();
    let mut values = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some((parameter, value)) = line.split_once(char::is_whitespace) {
            let raw = value.trim();
            values.push(ConfigValue {
                section: section.clone(),
                parameter: parameter.to_string(),
                raw: raw.to_string(),
                parsed: parse_value(raw),
            });
        }
    }

    values
}

/// A parsed document together with where it was read from.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub path: PathBuf,
    pub values: Vec<ConfigValue>,
}

impl ConfigDocument {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LimitsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LimitsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_text(path, &text))
    }

    pub fn from_text(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            values: parse_str(text),
        }
    }

    /// First record for `parameter`, whatever its section.
    pub fn get(&self, parameter: &str) -> Option<&ConfigValue> {
        self.values.iter().find(|v| v.parameter == parameter)
    }

    pub fn section<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigValue> + 'a {
        self.values.iter().filter(move |v| v.section == name)
    }

    pub fn numbers(&self, parameter: &'static str) -> Result<&[f64], LimitsError> {
        match &self.lookup(parameter)?.parsed {
            ParsedValue::Numbers(numbers) => Ok(numbers.as_slice()),
            _ => Err(self.wrong_type(parameter, "numbers")),
        }
    }

    pub fn identifiers(&self, parameter: &'static str) -> Result<&[String], LimitsError> {
        match &self.lookup(parameter)?.parsed {
            ParsedValue::Identifiers(names) => Ok(names.as_slice()),
            _ => Err(self.wrong_type(parameter, "identifiers")),
        }
    }

    fn lookup(&self, parameter: &'static str) -> Result<&ConfigValue, LimitsError> {
        self.get(parameter).ok_or_else(|| LimitsError::MissingParameter {
            path: self.path.clone(),
            parameter,
        })
    }

    fn wrong_type(&self, parameter: &'static str, expected: &'static str) -> LimitsError {
        LimitsError::WrongValueType {
            path: self.path.clone(),
            parameter,
            expected,
        }
    }
}
