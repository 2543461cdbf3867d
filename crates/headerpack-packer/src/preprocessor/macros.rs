//! Macro Definitions
//!
//! `-D`/`-U` switches handed to the preprocessor.

use headerpack_core::Error;

/// A macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    pub value: Option<String>,
}

impl MacroDefinition {
    /// Create a macro that is simply defined (value `1`)
    pub fn defined(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some("1".to_string()),
        }
    }

    /// Create a macro with a specific value
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    /// Create an undefined macro (for -U flag)
    pub fn undefined(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
        }
    }

    /// Convert to clang -D/-U argument
    pub fn to_clang_arg(&self) -> String {
        match &self.value {
            Some(v) => format!("-D{}={}", self.name, v),
            None => format!("-U{}", self.name),
        }
    }
}

impl std::str::FromStr for MacroDefinition {
    type Err = Error;

    /// Parse `NAME` or `NAME=VALUE`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (s.trim(), None),
        };

        if !is_identifier(name) {
            return Err(Error::Config(format!("invalid macro name: {:?}", s)));
        }

        Ok(match value {
            Some(value) => MacroDefinition::with_value(name, value),
            None => MacroDefinition::defined(name),
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
