//! Shader templates and defines
//!
//! Templates are WGSL sources containing `{{NAME}}` placeholders. Configuring a
//! template against a set of defines substitutes every placeholder; a
//! placeholder without a matching define is an error so a missing constant
//! never silently reaches the WGSL parser.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ShaderError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A single named define
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderDefine {
    /// Placeholder name
    pub name: String,
    /// Substituted text
    pub value: String,
}

impl ShaderDefine {
    /// Create a define with a textual value
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a define holding an integer
    pub fn integer(name: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(name, value.to_string())
    }
}

/// Ordered set of defines applied to a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderDefines {
    values: BTreeMap<String, String>,
}

impl ShaderDefines {
    /// Create an empty define set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a define
    pub fn set(&mut self, define: ShaderDefine) -> Option<String> {
        self.values.insert(define.name, define.value)
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set(ShaderDefine::integer(name, value));
        self
    }

    /// Look up a define value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Remove a define
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate defines in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<ShaderDefine> for ShaderDefines {
    fn from_iter<I: IntoIterator<Item = ShaderDefine>>(iter: I) -> Self {
        let mut defines = Self::new();
        for define in iter {
            defines.set(define);
        }
        defines
    }
}

/// WGSL source with `{{NAME}}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTemplate {
    name: String,
    source: String,
}

impl ShaderTemplate {
    /// Create a template from in-memory source
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Load a template from disk, named after the file stem
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        log::debug!("Loaded shader template '{}' from {:?}", name, path);
        Ok(Self { name, source })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names referenced by the template, in order of appearance
    pub fn placeholders(&self) -> Result<Vec<&str>, ShaderError> {
        let mut names = Vec::new();
        let mut rest = self.source.as_str();
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            let after = &rest[start + OPEN.len()..];
            let end = after
                .find(CLOSE)
                .ok_or(ShaderError::UnterminatedPlaceholder(offset + start))?;
            names.push(after[..end].trim());

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        Ok(names)
    }

    /// Substitute every placeholder with its define value
    pub fn configure(&self, defines: &ShaderDefines) -> Result<String, ShaderError> {
        let mut output = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            output.push_str(&rest[..start]);

            let after = &rest[start + OPEN.len()..];
            let end = after
                .find(CLOSE)
                .ok_or(ShaderError::UnterminatedPlaceholder(offset + start))?;
            let name = after[..end].trim();
            let value = defines
                .get(name)
                .ok_or_else(|| ShaderError::UndefinedPlaceholder(name.to_string()))?;
            output.push_str(value);

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        output.push_str(rest);
        Ok(output)
    }
}
