//! The word-attribute configuration: document model, loader, validation.
//!
//! A configuration declares every attribute a word annotation may carry.
//! Exactly one attribute is the *main* one (the word class); the others are
//! enumerations or free strings, and any non-main attribute may be marked
//! *consistent*, meaning it participates in cross-word agreement.
//!
//! After building, attributes are ordered: main first, then plain
//! attributes, then all consistent ones. The index of the first consistent
//! attribute is [`WordAttributes::agreement_begin`]; main-attribute
//! agreement scans exactly the tail starting there.
//!
//! Enumerated attributes (including main) reserve value index 0 for the
//! empty value, so 0 uniformly means "not set" and real values start at 1.

use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use morphex_base::OrderedSet;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::attributes::{Attribute, AttributeValue, MAIN_ATTRIBUTE};

/// Ordered, duplicate-free list of names or values.
pub type OrderedStrings = OrderedSet<String>;

/// The three attribute families of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// The word class. Exactly one per configuration, never consistent.
    Main,
    /// A closed value list.
    Enum,
    /// Open values, interned at load time.
    String,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeType::Main => "main",
            AttributeType::Enum => "enum",
            AttributeType::String => "string",
        })
    }
}

/// One declared attribute.
#[derive(Debug, Clone)]
pub struct WordAttribute {
    pub kind: AttributeType,
    pub consistent: bool,
    pub names: OrderedStrings,
    /// Sorted values with the reserved empty value at index 0.
    /// Empty for string attributes.
    pub values: OrderedStrings,
}

impl WordAttribute {
    /// The canonical (first) name.
    pub fn name(&self) -> &str {
        self.names.value(0)
    }

    /// Resolves an enumerated value to its index.
    pub fn find_value(&self, value: &str) -> Option<AttributeValue> {
        self.values.find(&value.to_owned()).map(|i| i as AttributeValue)
    }

    /// Renders an enumerated value index.
    pub fn value_name(&self, value: AttributeValue) -> &str {
        self.values.value(value as usize)
    }
}

/// The full ordered attribute table.
#[derive(Debug)]
pub struct WordAttributes {
    data: Vec<WordAttribute>,
    name_indices: FxHashMap<String, Attribute>,
    agreement_begin: Attribute,
}

impl WordAttributes {
    pub fn size(&self) -> Attribute {
        self.data.len() as Attribute
    }

    /// The main attribute, always at index 0.
    pub fn main(&self) -> &WordAttribute {
        &self.data[MAIN_ATTRIBUTE as usize]
    }

    pub fn get(&self, index: Attribute) -> &WordAttribute {
        &self.data[index as usize]
    }

    /// Looks an attribute up by any of its names.
    pub fn find(&self, name: &str) -> Option<Attribute> {
        self.name_indices.get(name).copied()
    }

    /// Index of the first consistent attribute; equals [`Self::size`] when
    /// no attribute is consistent.
    pub fn agreement_begin(&self) -> Attribute {
        self.agreement_begin
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordAttribute> {
        self.data.iter()
    }
}

/// The loaded configuration. Shared read-only by patterns and texts.
#[derive(Debug)]
pub struct Configuration {
    attributes: WordAttributes,
}

impl Configuration {
    pub fn attributes(&self) -> &WordAttributes {
        &self.attributes
    }

    /// Number of values of the main attribute, counting the reserved empty
    /// value. Element identifiers are encoded modulo this size.
    pub fn main_size(&self) -> usize {
        self.attributes.main().values.len()
    }

    pub fn agreement_begin(&self) -> Attribute {
        self.attributes.agreement_begin()
    }

    /// Loads and validates a configuration document from `path`.
    pub fn load_from_file(path: &Path) -> Result<Configuration, ConfigError> {
        info!("loading configuration from '{}'", path.display());
        let source = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Self::from_json(&source)
    }

    /// Builds a configuration from document text.
    pub fn from_json(source: &str) -> Result<Configuration, ConfigError> {
        let raw: RawConfiguration = serde_json::from_str(source).map_err(ConfigError::Parse)?;
        let attributes = validate(raw)?;
        info!(
            "configuration built: {} attributes, agreement begins at {}",
            attributes.size(),
            attributes.agreement_begin()
        );
        Ok(Configuration { attributes })
    }
}

// ============================================================================
// Raw document mirror
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfiguration {
    word_signs: Vec<RawWordSign>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWordSign {
    #[serde(rename = "type")]
    kind: String,
    names: Vec<String>,
    values: Option<Vec<String>>,
    consistent: Option<bool>,
}

// ============================================================================
// Validation
// ============================================================================

/// Configuration loading failures.
#[derive(Debug)]
pub enum ConfigError {
    Io(String, std::io::Error),
    Parse(serde_json::Error),
    /// Accumulated rule violations, reported together.
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "cannot read configuration '{}': {}", path, e),
            ConfigError::Parse(e) => write!(f, "configuration is not valid JSON: {}", e),
            ConfigError::Invalid(messages) => {
                write!(f, "configuration error: {}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn validate(raw: RawConfiguration) -> Result<WordAttributes, ConfigError> {
    let mut errors = Vec::new();
    let name_pattern =
        Regex::new("^[A-Za-z]([A-Za-z0-9_-]*[A-Za-z_-])?$").expect("name pattern is well-formed");

    if raw.word_signs.is_empty() {
        errors.push("'word_signs' must not be empty".to_owned());
    }
    if raw.word_signs.len() > usize::from(u8::MAX) {
        errors.push("too many word signs (at most 255)".to_owned());
    }

    let mut mains = Vec::new();
    let mut plain = Vec::new();
    let mut consistent = Vec::new();

    for (si, sign) in raw.word_signs.into_iter().enumerate() {
        let kind = match sign.kind.as_str() {
            "main" => AttributeType::Main,
            "enum" => AttributeType::Enum,
            "string" => AttributeType::String,
            other => {
                errors.push(format!("word sign #{}: unknown type '{}'", si, other));
                continue;
            }
        };

        let mut names = OrderedStrings::new();
        if sign.names.is_empty() {
            errors.push(format!("word sign #{}: 'names' must not be empty", si));
        }
        for name in sign.names {
            if !name_pattern.is_match(&name) {
                errors.push(format!("word sign #{}: bad name '{}'", si, name));
            }
            if !names.add(name.clone()) {
                errors.push(format!("word sign #{}: repeated name '{}'", si, name));
            }
        }

        let mut values = OrderedStrings::new();
        match kind {
            AttributeType::Main | AttributeType::Enum => {
                values.add(String::new());
                match &sign.values {
                    Some(raw_values) if !raw_values.is_empty() => {
                        for value in raw_values {
                            if !name_pattern.is_match(value) {
                                errors.push(format!("word sign #{}: bad value '{}'", si, value));
                            }
                            if !values.add(value.clone()) {
                                errors
                                    .push(format!("word sign #{}: repeated value '{}'", si, value));
                            }
                        }
                    }
                    _ => errors.push(format!(
                        "word sign #{}: '{}' requires a non-empty 'values'",
                        si, kind
                    )),
                }
            }
            AttributeType::String => {
                if sign.values.is_some() {
                    errors.push(format!("word sign #{}: 'string' forbids 'values'", si));
                }
            }
        }

        let is_consistent = sign.consistent.unwrap_or(false);
        if kind == AttributeType::Main && is_consistent {
            errors.push("the main word sign must not be consistent".to_owned());
        }

        let attribute = WordAttribute {
            kind,
            consistent: is_consistent,
            names,
            values,
        };
        if kind == AttributeType::Main {
            mains.push(attribute);
        } else if is_consistent {
            consistent.push(attribute);
        } else {
            plain.push(attribute);
        }
    }

    if mains.len() != 1 {
        errors.push("there must be exactly one main word sign".to_owned());
    }

    let mut data = mains;
    let agreement_begin = (data.len() + plain.len()) as Attribute;
    data.append(&mut plain);
    data.append(&mut consistent);

    let mut name_indices = FxHashMap::default();
    for (index, attribute) in data.iter().enumerate() {
        for name in attribute.names.iter() {
            if name_indices.insert(name.clone(), index as Attribute).is_some() {
                errors.push(format!("redefinition of word sign name '{}'", name));
            }
        }
    }

    if errors.is_empty() {
        Ok(WordAttributes {
            data,
            name_indices,
            agreement_begin,
        })
    } else {
        Err(ConfigError::Invalid(errors))
    }
}
