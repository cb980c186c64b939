//! Loader for the annotated-text document.
//!
//! The document shape is:
//!
//! ```json
//! { "text": [ { "word": "cats",
//!               "annotations": [ { "pos": "N", "num": "pl" } ] } ] }
//! ```
//!
//! Every annotation must set the main attribute. Enumerated values resolve
//! against the configuration; string values are interned into the shared
//! [`StringStore`] so they compare by index against pattern restrictions.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::annotation::Annotation;
use crate::attributes::{Attributes, MAIN_ATTRIBUTE, NULL_ATTRIBUTE_VALUE};
use crate::config::{AttributeType, Configuration};
use crate::strings::StringStore;
use crate::word::{Word, MAX_ANNOTATION};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawText {
    text: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWord {
    word: String,
    // BTreeMap keeps attribute iteration (and so error reporting) stable.
    annotations: Vec<BTreeMap<String, String>>,
}

/// Text loading failures.
#[derive(Debug)]
pub enum TextError {
    Io(String, std::io::Error),
    Parse(serde_json::Error),
    /// `word #i annotation #j: message`
    Word(usize, usize, String),
}

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextError::Io(path, e) => write!(f, "cannot read text '{}': {}", path, e),
            TextError::Parse(e) => write!(f, "text is not valid JSON: {}", e),
            TextError::Word(wi, ai, message) => {
                write!(f, "bad word #{} annotation #{}: {}", wi, ai, message)
            }
        }
    }
}

impl std::error::Error for TextError {}

/// Loads the words of a text document from `path`.
pub fn load_words(
    configuration: &Configuration,
    strings: &StringStore,
    path: &Path,
) -> Result<Vec<Word>, TextError> {
    info!("loading text from '{}'", path.display());
    let source =
        fs::read_to_string(path).map_err(|e| TextError::Io(path.display().to_string(), e))?;
    words_from_json(configuration, strings, &source)
}

/// Builds the words of a text document from document text.
pub fn words_from_json(
    configuration: &Configuration,
    strings: &StringStore,
    source: &str,
) -> Result<Vec<Word>, TextError> {
    let raw: RawText = serde_json::from_str(source).map_err(TextError::Parse)?;
    let attributes = configuration.attributes();

    let mut words = Vec::with_capacity(raw.text.len());
    for (wi, raw_word) in raw.text.into_iter().enumerate() {
        if raw_word.annotations.is_empty() {
            return Err(TextError::Word(wi, 0, "no annotations".to_owned()));
        }
        if raw_word.annotations.len() > MAX_ANNOTATION as usize + 1 {
            return Err(TextError::Word(wi, 0, "too many annotations".to_owned()));
        }

        let mut annotations = Vec::with_capacity(raw_word.annotations.len());
        for (ai, raw_annotation) in raw_word.annotations.into_iter().enumerate() {
            let mut values = Attributes::new(attributes.size());
            for (name, value) in &raw_annotation {
                let Some(index) = attributes.find(name) else {
                    return Err(TextError::Word(
                        wi,
                        ai,
                        format!("unknown attribute '{}'", name),
                    ));
                };
                let attribute = attributes.get(index);
                let resolved = match attribute.kind {
                    AttributeType::String => strings.index_of(value),
                    AttributeType::Main | AttributeType::Enum => {
                        match attribute.find_value(value) {
                            Some(v) if v != NULL_ATTRIBUTE_VALUE => v,
                            _ => {
                                return Err(TextError::Word(
                                    wi,
                                    ai,
                                    format!("unknown value '{}' of attribute '{}'", value, name),
                                ))
                            }
                        }
                    }
                };
                if values.get(index) != NULL_ATTRIBUTE_VALUE {
                    return Err(TextError::Word(
                        wi,
                        ai,
                        format!("redefinition of attribute '{}'", name),
                    ));
                }
                values.set(index, resolved);
            }
            if values.get(MAIN_ATTRIBUTE) == NULL_ATTRIBUTE_VALUE {
                return Err(TextError::Word(wi, ai, "no main attribute".to_owned()));
            }
            annotations.push(Annotation::new(values));
        }
        words.push(Word::new(raw_word.word, annotations));
    }

    info!("text loaded: {} words", words.len());
    Ok(words)
}
