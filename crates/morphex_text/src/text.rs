//! The loaded text: a word sequence with its agreement cache.

use std::cell::RefCell;
use std::sync::Arc;

use crate::agreements::{AgreementKey, AgreementPair, Agreements};
use crate::attributes::Attribute;
use crate::config::Configuration;
use crate::word::Word;

/// An annotated text. Owns its words and a lazily-filled agreement cache;
/// intended for one matching session at a time.
pub struct Text {
    configuration: Arc<Configuration>,
    words: Vec<Word>,
    agreements: RefCell<Agreements>,
}

impl Text {
    pub fn new(configuration: Arc<Configuration>, words: Vec<Word>) -> Self {
        Self {
            configuration,
            words,
            agreements: RefCell::new(Agreements::new()),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, index: usize) -> &Word {
        &self.words[index]
    }

    /// The attribute index where agreement-eligible attributes start.
    pub fn agreement_begin(&self) -> Attribute {
        self.configuration.agreement_begin()
    }

    /// Cached pairwise agreement index sets for two word positions.
    pub fn agreement(&self, key: AgreementKey, strong: bool) -> AgreementPair {
        self.agreements
            .borrow_mut()
            .agreement(&self.words, self.agreement_begin(), key, strong)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use crate::attributes::Attributes;
    use crate::config::Configuration;

    fn test_config() -> Arc<Configuration> {
        Arc::new(
            Configuration::from_json(
                r#"{ "word_signs": [
                    { "names": ["pos"], "type": "main", "values": ["N", "V"] },
                    { "names": ["num"], "type": "enum", "values": ["sg", "pl"], "consistent": true }
                ] }"#,
            )
            .unwrap(),
        )
    }

    fn word(text: &str, values: &[u32]) -> Word {
        let mut attributes = Attributes::new(values.len() as Attribute);
        for (i, v) in values.iter().enumerate() {
            attributes.set(i as Attribute, *v);
        }
        Word::new(text.to_owned(), vec![Annotation::new(attributes)])
    }

    #[test]
    fn text_exposes_words_in_order() {
        let text = Text::new(test_config(), vec![word("a", &[1, 1]), word("b", &[2, 1])]);
        assert_eq!(text.len(), 2);
        assert_eq!(text.word(0).text(), "a");
        assert_eq!(text.word(1).text(), "b");
    }

    #[test]
    fn agreement_goes_through_the_cache() {
        let text = Text::new(test_config(), vec![word("a", &[1, 1]), word("b", &[2, 1])]);
        let first = text.agreement((0, 1, 1), true);
        let second = text.agreement((0, 1, 1), true);
        assert_eq!(first, second);
        assert_eq!(first.0.as_slice(), &[0]);
    }
}
