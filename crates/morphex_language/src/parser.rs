//! Recursive-descent parser for pattern definitions.
//!
//! The grammar, one method per production:
//!
//! ```text
//! pattern    := Name [ '(' Arg (',' Arg)* ')' ] '=' alts
//! alts       := alt ('|' alt)*
//! alt        := elems ('~' elems)* [ '<<' acond (',' acond)* '>>' ]
//! elems      := elem+
//! elem       := Regex
//!             | Name [ '<' econd (',' econd)* '>' ]
//!             | '{' alts '}' [ '<' Num [',' Num] '>' ]
//!             | '[' alts ']'
//!             | '(' alts ')'
//! econd      := Name ('='|'!=') Value ('|' Value)*
//! acond      := extName (('='|'==') extName)*
//!             | Name '(' group (',' group)* ')'
//! group      := extName+
//! extName    := Name [ '.' Name ]
//! ```
//!
//! Errors go to the shared [`ErrorProcessor`]; a definition with a syntax
//! error yields `None` but never aborts the surrounding file.

use morphex_base::Span;

use crate::ast::{
    Alternative, AlternativeCondition, ElementCondition, ExtendedName, PatternDef, PatternNode,
};
use crate::errors::{ErrorProcessor, ParseError, Severity};
use crate::token::{Token, TokenKind};

/// Parses one definition's token group.
pub struct PatternParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: &'a mut ErrorProcessor,
}

impl<'a> PatternParser<'a> {
    pub fn new(tokens: &'a [Token], errors: &'a mut ErrorProcessor) -> Self {
        Self {
            tokens,
            pos: 0,
            errors,
        }
    }

    /// Parses the whole group into a definition.
    pub fn parse(mut self) -> Option<PatternDef> {
        let name = self.read_pattern_name()?;
        let arguments = self.read_pattern_arguments()?;
        if !self.is_kind(TokenKind::EqualSign) {
            self.add_error("equal sign `=` expected");
            return None;
        }
        self.advance();
        let alternatives = self.read_alternatives()?;
        if self.token().is_some() {
            self.add_error("end of pattern definition expected");
            return None;
        }
        Some(PatternDef {
            name,
            arguments,
            alternatives,
        })
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn token(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_kind(&self, kind: TokenKind) -> bool {
        self.token().is_some_and(|t| t.kind == kind)
    }

    /// Advances, then tests the new current token.
    fn next_is_kind(&mut self, kind: TokenKind) -> bool {
        self.advance();
        self.is_kind(kind)
    }

    fn add_error(&mut self, message: &str) {
        let error = match self.token() {
            Some(token) => ParseError::in_line(
                token.line.clone(),
                vec![token.span],
                message,
                Severity::Error,
            ),
            None => match self.tokens.last() {
                Some(last) => ParseError::in_line(
                    last.line.clone(),
                    vec![Span::at(usize::MAX, 1)],
                    message,
                    Severity::Error,
                ),
                None => ParseError::bare(message, Severity::Error),
            },
        };
        self.errors.add_error(error);
    }

    // ------------------------------------------------------------------
    // Productions
    // ------------------------------------------------------------------

    fn read_pattern_name(&mut self) -> Option<Token> {
        if !self.is_kind(TokenKind::Identifier) {
            self.add_error("template name expected");
            return None;
        }
        let name = self.token().cloned();
        self.advance();
        name
    }

    fn read_pattern_arguments(&mut self) -> Option<Vec<ExtendedName>> {
        let mut arguments = Vec::new();
        if self.is_kind(TokenKind::OpeningParenthesis) {
            loop {
                self.advance();
                arguments.push(self.read_extended_name()?);
                if !self.is_kind(TokenKind::Comma) {
                    break;
                }
            }
            if !self.is_kind(TokenKind::ClosingParenthesis) {
                self.add_error("closing parenthesis `)` expected");
                return None;
            }
            self.advance();
        }
        Some(arguments)
    }

    fn read_extended_name(&mut self) -> Option<ExtendedName> {
        if !self.is_kind(TokenKind::Identifier) {
            self.add_error("word class or template name expected");
            return None;
        }
        let name = self.token().cloned()?;
        let mut sub = None;
        if self.next_is_kind(TokenKind::Dot) {
            if !self.next_is_kind(TokenKind::Identifier) {
                self.add_error("word class attribute name expected");
                return None;
            }
            sub = self.token().cloned();
            self.advance();
        }
        Some(ExtendedName { name, sub })
    }

    fn read_alternatives(&mut self) -> Option<Vec<Alternative>> {
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.read_alternative()?);
            if self.is_kind(TokenKind::VerticalBar) {
                self.advance();
            } else {
                break;
            }
        }
        Some(alternatives)
    }

    fn read_alternative(&mut self) -> Option<Alternative> {
        let node = self.read_transposition()?;
        let conditions = self.read_alternative_conditions()?;
        Some(Alternative { node, conditions })
    }

    fn read_transposition(&mut self) -> Option<PatternNode> {
        let mut parts = Vec::new();
        loop {
            parts.push(self.read_elements()?);
            if self.is_kind(TokenKind::Tilde) {
                self.advance();
            } else {
                break;
            }
        }
        debug_assert!(!parts.is_empty());
        if parts.len() == 1 {
            parts.pop()
        } else {
            Some(PatternNode::Transposition(parts))
        }
    }

    fn read_elements(&mut self) -> Option<PatternNode> {
        let mut elements = Vec::new();
        while let Some(element) = self.read_element()? {
            elements.push(element);
        }
        if elements.is_empty() {
            self.add_error("at least one template element expected");
            return None;
        }
        if elements.len() == 1 {
            elements.pop()
        } else {
            Some(PatternNode::Sequence(elements))
        }
    }

    /// `Ok(None)` when the current token cannot start an element.
    fn read_element(&mut self) -> Option<Option<PatternNode>> {
        let Some(token) = self.token() else {
            return Some(None);
        };
        match token.kind {
            TokenKind::Regexp => {
                let token = token.clone();
                self.advance();
                Some(Some(PatternNode::Regexp(token)))
            }
            TokenKind::Identifier => {
                let name = token.clone();
                self.advance();
                let conditions = self.read_element_conditions()?;
                Some(Some(PatternNode::Element { name, conditions }))
            }
            TokenKind::OpeningBrace => {
                self.advance();
                let alternatives = self.read_alternatives()?;
                if !self.is_kind(TokenKind::ClosingBrace) {
                    self.add_error("closing brace `}` expected");
                    return None;
                }
                let mut min_count = 0;
                let mut max_count = usize::MAX;
                if self.next_is_kind(TokenKind::LessThanSign) {
                    if !self.next_is_kind(TokenKind::Number) {
                        self.add_error("number (0, 1, 2, etc.) expected");
                        return None;
                    }
                    min_count = self.token()?.number;
                    if self.next_is_kind(TokenKind::Comma) {
                        if !self.next_is_kind(TokenKind::Number) {
                            self.add_error("number (0, 1, 2, etc.) expected");
                            return None;
                        }
                        max_count = self.token()?.number;
                        self.advance();
                    } else {
                        max_count = usize::MAX;
                    }
                    if !self.is_kind(TokenKind::GreaterThanSign) {
                        self.add_error("greater than sign `>` expected");
                        return None;
                    }
                    if min_count > max_count || max_count == 0 {
                        self.add_error("incorrect min max values for repeating");
                    }
                    self.advance();
                }
                Some(Some(PatternNode::Repeating {
                    node: Box::new(PatternNode::Alternatives(alternatives)),
                    min_count,
                    max_count,
                }))
            }
            TokenKind::OpeningBracket => {
                self.advance();
                let alternatives = self.read_alternatives()?;
                if !self.is_kind(TokenKind::ClosingBracket) {
                    self.add_error("closing bracket `]` expected");
                    return None;
                }
                self.advance();
                Some(Some(PatternNode::Repeating {
                    node: Box::new(PatternNode::Alternatives(alternatives)),
                    min_count: 0,
                    max_count: 1,
                }))
            }
            TokenKind::OpeningParenthesis => {
                self.advance();
                let alternatives = self.read_alternatives()?;
                if !self.is_kind(TokenKind::ClosingParenthesis) {
                    self.add_error("closing parenthesis `)` expected");
                    return None;
                }
                self.advance();
                Some(Some(PatternNode::Alternatives(alternatives)))
            }
            _ => Some(None),
        }
    }

    fn read_element_conditions(&mut self) -> Option<Vec<ElementCondition>> {
        let mut conditions = Vec::new();
        if self.is_kind(TokenKind::LessThanSign) {
            loop {
                self.advance();
                conditions.push(self.read_element_condition()?);
                if !self.is_kind(TokenKind::Comma) {
                    break;
                }
            }
            if !self.is_kind(TokenKind::GreaterThanSign) {
                self.add_error("greater than sign `>` expected");
                return None;
            }
            self.advance();
        }
        Some(conditions)
    }

    fn read_element_condition(&mut self) -> Option<ElementCondition> {
        if !self.is_kind(TokenKind::Identifier) {
            self.add_error("word class attribute name expected");
            return None;
        }
        let name = self.token().cloned()?;
        self.advance();

        let exclude = match self.token().map(|t| t.kind) {
            Some(TokenKind::EqualSign) => false,
            Some(TokenKind::ExclamationPointEqualSign) => true,
            _ => {
                self.add_error("equal sign `=` or `!=` expected");
                return None;
            }
        };

        let mut values = Vec::new();
        loop {
            if !self.next_is_kind(TokenKind::Identifier) {
                self.add_error("word class attribute value expected");
                return None;
            }
            values.push(self.token().cloned()?);
            if !self.next_is_kind(TokenKind::VerticalBar) {
                break;
            }
        }
        Some(ElementCondition {
            name,
            exclude,
            values,
        })
    }

    fn read_alternative_conditions(&mut self) -> Option<Vec<AlternativeCondition>> {
        let mut conditions = Vec::new();
        if self.is_kind(TokenKind::DoubleLessThanSign) {
            loop {
                self.advance();
                conditions.push(self.read_alternative_condition()?);
                if !self.is_kind(TokenKind::Comma) {
                    break;
                }
            }
            if !self.is_kind(TokenKind::DoubleGreaterThanSign) {
                self.add_error("double greater than sign `>>` expected");
                return None;
            }
            self.advance();
        }
        Some(conditions)
    }

    fn read_alternative_condition(&mut self) -> Option<AlternativeCondition> {
        // An identifier directly followed by `(` opens a dictionary
        // condition; everything else is an agreement chain.
        let dictionary = self.is_kind(TokenKind::Identifier)
            && self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|t| t.kind == TokenKind::OpeningParenthesis);
        if dictionary {
            self.read_dictionary_condition()
        } else {
            self.read_matching_condition()
        }
    }

    fn read_matching_condition(&mut self) -> Option<AlternativeCondition> {
        let mut names = Vec::new();
        let mut saw_equal = false;
        let mut saw_double = false;
        loop {
            names.push(self.read_extended_name()?);
            match self.token().map(|t| t.kind) {
                Some(TokenKind::EqualSign) => saw_equal = true,
                Some(TokenKind::DoubleEqualSign) => saw_double = true,
                _ => break,
            }
            self.advance();
            // `<<num==>>`: a single attribute name with a trailing sign
            // means agreement over every word of the alternative.
            if names.len() == 1
                && matches!(
                    self.token().map(|t| t.kind),
                    Some(TokenKind::Comma | TokenKind::DoubleGreaterThanSign) | None
                )
            {
                break;
            }
        }
        if !saw_equal && !saw_double {
            self.add_error("equal sign `=` or double equal `==` sign expected");
            return None;
        }
        if saw_equal && saw_double {
            self.add_error("inconsistent equal sign `=` and double equal `==` sign");
        }
        Some(AlternativeCondition::Agreement {
            names,
            strong: saw_double,
        })
    }

    fn read_dictionary_condition(&mut self) -> Option<AlternativeCondition> {
        let name = self.token().cloned()?;
        if !self.next_is_kind(TokenKind::OpeningParenthesis) {
            self.add_error("opening parenthesis `(` expected");
            return None;
        }
        self.advance();

        let mut groups = Vec::new();
        loop {
            let mut group = Vec::new();
            while self.is_kind(TokenKind::Identifier) {
                group.push(self.read_extended_name()?);
            }
            if group.is_empty() {
                self.add_error("at least one template element expected");
                return None;
            }
            groups.push(group);
            if self.is_kind(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        if !self.is_kind(TokenKind::ClosingParenthesis) {
            self.add_error("closing parenthesis `)` expected");
            return None;
        }
        self.advance();
        Some(AlternativeCondition::Dictionary { name, groups })
    }
}
