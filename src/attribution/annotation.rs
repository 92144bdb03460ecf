//! Fixed-shape NLP annotation consumed by the resolver.

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Pronoun,
    ProperNoun,
    Noun,
    Verb,
    Punctuation,
    Other,
}

/// Dependency role of a token, reduced to the roles attribution cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepRole {
    NominalSubject,
    Attribute,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLabel {
    Person,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lower: String,
    pub pos: PartOfSpeech,
    pub dep: DepRole,
}

impl Token {
    pub fn new(text: &str, pos: PartOfSpeech, dep: DepRole) -> Self {
        Self {
            text: text.to_string(),
            lower: text.to_lowercase(),
            pos,
            dep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub label: EntityLabel,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub tokens: Vec<Token>,
    pub entities: Vec<EntitySpan>,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Anything that can tag a cleaned line of text.
pub trait Annotator {
    fn annotate(&self, line: &str) -> Result<Annotation>;
}
