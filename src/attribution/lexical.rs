//! A small rule-based annotator.
//!
//! It knows nothing about syntax beyond word shape and a few closed word
//! classes, but it fills the same [`Annotation`] contract a statistical
//! tagger would, which is all the resolver needs.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::annotation::{Annotation, Annotator, DepRole, EntityLabel, EntitySpan, PartOfSpeech, Token};
use crate::Result;

const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "you", "your", "yours", "he", "him", "his", "she", "her", "hers",
    "it", "its", "we", "us", "our", "ours", "they", "them", "their", "theirs", "himself",
    "herself", "themselves", "myself", "yourself", "everyone", "everybody", "someone",
    "somebody", "anyone", "anybody", "nobody",
];

/// Capitalised words that are almost never names.
const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "so", "if", "then", "when", "while", "as", "at", "by",
    "for", "from", "in", "into", "of", "on", "to", "with", "without", "after", "before", "this",
    "that", "these", "those", "there", "here", "what", "why", "how", "where", "who", "which",
    "yes", "no", "not", "oh", "ah", "well", "let", "let's", "do", "don't", "did", "is", "was",
    "are", "were", "be", "been", "have", "has", "had", "can", "could", "will", "would", "shall",
    "should", "may", "might", "must", "come", "go", "look", "please", "okay", "ok", "hello",
    "hi", "good", "now", "just", "maybe", "perhaps", "all", "some", "every", "each", "one",
    "chapter", "i'm", "i'll", "i've", "i'd", "it's", "that's", "what's", "there's",
];

const COPULAS: &[&str] = &["is", "was", "am", "are", "were", "be", "been", "being"];

const SPEECH_VERBS: &[&str] = &[
    "say", "says", "said", "ask", "asks", "asked", "reply", "replies", "replied", "shout",
    "shouts", "shouted", "whisper", "whispers", "whispered", "add", "adds", "added", "continue",
    "continued", "speak", "spoke", "cried", "called", "answered", "muttered", "yelled",
];

const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "miss", "dr", "sir", "lady", "lord"];

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9]+(?:'[A-Za-z]+)?|[^\sA-Za-z0-9]").expect("valid token regex")
    })
}

fn word_set(words: &'static [&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

pub struct LexicalAnnotator {
    pronouns: HashSet<&'static str>,
    function_words: HashSet<&'static str>,
    copulas: HashSet<&'static str>,
    speech_verbs: HashSet<&'static str>,
    honorifics: HashSet<&'static str>,
}

impl Default for LexicalAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalAnnotator {
    pub fn new() -> Self {
        Self {
            pronouns: word_set(PRONOUNS),
            function_words: word_set(FUNCTION_WORDS),
            copulas: word_set(COPULAS),
            speech_verbs: word_set(SPEECH_VERBS),
            honorifics: word_set(HONORIFICS),
        }
    }

    fn part_of_speech(&self, text: &str, lower: &str) -> PartOfSpeech {
        let first = text.chars().next().unwrap_or(' ');
        if !first.is_alphanumeric() {
            PartOfSpeech::Punctuation
        } else if self.pronouns.contains(lower) {
            PartOfSpeech::Pronoun
        } else if self.speech_verbs.contains(lower) || self.copulas.contains(lower) {
            PartOfSpeech::Verb
        } else if first.is_uppercase() && !self.function_words.contains(lower) {
            PartOfSpeech::ProperNoun
        } else if lower.ends_with("ed") {
            PartOfSpeech::Verb
        } else if self.function_words.contains(lower) {
            PartOfSpeech::Other
        } else {
            PartOfSpeech::Noun
        }
    }

    /// Group adjacent proper nouns into PERSON spans when a speech verb or
    /// an honorific sits next to the run.
    fn person_spans(&self, tokens: &[Token]) -> Vec<EntitySpan> {
        let mut spans = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i].pos != PartOfSpeech::ProperNoun {
                i += 1;
                continue;
            }
            let start = i;
            while i < tokens.len() && tokens[i].pos == PartOfSpeech::ProperNoun {
                i += 1;
            }
            let end = i;

            let before = start.checked_sub(1).map(|j| &tokens[j]);
            // "Mr. Darcy": step back over the abbreviation dot.
            let before_honorific = match (start.checked_sub(2), before) {
                (Some(j), Some(dot)) if dot.text == "." => Some(&tokens[j]),
                _ => before,
            };
            let after = tokens.get(end);

            let is_person = before_honorific
                .is_some_and(|t| self.honorifics.contains(t.lower.as_str()))
                || before.is_some_and(|t| self.speech_verbs.contains(t.lower.as_str()))
                || after.is_some_and(|t| self.speech_verbs.contains(t.lower.as_str()));

            // Honorifics tagged as proper nouns belong to the name itself.
            let first_name = (start..end)
                .find(|&k| !self.honorifics.contains(tokens[k].lower.as_str()))
                .unwrap_or(start);

            if is_person {
                let text = tokens[first_name..end]
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                spans.push(EntitySpan {
                    label: EntityLabel::Person,
                    text,
                });
            }
        }
        spans
    }
}

impl Annotator for LexicalAnnotator {
    fn annotate(&self, line: &str) -> Result<Annotation> {
        let mut tokens: Vec<Token> = token_regex()
            .find_iter(line)
            .map(|m| {
                let text = m.as_str();
                let lower = text.to_lowercase();
                let pos = self.part_of_speech(text, &lower);
                Token {
                    text: text.to_string(),
                    lower,
                    pos,
                    dep: DepRole::Other,
                }
            })
            .collect();

        for i in 0..tokens.len() {
            if tokens[i].pos != PartOfSpeech::ProperNoun {
                continue;
            }
            let next = tokens.get(i + 1);
            let prev = i.checked_sub(1).map(|j| &tokens[j]);
            let dep = if next.is_some_and(|t| t.pos == PartOfSpeech::Verb) {
                DepRole::NominalSubject
            } else if prev.is_some_and(|t| self.copulas.contains(t.lower.as_str())) {
                DepRole::Attribute
            } else {
                DepRole::Other
            };
            tokens[i].dep = dep;
        }

        let entities = self.person_spans(&tokens);
        Ok(Annotation { tokens, entities })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate(line: &str) -> Annotation {
        LexicalAnnotator::new().annotate(line).unwrap()
    }

    #[test]
    fn tags_subject_of_speech_verb_as_person() {
        let ann = annotate(r#"Meg said, "Let's go.""#);
        assert_eq!(ann.entities.len(), 1);
        assert_eq!(ann.entities[0].text, "Meg");
        let meg = &ann.tokens[0];
        assert_eq!(meg.pos, PartOfSpeech::ProperNoun);
        assert_eq!(meg.dep, DepRole::NominalSubject);
    }

    #[test]
    fn inverted_attribution_is_a_person() {
        let ann = annotate(r#""Fine," said Jo March."#);
        assert_eq!(ann.entities[0].text, "Jo March");
    }

    #[test]
    fn honorific_names_drop_the_title() {
        let ann = annotate("Mr. Darcy bowed.");
        assert_eq!(ann.entities[0].text, "Darcy");
    }

    #[test]
    fn pronouns_and_function_words_are_not_names() {
        let ann = annotate(r#""I don't know," he whispered."#);
        assert!(ann.entities.is_empty());
        assert!(ann
            .tokens
            .iter()
            .all(|t| t.pos != PartOfSpeech::ProperNoun));
        let he = ann.tokens.iter().find(|t| t.lower == "he").unwrap();
        assert_eq!(he.pos, PartOfSpeech::Pronoun);
    }

    #[test]
    fn indefinite_pronouns_are_not_names() {
        for line in [r#"Everyone laughed. "Stop!""#, r#"Somebody coughed. "Who?""#] {
            let ann = annotate(line);
            assert!(ann.entities.is_empty(), "{line}");
            assert_eq!(ann.tokens[0].pos, PartOfSpeech::Pronoun, "{line}");
            assert_eq!(crate::attribution::resolver::get_named_speaker(&ann), None);
        }
    }

    #[test]
    fn copula_complement_is_an_attribute() {
        let ann = annotate("The speaker was Amy.");
        let amy = ann.tokens.iter().find(|t| t.text == "Amy").unwrap();
        assert_eq!(amy.dep, DepRole::Attribute);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(annotate("   ").is_empty());
    }
}
