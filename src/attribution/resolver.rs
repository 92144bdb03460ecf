use std::sync::OnceLock;

use regex::Regex;

use super::annotation::{Annotation, DepRole, EntityLabel, PartOfSpeech};
use super::segmenter::{Segment, SegmentKind};
use crate::speakers::{Gender, Number, SpeakerRegistry, NARRATOR, UNNAMED_SPEAKERS};

/// Rolling state carried from line to line within one document.
#[derive(Debug, Default, Clone)]
pub struct AttributionContext {
    pub last_named_speaker: Option<String>,
}

impl AttributionContext {
    pub fn reset(&mut self) {
        self.last_named_speaker = None;
    }
}

/// First PERSON entity, else the first proper noun used as a subject or
/// a copula complement.
pub fn get_named_speaker(annotation: &Annotation) -> Option<String> {
    if let Some(person) = annotation
        .entities
        .iter()
        .find(|e| e.label == EntityLabel::Person)
    {
        return Some(person.text.clone());
    }

    annotation
        .tokens
        .iter()
        .find(|t| {
            t.pos == PartOfSpeech::ProperNoun
                && matches!(t.dep, DepRole::NominalSubject | DepRole::Attribute)
        })
        .map(|t| t.text.clone())
}

/// Gender of the first personal pronoun on the line. "they" and no
/// pronoun at all both mean unknown.
pub fn infer_gender_from_pronouns(annotation: &Annotation) -> Gender {
    annotation
        .tokens
        .iter()
        .filter(|t| t.pos == PartOfSpeech::Pronoun)
        .find_map(|t| match t.lower.as_str() {
            "he" | "him" | "his" => Some(Gender::Male),
            "she" | "her" | "hers" => Some(Gender::Female),
            "they" => Some(Gender::Unknown),
            _ => None,
        })
        .unwrap_or(Gender::Unknown)
}

fn attribution_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:said|asked|replied|shouted|whispered|added)\s+([A-Z][A-Za-z'-]*)")
            .expect("valid attribution regex")
    })
}

/// Name following an attribution verb in narration ("... said Meg").
pub fn detect_attribution(text: &str) -> Option<&str> {
    attribution_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Assign each segment of one line to a speaker and append it to the script.
pub fn resolve_line(
    annotation: &Annotation,
    segments: &[Segment],
    registry: &mut SpeakerRegistry,
    context: &mut AttributionContext,
) {
    let named_speaker = get_named_speaker(annotation);
    let gender = if named_speaker.is_some() {
        infer_gender_from_pronouns(annotation)
    } else {
        Gender::Unknown
    };

    for segment in segments {
        match segment.kind {
            SegmentKind::Dialogue => {
                let speaker = match &named_speaker {
                    Some(name) => {
                        registry.add_speaker(name, gender, Number::Singular);
                        context.last_named_speaker = Some(name.clone());
                        name.clone()
                    }
                    None => match &context.last_named_speaker {
                        Some(last) => last.clone(),
                        None => {
                            let placeholder = UNNAMED_SPEAKERS[0];
                            registry.add_speaker(placeholder, Gender::Unknown, Number::Singular);
                            placeholder.to_string()
                        }
                    },
                };
                registry.push_entry(&speaker, &segment.text);
            }
            SegmentKind::Narration => {
                // A named speaker already owns this line; lexical cues do not
                // displace it.
                if named_speaker.is_none() {
                    if let Some(name) = detect_attribution(&segment.text) {
                        registry.add_speaker(name, Gender::Unknown, Number::Singular);
                        context.last_named_speaker = Some(name.to_string());
                    }
                }
                registry.push_entry(NARRATOR, &segment.text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::annotation::{EntitySpan, Token};
    use crate::attribution::segmenter::split_narration_dialogue;

    fn tok(text: &str, pos: PartOfSpeech, dep: DepRole) -> Token {
        Token::new(text, pos, dep)
    }

    fn person(text: &str) -> EntitySpan {
        EntitySpan {
            label: EntityLabel::Person,
            text: text.to_string(),
        }
    }

    fn run(line: &str, annotation: &Annotation, registry: &mut SpeakerRegistry, ctx: &mut AttributionContext) {
        let segments = split_narration_dialogue(line);
        resolve_line(annotation, &segments, registry, ctx);
    }

    fn entries(registry: &SpeakerRegistry) -> Vec<(String, String)> {
        registry
            .script()
            .iter()
            .map(|e| (e.speaker_name.clone(), e.text.clone()))
            .collect()
    }

    #[test]
    fn named_person_takes_the_dialogue() {
        let annotation = Annotation {
            tokens: vec![
                tok("Meg", PartOfSpeech::ProperNoun, DepRole::NominalSubject),
                tok("said", PartOfSpeech::Verb, DepRole::Other),
            ],
            entities: vec![person("Meg")],
        };
        let mut registry = SpeakerRegistry::with_seed(3);
        let mut ctx = AttributionContext::default();
        run(r#"Meg said, "Let's go.""#, &annotation, &mut registry, &mut ctx);

        assert_eq!(
            entries(&registry),
            vec![
                (NARRATOR.to_string(), "Meg said,".to_string()),
                ("Meg".to_string(), "Let's go.".to_string()),
            ]
        );
        assert!(registry.get_speaker("Meg").is_some());
        assert_eq!(ctx.last_named_speaker.as_deref(), Some("Meg"));
    }

    #[test]
    fn unattributed_dialogue_without_context_uses_placeholder() {
        let annotation = Annotation {
            tokens: vec![
                tok("I", PartOfSpeech::Pronoun, DepRole::NominalSubject),
                tok("he", PartOfSpeech::Pronoun, DepRole::NominalSubject),
                tok("whispered", PartOfSpeech::Verb, DepRole::Other),
            ],
            entities: vec![],
        };
        let mut registry = SpeakerRegistry::with_seed(3);
        let mut ctx = AttributionContext::default();
        run(r#""I don't know," he whispered."#, &annotation, &mut registry, &mut ctx);

        assert_eq!(
            entries(&registry),
            vec![
                (UNNAMED_SPEAKERS[0].to_string(), "I don't know,".to_string()),
                (NARRATOR.to_string(), "he whispered.".to_string()),
            ]
        );
        assert!(registry.get_speaker(UNNAMED_SPEAKERS[0]).is_some());
    }

    #[test]
    fn unattributed_dialogue_carries_previous_speaker() {
        let mut registry = SpeakerRegistry::with_seed(3);
        let mut ctx = AttributionContext {
            last_named_speaker: Some("Jo".to_string()),
        };
        run(r#""Again?""#, &Annotation::default(), &mut registry, &mut ctx);
        assert_eq!(entries(&registry)[0].0, "Jo");
    }

    #[test]
    fn proper_noun_subject_is_a_fallback_name() {
        let annotation = Annotation {
            tokens: vec![
                tok("Beth", PartOfSpeech::ProperNoun, DepRole::NominalSubject),
                tok("she", PartOfSpeech::Pronoun, DepRole::Other),
            ],
            entities: vec![],
        };
        assert_eq!(get_named_speaker(&annotation).as_deref(), Some("Beth"));
        assert_eq!(infer_gender_from_pronouns(&annotation), Gender::Female);
    }

    #[test]
    fn first_pronoun_decides_gender() {
        let annotation = Annotation {
            tokens: vec![
                tok("they", PartOfSpeech::Pronoun, DepRole::Other),
                tok("he", PartOfSpeech::Pronoun, DepRole::Other),
            ],
            entities: vec![],
        };
        assert_eq!(infer_gender_from_pronouns(&annotation), Gender::Unknown);
        assert_eq!(infer_gender_from_pronouns(&Annotation::default()), Gender::Unknown);
    }

    #[test]
    fn pronoun_gender_is_attached_to_named_speaker() {
        let annotation = Annotation {
            tokens: vec![
                tok("Laurie", PartOfSpeech::ProperNoun, DepRole::NominalSubject),
                tok("his", PartOfSpeech::Pronoun, DepRole::Other),
            ],
            entities: vec![person("Laurie")],
        };
        let mut registry = SpeakerRegistry::with_seed(3);
        let mut ctx = AttributionContext::default();
        run(
            r#"Laurie tipped his hat. "Ladies.""#,
            &annotation,
            &mut registry,
            &mut ctx,
        );
        assert_eq!(registry.get_speaker("Laurie").unwrap().gender, Gender::Male);
    }

    #[test]
    fn attribution_verb_updates_context_but_credits_narrator() {
        let mut registry = SpeakerRegistry::with_seed(3);
        let mut ctx = AttributionContext::default();
        run(r#""Hush," whispered Amy."#, &Annotation::default(), &mut registry, &mut ctx);

        // The dialogue came before the cue, so it still falls to the placeholder.
        assert_eq!(
            entries(&registry),
            vec![
                (UNNAMED_SPEAKERS[0].to_string(), "Hush,".to_string()),
                (NARRATOR.to_string(), "whispered Amy.".to_string()),
            ]
        );
        assert_eq!(ctx.last_named_speaker.as_deref(), Some("Amy"));
        assert!(registry.get_speaker("Amy").is_some());

        run(r#""Why?""#, &Annotation::default(), &mut registry, &mut ctx);
        assert_eq!(entries(&registry)[2].0, "Amy");
    }

    #[test]
    fn attribution_verb_does_not_override_named_speaker() {
        let annotation = Annotation {
            tokens: vec![tok("Meg", PartOfSpeech::ProperNoun, DepRole::NominalSubject)],
            entities: vec![person("Meg")],
        };
        let mut registry = SpeakerRegistry::with_seed(3);
        let mut ctx = AttributionContext::default();
        run(
            r#"Meg smiled as she said Hello. "Come in.""#,
            &annotation,
            &mut registry,
            &mut ctx,
        );
        assert_eq!(ctx.last_named_speaker.as_deref(), Some("Meg"));
        assert!(registry.get_speaker("Hello").is_none());
    }

    #[test]
    fn attribution_needs_a_capitalised_name() {
        assert_eq!(detect_attribution("he whispered."), None);
        assert_eq!(detect_attribution("whispered he"), None);
        assert_eq!(detect_attribution("then asked  Beth, quietly"), Some("Beth"));
    }
}
