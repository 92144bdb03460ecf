//! Drives document lines through segmentation and attribution, building
//! the script inside a [`SpeakerRegistry`].

use serde::{Deserialize, Serialize};

use crate::attribution::{
    clean_text, resolve_line, split_narration_dialogue, AttributionContext, Annotator,
};
use crate::speakers::{Gender, Number, SpeakerRegistry, UNNAMED_SPEAKERS};

/// How dialogue is assigned to voices for a whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributionMode {
    /// Entity, pronoun and context based attribution.
    #[default]
    Heuristic,
    /// Every line alternates between two placeholder voices.
    Alternating,
}

pub struct NarrativeProcessor<'a> {
    annotator: &'a dyn Annotator,
    context: AttributionContext,
}

impl<'a> NarrativeProcessor<'a> {
    pub fn new(annotator: &'a dyn Annotator) -> Self {
        Self {
            annotator,
            context: AttributionContext::default(),
        }
    }

    /// Process a whole document with the given strategy.
    pub fn process<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        mode: AttributionMode,
        registry: &mut SpeakerRegistry,
    ) {
        match mode {
            AttributionMode::Heuristic => self.process_text_lines(lines, registry),
            AttributionMode::Alternating => alternate_speakers(lines, registry),
        }
    }

    /// Heuristic attribution. A line the annotator cannot handle is logged
    /// and skipped.
    pub fn process_text_lines<S: AsRef<str>>(&mut self, lines: &[S], registry: &mut SpeakerRegistry) {
        self.context.reset();

        for (line_no, raw) in lines.iter().enumerate() {
            let cleaned = clean_text(raw.as_ref());
            let line = cleaned.trim();
            if line.is_empty() {
                continue;
            }

            let annotation = match self.annotator.annotate(line) {
                Ok(annotation) if !annotation.is_empty() => annotation,
                Ok(_) => {
                    log::debug!("Line {} produced no tokens, skipping", line_no + 1);
                    continue;
                }
                Err(e) => {
                    log::warn!("Skipping line {}: {e}", line_no + 1);
                    continue;
                }
            };

            let segments = split_narration_dialogue(line);
            resolve_line(&annotation, &segments, registry, &mut self.context);
        }
    }

    pub fn context(&self) -> &AttributionContext {
        &self.context
    }
}

/// Round-robin every non-empty line between the two placeholder voices.
pub fn alternate_speakers<S: AsRef<str>>(lines: &[S], registry: &mut SpeakerRegistry) {
    for name in UNNAMED_SPEAKERS {
        registry.add_speaker(name, Gender::Unknown, Number::Singular);
    }

    let mut current = 0;
    for raw in lines {
        let cleaned = clean_text(raw.as_ref());
        let line = cleaned.trim();
        if line.is_empty() {
            continue;
        }
        registry.push_entry(UNNAMED_SPEAKERS[current], line);
        current = (current + 1) % UNNAMED_SPEAKERS.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::{Annotation, LexicalAnnotator};
    use crate::speakers::NARRATOR;
    use crate::{Error, Result};

    struct BrokenAnnotator;

    impl Annotator for BrokenAnnotator {
        fn annotate(&self, line: &str) -> Result<Annotation> {
            if line.contains("boom") {
                Err(Error::Annotation("tagger crashed".to_string()))
            } else {
                LexicalAnnotator::new().annotate(line)
            }
        }
    }

    fn speakers_of(registry: &SpeakerRegistry) -> Vec<&str> {
        registry
            .script()
            .iter()
            .map(|e| e.speaker_name.as_str())
            .collect()
    }

    #[test]
    fn follows_a_short_conversation() {
        let lines = [
            r#"Meg said, "Let's go.""#,
            "",
            r#""Where?" asked Jo."#,
            r#""Home.""#,
        ];
        let annotator = LexicalAnnotator::new();
        let mut registry = SpeakerRegistry::with_seed(5);
        let mut processor = NarrativeProcessor::new(&annotator);
        processor.process(&lines, AttributionMode::Heuristic, &mut registry);

        assert_eq!(
            speakers_of(&registry),
            vec![NARRATOR, "Meg", "Jo", NARRATOR, "Jo"]
        );
        assert_eq!(processor.context().last_named_speaker.as_deref(), Some("Jo"));
    }

    #[test]
    fn failing_lines_are_skipped() {
        let lines = [r#""One," said Amy."#, "boom", r#""Two.""#];
        let mut registry = SpeakerRegistry::with_seed(5);
        let mut processor = NarrativeProcessor::new(&BrokenAnnotator);
        processor.process(&lines, AttributionMode::Heuristic, &mut registry);

        let texts: Vec<&str> = registry.script().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["One,", "said Amy.", "Two."]);
        assert_eq!(speakers_of(&registry), vec!["Amy", NARRATOR, "Amy"]);
    }

    #[test]
    fn context_is_reset_per_document() {
        let annotator = LexicalAnnotator::new();
        let mut registry = SpeakerRegistry::with_seed(5);
        let mut processor = NarrativeProcessor::new(&annotator);
        processor.process(&[r#""Hi," said Beth."#], AttributionMode::Heuristic, &mut registry);

        let mut second = SpeakerRegistry::with_seed(5);
        processor.process(&[r#""Hello?""#], AttributionMode::Heuristic, &mut second);
        assert_eq!(speakers_of(&second), vec![UNNAMED_SPEAKERS[0]]);
    }

    #[test]
    fn alternating_mode_round_robins_lines() {
        let lines = ["  First.  ", "Second.", "   ", "Third."];
        let annotator = LexicalAnnotator::new();
        let mut registry = SpeakerRegistry::with_seed(5);
        NarrativeProcessor::new(&annotator).process(
            &lines,
            AttributionMode::Alternating,
            &mut registry,
        );

        assert_eq!(
            speakers_of(&registry),
            vec![UNNAMED_SPEAKERS[0], UNNAMED_SPEAKERS[1], UNNAMED_SPEAKERS[0]]
        );
        assert_eq!(registry.script()[0].text, "First.");
        assert_eq!(registry.speakers().len(), 3);
    }
}
