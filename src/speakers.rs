//! Speaker registry and the "superbook" script it owns.
//!
//! The registry is the only mutable state of the attribution phase. Once
//! attribution is done it is handed to the audio phase by shared reference
//! and never mutated again.

use std::collections::HashMap;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Name of the narrator voice. Always registered, always at pitch 1.0.
pub const NARRATOR: &str = "Narrator";

/// Placeholder voices used when dialogue cannot be attributed.
pub const UNNAMED_SPEAKERS: [&str; 2] = ["Unnamed Speaker 1", "Unnamed Speaker 2"];

/// Default range for randomly drawn pitch factors (upper bound exclusive).
pub const PITCH_FACTOR_RANGE: Range<f64> = 0.8..1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn is_known(self) -> bool {
        self != Gender::Unknown
    }

    /// Parse a loose gender label ("m", "Female", ...). Anything else is unknown.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "m" | "male" | "man" => Gender::Male,
            "f" | "female" | "woman" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Number {
    Singular,
    Plural,
}

/// A voice identity with a fixed pitch offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    pub gender: Gender,
    pub number: Number,
    pub pitch_factor: f64,
}

/// One line of the script: who says what, in which position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub sequence_index: usize,
    #[serde(rename = "speaker")]
    pub speaker_name: String,
    pub text: String,
}

/// Known speakers plus the append-only script.
pub struct SpeakerRegistry {
    speakers: Vec<Speaker>,
    by_name: HashMap<String, usize>,
    script: Vec<ScriptEntry>,
    pitch_range: Range<f64>,
    rng: StdRng,
}

impl Default for SpeakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeakerRegistry {
    /// Create a registry seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), PITCH_FACTOR_RANGE)
    }

    /// Create a registry whose pitch draws are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), PITCH_FACTOR_RANGE)
    }

    pub fn with_rng(rng: StdRng, pitch_range: Range<f64>) -> Self {
        let mut registry = Self {
            speakers: Vec::new(),
            by_name: HashMap::new(),
            script: Vec::new(),
            pitch_range,
            rng,
        };
        registry.insert(Speaker {
            name: NARRATOR.to_string(),
            gender: Gender::Unknown,
            number: Number::Singular,
            pitch_factor: 1.0,
        });
        registry
    }

    fn insert(&mut self, speaker: Speaker) {
        self.by_name
            .insert(speaker.name.clone(), self.speakers.len());
        self.speakers.push(speaker);
    }

    /// Register `name`, or upgrade its gender if it is already known.
    ///
    /// The pitch factor is drawn only on first insertion. A known gender is
    /// never replaced, and `Unknown` never overwrites anything.
    pub fn add_speaker(&mut self, name: &str, gender: Gender, number: Number) {
        if let Some(&idx) = self.by_name.get(name) {
            let existing = &mut self.speakers[idx];
            if !existing.gender.is_known() && gender.is_known() {
                log::debug!("Gender of {name} upgraded to {gender:?}");
                existing.gender = gender;
            }
            return;
        }

        let pitch_factor = self.rng.gen_range(self.pitch_range.clone());
        log::debug!("Registered speaker {name} with pitch factor {pitch_factor:.3}");
        self.insert(Speaker {
            name: name.to_string(),
            gender,
            number,
            pitch_factor,
        });
    }

    pub fn get_speaker(&self, name: &str) -> Option<&Speaker> {
        self.by_name.get(name).map(|&idx| &self.speakers[idx])
    }

    /// Overwrite an unknown gender; used by the post-pass name lookup.
    pub(crate) fn upgrade_gender(&mut self, name: &str, gender: Gender) {
        self.add_speaker(name, gender, Number::Singular);
    }

    /// All speakers in registration order, Narrator first.
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// Append a script line. Blank text is ignored.
    pub fn push_entry(&mut self, speaker_name: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let sequence_index = self.script.len();
        self.script.push(ScriptEntry {
            sequence_index,
            speaker_name: speaker_name.to_string(),
            text: text.to_string(),
        });
    }

    pub fn script(&self) -> &[ScriptEntry] {
        &self.script
    }
}
