use std::collections::HashMap;
use std::path::Path;

use crate::speakers::{Gender, SpeakerRegistry, NARRATOR};
use crate::{Error, Result};

/// Best-guess gender for a given name.
pub trait GenderOracle {
    /// `Ok(None)` means the name is not in the dataset.
    fn lookup(&self, name: &str) -> Result<Option<Gender>>;
}

/// Case-insensitive first-name to gender table.
#[derive(Debug, Clone)]
pub struct NameTable {
    names: HashMap<String, Gender>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self {
            names: hardcoded_names(),
        }
    }
}

impl NameTable {
    /// Load a name table from a JSON file.
    ///
    /// The file must contain a `"names"` object mapping names to gender
    /// labels (`"male"`, `"female"`, `"m"`, `"f"`). Unknown labels are kept
    /// out of the table.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let json: serde_json::Value = serde_json::from_str(&content)?;

        let names_obj = json
            .get("names")
            .ok_or_else(|| Error::NameTable("Missing 'names' field".to_string()))?
            .as_object()
            .ok_or_else(|| Error::NameTable("'names' must be an object".to_string()))?;

        let mut names = HashMap::new();
        for (name, label) in names_obj {
            let label = label
                .as_str()
                .ok_or_else(|| Error::NameTable(format!("Non-string gender for {name:?}")))?;
            let gender = Gender::from_label(label);
            if gender.is_known() {
                names.insert(name.to_lowercase(), gender);
            }
        }

        log::info!("Loaded {} names from {}", names.len(), path.display());
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl GenderOracle for NameTable {
    fn lookup(&self, name: &str) -> Result<Option<Gender>> {
        let first = name
            .split_whitespace()
            .next()
            .ok_or_else(|| Error::NameTable("Empty name".to_string()))?;
        Ok(self.names.get(&first.to_lowercase()).copied())
    }
}

/// Fill in unknown genders after the whole document has been attributed.
///
/// Lookup failures are logged and leave the speaker unknown.
pub fn backfill_genders(registry: &mut SpeakerRegistry, oracle: &dyn GenderOracle) {
    let pending: Vec<String> = registry
        .speakers()
        .iter()
        .filter(|s| s.name != NARRATOR && !s.gender.is_known())
        .map(|s| s.name.clone())
        .collect();

    for name in pending {
        match oracle.lookup(&name) {
            Ok(Some(gender)) if gender.is_known() => {
                log::debug!("Guessed {gender:?} for {name}");
                registry.upgrade_gender(&name, gender);
            }
            Ok(_) => {}
            Err(e) => log::error!("Error guessing gender for {name}: {e}"),
        }
    }
}

/// Built-in fallback used when no name table file is supplied.
pub fn hardcoded_names() -> HashMap<String, Gender> {
    let entries: &[(&str, Gender)] = &[
        ("meg", Gender::Female),
        ("jo", Gender::Female),
        ("beth", Gender::Female),
        ("amy", Gender::Female),
        ("alice", Gender::Female),
        ("anna", Gender::Female),
        ("elizabeth", Gender::Female),
        ("emma", Gender::Female),
        ("jane", Gender::Female),
        ("mary", Gender::Female),
        ("sarah", Gender::Female),
        ("margaret", Gender::Female),
        ("catherine", Gender::Female),
        ("lucy", Gender::Female),
        ("hannah", Gender::Female),
        ("laurie", Gender::Male),
        ("john", Gender::Male),
        ("james", Gender::Male),
        ("william", Gender::Male),
        ("henry", Gender::Male),
        ("thomas", Gender::Male),
        ("tom", Gender::Male),
        ("george", Gender::Male),
        ("charles", Gender::Male),
        ("robert", Gender::Male),
        ("edward", Gender::Male),
        ("peter", Gender::Male),
        ("harry", Gender::Male),
        ("darcy", Gender::Male),
        ("frederick", Gender::Male),
        ("arthur", Gender::Male),
    ];
    entries
        .iter()
        .map(|&(name, gender)| (name.to_string(), gender))
        .collect()
}
