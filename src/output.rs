//! JSON-lines record of an attribution run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::speakers::{ScriptEntry, Speaker, SpeakerRegistry};
use crate::Result;

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Record<'a> {
    Speakers(&'a Speaker),
    Superbook(&'a ScriptEntry),
}

/// Write one record per speaker, then one per script entry.
pub fn write_jsonl(registry: &SpeakerRegistry, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for speaker in registry.speakers() {
        serde_json::to_writer(&mut writer, &Record::Speakers(speaker))?;
        writer.write_all(b"\n")?;
    }
    for entry in registry.script() {
        serde_json::to_writer(&mut writer, &Record::Superbook(entry))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    log::info!("Saved results to {}", path.display());
    Ok(())
}
