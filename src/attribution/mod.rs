//! Speaker attribution: who is speaking each span of a line.
//!
//! A line is cleaned, split into narration and dialogue by
//! [`segmenter`], tagged by an [`Annotator`], then handed to
//! [`resolver::resolve_line`] together with the rolling
//! [`AttributionContext`].

pub mod annotation;
pub mod lexical;
pub mod resolver;
pub mod segmenter;

pub use annotation::{Annotation, Annotator, DepRole, EntityLabel, EntitySpan, PartOfSpeech, Token};
pub use lexical::LexicalAnnotator;
pub use resolver::{resolve_line, AttributionContext};
pub use segmenter::{clean_text, split_narration_dialogue, Segment, SegmentKind};
