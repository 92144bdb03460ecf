use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Narration,
    Dialogue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

impl Segment {
    fn new(kind: SegmentKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Strip everything outside ASCII, after folding typographic quotes onto
/// their ASCII forms so they still delimit dialogue.
pub fn clean_text(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .filter_map(|ch| match ch {
                '\u{201c}' | '\u{201d}' | '\u{201e}' => Some('"'),
                '\u{2018}' | '\u{2019}' => Some('\''),
                c if c.is_ascii() => Some(c),
                _ => None,
            })
            .collect(),
    )
}

/// Split a line into narration and dialogue, left to right.
///
/// Text between a pair of `"` is dialogue. A trailing unmatched `"` is
/// dropped and whatever follows it stays narration.
pub fn split_narration_dialogue(line: &str) -> Vec<Segment> {
    let pieces: Vec<&str> = line.split('"').collect();
    let last = pieces.len() - 1;

    pieces
        .iter()
        .enumerate()
        .filter_map(|(i, piece)| {
            let text = piece.trim();
            if text.is_empty() {
                return None;
            }
            // Odd pieces sit after an opening quote; they are dialogue only
            // when a closing quote follows.
            let kind = if i % 2 == 1 && i < last {
                SegmentKind::Dialogue
            } else {
                SegmentKind::Narration
            };
            Some(Segment::new(kind, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace() && *c != '"').collect()
    }

    #[test]
    fn splits_narration_then_dialogue() {
        let parts = split_narration_dialogue(r#"Meg said, "Let's go.""#);
        assert_eq!(
            parts,
            vec![
                Segment::new(SegmentKind::Narration, "Meg said,"),
                Segment::new(SegmentKind::Dialogue, "Let's go."),
            ]
        );
    }

    #[test]
    fn keeps_interleaved_order() {
        let parts = split_narration_dialogue(r#""Wait," he said. "Come back!" She ran."#);
        let kinds: Vec<SegmentKind> = parts.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Dialogue,
                SegmentKind::Narration,
                SegmentKind::Dialogue,
                SegmentKind::Narration,
            ]
        );
        assert_eq!(parts[2].text, "Come back!");
    }

    #[test]
    fn unterminated_quote_is_absorbed_into_narration() {
        let parts = split_narration_dialogue(r#"He said "hello there"#);
        assert_eq!(
            parts,
            vec![
                Segment::new(SegmentKind::Narration, "He said"),
                Segment::new(SegmentKind::Narration, "hello there"),
            ]
        );
    }

    #[test]
    fn whitespace_only_segments_are_dropped() {
        let parts = split_narration_dialogue(r#"  "   "  "Hi."  "#);
        assert_eq!(parts, vec![Segment::new(SegmentKind::Dialogue, "Hi.")]);
        assert!(split_narration_dialogue("   ").is_empty());
    }

    #[test]
    fn balanced_lines_reconstruct_their_content() {
        let lines = [
            r#"Meg said, "Let's go.""#,
            r#""I don't know," he whispered."#,
            r#"A "b" c "d e" f"#,
            "No quotes at all, just words.",
            r#""""#,
        ];
        for line in lines {
            let joined: String = split_narration_dialogue(line)
                .iter()
                .map(|s| s.text.as_str())
                .collect();
            assert_eq!(non_whitespace(&joined), non_whitespace(line), "{line}");
        }
    }

    #[test]
    fn clean_text_folds_curly_quotes() {
        assert_eq!(
            clean_text("\u{201c}Hi,\u{201d} she said \u{2014} caf\u{e9}"),
            "\"Hi,\" she said  caf"
        );
        assert!(matches!(clean_text("plain"), Cow::Borrowed(_)));
    }
}
