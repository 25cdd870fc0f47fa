//! Finds the "name" label on a page among grouped text lines.
use std::sync::OnceLock;

use namefill_ocr::BoundingBox;
use regex::Regex;
use tracing::{debug, trace};

use crate::line_grouper::Line;

static LABEL_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Label alternatives, longest first so "full name" wins over "name".
fn label_pattern() -> &'static Regex {
    LABEL_PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(?:^|[^a-z0-9])(?P<label>full name|first name|last name|given name|family name|surname|name)(?P<sep>[:\-_\s]*)(?:[^a-z0-9]|$)",
        )
        .expect("label pattern is a valid regex")
    })
}

/// A label found on one line, in pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMatch {
    pub bbox: BoundingBox,
    /// Mean OCR confidence of the words folded into `bbox`, `0` if none.
    pub confidence: f32,
    pub label_text: String,
    /// Position of the matched line in the slice handed to [`find_label`].
    pub line_index: usize,
}

/// Matches the label pattern against one line.
///
/// Starting at the word where the label begins, up to `max_words` consecutive
/// words are folded into the label box; a word containing a colon ends the
/// label after being included.
pub fn match_line(line: &Line, line_index: usize, max_words: usize) -> Option<LabelMatch> {
    let caps = label_pattern().captures(&line.joined_text)?;
    let label = caps.name("label")?;
    let start = line.word_index_at(label.start())?;

    let mut bbox: Option<BoundingBox> = None;
    let mut confidences = Vec::new();
    for word in line.words.iter().skip(start).take(max_words) {
        bbox = Some(match bbox {
            Some(b) => b.union(&word.bbox),
            None => word.bbox,
        });
        confidences.push(word.confidence);
        if word.text.contains(':') {
            break;
        }
    }

    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f32>() / confidences.len() as f32
    };

    Some(LabelMatch {
        bbox: bbox?,
        confidence,
        label_text: label.as_str().to_string(),
        line_index,
    })
}

/// Scans lines top to bottom. The first match above `threshold` wins at once;
/// otherwise the last match seen is returned, however weak.
pub fn find_label(lines: &[Line], threshold: f32, max_words: usize) -> Option<LabelMatch> {
    let mut best = None;
    for (idx, line) in lines.iter().enumerate() {
        let Some(found) = match_line(line, idx, max_words) else {
            continue;
        };
        trace!(line = line.key, confidence = found.confidence, "label candidate");
        if found.confidence > threshold {
            debug!(label = %found.label_text, confidence = found.confidence, "label accepted");
            return Some(found);
        }
        best = Some(found);
    }
    if let Some(found) = &best {
        debug!(
            label = %found.label_text,
            confidence = found.confidence,
            "no label above threshold, keeping weakest-policy match"
        );
    }
    best
}
