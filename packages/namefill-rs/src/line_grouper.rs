//! Clusters OCR words into horizontal text lines by vertical proximity.
use std::collections::BTreeMap;

use namefill_ocr::Word;
use tracing::debug;

/// Words that share a vertical bucket, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Bucket key: the rounded vertical center, in pixels.
    pub key: i64,
    pub words: Vec<Word>,
    /// Lower-cased, whitespace-collapsed word texts joined by single spaces.
    pub joined_text: String,
    offsets: Vec<usize>,
}

impl Line {
    fn new(key: i64, mut words: Vec<Word>) -> Self {
        words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let mut joined_text = String::new();
        let mut offsets = Vec::with_capacity(words.len());
        for word in &words {
            let text = normalize(&word.text);
            // whitespace-only words keep an offset but add nothing
            if !text.is_empty() && !joined_text.is_empty() {
                joined_text.push(' ');
            }
            offsets.push(joined_text.len());
            joined_text.push_str(&text);
        }

        Self {
            key,
            words,
            joined_text,
            offsets,
        }
    }

    /// Index of the word whose text covers byte `offset` of `joined_text`.
    /// An offset on a separating space resolves to the following word.
    pub fn word_index_at(&self, offset: usize) -> Option<usize> {
        if offset >= self.joined_text.len() {
            return None;
        }
        self.offsets
            .iter()
            .rposition(|&start| start <= offset)
            .map(|idx| {
                let end = self.offsets[idx] + normalize(&self.words[idx].text).len();
                if offset >= end && idx + 1 < self.words.len() {
                    idx + 1
                } else {
                    idx
                }
            })
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Bucket key for a word: its vertical center rounded to the nearest
/// multiple of `tolerance`.
pub fn line_key(word: &Word, tolerance: f32) -> i64 {
    ((word.bbox.center_y() / tolerance).round() * tolerance) as i64
}

/// Groups words into lines, returned top to bottom.
pub fn group_lines(words: &[Word], tolerance: f32) -> Vec<Line> {
    let mut buckets: BTreeMap<i64, Vec<Word>> = BTreeMap::new();
    for word in words {
        buckets
            .entry(line_key(word, tolerance))
            .or_default()
            .push(word.clone());
    }

    let lines: Vec<Line> = buckets
        .into_iter()
        .map(|(key, words)| Line::new(key, words))
        .collect();
    debug!(words = words.len(), lines = lines.len(), "grouped words into lines");
    lines
}
