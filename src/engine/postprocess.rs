//! Post-processing of raw engine output.
//!
//! Filters word candidates against the confidence threshold, maps boxes
//! back from the upscaled engine image to region coordinates, reconstructs
//! line structure from word positions, and aggregates confidences.

use crate::core::traits::EngineOutput;
use crate::models::recognition::{BBox, Word};
use std::collections::BTreeMap;

/// Floor for the line-clustering bucket height, in pixels.
const MIN_LINE_BUCKET: u32 = 5;
/// Bucket height as a fraction of the median word height.
const LINE_BUCKET_FACTOR: f64 = 0.7;

/// Filtered and aggregated engine output.
#[derive(Debug, Clone, Default)]
pub struct RefinedOutput {
    pub text: String,
    pub confidence: f64,
    pub words: Vec<Word>,
    pub min_word_confidence: f64,
    pub max_word_confidence: f64,
}

/// Refines raw engine output.
///
/// Words below `min_confidence` are dropped. `scale` is the upscaling factor
/// the engine image was prepared with; boxes are divided back so downstream
/// consumers see region coordinates.
pub fn refine(output: &EngineOutput, min_confidence: f64, scale: f64) -> RefinedOutput {
    let mut words: Vec<Word> = Vec::new();
    let mut confidences: Vec<f64> = Vec::new();

    for raw in &output.words {
        let text = raw.text.trim();
        if text.is_empty() {
            continue;
        }
        let confidence = if raw.confidence.is_finite() {
            raw.confidence
        } else {
            -1.0
        };
        if confidence < min_confidence {
            continue;
        }
        if confidence >= 0.0 {
            confidences.push(confidence);
        }
        words.push(Word {
            text: text.to_string(),
            confidence,
            bbox: raw.bbox.map(|b| descale(b, scale)),
        });
    }

    let confidence = mean(&confidences);
    RefinedOutput {
        text: reconstruct_lines(&words),
        confidence,
        min_word_confidence: confidences.iter().cloned().fold(f64::INFINITY, f64::min).min(confidence),
        max_word_confidence: confidences.iter().cloned().fold(0.0, f64::max),
        words,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn descale(bbox: BBox, scale: f64) -> BBox {
    if scale <= 1.0 {
        return bbox;
    }
    BBox {
        x: (bbox.x as f64 / scale).round() as u32,
        y: (bbox.y as f64 / scale).round() as u32,
        w: (bbox.w as f64 / scale).round().max(1.0) as u32,
        h: (bbox.h as f64 / scale).round().max(1.0) as u32,
    }
}

/// Rebuilds multi-line text by clustering words into lines.
///
/// Words are bucketed by their top coordinate (bucket height scales with the
/// median word height), then ordered left-to-right within each bucket.
/// Words without boxes are appended in input order on a trailing line.
pub fn reconstruct_lines(words: &[Word]) -> String {
    if words.is_empty() {
        return String::new();
    }

    let mut heights: Vec<u32> = words
        .iter()
        .filter_map(|w| w.bbox.map(|b| b.h))
        .collect();
    if heights.is_empty() {
        return words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
    }
    heights.sort_unstable();
    let median_height = heights[heights.len() / 2];
    let bucket = ((median_height as f64 * LINE_BUCKET_FACTOR) as u32).max(MIN_LINE_BUCKET);

    let mut lines: BTreeMap<u32, Vec<&Word>> = BTreeMap::new();
    let mut boxless: Vec<&Word> = Vec::new();
    for word in words {
        match word.bbox {
            Some(b) => lines.entry(b.y / bucket).or_default().push(word),
            None => boxless.push(word),
        }
    }

    let mut out: Vec<String> = lines
        .into_values()
        .map(|mut line| {
            line.sort_by_key(|w| w.bbox.map(|b| b.x).unwrap_or(0));
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    if !boxless.is_empty() {
        out.push(
            boxless
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    out.join("\n")
}
