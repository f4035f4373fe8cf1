//! Summary text: emphasis markup and the progressive reveal.

use std::time::{Duration, Instant};

use crate::models::ChunkSummary;

/// Shown in place of the summary when generation fails
pub const GENERATION_FAILED: &str = "Error generating summary";

/// A run of summary text, bold or plain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
}

impl Segment {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// Chunk summaries joined into one paragraph
pub fn join_chunks(chunks: &[ChunkSummary]) -> String {
    chunks
        .iter()
        .map(|c| c.summary.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split `**bold**` markup into segments.
///
/// Bold runs get a space on each side, then all whitespace is collapsed to
/// single spaces and the ends are trimmed. An unmatched `**` is kept as
/// literal text.
pub fn emphasize(text: &str) -> Vec<Segment> {
    let mut raw = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        raw.push(Segment::plain(format!("{} ", &rest[..open])));
        raw.push(Segment::bold(&after_open[..close]));
        raw.push(Segment::plain(" "));
        rest = &after_open[close + 2..];
    }
    raw.push(Segment::plain(rest));
    normalize(raw)
}

/// Collapse whitespace across segment boundaries and drop empty segments.
fn normalize(raw: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut pending_space = false;
    let mut at_start = true;

    for seg in raw {
        let mut text = String::new();
        for ch in seg.text.chars() {
            if ch.is_whitespace() {
                pending_space = true;
                continue;
            }
            if pending_space && !at_start {
                // The space belongs to whichever segment the next word is in,
                // unless that is a bold run: spaces stay plain.
                if seg.bold && text.is_empty() {
                    push_text(&mut out, " ", false);
                } else {
                    text.push(' ');
                }
            }
            pending_space = false;
            at_start = false;
            text.push(ch);
        }
        if !text.is_empty() {
            push_text(&mut out, &text, seg.bold);
        }
    }
    out
}

fn push_text(out: &mut Vec<Segment>, text: &str, bold: bool) {
    match out.last_mut() {
        Some(last) if last.bold == bold => last.text.push_str(text),
        _ => out.push(Segment {
            text: text.to_string(),
            bold,
        }),
    }
}

/// Total character count of a segment list
pub fn char_len(segments: &[Segment]) -> usize {
    segments.iter().map(|s| s.text.chars().count()).sum()
}

/// Typewriter-style reveal of a summary
#[derive(Debug, Clone)]
pub struct TextReveal {
    segments: Vec<Segment>,
    total: usize,
    shown: usize,
    interval: Duration,
    last_step: Instant,
}

impl TextReveal {
    pub fn new(segments: Vec<Segment>, interval: Duration) -> Self {
        let total = char_len(&segments);
        Self {
            segments,
            total,
            shown: 0,
            interval,
            last_step: Instant::now(),
        }
    }

    /// Whole text at once, used for error messages
    pub fn immediate(text: &str) -> Self {
        let mut reveal = Self::new(vec![Segment::plain(text)], Duration::ZERO);
        reveal.skip();
        reveal
    }

    /// Advance according to the time elapsed since the last step.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if self.is_done() {
            return;
        }
        if self.interval.is_zero() {
            self.skip();
            return;
        }
        let elapsed = now.saturating_duration_since(self.last_step);
        let steps = (elapsed.as_millis() / self.interval.as_millis().max(1)) as usize;
        if steps > 0 {
            self.shown = (self.shown + steps).min(self.total);
            self.last_step += self.interval * steps as u32;
        }
    }

    pub fn skip(&mut self) {
        self.shown = self.total;
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.total
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// The revealed prefix, cut on a character boundary
    pub fn visible(&self) -> Vec<Segment> {
        let mut remaining = self.shown;
        let mut out = Vec::new();
        for seg in &self.segments {
            if remaining == 0 {
                break;
            }
            let count = seg.text.chars().count();
            if count <= remaining {
                out.push(seg.clone());
                remaining -= count;
            } else {
                out.push(Segment {
                    text: seg.text.chars().take(remaining).collect(),
                    bold: seg.bold,
                });
                remaining = 0;
            }
        }
        out
    }

    pub fn full_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}
