use super::model::Chunk;
use regex::Regex;
use std::sync::OnceLock;

/// Byte range into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    hard: bool,
}

impl Span {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

fn sentence_boundary() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[.!?]\s+").expect("valid regex"))
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\S+").expect("valid regex"))
}

/// Split text into an ordered sequence of chunks no longer than
/// `max_chunk_bytes`.
///
/// Sentences (terminated by `.`, `!` or `?` followed by whitespace) are the
/// packing unit. A sentence longer than `max_unit_bytes` is re-split on word
/// boundaries, and a single word longer than that is cut at the nearest UTF-8
/// boundary below the limit; chunks holding such a piece are flagged with
/// `hard_split`. The unit ceiling never exceeds the chunk ceiling.
///
/// Each chunk's text is a verbatim slice of the input, so the whitespace
/// between sentences packed together is kept and the whitespace between
/// chunks is dropped. Output is deterministic for a given input and limits.
pub fn segment(text: &str, max_chunk_bytes: usize, max_unit_bytes: usize) -> Vec<Chunk> {
    let chunk_limit = max_chunk_bytes.max(1);
    let unit_limit = max_unit_bytes.max(1).min(chunk_limit);

    let units = units(text, unit_limit);
    pack(text, &units, chunk_limit)
}

fn units(text: &str, unit_limit: usize) -> Vec<Span> {
    let mut units = Vec::new();
    for sentence in sentences(text) {
        if sentence.len() <= unit_limit {
            units.push(sentence);
        } else {
            split_words(text, sentence, unit_limit, &mut units);
        }
    }
    units
}

fn sentences(text: &str) -> Vec<Span> {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    if start >= end {
        return Vec::new();
    }

    let body = &text[start..end];
    let mut spans = Vec::new();
    let mut last = 0;
    for mat in sentence_boundary().find_iter(body) {
        // Punctuation is a single ASCII byte; the whitespace run is the delimiter
        spans.push(Span {
            start: start + last,
            end: start + mat.start() + 1,
            hard: false,
        });
        last = mat.end();
    }
    if last < body.len() {
        spans.push(Span {
            start: start + last,
            end,
            hard: false,
        });
    }
    spans
}

fn split_words(text: &str, sentence: Span, limit: usize, out: &mut Vec<Span>) {
    let mut current: Option<Span> = None;

    for mat in word_pattern().find_iter(&text[sentence.start..sentence.end]) {
        let word = Span {
            start: sentence.start + mat.start(),
            end: sentence.start + mat.end(),
            hard: false,
        };

        if word.len() > limit {
            out.extend(current.take());
            hard_split(text, word, limit, out);
            continue;
        }

        match current.as_mut() {
            Some(span) if word.end - span.start <= limit => span.end = word.end,
            _ => {
                out.extend(current.take());
                current = Some(word);
            }
        }
    }
    out.extend(current);
}

fn hard_split(text: &str, word: Span, limit: usize, out: &mut Vec<Span>) {
    tracing::debug!(
        word_bytes = word.len(),
        limit = limit,
        "Word exceeds unit limit, cutting at byte boundary"
    );

    let mut pos = word.start;
    while pos < word.end {
        let mut cut = (pos + limit).min(word.end);
        while cut > pos && !text.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == pos {
            // A single character is wider than the limit; emit it whole
            cut = pos + 1;
            while !text.is_char_boundary(cut) {
                cut += 1;
            }
        }
        out.push(Span {
            start: pos,
            end: cut,
            hard: true,
        });
        pos = cut;
    }
}

fn pack(text: &str, units: &[Span], limit: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Option<Span> = None;

    for unit in units {
        match current.as_mut() {
            Some(span) if unit.end - span.start <= limit => {
                span.end = unit.end;
                span.hard |= unit.hard;
            }
            _ => {
                if let Some(span) = current.take() {
                    push_chunk(text, span, &mut chunks);
                }
                current = Some(*unit);
            }
        }
    }
    if let Some(span) = current {
        push_chunk(text, span, &mut chunks);
    }
    chunks
}

fn push_chunk(text: &str, span: Span, chunks: &mut Vec<Chunk>) {
    chunks.push(Chunk {
        index: chunks.len(),
        text: text[span.start..span.end].to_string(),
        hard_split: span.hard,
    });
}
