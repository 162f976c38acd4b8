/// Longest boundary overlap considered, in bytes. The guard region is a few
/// hundred milliseconds of audio, so duplicated text stays short.
const OVERLAP_SEARCH_BYTES: usize = 64;
const MIN_OVERLAP_BYTES: usize = 4;

/// Reassembles chunk texts into one transcript. Runs exactly once per job,
/// only after every chunk is terminal and none failed.
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// `texts` must already be ordered by chunk index.
    pub fn assemble(&self, texts: &[&str]) -> String {
        let mut transcript = String::new();
        for text in texts {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            if transcript.is_empty() {
                transcript.push_str(text);
                continue;
            }
            let skip = boundary_overlap(&transcript, text);
            let rest = text[skip..].trim_start();
            if rest.is_empty() {
                continue;
            }
            transcript.push(' ');
            transcript.push_str(rest);
        }
        transcript
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Length of the longest word-aligned prefix of `next` that is an exact
/// suffix of `prev`, i.e. the text duplicated by the boundary guard.
/// Returns 0 when no overlap is detected; the caller joins with a space.
fn boundary_overlap(prev: &str, next: &str) -> usize {
    let prev = prev.trim_end();
    let limit = OVERLAP_SEARCH_BYTES.min(next.len());

    let mut candidates: Vec<usize> = next
        .char_indices()
        .filter(|(i, ch)| *i > 0 && *i <= limit && ch.is_whitespace())
        .map(|(i, _)| i)
        .collect();
    if next.len() <= limit {
        candidates.push(next.len());
    }

    for end in candidates.into_iter().rev() {
        let prefix = next[..end].trim_end();
        if prefix.len() >= MIN_OVERLAP_BYTES && prev.ends_with(prefix) {
            return end;
        }
    }
    0
}
