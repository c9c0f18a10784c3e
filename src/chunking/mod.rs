//! Splitting scripts into speech-API-safe chunks.
//!
//! The speech provider enforces a per-call input ceiling, so long scripts are
//! split into an ordered sequence of chunks before synthesis. Chunk boundaries
//! fall on paragraph breaks so narration never cuts mid-sentence.

/// Paragraph delimiter used by the script stages and the chunker.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split `text` into ordered chunks, each below `max_len` characters.
///
/// Paragraphs are accumulated greedily; the current chunk closes when adding
/// the next paragraph (plus its separator) would meet or exceed `max_len`.
/// Joining the returned chunks with [`PARAGRAPH_SEPARATOR`] reproduces the
/// input exactly. A single paragraph longer than `max_len` is emitted as its
/// own oversize chunk rather than split mid-paragraph.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for paragraph in text.split(PARAGRAPH_SEPARATOR) {
        let added = if current.is_empty() {
            paragraph.len()
        } else {
            PARAGRAPH_SEPARATOR.len() + paragraph.len()
        };

        if !current.is_empty() && current_len + added >= max_len {
            chunks.push(current.join(PARAGRAPH_SEPARATOR));
            current = vec![paragraph];
            current_len = paragraph.len();
        } else {
            current.push(paragraph);
            current_len += added;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(PARAGRAPH_SEPARATOR));
    }

    chunks
}
