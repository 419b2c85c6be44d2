//! Fixed-size sliding-window chunking.

/// Window length in characters.
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared by consecutive windows.
pub const CHUNK_OVERLAP: usize = 150;

/// One window of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    /// Position among the kept windows, from 0
    pub index: usize,
    /// Offset of the first character in the source text
    pub start_char: usize,
    pub text: String,
}

/// Split `text` into windows of `chunk_size` characters, each starting
/// `chunk_size - overlap` characters after the previous one.
///
/// Sizes count `char`s, so multi-byte text is never split inside a code
/// point. Windows that are blank after trimming are skipped; the final
/// window ends at the end of the text.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextWindow> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();

        if !window.trim().is_empty() {
            windows.push(TextWindow {
                index: windows.len(),
                start_char: start,
                text: window,
            });
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked {} chars into {} windows (size: {}, overlap: {})",
        chars.len(),
        windows.len(),
        chunk_size,
        overlap
    );

    windows
}
