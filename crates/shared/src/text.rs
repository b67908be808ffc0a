//! Helpers for fitting text into the platform's per-message length limit.

pub const MAX_MESSAGE_LEN: usize = 2000;
pub const DEFAULT_MESSAGE_LEN: usize = 1900;

/// Splits `text` into chunks of at most `part_len` characters.
pub fn split_to_parts(text: &str, part_len: usize) -> Vec<String> {
    if part_len == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(part_len)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Breaks every entry longer than `max_len` into `max_len`-sized parts.
pub fn trim_messages<I, S>(messages: I, max_len: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if max_len < 1 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for message in messages {
        let message = message.as_ref();
        if message.chars().count() > max_len {
            out.extend(split_to_parts(message, max_len));
        } else {
            out.push(message.to_string());
        }
    }
    out
}

/// Joins entries line by line into as few messages as possible, each at most `max_len`
/// characters. Returns nothing when a single entry already exceeds the limit.
pub fn merge_messages<I, S>(messages: I, max_len: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if max_len < 1 {
        return Vec::new();
    }

    let mut merged = Vec::new();
    let mut current = String::new();
    for message in messages {
        let message = message.as_ref();
        if message.chars().count() > max_len {
            return Vec::new();
        }
        if !current.is_empty() && !current.ends_with('\n') {
            current.push('\n');
        }
        let candidate = format!("{current}{message}");
        if candidate.chars().count() > max_len {
            merged.push(current.trim_end().to_string());
            current = message.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        merged.push(current.trim_end().to_string());
    }
    merged
}

/// Prepares a list of lines for sending: limit clamped to `2..=MAX_MESSAGE_LEN`, long lines
/// split, then lines merged. One character of the limit is reserved for the joining newline.
pub fn pack_messages<I, S>(messages: I, max_len: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max_len = max_len.clamp(2, MAX_MESSAGE_LEN);
    let trimmed = trim_messages(messages, max_len - 1);
    merge_messages(trimmed, max_len - 1)
}
