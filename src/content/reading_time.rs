//! Reading-time estimation over a post's sections

use super::post::Section;
use super::richtext::as_text;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Flattened text of a post, bodies first and then headings
///
/// Sections keep their original order within each half.
pub fn flatten(sections: &[Section]) -> Vec<String> {
    let mut parts: Vec<String> = sections.iter().map(|s| as_text(&s.body)).collect();
    parts.extend(sections.iter().map(|s| s.heading.clone()));
    parts
}

/// Number of tokens after splitting every part on each separator char
///
/// Consecutive separators yield empty tokens, which are counted; an empty
/// part counts as one token.
pub fn count_words(parts: &[String]) -> usize {
    parts.iter().map(|part| part.split(is_separator).count()).sum()
}

/// The ECMAScript `\s` class: Unicode whitespace plus U+FEFF, without U+0085
fn is_separator(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

/// Minutes needed for a given number of words, rounded up
pub fn minutes_for(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Estimated minutes to read the given sections
pub fn estimate_minutes(sections: &[Section]) -> u32 {
    minutes_for(count_words(&flatten(sections)))
}
