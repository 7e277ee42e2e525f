//! Phonetic encoders that map words to spelling-tolerant codes.

mod daitch_mokotoff;
mod soundex;

pub use daitch_mokotoff::DaitchMokotoff;
pub use soundex::Soundex;

use deunicode::deunicode;

/// Encodes words into fixed-width phonetic codes.
pub trait PhoneticEncoder: Send + Sync {
    /// Short identifier of the encoder.
    fn name(&self) -> &'static str;

    /// Encode a single word. Returns an empty string when the word has no letters.
    fn encode_word(&self, word: &str) -> String;

    /// Encode every whitespace-separated word independently, joined by a space.
    fn encode(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| self.encode_word(word))
            .filter(|code| !code.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Every code the text can take, primary code first.
    ///
    /// Encoders without ambiguous rules have exactly one code.
    fn codes(&self, text: &str) -> Vec<String> {
        vec![self.encode(text)]
    }
}

/// Transliterate to ASCII and keep only lowercase letters.
pub(crate) fn fold_letters(word: &str) -> Vec<char> {
    deunicode(word)
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
