use tiktoken_rs::CoreBPE;

use crate::error::ReportError;

/// Token encoding used only to size text chunks.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Raw bytes of `tokens`. A slice of an encoding may start or end in the
    /// middle of a UTF-8 sequence, so the result is not necessarily valid text.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Tokenizer`] if a token is not part of the vocabulary.
    fn decode_bytes(&self, tokens: &[u32]) -> Result<Vec<u8>, ReportError>;
}

/// Ranks present in the `cl100k_base` table plus its special tokens.
fn is_cl100k_token(token: u32) -> bool {
    token < 100_256 || matches!(token, 100_257..=100_260 | 100_276)
}

/// The `cl100k_base` byte-pair encoding.
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    /// # Errors
    ///
    /// Returns [`ReportError::Tokenizer`] if the encoding tables fail to load.
    pub fn new() -> Result<Self, ReportError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| ReportError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl std::fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cl100kTokenizer")
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_with_special_tokens(text)
    }

    // tiktoken-rs only exposes byte-level decoding through this method.
    #[allow(clippy::used_underscore_items)]
    fn decode_bytes(&self, tokens: &[u32]) -> Result<Vec<u8>, ReportError> {
        if let Some(token) = tokens.iter().find(|t| !is_cl100k_token(**t)) {
            return Err(ReportError::Tokenizer(format!("unknown token {token}")));
        }
        Ok(self
            .bpe
            ._decode_native_and_split(tokens.to_vec())
            .flatten()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cl100k_round_trips_ascii_text() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = "Battery lasts about thirty hours on a single charge.";
        let tokens = tokenizer.encode(text);
        assert!(!tokens.is_empty());
        assert!(tokens.len() < text.len());
        assert_eq!(tokenizer.decode_bytes(&tokens).unwrap(), text.as_bytes());
    }

    #[test]
    fn single_tokens_may_hold_partial_characters() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = "音质 🎧";
        let tokens = tokenizer.encode(text);
        let bytes: Vec<u8> = tokens
            .iter()
            .flat_map(|t| tokenizer.decode_bytes(&[*t]).unwrap())
            .collect();
        assert_eq!(bytes, text.as_bytes());
    }

    #[test]
    fn out_of_vocabulary_token_is_rejected() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        assert!(matches!(
            tokenizer.decode_bytes(&[100_265]),
            Err(ReportError::Tokenizer(_))
        ));
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        assert!(tokenizer.encode("").is_empty());
    }
}
