//! Tokenizer: text → integer token IDs
//!
//! - **BpeTokenizer**: the real tiktoken BPE ranks for a named encoding
//! - **HashingTokenizer**: regex pre-tokenizer with hashed piece IDs. One
//!   ID per pre-token piece, so words BPE would split count once. Only
//!   used when explicitly selected.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use tiktoken_rs::CoreBPE;

use crate::types::{TokenizerKind, ZenomeError, ZenomeResult};

lazy_static! {
    // Contractions, letter runs with one optional leading non-letter,
    // digit groups of up to three, punctuation runs, newlines, whitespace.
    static ref RE_PRETOKENIZE: Regex = Regex::new(
        r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+"
    ).unwrap();
}

/// Turns text into integer token IDs
pub trait Tokenizer: Send + Sync {
    /// Name of the encoding, e.g. `cl100k_base`
    fn encoding_name(&self) -> &str;

    /// Encode text into token IDs
    fn tokenize(&self, text: &str) -> ZenomeResult<Vec<u32>>;
}

/// Vocabulary size for a known encoding name
pub fn vocab_size(encoding: &str) -> Option<u32> {
    match encoding {
        "cl100k_base" => Some(100_256),
        "o200k_base" => Some(200_019),
        "p50k_base" | "p50k_edit" => Some(50_281),
        "r50k_base" | "gpt2" => Some(50_257),
        _ => None,
    }
}

/// Build the tokenizer selected in config
pub fn build_tokenizer(kind: TokenizerKind, encoding: &str) -> ZenomeResult<Arc<dyn Tokenizer>> {
    Ok(match kind {
        TokenizerKind::Bpe => Arc::new(BpeTokenizer::new(encoding)?),
        TokenizerKind::Hashing => Arc::new(HashingTokenizer::new(encoding)?),
    })
}

/// tiktoken byte-pair encoder
#[derive(Clone)]
pub struct BpeTokenizer {
    encoding: String,
    bpe: Arc<CoreBPE>,
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer").field("encoding", &self.encoding).finish()
    }
}

impl BpeTokenizer {
    /// Load the ranks for `encoding`. They ship inside `tiktoken-rs`, so no
    /// network access is needed.
    pub fn new(encoding: &str) -> ZenomeResult<Self> {
        let loaded = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
            _ => {
                return Err(ZenomeError::Tokenizer(format!("unknown encoding: {}", encoding)));
            }
        };
        let bpe = loaded
            .map_err(|e| ZenomeError::Tokenizer(format!("failed to load {}: {}", encoding, e)))?;
        Ok(Self {
            encoding: encoding.to_string(),
            bpe: Arc::new(bpe),
        })
    }
}

impl Tokenizer for BpeTokenizer {
    fn encoding_name(&self) -> &str {
        &self.encoding
    }

    // Special-token text is encoded as ordinary bytes
    fn tokenize(&self, text: &str) -> ZenomeResult<Vec<u32>> {
        Ok(self.bpe.encode_ordinary(text).into_iter().map(|id| id as u32).collect())
    }
}

/// Regex pre-tokenizer with SHA-256 piece → ID mapping
#[derive(Debug, Clone)]
pub struct HashingTokenizer {
    encoding: String,
    vocab: u32,
}

impl HashingTokenizer {
    /// Create a tokenizer for a known encoding
    pub fn new(encoding: &str) -> ZenomeResult<Self> {
        let vocab = vocab_size(encoding)
            .ok_or_else(|| ZenomeError::Tokenizer(format!("unknown encoding: {}", encoding)))?;
        Ok(Self {
            encoding: encoding.to_string(),
            vocab,
        })
    }

    /// Split text into pre-token pieces
    pub fn pieces<'a>(&self, text: &'a str) -> Vec<&'a str> {
        RE_PRETOKENIZE.find_iter(text).map(|m| m.as_str()).collect()
    }

    fn piece_id(&self, piece: &str) -> u32 {
        let mut hasher = Sha256::new();
        hasher.update(self.encoding.as_bytes());
        hasher.update([0u8]);
        hasher.update(piece.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[0..8]);
        (u64::from_le_bytes(head) % self.vocab as u64) as u32
    }
}

impl Tokenizer for HashingTokenizer {
    fn encoding_name(&self) -> &str {
        &self.encoding
    }

    fn tokenize(&self, text: &str) -> ZenomeResult<Vec<u32>> {
        Ok(self.pieces(text).into_iter().map(|p| self.piece_id(p)).collect())
    }
}
