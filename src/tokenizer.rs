use regex::Regex;

use crate::error::Error;

/// A token: normalized text plus the byte span of its pre-normalized source
/// in the original utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub text: String,
  pub span: (usize, usize),
}

impl Token {
  pub fn new(text: &str, start: usize, end: usize) -> Self {
    Self {
      text: text.to_string(),
      span: (start, end),
    }
  }
}

/// Splits an utterance into tokens. `s[span.0..span.1]` must be the original
/// source of each token; the token text may be normalized.
pub trait Tokenizer {
  fn tokenize(&self, s: &str) -> Result<Vec<Token>, Error>;
}

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// The default tokenizer: drops punctuation, splits on whitespace,
/// lowercases. Spans cover only the kept characters, so the verbatim source
/// of a token never includes the punctuation shed around it.
#[derive(Debug, Default)]
pub struct BasicTokenizer;

impl Tokenizer for BasicTokenizer {
  fn tokenize(&self, s: &str) -> Result<Vec<Token>, Error> {
    regex_static!(WORD, r"[A-Za-z0-9]+");
    Ok(
      WORD
        .find_iter(s)
        .map(|m| Token {
          text: m.as_str().to_lowercase(),
          span: (m.start(), m.end()),
        })
        .collect(),
    )
  }
}
