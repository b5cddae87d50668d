use thiserror::Error;

/// Everything that can go wrong inside the engine.
///
/// Construction errors (`InvalidSymbol`, `InvalidRule`, `InvalidGrammar`) are
/// fatal to the object being built; parse-time errors are fatal to the single
/// call. The engine never retries.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid symbol `{symbol}`: expected {expected}")]
  InvalidSymbol { symbol: String, expected: &'static str },

  #[error("invalid rule `{tag}`: {reason}")]
  InvalidRule { tag: String, reason: String },

  #[error("rule `{tag}` could not be normalized: {reason}")]
  InvalidGrammar { tag: String, reason: String },

  #[error("tokenization failed: {0}")]
  Tokenization(String),

  #[error("fit given {utterances} utterances but {denotations} denotations")]
  LengthMismatch { utterances: usize, denotations: usize },

  /// Raised by a user-supplied semantics function when a denotation is
  /// computed. Never caught during parsing.
  #[error("evaluation failed: {0}")]
  Evaluation(String),
}
