//! Classification of grammar symbols.
//!
//! A symbol is a short string. It is a non-terminal when it starts with `$`
//! and is longer than one byte; anything else is a terminal, matched
//! literally against tokens. A leading `?` marks a symbol as optional.
//! Classification looks only at the first byte and the length; no unicode
//! normalization is performed.

/// Marks a non-terminal, e.g. `$Expr`.
pub const NONTERMINAL_MARK: char = '$';

/// Marks an optional right-hand-side symbol, e.g. `?$Preamble`.
pub const OPTIONAL_MARK: char = '?';

/// Prefix of categories synthesized for lifted terminals, e.g. `$@plus`.
pub const LIFTED_PREFIX: &str = "$@";

/// Separator used inside synthesized category names (`$@to`, `$A_$B`).
pub const BINARIZATION_SEP: char = '_';

pub fn is_nonterminal(s: &str) -> bool {
  s.len() > 1 && s.starts_with(NONTERMINAL_MARK)
}

pub fn is_terminal(s: &str) -> bool {
  !is_nonterminal(s)
}

pub fn is_optional(s: &str) -> bool {
  s.len() > 1 && s.starts_with(OPTIONAL_MARK)
}

/// Recovers the base symbol from an optional one. Idempotent.
pub fn strip_optional(s: &str) -> &str {
  if is_optional(s) {
    &s[OPTIONAL_MARK.len_utf8()..]
  } else {
    s
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_nonterminals() {
    assert!(is_nonterminal("$Expr"));
    assert!(is_nonterminal("$@plus"));
    assert!(!is_nonterminal("plus"));
    assert!(!is_nonterminal("$")); // too short
    assert!(!is_nonterminal("?$Expr")); // optional marker comes first
  }

  #[test]
  fn everything_else_is_terminal() {
    assert!(is_terminal("plus"));
    assert!(is_terminal("$"));
    assert!(is_terminal("?"));
    assert!(is_terminal(""));
    assert!(!is_terminal("$Expr"));
  }

  #[test]
  fn classifies_optionals() {
    assert!(is_optional("?$Preamble"));
    assert!(is_optional("?please"));
    assert!(!is_optional("?"));
    assert!(!is_optional("$Expr"));
  }

  #[test]
  fn strip_optional_is_idempotent() {
    assert_eq!(strip_optional("?$Preamble"), "$Preamble");
    assert_eq!(strip_optional("$Preamble"), "$Preamble");
    assert_eq!(strip_optional(strip_optional("?x")), strip_optional("?x"));
    assert_eq!(strip_optional("?"), "?");
  }
}
