use std::fmt;

/// A denotation: the machine-interpretable result of evaluating a
/// derivation's semantics.
///
/// `Null` stands in for omitted optional symbols, `Pair` for the
/// intermediate results of binarized rules. Equality over values is what
/// rankers use to aggregate equivalent denotations.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Int(i64),
  Str(String),
  Pair(Box<Value>, Box<Value>),
  List(Vec<Value>),
}

impl Value {
  pub fn pair(a: Value, b: Value) -> Self {
    Self::Pair(Box::new(a), Box::new(b))
  }

  pub fn is_null(&self) -> bool {
    match self {
      Self::Null => true,
      _ => false,
    }
  }

  pub fn int(&self) -> Option<i64> {
    match self {
      Self::Int(n) => Some(*n),
      _ => None,
    }
  }

  pub fn str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => write!(f, "null"),
      Self::Int(n) => write!(f, "{}", n),
      Self::Str(s) => write!(f, "{}", s),
      Self::Pair(a, b) => write!(f, "({}, {})", a, b),
      Self::List(vs) => {
        write!(f, "[")?;
        for (idx, v) in vs.iter().enumerate() {
          if idx > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", v)?;
        }
        write!(f, "]")
      }
    }
  }
}
