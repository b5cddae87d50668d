use std::collections::HashMap;

use crate::derivation::Derivation;

/// A sparse feature vector: feature name to value, absent means zero.
pub type FeatureMap = HashMap<String, f64>;

/// Maps a derivation tree to a sparse feature vector. Implementations must
/// be pure and deterministic.
pub trait Featurizer {
  fn featurize(&self, derivation: &Derivation) -> FeatureMap;
}

/// Counts how often each rule tag occurs in the tree.
pub struct ParseCounts;

impl Featurizer for ParseCounts {
  fn featurize(&self, derivation: &Derivation) -> FeatureMap {
    fn walk(d: &Derivation, features: &mut FeatureMap) {
      *features.entry(d.tag.clone()).or_insert(0.0) += 1.0;
      for child in d.children.iter() {
        walk(child, features);
      }
    }

    let mut features = FeatureMap::new();
    walk(derivation, &mut features);
    features
  }
}

/// Counts (ancestor tag, node tag) pairs along every root-to-node path.
/// The ancestor set is forked at each descent; siblings never share it.
pub struct ParsePrecedence;

impl Featurizer for ParsePrecedence {
  fn featurize(&self, derivation: &Derivation) -> FeatureMap {
    fn walk(d: &Derivation, ancestors: &[String], features: &mut FeatureMap) {
      for ancestor in ancestors.iter() {
        *features
          .entry(format!("{}>{}", ancestor, d.tag))
          .or_insert(0.0) += 1.0;
      }
      let mut forked = ancestors.to_vec();
      if !forked.contains(&d.tag) {
        forked.push(d.tag.clone());
      }
      for child in d.children.iter() {
        walk(child, &forked, features);
      }
    }

    let mut features = FeatureMap::new();
    walk(derivation, &[], &mut features);
    features
  }
}

/// Minimum depth at which each tag appears; the root is at depth 0.
pub struct ParseDepths;

impl Featurizer for ParseDepths {
  fn featurize(&self, derivation: &Derivation) -> FeatureMap {
    fn walk(d: &Derivation, depth: f64, features: &mut FeatureMap) {
      let entry = features.entry(d.tag.clone()).or_insert(depth);
      if depth < *entry {
        *entry = depth;
      }
      for child in d.children.iter() {
        walk(child, depth + 1.0, features);
      }
    }

    let mut features = FeatureMap::new();
    walk(derivation, 0.0, &mut features);
    features
  }
}

/// Maximum span length, in characters, across all nodes with each tag.
pub struct ParseLengths;

impl Featurizer for ParseLengths {
  fn featurize(&self, derivation: &Derivation) -> FeatureMap {
    fn walk(d: &Derivation, features: &mut FeatureMap) {
      let len = d.span.chars().count() as f64;
      let entry = features.entry(d.tag.clone()).or_insert(len);
      if len > *entry {
        *entry = len;
      }
      for child in d.children.iter() {
        walk(child, features);
      }
    }

    let mut features = FeatureMap::new();
    walk(derivation, &mut features);
    features
  }
}

/// Runs each sub-featurizer and namespaces its keys with an `_i` suffix.
/// The suffix keeps keys unique even when sub-featurizers share names.
pub struct Concat(pub Vec<Box<dyn Featurizer>>);

impl Featurizer for Concat {
  fn featurize(&self, derivation: &Derivation) -> FeatureMap {
    let mut features = FeatureMap::new();
    for (idx, featurizer) in self.0.iter().enumerate() {
      for (name, value) in featurizer.featurize(derivation) {
        features.insert(format!("{}_{}", name, idx), value);
      }
    }
    features
  }
}

/// All four featurizers concatenated.
pub fn standard() -> Concat {
  Concat(vec![
    Box::new(ParseCounts),
    Box::new(ParsePrecedence),
    Box::new(ParseDepths),
    Box::new(ParseLengths),
  ])
}
