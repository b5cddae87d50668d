//! Accuracy metrics for rankers over labeled datasets.

use crate::error::Error;
use crate::ranker::Ranker;
use crate::value::Value;

fn check_lengths(utterances: usize, denotations: usize) -> Result<(), Error> {
  if utterances != denotations {
    Err(Error::LengthMismatch {
      utterances,
      denotations,
    })
  } else {
    Ok(())
  }
}

/// Fraction of samples whose top-ranked denotation equals the label.
/// An empty dataset scores 0.
pub fn denotation_accuracy<R>(
  ranker: &R,
  utterances: &[&str],
  denotations: &[Value],
) -> Result<f64, Error>
where
  R: Ranker + ?Sized,
{
  check_lengths(utterances.len(), denotations.len())?;
  if utterances.is_empty() {
    return Ok(0.0);
  }

  let mut hits = 0;
  for (utterance, label) in utterances.iter().zip(denotations.iter()) {
    if ranker.top_denotation(utterance)?.as_ref() == Some(label) {
      hits += 1;
    }
  }
  Ok(hits as f64 / utterances.len() as f64)
}

/// Fraction of samples for which *any* parse denotes the label, regardless
/// of rank: the ceiling a ranker can reach on the dataset.
pub fn oracle_accuracy<R>(
  ranker: &R,
  utterances: &[&str],
  denotations: &[Value],
) -> Result<f64, Error>
where
  R: Ranker + ?Sized,
{
  check_lengths(utterances.len(), denotations.len())?;
  if utterances.is_empty() {
    return Ok(0.0);
  }

  let mut hits = 0;
  for (utterance, label) in utterances.iter().zip(denotations.iter()) {
    let reachable = ranker
      .scores_and_denotations(utterance)?
      .iter()
      .any(|(_, denotation)| denotation == label);
    if reachable {
      hits += 1;
    }
  }
  Ok(hits as f64 / utterances.len() as f64)
}
