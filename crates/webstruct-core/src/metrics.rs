//! Evaluation metrics for tagged sequences.
//!
//! Two flavours: span-exact F1 over tag sequences ([`bio_f_score`]) and
//! per-label scores over entity texts ([`per_class_metrics`]), where an
//! entity counts as found when its words appear as a predicted entity of
//! the same label anywhere in the document.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::encoding::{Tag, entity_spans};
use crate::error::{Result, WebstructError};

/// F-score over entity spans, as used by CoNLL.
///
/// A true positive is a span with the same start, end and type in both
/// sequences. Returns 0.0 when there are no true positives.
///
/// ```
/// use webstruct_core::encoding::parse_tags;
/// use webstruct_core::metrics::bio_f_score;
///
/// let y_true = parse_tags(&["B-PER", "I-PER", "O", "B-ORG"]).unwrap();
/// let y_pred = parse_tags(&["B-PER", "I-PER", "O", "O"]).unwrap();
/// let f = bio_f_score(&y_true, &y_pred).unwrap();
/// assert!((f - 2.0 / 3.0).abs() < 1e-9);
/// ```
pub fn bio_f_score(y_true: &[Tag], y_pred: &[Tag]) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(WebstructError::LengthMismatch {
            tokens: y_true.len(),
            tags: y_pred.len(),
        });
    }

    let true_spans: HashSet<_> = entity_spans(y_true)?.into_iter().collect();
    let pred_spans: HashSet<_> = entity_spans(y_pred)?.into_iter().collect();

    let tp = pred_spans.intersection(&true_spans).count();
    if tp == 0 {
        return Ok(0.0);
    }
    let precision = tp as f64 / pred_spans.len() as f64;
    let recall = tp as f64 / true_spans.len() as f64;
    Ok(2.0 * precision * recall / (precision + recall))
}

/// Mean of [`bio_f_score`] over pairs of sequences.
pub fn avg_bio_f1_score(y_true: &[Vec<Tag>], y_pred: &[Vec<Tag>]) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(WebstructError::LengthMismatch {
            tokens: y_true.len(),
            tags: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Ok(0.0);
    }
    let total = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| bio_f_score(t, p))
        .sum::<Result<f64>>()?;
    Ok(total / y_true.len() as f64)
}

/// Entity texts of a document, by label.
///
/// `O` tokens are skipped. A `B-` or `U-` tag starts a new entity; any
/// other entity tag appends its word to the current one, so a gap of `O`
/// tokens does not split an entity. Words are joined with single spaces.
///
/// ```
/// use webstruct_core::encoding::parse_tags;
/// use webstruct_core::metrics::label_entities;
///
/// let tags = parse_tags(&["O", "B-PER", "I-PER", "U-PER", "O"]).unwrap();
/// let entities = label_entities(&["hello", "John", "Doe", "Mary", "said"], &tags).unwrap();
/// let people: Vec<_> = entities["PER"].iter().map(String::as_str).collect();
/// assert_eq!(people, ["John Doe", "Mary"]);
/// ```
pub fn label_entities<S: AsRef<str>>(
    tokens: &[S],
    tags: &[Tag],
) -> Result<BTreeMap<String, BTreeSet<String>>> {
    if tokens.len() != tags.len() {
        return Err(WebstructError::LengthMismatch {
            tokens: tokens.len(),
            tags: tags.len(),
        });
    }

    let mut entities: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut flush = |buffer: &mut Option<(&str, Vec<&str>)>| {
        if let Some((label, words)) = buffer.take() {
            entities
                .entry(label.to_string())
                .or_default()
                .insert(words.join(" "));
        }
    };

    let mut buffer: Option<(&str, Vec<&str>)> = None;
    for (token, tag) in tokens.iter().zip(tags) {
        let Some(label) = tag.entity_type() else {
            continue;
        };
        if tag.starts_span() {
            flush(&mut buffer);
        }
        buffer
            .get_or_insert_with(|| (label, Vec::new()))
            .1
            .push(token.as_ref());
    }
    flush(&mut buffer);
    Ok(entities)
}

/// Scores of one label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassScores {
    /// Share of true entities that were predicted.
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

fn class_scores(
    true_entities: &BTreeMap<String, BTreeSet<String>>,
    pred_entities: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, ClassScores> {
    let mut scores = BTreeMap::new();
    for (label, expected) in true_entities {
        let Some(predicted) = pred_entities.get(label) else {
            scores.insert(label.clone(), ClassScores::default());
            continue;
        };
        let tp = expected.intersection(predicted).count() as f64;
        let fp = predicted.len() as f64 - tp;
        let fn_ = expected.len() as f64 - tp;

        let ratio = |num: f64, den: f64| if den > 0.0 { num / den } else { 0.0 };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        scores.insert(
            label.clone(),
            ClassScores {
                accuracy: ratio(tp, expected.len() as f64),
                precision,
                recall,
                f1: ratio(2.0 * precision * recall, precision + recall),
            },
        );
    }
    // labels that were only predicted score zero
    for label in pred_entities.keys() {
        scores.entry(label.clone()).or_default();
    }
    scores
}

/// Per-label scores of one document.
///
/// True and predicted documents may be tokenized differently; entities are
/// compared by their text.
pub fn metrics_single<S: AsRef<str>, P: AsRef<str>>(
    tokens_true: &[S],
    tags_true: &[Tag],
    tokens_pred: &[P],
    tags_pred: &[Tag],
) -> Result<BTreeMap<String, ClassScores>> {
    let true_entities = label_entities(tokens_true, tags_true)?;
    let pred_entities = label_entities(tokens_pred, tags_pred)?;
    Ok(class_scores(&true_entities, &pred_entities))
}

/// Per-label scores averaged over documents.
///
/// Each label is averaged over the documents where it occurs (in the true
/// or the predicted tags); documents without the label do not count.
pub fn per_class_metrics<S: AsRef<str>, P: AsRef<str>>(
    x_true: &[Vec<S>],
    y_true: &[Vec<Tag>],
    x_pred: &[Vec<P>],
    y_pred: &[Vec<Tag>],
) -> Result<BTreeMap<String, ClassScores>> {
    let docs = x_true.len();
    for other in [y_true.len(), x_pred.len(), y_pred.len()] {
        if other != docs {
            return Err(WebstructError::LengthMismatch {
                tokens: docs,
                tags: other,
            });
        }
    }

    let mut sums: BTreeMap<String, (ClassScores, usize)> = BTreeMap::new();
    for i in 0..docs {
        for (label, scores) in metrics_single(&x_true[i], &y_true[i], &x_pred[i], &y_pred[i])? {
            let (sum, n) = sums.entry(label).or_default();
            sum.accuracy += scores.accuracy;
            sum.precision += scores.precision;
            sum.recall += scores.recall;
            sum.f1 += scores.f1;
            *n += 1;
        }
    }

    Ok(sums
        .into_iter()
        .map(|(label, (sum, n))| {
            let n = n as f64;
            let mean = ClassScores {
                accuracy: sum.accuracy / n,
                precision: sum.precision / n,
                recall: sum.recall / n,
                f1: sum.f1 / n,
            };
            (label, mean)
        })
        .collect())
}
