//! # Entity Grouping
//!
//! Pages often list several records (e.g. the contact details of several
//! offices). This module splits the entities found on a page into groups
//! that likely belong to the same record:
//!
//! 1. Every token gets a position. Positions grow with each token and grow
//!    faster when the owning element or its parent changes.
//! 2. The distance between two subsequent entities is the gap between the
//!    end of the first and the start of the second.
//! 3. For a threshold, a new cluster starts whenever a distance exceeds it.
//! 4. Clusters are scored: more entities score higher, repeated entity
//!    types are penalized (unless whitelisted), and every cluster costs 1.
//! 5. Every distinct observed distance is tried as threshold and the best
//!    scoring clustering wins. On ties the larger threshold is kept.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::encoding::{Tag, group};
use crate::error::{Result, WebstructError};
use crate::html::HtmlToken;

/// Options for [`choose_best_clustering`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringOptions {
    /// Entity types that may repeat inside a cluster without penalty,
    /// e.g. `TEL` and `FAX`.
    pub dont_penalize: HashSet<String>,
}

impl ClusteringOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dont_penalize<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dont_penalize = types.into_iter().map(Into::into).collect();
        self
    }
}

/// One entity inside a cluster.
#[derive(Debug, Clone)]
pub struct Entity {
    pub tokens: Vec<HtmlToken>,
    pub entity_type: String,
    /// Distance to the previous entity; 0 for the first entity of a page.
    pub distance: usize,
}

impl Entity {
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(HtmlToken::token)
    }
}

pub type Cluster = Vec<Entity>;

/// The selected way to split a page's entities into clusters.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub threshold: usize,
    pub score: i64,
    pub clusters: Vec<Cluster>,
}

/// Running position of every token.
fn token_positions(tokens: &[HtmlToken]) -> Vec<usize> {
    let mut positions = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let pos = match i.checked_sub(1) {
            None => 0,
            Some(prev) => {
                let prev_token = &tokens[prev];
                let mut pos = positions[prev] + 2;
                if token.parent() != prev_token.parent() {
                    pos += 2;
                }
                if token.elem() != prev_token.elem() {
                    pos += 1;
                }
                pos
            }
        };
        positions.push(pos);
    }
    positions
}

/// Entities in document order, each with its distance to the previous one.
fn entities_with_distances(tokens: &[HtmlToken], tags: &[Tag]) -> Result<Vec<Entity>> {
    if tokens.len() != tags.len() {
        return Err(WebstructError::LengthMismatch {
            tokens: tokens.len(),
            tags: tags.len(),
        });
    }

    let positions = token_positions(tokens);
    let data = tokens.iter().zip(positions).zip(tags);

    let mut entities = Vec::new();
    let mut prev_end: Option<usize> = None;
    for g in group(data, false)? {
        let Some(entity_type) = g.entity_type else {
            continue;
        };
        let (Some(&(_, start)), Some(&(_, end))) = (g.items.first(), g.items.last()) else {
            continue;
        };
        let distance = prev_end.map_or(0, |prev| start.saturating_sub(prev));
        prev_end = Some(end);
        entities.push(Entity {
            tokens: g.items.into_iter().map(|(token, _)| token.clone()).collect(),
            entity_type,
            distance,
        });
    }
    Ok(entities)
}

fn split_by_threshold(entities: &[Entity], threshold: usize) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut buf: Cluster = Vec::new();
    for entity in entities {
        if entity.distance > threshold && !buf.is_empty() {
            clusters.push(std::mem::take(&mut buf));
        }
        buf.push(entity.clone());
    }
    if !buf.is_empty() {
        clusters.push(buf);
    }
    clusters
}

/// Split the entities of a page into clusters, starting a new cluster
/// whenever the distance to the previous entity exceeds `threshold`.
pub fn group_entities_by_threshold(
    tokens: &[HtmlToken],
    tags: &[Tag],
    threshold: usize,
) -> Result<Vec<Cluster>> {
    let entities = entities_with_distances(tokens, tags)?;
    Ok(split_by_threshold(&entities, threshold))
}

/// Default clustering score.
///
/// Per cluster: entity types seen once (or listed in `dont_penalize`) add
/// their count, other repeated types subtract their count, and the cluster
/// itself costs 1. The total is the sum over clusters.
pub fn default_clustering_score(
    clusters: &[Cluster],
    _threshold: usize,
    dont_penalize: &HashSet<String>,
) -> i64 {
    clusters
        .iter()
        .map(|cluster| {
            let mut counts: HashMap<&str, i64> = HashMap::new();
            for entity in cluster {
                *counts.entry(entity.entity_type.as_str()).or_default() += 1;
            }
            let score: i64 = counts
                .iter()
                .map(|(entity_type, &n)| {
                    if n == 1 || dont_penalize.contains(*entity_type) {
                        n
                    } else {
                        -n
                    }
                })
                .sum();
            score - 1
        })
        .sum()
}

/// Pick the best clustering of a page using [`default_clustering_score`].
///
/// `tokens` and `tags` are a tokenized page and its (predicted) tags, e.g.
/// the output of [`Ner::extract_raw`](crate::model::Ner::extract_raw).
pub fn choose_best_clustering(
    tokens: &[HtmlToken],
    tags: &[Tag],
    options: &ClusteringOptions,
) -> Result<Clustering> {
    choose_best_clustering_with(tokens, tags, |clusters, threshold| {
        default_clustering_score(clusters, threshold, &options.dont_penalize)
    })
}

/// Pick the best clustering of a page with a custom score function
/// `score(clusters, threshold)`; larger is better.
///
/// Returns threshold 0 and score 0 when there are fewer than two entities.
pub fn choose_best_clustering_with<F>(
    tokens: &[HtmlToken],
    tags: &[Tag],
    score: F,
) -> Result<Clustering>
where
    F: Fn(&[Cluster], usize) -> i64,
{
    let entities = entities_with_distances(tokens, tags)?;

    let mut thresholds: Vec<usize> = entities.iter().skip(1).map(|e| e.distance).collect();
    thresholds.sort_unstable_by(|a, b| b.cmp(a));
    thresholds.dedup();

    if thresholds.is_empty() {
        return Ok(Clustering {
            threshold: 0,
            score: 0,
            clusters: split_by_threshold(&entities, 0),
        });
    }

    let mut best: Option<Clustering> = None;
    for threshold in thresholds {
        let clusters = split_by_threshold(&entities, threshold);
        let value = score(&clusters, threshold);
        trace!(threshold, score = value, clusters = clusters.len(), "scored clustering");
        if best.as_ref().is_none_or(|b| value > b.score) {
            best = Some(Clustering {
                threshold,
                score: value,
                clusters,
            });
        }
    }

    let best = best.unwrap_or(Clustering {
        threshold: 0,
        score: 0,
        clusters: Vec::new(),
    });
    trace!(threshold = best.threshold, score = best.score, "best clustering");
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{Dom, HtmlTokenizer, HtmlTokenizerConfig, rewrite_entity_tags};

    fn tokenize(html: &str) -> (Vec<HtmlToken>, Vec<Tag>) {
        let html = rewrite_entity_tags(html, &["ORG", "TEL", "CITY", "FAX"]).unwrap();
        HtmlTokenizer::new(HtmlTokenizerConfig::default())
            .unwrap()
            .tokenize_single(&Dom::parse_fragment(&html))
            .unwrap()
    }

    fn summary(clusters: &[Cluster]) -> Vec<Vec<(String, String)>> {
        clusters
            .iter()
            .map(|c| {
                c.iter()
                    .map(|e| (e.words().collect::<Vec<_>>().join(" "), e.entity_type.clone()))
                    .collect()
            })
            .collect()
    }

    const TWO_OFFICES: &str = "<div>\
        <p><ORG>Acme London</ORG> <CITY>London</CITY> <TEL>123</TEL></p>\
        <p>Some text about the offices that goes on for quite a while here</p>\
        <p><ORG>Acme Paris</ORG> <CITY>Paris</CITY> <TEL>456</TEL></p>\
        </div>";

    #[test]
    fn test_token_positions() {
        let (tokens, _) = tokenize("<div>a b<p>c</p> d</div>");
        // c: new elem and parent; d: tail of <p>, so same elem but parent div
        assert_eq!(token_positions(&tokens), [0, 2, 7, 11]);
    }

    #[test]
    fn test_distances() {
        let (tokens, tags) = tokenize("<p><ORG>Acme Inc</ORG> x <TEL>1</TEL></p>");
        let entities = entities_with_distances(&tokens, &tags).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].distance, 0);
        // positions: Acme 0, Inc 2, x 4, 1 6
        assert_eq!(entities[1].distance, 4);
    }

    #[test]
    fn test_two_offices_are_separated() {
        let (tokens, tags) = tokenize(TWO_OFFICES);
        let best = choose_best_clustering(&tokens, &tags, &ClusteringOptions::default()).unwrap();
        assert_eq!(
            summary(&best.clusters),
            [
                vec![
                    ("Acme London".to_string(), "ORG".to_string()),
                    ("London".to_string(), "CITY".to_string()),
                    ("123".to_string(), "TEL".to_string()),
                ],
                vec![
                    ("Acme Paris".to_string(), "ORG".to_string()),
                    ("Paris".to_string(), "CITY".to_string()),
                    ("456".to_string(), "TEL".to_string()),
                ],
            ]
        );
        assert_eq!(best.score, 4);
    }

    #[test]
    fn test_dont_penalize() {
        let (tokens, tags) = tokenize("<p><TEL>1</TEL> or <TEL>2</TEL> or else <TEL>3</TEL></p>");
        // distances 0, 4, 6
        let penalized = choose_best_clustering(&tokens, &tags, &ClusteringOptions::default()).unwrap();
        assert_eq!(penalized.threshold, 4);
        assert_eq!(penalized.clusters.len(), 2);
        assert_eq!(penalized.score, -3);

        let options = ClusteringOptions::new().with_dont_penalize(["TEL"]);
        let allowed = choose_best_clustering(&tokens, &tags, &options).unwrap();
        assert_eq!(allowed.threshold, 6);
        assert_eq!(allowed.clusters.len(), 1);
        assert_eq!(allowed.score, 2);
    }

    #[test]
    fn test_few_entities() {
        let (tokens, tags) = tokenize("<p>no entities here</p>");
        let best = choose_best_clustering(&tokens, &tags, &ClusteringOptions::default()).unwrap();
        assert_eq!((best.threshold, best.score), (0, 0));
        assert!(best.clusters.is_empty());

        let (tokens, tags) = tokenize("<p>call <TEL>1</TEL></p>");
        let best = choose_best_clustering(&tokens, &tags, &ClusteringOptions::default()).unwrap();
        assert_eq!((best.threshold, best.score), (0, 0));
        assert_eq!(best.clusters.len(), 1);
    }

    #[test]
    fn test_ties_prefer_larger_threshold() {
        let (tokens, tags) = tokenize(TWO_OFFICES);
        let best = choose_best_clustering_with(&tokens, &tags, |_, _| 7).unwrap();
        let largest = entities_with_distances(&tokens, &tags)
            .unwrap()
            .iter()
            .map(|e| e.distance)
            .max()
            .unwrap();
        assert_eq!(best.threshold, largest);
        assert_eq!(best.clusters.len(), 1);
    }

    #[test]
    fn test_group_by_threshold() {
        let (tokens, tags) = tokenize(TWO_OFFICES);
        assert_eq!(group_entities_by_threshold(&tokens, &tags, 0).unwrap().len(), 6);
        assert_eq!(group_entities_by_threshold(&tokens, &tags, 1000).unwrap().len(), 1);
    }

    #[test]
    fn test_length_mismatch() {
        let (tokens, _) = tokenize("<p>a b</p>");
        let err = choose_best_clustering(&tokens, &[Tag::Outside], &ClusteringOptions::default()).unwrap_err();
        assert!(matches!(err, WebstructError::LengthMismatch { tokens: 2, tags: 1 }));
    }

    #[test]
    fn test_options_serde() {
        let options: ClusteringOptions = serde_json::from_str(r#"{"dont_penalize": ["TEL", "FAX"]}"#).unwrap();
        assert!(options.dont_penalize.contains("FAX"));
        let empty: ClusteringOptions = serde_json::from_str("{}").unwrap();
        assert!(empty.dont_penalize.is_empty());
    }
}
