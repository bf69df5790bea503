//! Runs token and global features over documents.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rayon::prelude::*;
use tracing::debug;

use super::{FeatureDict, GlobalFeatureRef, TokenFeatureRef};
use crate::html::HtmlToken;

/// Turns documents (token lists) into per-token feature dictionaries.
///
/// Token features run in registration order and later ones overwrite keys
/// of earlier ones. Global features then run in registration order over the
/// whole document. Keys starting with `_` are available to global features
/// but removed from the result.
#[derive(Clone, Default)]
pub struct HtmlFeatureExtractor {
    token_features: Vec<TokenFeatureRef>,
    global_features: Vec<GlobalFeatureRef>,
    min_df: usize,
}

impl fmt::Debug for HtmlFeatureExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlFeatureExtractor")
            .field("token_features", &self.token_features.len())
            .field("global_features", &self.global_features.len())
            .field("min_df", &self.min_df)
            .finish()
    }
}

impl HtmlFeatureExtractor {
    pub fn new(token_features: Vec<TokenFeatureRef>) -> Self {
        Self {
            token_features,
            global_features: Vec::new(),
            min_df: 1,
        }
    }

    pub fn with_global_features(mut self, global_features: Vec<GlobalFeatureRef>) -> Self {
        self.global_features = global_features;
        self
    }

    /// Drop `(key, value)` pairs seen in fewer than `min_df` documents during
    /// [`fit_transform`](Self::fit_transform).
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df;
        self
    }

    pub fn min_df(&self) -> usize {
        self.min_df
    }

    /// Features of a single document.
    pub fn transform_single(&self, tokens: &[HtmlToken]) -> Vec<FeatureDict> {
        let mut features: Vec<FeatureDict> = tokens
            .iter()
            .map(|token| {
                let mut dict = FeatureDict::new();
                for feature in &self.token_features {
                    dict.merge(feature.extract(token));
                }
                dict
            })
            .collect();

        for feature in &self.global_features {
            feature.apply(tokens, &mut features);
        }

        for dict in &mut features {
            dict.retain(|key, _| !key.starts_with('_'));
        }
        features
    }

    /// Features of many documents, computed in parallel.
    pub fn transform(&self, documents: &[Vec<HtmlToken>]) -> Vec<Vec<FeatureDict>> {
        documents
            .par_iter()
            .map(|tokens| self.transform_single(tokens))
            .collect()
    }

    /// Like [`transform`](Self::transform), then prune rare feature values
    /// when `min_df > 1`.
    pub fn fit_transform(&self, documents: &[Vec<HtmlToken>]) -> Vec<Vec<FeatureDict>> {
        let mut features = self.transform(documents);
        if self.min_df > 1 {
            self.prune(&mut features);
        }
        features
    }

    fn prune(&self, documents: &mut [Vec<FeatureDict>]) {
        let mut df: HashMap<(String, String), usize> = HashMap::new();
        for document in documents.iter() {
            let seen: HashSet<(&str, String)> = document
                .iter()
                .flat_map(|dict| dict.iter().map(|(k, v)| (k, v.to_string())))
                .collect();
            for (key, value) in seen {
                *df.entry((key.to_string(), value)).or_default() += 1;
            }
        }

        let (mut kept, mut dropped) = (0usize, 0usize);
        for dict in documents.iter_mut().flatten() {
            dict.retain(|key, value| {
                let count = df
                    .get(&(key.to_string(), value.to_string()))
                    .copied()
                    .unwrap_or(0);
                let keep = count >= self.min_df;
                if keep {
                    kept += 1;
                } else {
                    dropped += 1;
                }
                keep
            });
        }
        debug!(kept, dropped, min_df = self.min_df, "pruned rare features");
    }
}
