//! # Model Boundary
//!
//! The sequence labeller itself (a CRF in practice) lives outside this
//! crate. [`SequenceModel`] is the contract it has to satisfy and [`Ner`]
//! wires it to the tokenizer, the feature extractor and entity grouping.

use crate::encoding::{Tag, group};
use crate::error::{Result, WebstructError};
use crate::features::{FeatureDict, HtmlFeatureExtractor};
use crate::grouping::{ClusteringOptions, choose_best_clustering};
use crate::html::{Dom, HtmlToken, HtmlTokenizer, HtmlTokenizerConfig};
use crate::text::smart_join;

/// A trainable sequence labeller over per-token feature dictionaries.
pub trait SequenceModel: Send + Sync {
    /// Train on documents `x` with gold tags `y`; `x[i][j]` belongs to
    /// `y[i][j]`.
    fn fit(&mut self, x: &[Vec<FeatureDict>], y: &[Vec<Tag>]) -> Result<()>;

    /// Predict one tag per token for every document.
    fn predict(&self, x: &[Vec<FeatureDict>]) -> Result<Vec<Vec<Tag>>>;
}

/// Named entity extraction from HTML with a trained [`SequenceModel`].
#[derive(Debug, Clone)]
pub struct Ner<M> {
    model: M,
    tokenizer: HtmlTokenizer,
    extractor: HtmlFeatureExtractor,
    clustering: ClusteringOptions,
}

impl<M: SequenceModel> Ner<M> {
    /// Create a pipeline with the default HTML tokenizer.
    pub fn new(model: M, extractor: HtmlFeatureExtractor) -> Result<Self> {
        Ok(Self {
            model,
            tokenizer: HtmlTokenizer::new(HtmlTokenizerConfig::default())?,
            extractor,
            clustering: ClusteringOptions::default(),
        })
    }

    /// Use a custom HTML tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: HtmlTokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Options used by [`Ner::extract_groups`].
    pub fn with_clustering_options(mut self, options: ClusteringOptions) -> Self {
        self.clustering = options;
        self
    }

    /// The wrapped sequence model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The HTML tokenizer used for training and extraction.
    pub fn tokenizer(&self) -> &HtmlTokenizer {
        &self.tokenizer
    }

    /// Train the model on annotated trees (with entity markers in the text).
    pub fn fit(&mut self, annotated: &[Dom]) -> Result<()> {
        let (tokens, tags) = self.tokenizer.tokenize(annotated)?;
        let features = self.extractor.fit_transform(&tokens);
        self.model.fit(&features, &tags)
    }

    /// Tokens of `html` and the predicted tag of each one.
    pub fn extract_raw(&self, html: &str) -> Result<(Vec<HtmlToken>, Vec<Tag>)> {
        let dom = Dom::parse_document(html);
        let (tokens, _) = self.tokenizer.tokenize_single(&dom)?;
        let features = self.extractor.transform_single(&tokens);

        let tags = self
            .model
            .predict(std::slice::from_ref(&features))?
            .into_iter()
            .next()
            .ok_or_else(|| WebstructError::Model("no prediction for document".into()))?;
        if tags.len() != tokens.len() {
            return Err(WebstructError::LengthMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        Ok((tokens, tags))
    }

    /// Entities of `html` as `(text, type)` pairs, in document order.
    pub fn extract(&self, html: &str) -> Result<Vec<(String, String)>> {
        let (tokens, tags) = self.extract_raw(html)?;
        let data = tokens.iter().map(HtmlToken::token).zip(&tags);
        Ok(group(data, false)?
            .into_iter()
            .filter_map(|g| {
                let entity_type = g.entity_type?;
                Some((smart_join(&g.items), entity_type))
            })
            .collect())
    }

    /// Entities of `html` split into groups that likely describe the same
    /// record (see [`choose_best_clustering`]).
    pub fn extract_groups(&self, html: &str) -> Result<Vec<Vec<(String, String)>>> {
        let (tokens, tags) = self.extract_raw(html)?;
        let best = choose_best_clustering(&tokens, &tags, &self.clustering)?;
        Ok(best
            .clusters
            .into_iter()
            .map(|cluster| {
                cluster
                    .into_iter()
                    .map(|entity| (smart_join(entity.words()), entity.entity_type))
                    .collect()
            })
            .collect())
    }

    /// The tree of `html` with predicted entities marked inline.
    pub fn annotate(&self, html: &str) -> Result<Option<Dom>> {
        let (tokens, tags) = self.extract_raw(html)?;
        self.tokenizer.detokenize_single(&tokens, &tags)
    }
}

#[cfg(test)]
pub(crate) mod test_model {
    use std::collections::HashMap;

    use super::*;

    /// Remembers the gold tag of every lowercased token.
    #[derive(Debug, Clone, Default)]
    pub struct MemorizingModel {
        pub tags: HashMap<String, Tag>,
    }

    impl SequenceModel for MemorizingModel {
        fn fit(&mut self, x: &[Vec<FeatureDict>], y: &[Vec<Tag>]) -> Result<()> {
            for (features, tags) in x.iter().zip(y) {
                for (dict, tag) in features.iter().zip(tags) {
                    if let Some(word) = dict.get("lower") {
                        self.tags.insert(word.to_string(), tag.clone());
                    }
                }
            }
            Ok(())
        }

        fn predict(&self, x: &[Vec<FeatureDict>]) -> Result<Vec<Vec<Tag>>> {
            Ok(x.iter()
                .map(|features| {
                    features
                        .iter()
                        .map(|dict| {
                            dict.get("lower")
                                .and_then(|w| self.tags.get(&w.to_string()))
                                .cloned()
                                .unwrap_or(Tag::Outside)
                        })
                        .collect()
                })
                .collect())
        }
    }
}
