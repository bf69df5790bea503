//! # Webstruct Core
//!
//! Turns annotated or plain HTML into aligned token and tag sequences for
//! sequence labelling, extracts per-token features for a CRF-style model,
//! puts predicted tags back into the tree, and groups extracted entities
//! into records.
//!
//! ## Quick Start
//!
//! ```rust
//! use webstruct_core::html::{Dom, HtmlTokenizer, HtmlTokenizerConfig, rewrite_entity_tags};
//! use webstruct_core::features::{default_token_features, HtmlFeatureExtractor};
//!
//! let html = rewrite_entity_tags("<p>hello, <PER>John <b>Doe</b></PER> said</p>", &["PER"]).unwrap();
//! let tokenizer = HtmlTokenizer::new(HtmlTokenizerConfig::default()).unwrap();
//! let (tokens, tags) = tokenizer.tokenize_single(&Dom::parse_fragment(&html)).unwrap();
//!
//! let tags: Vec<String> = tags.iter().map(ToString::to_string).collect();
//! assert_eq!(tags, ["O", "B-PER", "I-PER", "O"]);
//!
//! let extractor = HtmlFeatureExtractor::new(default_token_features().unwrap());
//! let features = extractor.transform_single(&tokens);
//! assert_eq!(features[2].get("parent_tag").unwrap().to_string(), "b");
//! ```
pub mod encoding;
pub mod error;
pub mod features;
pub mod grouping;
pub mod html;
pub mod metrics;
pub mod model;
pub mod text;

// Re-export primary API
pub use encoding::{Scheme, SequenceEncoder, Tag};
pub use error::{Result, WebstructError};
pub use features::{FeatureDict, FeatureValue, GlobalFeature, HtmlFeatureExtractor, TokenFeature};
pub use grouping::{Cluster, Clustering, ClusteringOptions, Entity, choose_best_clustering};
pub use html::{Dom, DomainGuesser, HtmlToken, HtmlTokenizer, HtmlTokenizerConfig};
pub use metrics::{ClassScores, avg_bio_f1_score, bio_f_score, label_entities, per_class_metrics};
pub use model::{Ner, SequenceModel};
pub use text::{TextToken, TextTokenizer, WordTokenizer, smart_join};
