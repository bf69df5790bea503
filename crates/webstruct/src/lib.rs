//! # Webstruct
//!
//! Named entity recognition for web pages.
//!
//! This crate re-exports [`webstruct_core`]: HTML tokenization with entity
//! markers, IOB2/BILOU encoding, feature extraction for sequence models and
//! grouping of extracted entities.
//!
//! ```rust
//! use webstruct::{Dom, HtmlTokenizer, HtmlTokenizerConfig, Scheme};
//! use webstruct::html::rewrite_entity_tags;
//!
//! let html = rewrite_entity_tags("<p><ORG>Acme</ORG> Ltd</p>", &["ORG"]).unwrap();
//! let config = HtmlTokenizerConfig::new().with_scheme(Scheme::Bilou);
//! let tokenizer = HtmlTokenizer::new(config).unwrap();
//! let (_, tags) = tokenizer.tokenize_single(&Dom::parse_fragment(&html)).unwrap();
//! assert_eq!(tags[0].to_string(), "U-ORG");
//! ```
pub use webstruct_core::*;
