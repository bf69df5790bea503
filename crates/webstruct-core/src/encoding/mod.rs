//! Sequence encoding: tag vocabulary, marker-to-tag encoders and span grouping.

pub mod encoder;
pub mod tags;

pub use encoder::{
    EncoderState, Group, MarkerClassifier, Scheme, SequenceEncoder, TokenClass, entity_spans,
    group, repair, to_bilou, to_iob2,
};
pub use tags::{Tag, parse_tags};
