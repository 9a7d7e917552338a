//! Multi-table sheet segmentation.

pub mod keywords;
mod segmenter;

pub use segmenter::{
    dedup_columns, HeaderRules, RowFeatures, Segmentation, TableSegment, TableSegmenter,
};
