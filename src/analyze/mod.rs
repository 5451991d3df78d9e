// src/analyze/mod.rs
//! Curation side of the pipeline: AI capability, two-stage curator, ranker.

pub mod ai_adapter;
pub mod curator;
pub mod rank;

pub use crate::analyze::ai_adapter::{
    build_classifier, AnalysisResult, Classifier, DisabledClassifier, DynClassifier,
};
pub use crate::analyze::curator::{CuratedArticle, Curator};
pub use crate::analyze::rank::{rank, CURATED_CAP, RELEVANCE_FLOOR};
