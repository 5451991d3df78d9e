// src/analyze/rank.rs
use crate::analyze::curator::CuratedArticle;

/// Items at or below this relevance are dropped.
pub const RELEVANCE_FLOOR: u8 = 4;
/// Upper bound of the curated snapshot.
pub const CURATED_CAP: usize = 50;

/// Keep relevance > 4, order by hype descending. `sort_by` is stable, so equal
/// hype keeps input order.
pub fn rank(items: Vec<CuratedArticle>) -> Vec<CuratedArticle> {
    let mut kept: Vec<_> = items
        .into_iter()
        .filter(|a| a.relevance_score > RELEVANCE_FLOOR)
        .collect();
    kept.sort_by(|a, b| b.hype_score.cmp(&a.hype_score));
    kept
}
