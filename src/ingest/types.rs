// src/ingest/types.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Where a candidate came from, as shown to readers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SourceKind {
    Official,
    #[default]
    #[serde(rename = "RSS", alias = "Syndicated")]
    Syndicated,
    Social,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Category {
    Tickets,
    Teams,
    Federations,
    Players,
    #[default]
    General,
    Social,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum HypeLabel {
    Viral,
    Breaking,
    Hot,
    #[default]
    Routine,
}

impl HypeLabel {
    /// Label for a provisional hype score: >=9 Viral, >=7 Breaking, else Hot.
    pub fn from_hype(score: u8) -> Self {
        if score >= 9 {
            HypeLabel::Viral
        } else if score >= 7 {
            HypeLabel::Breaking
        } else {
            HypeLabel::Hot
        }
    }
}

/// A pre-curation article as emitted by an adapter or supplied by an operator.
///
/// Every field is optional on the wire so operators can seed partial records and
/// the previous curated snapshot can be fed back through the same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(
        default,
        deserialize_with = "lenient_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hype_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hype_label: Option<HypeLabel>,
    #[serde(default)]
    pub ai_summary: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduplication_id: Option<String>,
}

impl RawCandidate {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Stage-1 projection of a candidate: ordinal, title, source. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedHeadline {
    pub index: usize,
    pub title: String,
    pub source: String,
}

impl NormalizedHeadline {
    pub fn project(items: &[RawCandidate]) -> Vec<Self> {
        items
            .iter()
            .enumerate()
            .map(|(index, c)| Self {
                index,
                title: c.title.clone(),
                source: c.source.clone(),
            })
            .collect()
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawCandidate>, SourceError>;
    fn name(&self) -> &'static str;
}

/// `date` fields accept `YYYY-MM-DD` or a full timestamp such as
/// `2026-06-01T10:00:00Z`; only the leading calendar date is kept.
pub(crate) mod lenient_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer};

    fn parse<E: de::Error>(s: &str) -> Result<NaiveDate, E> {
        let day = s.trim().get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| E::custom(format!("invalid date {s:?}: {e}")))
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(d)?;
        parse(&s)
    }

    pub fn option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) => parse(&s).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hype_label_thresholds() {
        assert_eq!(HypeLabel::from_hype(10), HypeLabel::Viral);
        assert_eq!(HypeLabel::from_hype(9), HypeLabel::Viral);
        assert_eq!(HypeLabel::from_hype(8), HypeLabel::Breaking);
        assert_eq!(HypeLabel::from_hype(7), HypeLabel::Breaking);
        assert_eq!(HypeLabel::from_hype(6), HypeLabel::Hot);
        assert_eq!(HypeLabel::from_hype(4), HypeLabel::Hot);
    }

    #[test]
    fn partial_seed_deserializes_with_defaults() {
        let c: RawCandidate =
            serde_json::from_str(r#"{"title":"High Relevance","relevanceScore":8,"hypeScore":5}"#)
                .unwrap();
        assert_eq!(c.title, "High Relevance");
        assert_eq!(c.relevance_score, Some(8));
        assert!(c.summary.is_empty());
        assert!(c.id.is_none());
    }

    #[test]
    fn dates_accept_plain_days_and_timestamps() {
        let seeds: Vec<RawCandidate> = serde_json::from_str(
            r#"[{"title":"a","date":"2026-06-01T10:00:00Z"},
                {"title":"b","date":"2026-06-02"},
                {"title":"c","date":null},
                {"title":"d"}]"#,
        )
        .unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2026, 6, d);
        assert_eq!(seeds[0].date, day(1));
        assert_eq!(seeds[1].date, day(2));
        assert!(seeds[2].date.is_none() && seeds[3].date.is_none());

        let back = serde_json::to_value(&seeds[0]).unwrap();
        assert_eq!(back["date"], "2026-06-01");

        assert!(serde_json::from_str::<RawCandidate>(r#"{"date":"June 1st"}"#).is_err());
    }

    #[test]
    fn syndicated_kind_uses_rss_wire_name() {
        let s = serde_json::to_string(&SourceKind::Syndicated).unwrap();
        assert_eq!(s, "\"RSS\"");
        let back: SourceKind = serde_json::from_str("\"Syndicated\"").unwrap();
        assert_eq!(back, SourceKind::Syndicated);
    }
}
