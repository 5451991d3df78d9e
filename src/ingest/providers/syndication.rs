// src/ingest/providers/syndication.rs
//! Syndication adapter: polls every registry entry concurrently and maps RSS 2.0
//! or Atom items onto [`RawCandidate`]. One bad entry never affects the others.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use metrics::counter;
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::error::SourceError;
use crate::ingest::config::FeedSource;
use crate::ingest::normalize_text;
use crate::ingest::providers::STOCK_IMAGE_URL;
use crate::ingest::types::{RawCandidate, SourceAdapter};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded", alias = "content:encoded")]
    content: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Format-neutral view of one feed item.
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    date: Option<String>,
    summary: Option<String>,
    content: Option<String>,
    enclosure: Option<String>,
}

static RE_IMG_SRC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"src="([^"]+)""#).unwrap());

/// Parse an RFC 2822 (RSS) or RFC 3339 (Atom) timestamp into a UTC date.
pub fn parse_feed_date(ts: &str) -> Option<NaiveDate> {
    let ts = ts.trim();
    // Many feeds still use the obsolete named zones.
    let ts = match ts.strip_suffix(" GMT").or_else(|| ts.strip_suffix(" UTC")) {
        Some(head) => format!("{head} +0000"),
        None => ts.to_string(),
    };
    let ts = ts.as_str();
    let dt = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?
        .to_offset(UtcOffset::UTC);
    let d = dt.date();
    NaiveDate::from_ymd_opt(d.year(), u8::from(d.month()) as u32, d.day() as u32)
}

/// Enclosure first, then the first inlined `src="..."` in raw content, else stock.
fn pick_image(enclosure: Option<&str>, raw_content: Option<&str>) -> String {
    if let Some(url) = enclosure.filter(|u| !u.trim().is_empty()) {
        return url.trim().to_string();
    }
    raw_content
        .and_then(|c| RE_IMG_SRC.captures(c))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| STOCK_IMAGE_URL.to_string())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn read_items(xml: &str) -> Result<Vec<FeedItem>, SourceError> {
    let xml_clean = rewrite_html_entities(xml);

    let rss_err = match from_str::<Rss>(&xml_clean) {
        Ok(rss) => {
            return Ok(rss
                .channel
                .item
                .into_iter()
                .map(|it| FeedItem {
                    title: it.title,
                    link: it.link,
                    date: it.pub_date,
                    summary: it.description,
                    content: it.content,
                    enclosure: it.enclosure.and_then(|e| e.url),
                })
                .collect())
        }
        Err(e) => e,
    };

    if !xml_clean.contains("<feed") {
        return Err(SourceError::Parse(format!("rss: {rss_err}")));
    }
    let atom: AtomFeed =
        from_str(&xml_clean).map_err(|e| SourceError::Parse(format!("atom: {e}")))?;
    Ok(atom
        .entry
        .into_iter()
        .map(|e| {
            let link = e
                .link
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                .or_else(|| e.link.first())
                .and_then(|l| l.href.clone());
            FeedItem {
                title: e.title.and_then(|t| t.value),
                link,
                date: e.published.or(e.updated),
                summary: e.summary.and_then(|t| t.value),
                content: e.content.and_then(|t| t.value),
                enclosure: None,
            }
        })
        .collect())
}

/// Map one feed document onto candidates for the given registry entry.
pub fn parse_feed(
    xml: &str,
    src: &FeedSource,
    today: NaiveDate,
) -> Result<Vec<RawCandidate>, SourceError> {
    let items = read_items(xml)?;
    let mut out = Vec::with_capacity(items.len());

    for it in items {
        let raw_content = non_empty(it.content.clone()).or_else(|| it.summary.clone());
        let image = pick_image(it.enclosure.as_deref(), raw_content.as_deref());
        let summary = non_empty(it.summary)
            .or(it.content)
            .map(|s| normalize_text(&s))
            .unwrap_or_default();
        let title = non_empty(it.title.map(|t| normalize_text(&t)))
            .unwrap_or_else(|| "Untitled".to_string());

        out.push(RawCandidate {
            title,
            summary,
            source: src.name.clone(),
            source_type: Some(src.source_kind),
            category: Some(src.category()),
            date: Some(it.date.as_deref().and_then(parse_feed_date).unwrap_or(today)),
            url: Some(non_empty(it.link).unwrap_or_else(|| "#".to_string())),
            image_url: Some(image),
            ..Default::default()
        });
    }

    Ok(out)
}

pub struct SyndicationAdapter {
    registry: Vec<FeedSource>,
    client: reqwest::Client,
    per_feed_timeout: Duration,
}

impl SyndicationAdapter {
    pub fn new(registry: Vec<FeedSource>, per_feed_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("news-curator/0.1 (feed reader)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(per_feed_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            registry,
            client,
            per_feed_timeout,
        }
    }

    pub fn registry(&self) -> &[FeedSource] {
        &self.registry
    }

    async fn fetch_one(&self, src: &FeedSource) -> Result<Vec<RawCandidate>, SourceError> {
        let call = async {
            let resp = self.client.get(&src.url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    endpoint: src.url.clone(),
                    status: status.as_u16(),
                });
            }
            let body = resp.text().await?;
            parse_feed(&body, src, Utc::now().date_naive())
        };
        match tokio::time::timeout(self.per_feed_timeout, call).await {
            Ok(r) => r,
            Err(_) => Err(SourceError::Timeout(self.per_feed_timeout)),
        }
    }
}

#[async_trait]
impl SourceAdapter for SyndicationAdapter {
    async fn fetch(&self) -> Result<Vec<RawCandidate>, SourceError> {
        let calls = self.registry.iter().map(|src| async move {
            match self.fetch_one(src).await {
                Ok(items) => {
                    tracing::info!(target: "ingest", feed = %src.name, count = items.len(), "feed fetched");
                    items
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", feed = %src.name, error = %e, "feed error");
                    counter!("curator_source_errors_total", "provider" => "syndication").increment(1);
                    Vec::new()
                }
            }
        });
        Ok(join_all(calls).await.into_iter().flatten().collect())
    }

    fn name(&self) -> &'static str {
        "syndication"
    }
}

static RE_NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());

/// Rewrite HTML named entities that XML does not predefine (`&eacute;`,
/// `&hellip;`, ...) as numeric character references. Unknown names are
/// escaped so the document still parses.
fn rewrite_html_entities(xml: &str) -> String {
    RE_NAMED_ENTITY
        .replace_all(xml, |caps: &regex::Captures| {
            let name = &caps[1];
            if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
                return caps[0].to_string();
            }
            let decoded = html_escape::decode_html_entities(&caps[0]);
            if decoded == caps[0] {
                return format!("&amp;{name};");
            }
            decoded.chars().map(|c| format!("&#x{:X};", c as u32)).collect()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::config::FeedKind;
    use crate::ingest::types::{Category, SourceKind};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn news_src() -> FeedSource {
        FeedSource::new("BBC Sport", "http://x", SourceKind::Official, FeedKind::News)
    }

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Football</title>
    <item>
      <title>Canada confirms &nbsp;Toronto fan zone</title>
      <link>https://example.com/a</link>
      <pubDate>Mon, 01 Jun 2026 10:00:00 GMT</pubDate>
      <description><![CDATA[<p>Fan zone <b>details</b></p>]]></description>
      <enclosure url="https://img.example.com/a.jpg" type="image/jpeg" length="1"/>
    </item>
    <item>
      <title>Mexico unveils Azteca upgrades</title>
      <link>https://example.com/b</link>
      <description>Renovations done</description>
      <content:encoded><![CDATA[<img src="https://img.example.com/b.png"/> body]]></content:encoded>
    </item>
    <item>
      <description>no title, no link</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn rss_items_map_to_candidates() {
        let out = parse_feed(RSS, &news_src(), today()).unwrap();
        assert_eq!(out.len(), 3);

        assert_eq!(out[0].title, "Canada confirms Toronto fan zone");
        assert_eq!(out[0].summary, "Fan zone details");
        assert_eq!(out[0].image_url.as_deref(), Some("https://img.example.com/a.jpg"));
        assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(out[0].category, Some(Category::General));
        assert_eq!(out[0].source_type, Some(SourceKind::Official));
        assert_eq!(out[0].relevance_score, None);

        assert_eq!(out[1].image_url.as_deref(), Some("https://img.example.com/b.png"));
        assert_eq!(out[1].summary, "Renovations done");

        assert_eq!(out[2].title, "Untitled");
        assert_eq!(out[2].url.as_deref(), Some("#"));
        assert_eq!(out[2].image_url.as_deref(), Some(STOCK_IMAGE_URL));
        assert_eq!(out[2].date, Some(today()));
    }

    #[test]
    fn atom_forum_entries_are_social() {
        let atom = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>r/worldcup</title>
  <entry>
    <title type="text">Draw date announced</title>
    <link rel="alternate" href="https://reddit.example/r/worldcup/1"/>
    <updated>2026-05-30T12:00:00+00:00</updated>
    <content type="html">&lt;a href="x"&gt;&lt;img src="https://i.example/t.jpg" /&gt;&lt;/a&gt; submitted by u/fan</content>
  </entry>
</feed>"#;
        let src = FeedSource::new(
            "r/worldcup",
            "http://r",
            SourceKind::Syndicated,
            FeedKind::Forum,
        );
        let out = parse_feed(atom, &src, today()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Draw date announced");
        assert_eq!(out[0].category, Some(Category::Social));
        assert_eq!(out[0].url.as_deref(), Some("https://reddit.example/r/worldcup/1"));
        assert_eq!(out[0].image_url.as_deref(), Some("https://i.example/t.jpg"));
        assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2026, 5, 30));
        assert_eq!(out[0].summary, "submitted by u/fan");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_feed("<html>not a feed</html>", &news_src(), today()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(ref m) if m.starts_with("rss: ")));
    }

    #[test]
    fn html_entities_become_character_references() {
        assert_eq!(
            rewrite_html_entities("Mbapp&eacute; &amp; co&hellip; &lt;b&gt;"),
            "Mbapp&#xE9; &amp; co&#x2026; &lt;b&gt;"
        );
        assert_eq!(rewrite_html_entities("&bogus; &#233;"), "&amp;bogus; &#233;");
    }

    #[test]
    fn feed_dates_accept_both_formats() {
        assert_eq!(
            parse_feed_date("Tue, 02 Jun 2026 23:30:00 -0300"),
            NaiveDate::from_ymd_opt(2026, 6, 3)
        );
        assert_eq!(
            parse_feed_date("2026-06-02T08:00:00Z"),
            NaiveDate::from_ymd_opt(2026, 6, 2)
        );
        assert_eq!(parse_feed_date("yesterday"), None);
    }
}
