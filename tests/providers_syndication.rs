// tests/providers_syndication.rs
//
// Syndication adapter over real-looking fixtures, parsed offline and
// fetched from a local server alongside broken registry entries.

use std::time::Duration;

use axum::{http::StatusCode, routing::get, Router};
use chrono::NaiveDate;

use news_curator::ingest::config::{FeedKind, FeedSource};
use news_curator::ingest::providers::syndication::{parse_feed, SyndicationAdapter};
use news_curator::ingest::types::{Category, SourceAdapter, SourceKind};

const BBC: &str = include_str!("fixtures/bbc_football.xml");
const REDDIT: &str = include_str!("fixtures/reddit_worldcup.atom");
const LEQUIPE: &str = include_str!("fixtures/lequipe_football.xml");

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 2).unwrap()
}

#[test]
fn rss_fixture_maps_every_item() {
    let src = FeedSource::new("BBC Sport", "http://unused", SourceKind::Official, FeedKind::News);
    let out = parse_feed(BBC, &src, today()).unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].title, "USA name provisional squad for World Cup 2026");
    assert_eq!(out[0].source, "BBC Sport");
    assert_eq!(
        out[0].image_url.as_deref(),
        Some("https://ichef.example.co.uk/usa-squad.jpg")
    );
    assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2026, 6, 2));
    assert_eq!(out[1].date, NaiveDate::from_ymd_opt(2026, 6, 1));
    assert!(out.iter().all(|c| c.hype_score.is_none() && c.relevance_score.is_none()));
}

#[test]
fn html_named_entities_do_not_drop_the_feed() {
    let src = FeedSource::new("L'Equipe", "http://unused", SourceKind::Official, FeedKind::News);
    let out = parse_feed(LEQUIPE, &src, today()).unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out[0].title, "Mbapp\u{e9} joins France camp");
    assert_eq!(
        out[0].summary,
        "Le capitaine des Bleus est arriv\u{e9} \u{e0} Clairefontaine\u{2026}"
    );
    assert_eq!(out[1].title, "Coupe du monde : les Bleus \u{e0} Boston");
    assert_eq!(out[1].summary, "Deschamps d\u{e9}voile le programme & les horaires.");
    assert_eq!(out[2].title, "Ticket resale opens for Dallas \u{2013} New York");
    assert_eq!(out[2].summary, "Prices listed in \u{20ac} and $\u{2026}");
    assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2026, 6, 1));
}

#[test]
fn atom_fixture_from_forum_is_social() {
    let src = FeedSource::new(
        "r/worldcup",
        "http://unused",
        SourceKind::Syndicated,
        FeedKind::Forum,
    );
    let out = parse_feed(REDDIT, &src, today()).unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "Azteca opening match tickets sold out in minutes");
    assert_eq!(out[0].category, Some(Category::Social));
    assert_eq!(out[0].source_type, Some(SourceKind::Syndicated));
    assert_eq!(
        out[0].image_url.as_deref(),
        Some("https://b.thumbs.example.com/azteca.jpg")
    );
    assert_eq!(out[0].summary, "submitted by /u/matchday_mike");
}

#[tokio::test]
async fn one_bad_entry_never_aborts_the_others() {
    let app = Router::new()
        .route("/bbc.xml", get(|| async { BBC }))
        .route("/broken.xml", get(|| async { "<html><body>maintenance</body></html>" }))
        .route("/gone.xml", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
        .route("/worldcup.rss", get(|| async { REDDIT }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = |p: &str| format!("http://{addr}{p}");
    let registry = vec![
        FeedSource::new("Broken", &url("/broken.xml"), SourceKind::Official, FeedKind::News),
        FeedSource::new("BBC Sport", &url("/bbc.xml"), SourceKind::Official, FeedKind::News),
        FeedSource::new("Gone", &url("/gone.xml"), SourceKind::Official, FeedKind::News),
        // Nothing listens on port 9.
        FeedSource::new("Dead", "http://127.0.0.1:9/rss", SourceKind::Official, FeedKind::News),
        FeedSource::new("r/worldcup", &url("/worldcup.rss"), SourceKind::Syndicated, FeedKind::Forum),
    ];
    let adapter = SyndicationAdapter::new(registry, Duration::from_secs(5));

    let out = adapter.fetch().await.unwrap();
    let sources: Vec<_> = out.iter().map(|c| c.source.as_str()).collect();
    assert_eq!(sources, vec!["BBC Sport", "BBC Sport", "r/worldcup"]);
    assert_eq!(adapter.name(), "syndication");
}
