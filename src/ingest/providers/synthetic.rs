// src/ingest/providers/synthetic.rs
//! Template-based stand-in for a social feed. Unlike the other adapters its
//! posts carry a provisional hype score, which the curator may overwrite.

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::error::SourceError;
use crate::ingest::types::{Category, HypeLabel, RawCandidate, SourceAdapter, SourceKind};

const TEMPLATES: &[&str] = &[
    "JUST IN: {player} has been spotted at the training camp in {city}! #WorldCup2026",
    "Rumor has it that {team} is planning a major tactical shift for the opener. Thoughts?",
    "Look at this stadium! {stadium} is absolutely electric right now. #FIFA26",
    "Ticket drop alert! New batch of tickets for {match} just went live. Go go go!",
    "Can't believe it's only {days} days away! Who's your pick to win it all?",
    "BREAKING: {coach} confirms the starting XI for the friendly against {team}.",
    "The atmosphere in {city} is unmatched. This is going to be the best World Cup ever. USA Mexico Canada",
];

const PLAYERS: &[&str] = &["Mbappé", "Messi", "Haaland", "Bellingham", "Vinicius Jr", "Pulisic", "Davies"];
const TEAMS: &[&str] = &["Brazil", "France", "USA", "Argentina", "Japan", "Mexico", "Canada", "England"];
const CITIES: &[&str] = &["New York", "Los Angeles", "Mexico City", "Toronto", "Miami", "Dallas"];
const STADIUMS: &[&str] = &["SoFi Stadium", "MetLife Stadium", "Azteca"];
const COACH_SURNAMES: &[&str] = &["Pochettino", "Aguirre", "Marsch", "Scaloni", "Deschamps", "Tuchel", "Ancelotti"];
const HANDLES: &[&str] = &["golazo_daily", "wc26_insider", "matchday_mike", "futbol_fan", "pitchside_pat", "stadium_hopper"];

const URGENCY_MARKERS: &[&str] = &["BREAKING", "JUST IN"];
const SOURCE_NAME: &str = "X (Twitter)";
const POST_URL: &str = "https://twitter.com/FIFAWorldCup";
const SOCIAL_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1611605698380-8e13c2435bed?q=80&w=1000&auto=format&fit=crop";

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Fill one random template. Each placeholder is substituted once.
fn render_post(rng: &mut StdRng) -> String {
    let mut text = pick(rng, TEMPLATES).to_string();
    let player = pick(rng, PLAYERS);
    let team = pick(rng, TEAMS);
    let city = pick(rng, CITIES);
    let stadium = pick(rng, STADIUMS);
    let matchup = format!("{} vs {}", pick(rng, TEAMS), pick(rng, TEAMS));
    let coach = format!("Coach {}", pick(rng, COACH_SURNAMES));
    let days = rng.random_range(0..200u32).to_string();

    for (slot, value) in [
        ("{player}", player),
        ("{team}", team),
        ("{city}", city),
        ("{stadium}", stadium),
        ("{match}", matchup.as_str()),
        ("{coach}", coach.as_str()),
        ("{days}", days.as_str()),
    ] {
        text = text.replacen(slot, value, 1);
    }
    text
}

/// Provisional hype: 8–10 with an urgency marker, else 4–8.
fn provisional_hype(rng: &mut StdRng, text: &str) -> u8 {
    if URGENCY_MARKERS.iter().any(|m| text.contains(m)) {
        rng.random_range(8..=10)
    } else {
        rng.random_range(4..=8)
    }
}

pub struct SyntheticAdapter {
    count: usize,
    seed: Option<u64>,
}

impl SyntheticAdapter {
    pub fn new(count: usize) -> Self {
        Self { count, seed: None }
    }

    /// Deterministic generator: the same seed yields the same posts.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed: Some(seed),
        }
    }

    pub fn generate(&self) -> Vec<RawCandidate> {
        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let today = Utc::now().date_naive();

        (0..self.count)
            .map(|_| {
                let text = render_post(&mut rng);
                let hype = provisional_hype(&mut rng, &text);
                let handle = format!("{}{}", pick(&mut rng, HANDLES), rng.random_range(1..1000u32));
                RawCandidate {
                    title: format!("@{handle} on X"),
                    summary: text,
                    source: SOURCE_NAME.to_string(),
                    source_type: Some(SourceKind::Social),
                    category: Some(Category::Social),
                    date: Some(today),
                    url: Some(POST_URL.to_string()),
                    image_url: Some(SOCIAL_IMAGE_URL.to_string()),
                    hype_score: Some(hype),
                    hype_label: Some(HypeLabel::from_hype(hype)),
                    ..Default::default()
                }
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for SyntheticAdapter {
    async fn fetch(&self) -> Result<Vec<RawCandidate>, SourceError> {
        Ok(self.generate())
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
