// src/diagnose/report.rs
//! Report view model: everything the page shows, in display order, fully
//! computed server-side. The page only lays it out.

use serde::Serialize;

use crate::config::DiagnosisVariant;

use super::normalize::{Diagnosis, PersonaCritique, RegionRisk};

/// Regions at or above this risk get a warning line.
pub const REGIONAL_WARNING_THRESHOLD: u8 = 60;

/// Share quotes are cut to this many characters (not bytes).
const SHARE_QUOTE_MAX_CHARS: usize = 30;

const MISSING_COMMENT: &str = "コメントなし";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    ClassRep,
    KyotoOkami,
    ReplyOjisan,
    DoxingTeam,
}

impl Persona {
    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::ClassRep => "学級委員長",
            Persona::KyotoOkami => "京都の老舗女将",
            Persona::ReplyOjisan => "クソリプおじさん",
            Persona::DoxingTeam => "特定班",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Persona::ClassRep => "👩‍🏫",
            Persona::KyotoOkami => "👘",
            Persona::ReplyOjisan => "🧔",
            Persona::DoxingTeam => "🕵️",
        }
    }
}

/// Gauge coloring: red from 80, orange from 50, green below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeColor {
    Green,
    Orange,
    Red,
}

impl GaugeColor {
    pub fn for_score(score: u8) -> Self {
        if score >= 80 {
            GaugeColor::Red
        } else if score >= 50 {
            GaugeColor::Orange
        } else {
            GaugeColor::Green
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PersonaCard {
    pub persona: Persona,
    pub name: String,
    pub emoji: String,
    /// `'★' * rating + '☆' * (5 - rating)`, rating clamped per variant.
    pub stars: String,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionalChart {
    pub y_min: u8,
    pub y_max: u8,
    pub bars: Vec<RegionRisk>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionalWarning {
    pub region: String,
    pub risk_score: u8,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub headline: String,
    pub score: u8,
    pub gauge: GaugeColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regional_chart: Option<RegionalChart>,
    pub warnings: Vec<RegionalWarning>,
    pub cards: Vec<PersonaCard>,
    pub summary: String,
    pub share: ShareLink,
}

/// Project a normalized diagnosis into the ordered view model.
pub fn render_report(diag: &Diagnosis, variant: DiagnosisVariant, app_public_url: &str) -> Report {
    let cards = vec![
        card(Persona::ClassRep, &diag.critiques.class_rep, variant),
        card(Persona::KyotoOkami, &diag.critiques.kyoto_okami, variant),
        card(Persona::ReplyOjisan, &diag.critiques.reply_ojisan, variant),
        card(Persona::DoxingTeam, &diag.critiques.doxing_team, variant),
    ];

    let regional_chart = match variant {
        DiagnosisVariant::Base => None,
        DiagnosisVariant::Extended => Some(RegionalChart {
            y_min: 0,
            y_max: 100,
            bars: diag.regional.clone(),
        }),
    };

    let warnings = diag
        .regional
        .iter()
        .filter(|r| r.risk_score >= REGIONAL_WARNING_THRESHOLD)
        .map(|r| RegionalWarning {
            region: r.region.clone(),
            risk_score: r.risk_score,
            reason: r.reason.clone(),
        })
        .collect();

    Report {
        headline: format!("判定結果: 炎上リスク {}%", diag.score),
        score: diag.score,
        gauge: GaugeColor::for_score(diag.score),
        detected_language: diag.detected_language.clone(),
        regional_chart,
        warnings,
        cards,
        summary: diag.summary.clone(),
        share: share_link(diag.score, &diag.critiques.kyoto_okami.comment, app_public_url),
    }
}

fn card(persona: Persona, critique: &PersonaCritique, variant: DiagnosisVariant) -> PersonaCard {
    PersonaCard {
        persona,
        name: persona.display_name().to_string(),
        emoji: persona.emoji().to_string(),
        stars: stars(critique.rating, variant),
        comment: critique
            .comment
            .clone()
            .unwrap_or_else(|| MISSING_COMMENT.to_string()),
    }
}

fn stars(rating: i64, variant: DiagnosisVariant) -> String {
    // Base ratings arrive unclamped; the display floor differs per variant.
    let lo = match variant {
        DiagnosisVariant::Base => 1,
        DiagnosisVariant::Extended => 0,
    };
    let filled = rating.clamp(lo, 5) as usize;
    let mut s = "★".repeat(filled);
    s.push_str(&"☆".repeat(5 - filled));
    s
}

/// Quote the okami, cap the quote, percent-encode both query parameters.
fn share_link(score: u8, okami_comment: &Option<String>, app_public_url: &str) -> ShareLink {
    let quote = truncate_chars(okami_comment.as_deref().unwrap_or(""), SHARE_QUOTE_MAX_CHARS);
    let text =
        format!("【炎上リスク {score}%】京都の女将に『{quote}』と言われました... #炎上リスク診断");
    let url = format!(
        "https://twitter.com/intent/tweet?text={}&url={}",
        urlencoding::encode(&text),
        urlencoding::encode(app_public_url)
    );
    ShareLink { text, url }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut out: String = s.chars().take(max).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnose::normalize::PersonaCritiques;

    fn diag(score: u8) -> Diagnosis {
        let crit = |rating: i64, comment: &str| PersonaCritique {
            rating,
            comment: Some(comment.to_string()),
        };
        Diagnosis {
            score,
            detected_language: Some("日本語".to_string()),
            critiques: PersonaCritiques {
                class_rep: crit(3, "配慮が足りません。"),
                kyoto_okami: crit(4, "ようまあ言わはりますなあ。"),
                reply_ojisan: crit(2, "FF外から失礼します。"),
                doxing_team: crit(1, "特定リスクは低いです。"),
            },
            regional: vec![
                RegionRisk {
                    region: "Japan".into(),
                    risk_score: 72,
                    reason: "国内では強い反発が予想されます。".into(),
                },
                RegionRisk {
                    region: "Europe".into(),
                    risk_score: 59,
                    reason: "関心は限定的です。".into(),
                },
            ],
            summary: "全体的に強気すぎます。".into(),
            rating_based_score: Some(50),
        }
    }

    const APP_URL: &str = "https://enjo.example.app";

    #[test]
    fn gauge_thresholds_match_the_band_edges() {
        assert_eq!(GaugeColor::for_score(80), GaugeColor::Red);
        assert_eq!(GaugeColor::for_score(79), GaugeColor::Orange);
        assert_eq!(GaugeColor::for_score(50), GaugeColor::Orange);
        assert_eq!(GaugeColor::for_score(49), GaugeColor::Green);
        assert_eq!(GaugeColor::for_score(0), GaugeColor::Green);
    }

    #[test]
    fn headline_carries_the_percent_score() {
        let r = render_report(&diag(64), DiagnosisVariant::Extended, APP_URL);
        assert_eq!(r.headline, "判定結果: 炎上リスク 64%");
    }

    #[test]
    fn cards_keep_the_fixed_persona_order() {
        let r = render_report(&diag(10), DiagnosisVariant::Extended, APP_URL);
        let order: Vec<Persona> = r.cards.iter().map(|c| c.persona).collect();
        assert_eq!(
            order,
            vec![
                Persona::ClassRep,
                Persona::KyotoOkami,
                Persona::ReplyOjisan,
                Persona::DoxingTeam
            ]
        );
        assert_eq!(r.cards[1].emoji, "👘");
        assert_eq!(r.cards[1].stars, "★★★★☆");
    }

    #[test]
    fn missing_comment_gets_the_placeholder_on_the_card_only() {
        let mut d = diag(10);
        d.critiques.kyoto_okami.comment = None;
        let r = render_report(&d, DiagnosisVariant::Extended, APP_URL);
        assert_eq!(r.cards[1].comment, "コメントなし");
        // The share text quotes the absent comment as empty.
        assert!(r.share.text.contains("『』"));
    }

    #[test]
    fn base_star_floor_is_one_even_for_zero() {
        assert_eq!(stars(0, DiagnosisVariant::Base), "★☆☆☆☆");
        assert_eq!(stars(9, DiagnosisVariant::Base), "★★★★★");
        assert_eq!(stars(-2, DiagnosisVariant::Base), "★☆☆☆☆");
    }

    #[test]
    fn extended_star_floor_is_zero() {
        assert_eq!(stars(0, DiagnosisVariant::Extended), "☆☆☆☆☆");
        assert_eq!(stars(5, DiagnosisVariant::Extended), "★★★★★");
    }

    #[test]
    fn warnings_start_at_the_threshold() {
        let r = render_report(&diag(70), DiagnosisVariant::Extended, APP_URL);
        assert_eq!(r.warnings.len(), 1);
        assert_eq!(r.warnings[0].region, "Japan");
        assert_eq!(r.warnings[0].reason, "国内では強い反発が予想されます。");
    }

    #[test]
    fn base_variant_renders_no_chart() {
        let mut d = diag(40);
        d.regional.clear();
        d.detected_language = None;
        d.rating_based_score = None;
        let r = render_report(&d, DiagnosisVariant::Base, APP_URL);
        assert!(r.regional_chart.is_none());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn extended_chart_pins_the_axis_to_percent() {
        let r = render_report(&diag(40), DiagnosisVariant::Extended, APP_URL);
        let chart = r.regional_chart.expect("extended renders a chart");
        assert_eq!((chart.y_min, chart.y_max), (0, 100));
        assert_eq!(chart.bars.len(), 2);
    }

    #[test]
    fn long_okami_quote_is_cut_at_thirty_chars() {
        let mut d = diag(88);
        d.critiques.kyoto_okami.comment = Some("あ".repeat(31));
        let r = render_report(&d, DiagnosisVariant::Extended, APP_URL);
        let expected = format!("{}...", "あ".repeat(30));
        assert!(r.share.text.contains(&expected));
        assert!(!r.share.text.contains(&"あ".repeat(31)));

        d.critiques.kyoto_okami.comment = Some("あ".repeat(30));
        let r = render_report(&d, DiagnosisVariant::Extended, APP_URL);
        assert!(r.share.text.contains(&format!("『{}』", "あ".repeat(30))));
    }

    #[test]
    fn share_url_is_fully_percent_encoded() {
        let r = render_report(&diag(88), DiagnosisVariant::Extended, APP_URL);
        assert!(r
            .share
            .url
            .starts_with("https://twitter.com/intent/tweet?text="));
        assert!(r.share.url.contains("&url=https%3A%2F%2Fenjo.example.app"));
        // No raw multibyte or bracket characters may survive in the query.
        assert!(r.share.url.is_ascii());
        assert!(!r.share.url.contains('【'));
    }
}
