//! Keyword analysis of effect descriptions.
//!
//! Descriptions are lowercased and split into alphanumeric tokens. Each token
//! is matched against a fixed table of concepts; the number of tokens hitting a
//! concept determines its confidence. Colors, size/speed/density/intensity
//! modifiers, an explicit element count and quoted text are extracted on the
//! side.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::EngineError;

static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{Alphabetic}\p{N}]+").unwrap());

static COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[0-9a-f]{6}\b|[a-z]+").unwrap());

static COUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,6})\s+(?:[a-z]+\s+)?(?:particles?|stars?|drops?|raindrops?|flakes?|snowflakes?|dots?|sparks?|bubbles?|embers?|lines?|waves?|points?|rings?|circles?)\b",
    )
    .unwrap()
});

static QUOTED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]{1,80})"|“([^”]{1,80})”"#).unwrap());

/// A keyword may be followed by at most this many extra characters
/// ("flames", "glowing").
const MAX_SUFFIX: usize = 3;

const MODIFIER_MIN: f32 = 0.1;
const MODIFIER_MAX: f32 = 5.0;

/// Something a description can talk about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    Fire,
    Water,
    Rain,
    Snow,
    Smoke,
    Sparkle,
    Stars,
    Explosion,
    Glow,
    Wave,
    Ripple,
    Trail,
    Gradient,
    Text,
    Particles,
    Electric,
}

impl Concept {
    pub const ALL: [Concept; 16] = [
        Concept::Fire,
        Concept::Water,
        Concept::Rain,
        Concept::Snow,
        Concept::Smoke,
        Concept::Sparkle,
        Concept::Stars,
        Concept::Explosion,
        Concept::Glow,
        Concept::Wave,
        Concept::Ripple,
        Concept::Trail,
        Concept::Gradient,
        Concept::Text,
        Concept::Particles,
        Concept::Electric,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Water => "water",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Smoke => "smoke",
            Self::Sparkle => "sparkle",
            Self::Stars => "stars",
            Self::Explosion => "explosion",
            Self::Glow => "glow",
            Self::Wave => "wave",
            Self::Ripple => "ripple",
            Self::Trail => "trail",
            Self::Gradient => "gradient",
            Self::Text => "text",
            Self::Particles => "particles",
            Self::Electric => "electric",
        }
    }

    pub const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Fire => &["fire", "flame", "blaze", "ember", "burn", "inferno", "torch"],
            Self::Water => &["water", "ocean", "sea", "aqua", "liquid", "underwater"],
            Self::Rain => &["rain", "raindrop", "drizzle", "storm", "downpour", "shower"],
            Self::Snow => &["snow", "snowflake", "blizzard", "frost", "winter", "ice"],
            Self::Smoke => &["smoke", "fog", "mist", "haze", "steam", "vapor"],
            Self::Sparkle => &["sparkle", "glitter", "shimmer", "twinkle", "magic", "fairy"],
            Self::Stars => &["star", "starfield", "galaxy", "space", "cosmic", "night"],
            Self::Explosion => &["explosion", "explode", "burst", "firework", "blast", "boom"],
            Self::Glow => &["glow", "neon", "light", "luminous", "radiant", "halo"],
            Self::Wave => &["wave", "sine", "oscillate", "flow", "undulate", "ribbon"],
            Self::Ripple => &["ripple", "splash", "pond", "droplet", "click"],
            Self::Trail => &["trail", "cursor", "mouse", "comet", "tail", "follow"],
            Self::Gradient => &["gradient", "aurora", "sunset", "hue", "blend", "background"],
            Self::Text => &["text", "title", "letter", "word", "typewriter", "heading"],
            Self::Particles => &["particle", "dust", "dot", "confetti", "bubble", "swarm"],
            Self::Electric => &["electric", "lightning", "spark", "plasma", "thunder", "energy"],
        }
    }

    /// Adjective used when naming an effect after this concept.
    pub const fn adjective(self) -> &'static str {
        match self {
            Self::Fire => "Blazing",
            Self::Water => "Flowing",
            Self::Rain => "Stormy",
            Self::Snow => "Frosty",
            Self::Smoke => "Misty",
            Self::Sparkle => "Sparkling",
            Self::Stars => "Cosmic",
            Self::Explosion => "Explosive",
            Self::Glow => "Glowing",
            Self::Wave => "Undulating",
            Self::Ripple => "Rippling",
            Self::Trail => "Trailing",
            Self::Gradient => "Shifting",
            Self::Text => "Animated",
            Self::Particles => "Drifting",
            Self::Electric => "Electric",
        }
    }
}

/// A concept found in a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMatch {
    pub concept: Concept,
    /// Number of tokens that hit the concept.
    pub hits: u32,
    pub confidence: f32,
    /// The tokens that matched, in order of appearance.
    pub matched: Vec<String>,
}

/// Multipliers pulled from adjectives such as "slow" or "huge".
///
/// 1.0 means the description said nothing about that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Modifiers {
    pub speed: f32,
    pub density: f32,
    pub size: f32,
    pub intensity: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed: 1.0,
            density: 1.0,
            size: 1.0,
            intensity: 1.0,
        }
    }
}

impl Modifiers {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&mut self, kind: ModifierKind, factor: f32) {
        let slot = match kind {
            ModifierKind::Speed => &mut self.speed,
            ModifierKind::Density => &mut self.density,
            ModifierKind::Size => &mut self.size,
            ModifierKind::Intensity => &mut self.intensity,
        };
        *slot = (*slot * factor).clamp(MODIFIER_MIN, MODIFIER_MAX);
    }
}

#[derive(Debug, Clone, Copy)]
enum ModifierKind {
    Speed,
    Density,
    Size,
    Intensity,
}

const MODIFIER_WORDS: &[(&str, ModifierKind, f32)] = &[
    ("slow", ModifierKind::Speed, 0.5),
    ("slowly", ModifierKind::Speed, 0.5),
    ("gentle", ModifierKind::Speed, 0.6),
    ("gently", ModifierKind::Speed, 0.6),
    ("lazy", ModifierKind::Speed, 0.5),
    ("calm", ModifierKind::Speed, 0.6),
    ("fast", ModifierKind::Speed, 2.0),
    ("quick", ModifierKind::Speed, 1.8),
    ("quickly", ModifierKind::Speed, 1.8),
    ("rapid", ModifierKind::Speed, 2.0),
    ("rapidly", ModifierKind::Speed, 2.0),
    ("swift", ModifierKind::Speed, 1.8),
    ("sparse", ModifierKind::Density, 0.5),
    ("few", ModifierKind::Density, 0.5),
    ("scattered", ModifierKind::Density, 0.6),
    ("dense", ModifierKind::Density, 1.8),
    ("many", ModifierKind::Density, 1.5),
    ("lots", ModifierKind::Density, 1.5),
    ("thick", ModifierKind::Density, 1.6),
    ("heavy", ModifierKind::Density, 1.8),
    ("tiny", ModifierKind::Size, 0.5),
    ("small", ModifierKind::Size, 0.7),
    ("little", ModifierKind::Size, 0.7),
    ("fine", ModifierKind::Size, 0.6),
    ("big", ModifierKind::Size, 1.6),
    ("large", ModifierKind::Size, 1.6),
    ("huge", ModifierKind::Size, 2.2),
    ("giant", ModifierKind::Size, 2.5),
    ("massive", ModifierKind::Size, 2.5),
    ("soft", ModifierKind::Intensity, 0.6),
    ("subtle", ModifierKind::Intensity, 0.5),
    ("faint", ModifierKind::Intensity, 0.5),
    ("dim", ModifierKind::Intensity, 0.6),
    ("pale", ModifierKind::Intensity, 0.7),
    ("bright", ModifierKind::Intensity, 1.5),
    ("intense", ModifierKind::Intensity, 1.7),
    ("vivid", ModifierKind::Intensity, 1.5),
    ("strong", ModifierKind::Intensity, 1.4),
    ("blazing", ModifierKind::Intensity, 1.6),
];

/// Words that strengthen the modifier directly after them.
const INTENSIFIERS: &[&str] = &["very", "extremely", "super", "really"];

const NAMED_COLORS: &[(&str, &str)] = &[
    ("red", "#ff4136"),
    ("orange", "#ff851b"),
    ("yellow", "#ffdc00"),
    ("green", "#2ecc40"),
    ("blue", "#0074d9"),
    ("purple", "#b10dc9"),
    ("pink", "#ff69b4"),
    ("white", "#ffffff"),
    ("black", "#111111"),
    ("gray", "#aaaaaa"),
    ("grey", "#aaaaaa"),
    ("gold", "#ffd700"),
    ("golden", "#ffd700"),
    ("silver", "#c0c0c0"),
    ("cyan", "#00ffff"),
    ("teal", "#39cccc"),
    ("magenta", "#ff00ff"),
    ("violet", "#8a2be2"),
    ("crimson", "#dc143c"),
    ("amber", "#ffbf00"),
    ("turquoise", "#40e0d0"),
];

/// Everything the later stages need to know about a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// The trimmed description.
    pub description: String,
    pub tokens: Vec<String>,
    /// Matched concepts, most confident first.
    pub concepts: Vec<ConceptMatch>,
    /// Hex colors in order of appearance, without duplicates.
    pub colors: Vec<String>,
    pub modifiers: Modifiers,
    /// An explicit element count such as "300 particles".
    pub count: Option<u32>,
    /// Quoted text, used by typography effects.
    pub text: Option<String>,
}

impl Analysis {
    pub fn primary_concept(&self) -> Option<Concept> {
        self.concepts.first().map(|m| m.concept)
    }

    pub fn has(&self, concept: Concept) -> bool {
        self.concepts.iter().any(|m| m.concept == concept)
    }
}

/// Confidence for a concept hit by `hits` tokens.
pub fn concept_confidence(hits: u32) -> f32 {
    if hits == 0 {
        return 0.0;
    }
    (0.55 + 0.15 * (hits - 1) as f32).min(1.0)
}

/// Length of `keyword` if `token` is that keyword or the keyword plus a
/// short suffix.
fn keyword_match(token: &str, keyword: &str) -> Option<usize> {
    if token.len() >= keyword.len()
        && token.len() - keyword.len() <= MAX_SUFFIX
        && token.starts_with(keyword)
    {
        Some(keyword.len())
    } else {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NlpProcessor;

impl NlpProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, text: &str) -> Result<Analysis, EngineError> {
        let description = text.trim();
        if description.is_empty() {
            return Err(EngineError::EmptyDescription);
        }
        let lower = description.to_lowercase();
        let tokens: Vec<String> = TOKEN_REGEX
            .find_iter(&lower)
            .map(|m| m.as_str().to_owned())
            .collect();

        Ok(Analysis {
            description: description.to_owned(),
            concepts: match_concepts(&tokens),
            colors: extract_colors(&lower),
            modifiers: extract_modifiers(&tokens),
            count: extract_count(&lower),
            text: extract_quoted(description),
            tokens,
        })
    }
}

fn match_concepts(tokens: &[String]) -> Vec<ConceptMatch> {
    let mut found: HashMap<Concept, Vec<String>> = HashMap::new();
    for token in tokens {
        // Only the longest matching keyword counts, so "sparkles" is a
        // sparkle and not an electric "spark".
        let mut best = 0;
        let mut winners: Vec<Concept> = Vec::new();
        for concept in Concept::ALL {
            let len = concept
                .keywords()
                .iter()
                .filter_map(|kw| keyword_match(token, kw))
                .max()
                .unwrap_or(0);
            if len == 0 || len < best {
                continue;
            }
            if len > best {
                best = len;
                winners.clear();
            }
            winners.push(concept);
        }
        for concept in winners {
            found.entry(concept).or_default().push(token.clone());
        }
    }

    let mut concepts: Vec<ConceptMatch> = found
        .into_iter()
        .map(|(concept, matched)| {
            let hits = matched.len() as u32;
            ConceptMatch {
                concept,
                hits,
                confidence: concept_confidence(hits),
                matched,
            }
        })
        .collect();
    concepts.sort_by(|a, b| b.hits.cmp(&a.hits).then(a.concept.cmp(&b.concept)));
    concepts
}

fn extract_colors(lower: &str) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for m in COLOR_REGEX.find_iter(lower) {
        let word = m.as_str();
        let hex = if word.starts_with('#') {
            Some(word)
        } else {
            NAMED_COLORS
                .iter()
                .find(|(name, _)| *name == word)
                .map(|(_, hex)| *hex)
        };
        if let Some(hex) = hex {
            if !colors.iter().any(|c| c == hex) {
                colors.push(hex.to_owned());
            }
        }
    }
    colors
}

fn extract_modifiers(tokens: &[String]) -> Modifiers {
    let mut modifiers = Modifiers::default();
    let mut boost = false;
    for token in tokens {
        if INTENSIFIERS.contains(&token.as_str()) {
            boost = true;
            continue;
        }
        if let Some((_, kind, factor)) = MODIFIER_WORDS.iter().find(|(w, _, _)| w == token) {
            let factor = if boost { factor * factor } else { *factor };
            modifiers.apply(*kind, factor);
        }
        boost = false;
    }
    modifiers
}

fn extract_count(lower: &str) -> Option<u32> {
    COUNT_REGEX
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

fn extract_quoted(description: &str) -> Option<String> {
    QUOTED_REGEX
        .captures(description)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> Analysis {
        NlpProcessor::new().analyze(text).unwrap()
    }

    #[test]
    fn empty_description_is_rejected() {
        assert!(matches!(
            NlpProcessor::new().analyze("   \n"),
            Err(EngineError::EmptyDescription)
        ));
    }

    #[test]
    fn matches_keywords_with_short_suffixes() {
        let a = analyze("Warm fire particles rising slowly with glowing embers");
        let fire = a.concepts.iter().find(|m| m.concept == Concept::Fire).unwrap();
        assert_eq!(fire.hits, 2);
        assert_eq!(fire.matched, vec!["fire", "embers"]);
        assert!((fire.confidence - 0.70).abs() < 1e-6);
        assert!(a.has(Concept::Particles));
        assert!(a.has(Concept::Glow));
        assert_eq!(a.primary_concept(), Some(Concept::Fire));
    }

    #[test]
    fn long_suffixes_do_not_match() {
        // "firework" is four characters past "fire"
        let a = analyze("fireworks");
        assert!(!a.has(Concept::Fire));
        assert!(a.has(Concept::Explosion));
    }

    #[test]
    fn longest_keyword_wins() {
        let a = analyze("sparkles");
        assert!(a.has(Concept::Sparkle));
        assert!(!a.has(Concept::Electric));
        let a = analyze("sparks");
        assert!(a.has(Concept::Electric));
    }

    #[test]
    fn confidence_is_capped() {
        assert_eq!(concept_confidence(0), 0.0);
        assert!((concept_confidence(1) - 0.55).abs() < 1e-6);
        assert!((concept_confidence(3) - 0.85).abs() < 1e-6);
        assert_eq!(concept_confidence(10), 1.0);
    }

    #[test]
    fn extracts_colors_in_order() {
        let a = analyze("Blue and GOLD sparkles with #FF00aa accents, blue again");
        assert_eq!(a.colors, vec!["#0074d9", "#ffd700", "#ff00aa"]);
    }

    #[test]
    fn extracts_modifiers() {
        let a = analyze("very slow, huge and subtle snow");
        assert!((a.modifiers.speed - 0.25).abs() < 1e-6);
        assert!((a.modifiers.size - 2.2).abs() < 1e-6);
        assert!((a.modifiers.intensity - 0.5).abs() < 1e-6);
        assert_eq!(a.modifiers.density, 1.0);
        assert!(analyze("snow").modifiers.is_neutral());
    }

    #[test]
    fn extracts_count_and_quoted_text() {
        let a = analyze("300 golden particles");
        assert_eq!(a.count, Some(300));
        assert_eq!(a.text, None);

        let a = analyze(r#"typewriter text reveal saying "Hello, world""#);
        assert_eq!(a.text.as_deref(), Some("Hello, world"));
        assert!(a.has(Concept::Text));
        assert_eq!(a.count, None);
    }

    #[test]
    fn non_ascii_letters_stay_in_one_token() {
        let a = analyze("néon fire über glow");
        assert_eq!(a.tokens, vec!["néon", "fire", "über", "glow"]);
        assert!(a.has(Concept::Fire));
    }
}
