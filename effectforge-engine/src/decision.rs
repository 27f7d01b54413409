//! Picks an effect type for an analysed description.

use effectforge_store::{EffectCategory, EffectType, Platform};
use serde::Serialize;

use crate::nlp::{Analysis, Concept};

/// Confidence reported when no concept was recognised.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// How strongly a concept suggests each effect type.
fn affinities(concept: Concept) -> &'static [(EffectType, f32)] {
    use EffectType::*;
    match concept {
        Concept::Fire => &[(ParticleEmitter, 1.0), (GradientShift, 0.3)],
        Concept::Water => &[(WaveLines, 0.8), (Ripple, 0.6), (Precipitation, 0.3)],
        Concept::Rain => &[(Precipitation, 1.0)],
        Concept::Snow => &[(Precipitation, 1.0), (ParticleEmitter, 0.2)],
        Concept::Smoke => &[(ParticleEmitter, 0.7), (GradientShift, 0.4)],
        Concept::Sparkle => &[(ParticleEmitter, 0.6), (Starfield, 0.5), (CursorTrail, 0.3)],
        Concept::Stars => &[(Starfield, 1.0)],
        Concept::Explosion => &[(ParticleEmitter, 0.9)],
        Concept::Glow => &[(GradientShift, 0.5), (CursorTrail, 0.3), (TextReveal, 0.2)],
        Concept::Wave => &[(WaveLines, 1.0)],
        Concept::Ripple => &[(Ripple, 1.0)],
        Concept::Trail => &[(CursorTrail, 1.0)],
        Concept::Gradient => &[(GradientShift, 1.0)],
        Concept::Text => &[(TextReveal, 1.2)],
        Concept::Particles => &[(ParticleEmitter, 0.8), (Precipitation, 0.2), (Starfield, 0.2)],
        Concept::Electric => &[(ParticleEmitter, 0.5), (WaveLines, 0.5)],
    }
}

pub fn affinity(concept: Concept, effect_type: EffectType) -> f32 {
    affinities(concept)
        .iter()
        .find(|(t, _)| *t == effect_type)
        .map_or(0.0, |(_, weight)| *weight)
}

const fn base_complexity(effect_type: EffectType) -> u8 {
    match effect_type {
        EffectType::ParticleEmitter | EffectType::CursorTrail => 5,
        EffectType::Precipitation | EffectType::WaveLines | EffectType::Ripple => 4,
        EffectType::Starfield | EffectType::TextReveal => 3,
        EffectType::GradientShift => 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeScore {
    pub effect_type: EffectType,
    pub score: f32,
}

/// What the generator should build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPlan {
    pub effect_type: EffectType,
    pub category: EffectCategory,
    pub platform: Platform,
    /// 0.3 to 1.0.
    pub confidence: f32,
    /// 1 to 10.
    pub complexity: u8,
    pub name: String,
    /// The concept the name and palette are taken from.
    pub primary_concept: Option<Concept>,
    /// Non-zero scores, best first.
    pub scores: Vec<TypeScore>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(&self, analysis: &Analysis, platform: Platform) -> EffectPlan {
        let scores: Vec<TypeScore> = EffectType::ALL
            .into_iter()
            .map(|effect_type| TypeScore {
                effect_type,
                score: analysis
                    .concepts
                    .iter()
                    .map(|m| m.confidence * affinity(m.concept, effect_type))
                    .sum(),
            })
            .collect();

        // strictly greater, so ties keep the earlier type
        let best = scores
            .iter()
            .copied()
            .fold(None::<TypeScore>, |best, s| match best {
                Some(b) if b.score >= s.score => Some(b),
                _ if s.score > 0.0 => Some(s),
                other => other,
            });

        let Some(best) = best else {
            return self.fallback(analysis, platform);
        };

        let total: f32 = scores.iter().map(|s| s.score).sum();
        let share = best.score / total;
        let confidence = round2((share * best.score.min(1.0)).clamp(FALLBACK_CONFIDENCE, 1.0));

        let primary_concept = analysis
            .concepts
            .iter()
            .map(|m| m.concept)
            .find(|c| affinity(*c, best.effect_type) > 0.0)
            .or_else(|| analysis.primary_concept());

        let mut ranked: Vec<TypeScore> = scores.into_iter().filter(|s| s.score > 0.0).collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        EffectPlan {
            effect_type: best.effect_type,
            category: best.effect_type.category(),
            platform,
            confidence,
            complexity: complexity(best.effect_type, analysis, platform),
            name: display_name(primary_concept, best.effect_type),
            primary_concept,
            scores: ranked,
        }
    }

    fn fallback(&self, analysis: &Analysis, platform: Platform) -> EffectPlan {
        let effect_type = EffectType::ParticleEmitter;
        EffectPlan {
            effect_type,
            category: effect_type.category(),
            platform,
            confidence: FALLBACK_CONFIDENCE,
            complexity: complexity(effect_type, analysis, platform),
            name: display_name(None, effect_type),
            primary_concept: None,
            scores: Vec::new(),
        }
    }
}

fn complexity(effect_type: EffectType, analysis: &Analysis, platform: Platform) -> u8 {
    let extra_concepts = analysis.concepts.len().saturating_sub(1).min(3) as u8;
    let mut value = base_complexity(effect_type) + extra_concepts;
    if !analysis.modifiers.is_neutral() {
        value += 1;
    }
    if platform == Platform::React {
        value += 1;
    }
    value.clamp(1, 10)
}

fn display_name(concept: Option<Concept>, effect_type: EffectType) -> String {
    let adjective = concept.map_or("Custom", Concept::adjective);
    format!("{adjective} {}", effect_type.title())
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
