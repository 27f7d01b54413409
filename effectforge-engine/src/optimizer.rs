//! Turns a plan into concrete animation parameters.
//!
//! Parameters start from per-type defaults, then each matched concept nudges
//! them, then the description's modifiers scale them, and finally explicit
//! counts and colors override. Every field is clamped before it leaves.

use std::f32::consts::TAU;

use effectforge_store::EffectType;
use serde::Serialize;

use crate::decision::EffectPlan;
use crate::nlp::{Analysis, Concept};

pub const MAX_COUNT: u32 = 5000;
pub const MAX_COLORS: usize = 6;
pub const MAX_TEXT_CHARS: usize = 80;
pub const DEFAULT_TEXT: &str = "EffectForge";

/// Values substituted into the generated code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectParameters {
    /// Particles, drops, stars, lines, trail points or rings, depending on type.
    pub count: u32,
    pub speed: f32,
    /// Radius, line width or font size.
    pub size: f32,
    /// Seconds an element lives.
    pub lifetime: f32,
    pub gravity: f32,
    pub wind: f32,
    /// Emission cone in radians.
    pub spread: f32,
    pub opacity: f32,
    /// Shadow blur in pixels.
    pub glow: f32,
    /// Background alpha painted each frame; low values leave trails.
    pub fade: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub colors: Vec<String>,
    pub background: String,
    pub text: String,
}

impl EffectParameters {
    /// Starting point for `effect_type` before any tweaks.
    pub fn defaults_for(effect_type: EffectType) -> Self {
        let base = Self {
            count: 150,
            speed: 2.0,
            size: 3.0,
            lifetime: 2.5,
            gravity: 0.0,
            wind: 0.0,
            spread: 0.6,
            opacity: 0.9,
            glow: 0.0,
            fade: 0.25,
            amplitude: 0.0,
            frequency: 0.01,
            colors: vec!["#ffffff".to_owned()],
            background: "#000000".to_owned(),
            text: DEFAULT_TEXT.to_owned(),
        };
        match effect_type {
            EffectType::ParticleEmitter => Self {
                gravity: -0.02,
                ..base
            },
            EffectType::Precipitation => Self {
                count: 300,
                speed: 6.0,
                size: 2.0,
                gravity: 0.2,
                wind: 0.5,
                fade: 0.4,
                colors: vec!["#a4c8ff".to_owned()],
                background: "#0b1020".to_owned(),
                ..base
            },
            EffectType::Starfield => Self {
                count: 400,
                speed: 1.0,
                size: 1.5,
                fade: 0.6,
                colors: vec!["#ffffff".to_owned(), "#cfe8ff".to_owned()],
                background: "#02030a".to_owned(),
                ..base
            },
            EffectType::WaveLines => Self {
                count: 5,
                speed: 1.0,
                size: 2.0,
                fade: 1.0,
                amplitude: 40.0,
                frequency: 0.015,
                colors: vec!["#4facfe".to_owned(), "#00f2fe".to_owned()],
                background: "#050a18".to_owned(),
                ..base
            },
            EffectType::GradientShift => Self {
                count: 3,
                speed: 0.5,
                fade: 1.0,
                opacity: 1.0,
                colors: vec![
                    "#ff7e5f".to_owned(),
                    "#feb47b".to_owned(),
                    "#6a82fb".to_owned(),
                ],
                ..base
            },
            EffectType::TextReveal => Self {
                count: 1,
                speed: 1.0,
                size: 48.0,
                lifetime: 2.0,
                fade: 1.0,
                opacity: 1.0,
                ..base
            },
            EffectType::CursorTrail => Self {
                count: 40,
                speed: 1.0,
                size: 6.0,
                lifetime: 1.0,
                fade: 0.3,
                colors: vec!["#ff6ec7".to_owned(), "#7873f5".to_owned()],
                ..base
            },
            EffectType::Ripple => Self {
                count: 8,
                speed: 2.0,
                size: 2.0,
                lifetime: 2.0,
                fade: 0.2,
                amplitude: 120.0,
                colors: vec!["#66ccff".to_owned()],
                background: "#001122".to_owned(),
                ..base
            },
        }
    }

    fn clamp(&mut self) {
        self.count = self.count.clamp(1, MAX_COUNT);
        self.speed = self.speed.clamp(0.05, 20.0);
        self.size = self.size.clamp(0.5, 64.0);
        self.lifetime = self.lifetime.clamp(0.1, 30.0);
        self.gravity = self.gravity.clamp(-5.0, 5.0);
        self.wind = self.wind.clamp(-5.0, 5.0);
        self.spread = self.spread.clamp(0.0, TAU);
        self.opacity = self.opacity.clamp(0.05, 1.0);
        self.glow = self.glow.clamp(0.0, 40.0);
        self.fade = self.fade.clamp(0.02, 1.0);
        self.amplitude = self.amplitude.clamp(0.0, 400.0);
        self.frequency = self.frequency.clamp(0.001, 0.2);
        self.colors.truncate(MAX_COLORS);
        if self.colors.is_empty() {
            self.colors.push("#ffffff".to_owned());
        }
        if self.text.chars().count() > MAX_TEXT_CHARS {
            self.text = self.text.chars().take(MAX_TEXT_CHARS).collect();
        }
    }
}

fn palette(concept: Concept) -> Option<&'static [&'static str]> {
    let colors: &'static [&'static str] = match concept {
        Concept::Fire => &["#ff4500", "#ff8c00", "#ffd700"],
        Concept::Water => &["#1e90ff", "#00bfff", "#e0ffff"],
        Concept::Rain => &["#a4c8ff", "#7fa7d9"],
        Concept::Snow => &["#ffffff", "#e6f2ff"],
        Concept::Smoke => &["#888888", "#bbbbbb"],
        Concept::Sparkle => &["#fffacd", "#ffd700", "#ffffff"],
        Concept::Stars => &["#ffffff", "#cfe8ff", "#fff4e0"],
        Concept::Explosion => &["#ff4500", "#ffd700", "#ffffff"],
        Concept::Electric => &["#7df9ff", "#ffffff", "#b19cd9"],
        Concept::Gradient => &["#ff7e5f", "#feb47b", "#86a8e7", "#91eae4"],
        _ => return None,
    };
    Some(colors)
}

fn apply_concept(params: &mut EffectParameters, concept: Concept) {
    match concept {
        Concept::Fire => {
            params.gravity -= 0.08;
            params.glow += 8.0;
        }
        Concept::Water => {
            params.amplitude *= 1.2;
            params.speed *= 0.9;
        }
        Concept::Rain => {
            params.gravity += 0.15;
            params.size *= 0.8;
            params.wind += 0.3;
        }
        Concept::Snow => {
            params.speed *= 0.4;
            params.gravity = 0.03;
            params.wind += 0.2;
        }
        Concept::Smoke => {
            params.opacity *= 0.5;
            params.size *= 3.0;
            params.speed *= 0.5;
            params.lifetime *= 1.5;
        }
        Concept::Sparkle => {
            params.glow += 10.0;
            params.size *= 0.7;
        }
        Concept::Stars => {
            params.glow += 4.0;
        }
        Concept::Explosion => {
            params.speed *= 2.5;
            params.spread = TAU;
            params.lifetime *= 0.6;
            params.gravity += 0.1;
        }
        Concept::Glow => {
            params.glow += 15.0;
            params.fade *= 0.6;
        }
        Concept::Wave => {
            params.amplitude *= 1.3;
        }
        Concept::Ripple => {
            params.lifetime *= 1.2;
        }
        Concept::Trail => {
            params.fade *= 0.5;
            params.lifetime *= 1.3;
        }
        Concept::Gradient => {
            params.speed *= 0.8;
        }
        Concept::Text => {}
        Concept::Particles => {
            params.count = (params.count as f32 * 1.2).round() as u32;
        }
        Concept::Electric => {
            params.speed *= 1.8;
            params.glow += 12.0;
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterOptimizer;

impl ParameterOptimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn optimize(&self, plan: &EffectPlan, analysis: &Analysis) -> EffectParameters {
        let mut params = EffectParameters::defaults_for(plan.effect_type);

        for m in &analysis.concepts {
            apply_concept(&mut params, m.concept);
        }

        let m = analysis.modifiers;
        params.speed *= m.speed;
        params.count = (params.count as f32 * m.density).round() as u32;
        params.size *= m.size;
        params.opacity *= m.intensity;
        params.glow *= m.intensity;

        if let Some(count) = analysis.count {
            params.count = count;
        }

        if !analysis.colors.is_empty() {
            params.colors = analysis.colors.clone();
        } else if let Some(colors) = plan
            .primary_concept
            .into_iter()
            .chain(analysis.concepts.iter().map(|m| m.concept))
            .find_map(palette)
        {
            params.colors = colors.iter().map(|c| (*c).to_owned()).collect();
        }

        if let Some(text) = &analysis.text {
            params.text = text.clone();
        }

        params.clamp();
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionEngine;
    use crate::nlp::NlpProcessor;
    use effectforge_store::Platform;

    fn optimize(text: &str) -> (EffectPlan, EffectParameters) {
        let analysis = NlpProcessor::new().analyze(text).unwrap();
        let plan = DecisionEngine::new().decide(&analysis, Platform::Canvas);
        let params = ParameterOptimizer::new().optimize(&plan, &analysis);
        (plan, params)
    }

    #[test]
    fn fire_rises_and_glows_in_fire_colors() {
        let (_, params) = optimize("fire");
        assert!(params.gravity < 0.0);
        assert!(params.glow > 0.0);
        assert_eq!(params.colors, vec!["#ff4500", "#ff8c00", "#ffd700"]);
    }

    #[test]
    fn modifiers_scale_defaults() {
        let (_, base) = optimize("fire");
        let (_, slow) = optimize("slow fire");
        assert!((slow.speed - base.speed * 0.5).abs() < 1e-5);
        let (_, dense) = optimize("dense fire");
        assert_eq!(dense.count, 270);
    }

    #[test]
    fn explicit_values_override() {
        let (_, params) = optimize("red and #00ff00 fire with 300 particles");
        assert_eq!(params.count, 300);
        assert_eq!(params.colors, vec!["#ff4136", "#00ff00"]);

        let (plan, params) = optimize(r#"text reveal "Launch day""#);
        assert_eq!(plan.effect_type, EffectType::TextReveal);
        assert_eq!(params.text, "Launch day");
    }

    #[test]
    fn values_are_clamped() {
        let (_, params) = optimize("999999 particles, extremely fast explosion");
        assert_eq!(params.count, MAX_COUNT);
        assert!(params.speed <= 20.0);
        assert!(params.spread <= TAU);

        let (_, params) = optimize("very subtle faint smoke");
        assert!(params.opacity >= 0.05);
    }

    #[test]
    fn defaults_are_within_range() {
        for t in EffectType::ALL {
            let mut params = EffectParameters::defaults_for(t);
            let before = params.clone();
            params.clamp();
            assert_eq!(params, before, "defaults for {t} should already be in range");
        }
    }
}
