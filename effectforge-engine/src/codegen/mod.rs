//! JavaScript generation.

pub mod templates;

use std::collections::HashMap;

use effectforge_store::{EffectType, Platform};
use serde::Serialize;
use serde_json::Value;

use crate::decision::EffectPlan;
use crate::error::TemplateError;
use crate::optimizer::EffectParameters;
use crate::template::Template;

/// Generated module source and the name of the class it defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    pub class_name: String,
    pub source: String,
}

/// `init()`/`step(dt)` block for an effect type.
pub const fn members_for(effect_type: EffectType) -> &'static str {
    match effect_type {
        EffectType::ParticleEmitter => templates::PARTICLE_EMITTER_MEMBERS,
        EffectType::Precipitation => templates::PRECIPITATION_MEMBERS,
        EffectType::Starfield => templates::STARFIELD_MEMBERS,
        EffectType::WaveLines => templates::WAVE_LINES_MEMBERS,
        EffectType::GradientShift => templates::GRADIENT_SHIFT_MEMBERS,
        EffectType::TextReveal => templates::TEXT_REVEAL_MEMBERS,
        EffectType::CursorTrail => templates::CURSOR_TRAIL_MEMBERS,
        EffectType::Ripple => templates::RIPPLE_MEMBERS,
    }
}

/// "blazing  particle-emitter 2" -> "BlazingParticleEmitter2".
pub fn pascal_case(name: &str) -> String {
    let mut out = String::new();
    for word in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() {
        return "Custom".to_owned();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "Fx");
    }
    out
}

pub fn class_name(name: &str) -> String {
    let base = pascal_case(name);
    if base.ends_with("Effect") {
        base
    } else {
        format!("{base}Effect")
    }
}

/// Name of the React component wrapping the class. Never equal to
/// [`class_name`], since both are declared in the same module.
pub fn component_name(name: &str) -> String {
    let class = class_name(name);
    match class.strip_suffix("Effect") {
        Some(base) if !base.is_empty() => base.to_owned(),
        _ => format!("{class}Component"),
    }
}

/// Make user text safe to place inside a `/* */` block on one line.
pub fn sanitize_comment(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("*/", "* /")
}

fn js_number(value: f32) -> String {
    let rounded = (f64::from(value) * 1000.0).round() / 1000.0;
    // avoid "-0"
    if rounded == 0.0 {
        return "0".to_owned();
    }
    rounded.to_string()
}

fn js_string(value: &str) -> String {
    Value::from(value).to_string()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsGenerator;

impl JsGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        plan: &EffectPlan,
        params: &EffectParameters,
        description: &str,
        platform: Platform,
    ) -> Result<GeneratedCode, TemplateError> {
        let class_name = class_name(&plan.name);

        let mut values: HashMap<String, String> = HashMap::new();
        let mut set = |key: &str, value: String| {
            values.insert(key.to_owned(), value);
        };
        set("name", sanitize_comment(&plan.name));
        set("description", sanitize_comment(description));
        set("effect_type", plan.effect_type.as_str().to_owned());
        set("class_name", class_name.clone());
        set("count", params.count.to_string());
        set("speed", js_number(params.speed));
        set("size", js_number(params.size));
        set("lifetime", js_number(params.lifetime));
        set("gravity", js_number(params.gravity));
        set("wind", js_number(params.wind));
        set("spread", js_number(params.spread));
        set("opacity", js_number(params.opacity));
        set("glow", js_number(params.glow));
        set("fade", js_number(params.fade));
        set("amplitude", js_number(params.amplitude));
        set("frequency", js_number(params.frequency));
        set("colors", Value::from(params.colors.clone()).to_string());
        set("background", js_string(&params.background));
        set("text", js_string(&params.text));
        set(
            "members",
            Template::parse(members_for(plan.effect_type))?.render(&HashMap::new())?,
        );

        let class_source = Template::parse(templates::CANVAS_CLASS)?.render(&values)?;
        values.insert("class_source".to_owned(), class_source);

        let module = match platform {
            Platform::Canvas => templates::CANVAS_MODULE,
            Platform::React => {
                values.insert("component_name".to_owned(), component_name(&plan.name));
                templates::REACT_MODULE
            }
        };
        let source = Template::parse(module)?.render(&values)?;

        Ok(GeneratedCode { class_name, source })
    }
}
