//! Records kept in the effect library.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Target the generated code is written for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// A standalone ES class drawing onto a `<canvas>`.
    #[default]
    Canvas,
    /// The canvas class wrapped in a React function component.
    React,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Canvas, Platform::React];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::React => "react",
        }
    }

    /// File extension used when the code is downloaded.
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::Canvas => "js",
            Self::React => "jsx",
        }
    }
}

/// Broad grouping used for browsing the library.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    Particles,
    Motion,
    Ambient,
    Typography,
    Interactive,
}

impl EffectCategory {
    pub const ALL: [EffectCategory; 5] = [
        EffectCategory::Particles,
        EffectCategory::Motion,
        EffectCategory::Ambient,
        EffectCategory::Typography,
        EffectCategory::Interactive,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Particles => "particles",
            Self::Motion => "motion",
            Self::Ambient => "ambient",
            Self::Typography => "typography",
            Self::Interactive => "interactive",
        }
    }
}

/// The concrete effect a piece of generated code implements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    ParticleEmitter,
    Precipitation,
    Starfield,
    WaveLines,
    GradientShift,
    TextReveal,
    CursorTrail,
    Ripple,
}

impl EffectType {
    pub const ALL: [EffectType; 8] = [
        EffectType::ParticleEmitter,
        EffectType::Precipitation,
        EffectType::Starfield,
        EffectType::WaveLines,
        EffectType::GradientShift,
        EffectType::TextReveal,
        EffectType::CursorTrail,
        EffectType::Ripple,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParticleEmitter => "particle_emitter",
            Self::Precipitation => "precipitation",
            Self::Starfield => "starfield",
            Self::WaveLines => "wave_lines",
            Self::GradientShift => "gradient_shift",
            Self::TextReveal => "text_reveal",
            Self::CursorTrail => "cursor_trail",
            Self::Ripple => "ripple",
        }
    }

    /// Human-readable title, e.g. "Particle Emitter".
    pub const fn title(self) -> &'static str {
        match self {
            Self::ParticleEmitter => "Particle Emitter",
            Self::Precipitation => "Precipitation",
            Self::Starfield => "Starfield",
            Self::WaveLines => "Wave Lines",
            Self::GradientShift => "Gradient Shift",
            Self::TextReveal => "Text Reveal",
            Self::CursorTrail => "Cursor Trail",
            Self::Ripple => "Ripple",
        }
    }

    pub const fn category(self) -> EffectCategory {
        match self {
            Self::ParticleEmitter | Self::Precipitation | Self::Starfield => {
                EffectCategory::Particles
            }
            Self::WaveLines => EffectCategory::Motion,
            Self::GradientShift => EffectCategory::Ambient,
            Self::TextReveal => EffectCategory::Typography,
            Self::CursorTrail | Self::Ripple => EffectCategory::Interactive,
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| format!(concat!("unknown ", $what, ": {}"), s))
            }
        }
    };
}

impl_str_enum!(Platform, "platform");
impl_str_enum!(EffectCategory, "category");
impl_str_enum!(EffectType, "effect type");

/// A generated code artifact stored in the library.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub effect_type: EffectType,
    pub category: EffectCategory,
    pub platform: Platform,
    pub code: String,
    /// Hex-encoded SHA-256 of `code`.
    pub code_hash: String,
    pub parameters: Value,
    pub tags: Vec<String>,
    pub complexity: u8,
    pub confidence: f32,
    pub rating: f32,
    pub rating_count: u32,
    pub downloads: u64,
    pub source_job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`crate::EffectRepository::insert`].
#[derive(Debug, Clone)]
pub struct NewEffect {
    pub name: String,
    pub description: String,
    pub effect_type: EffectType,
    pub platform: Platform,
    pub code: String,
    pub parameters: Value,
    pub tags: Vec<String>,
    pub complexity: u8,
    pub confidence: f32,
    pub source_job_id: Option<Uuid>,
}

/// Lifecycle of a batch upload. Only moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// An entry of an upload that could not be turned into an effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadError {
    /// 1-based position of the entry in the uploaded file.
    pub entry: usize,
    pub message: String,
}

/// A batch of descriptions submitted together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: usize,
    pub status: UploadStatus,
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<UploadError>,
    pub job_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Entries whose outcome is already counted in `processed`.
    #[serde(skip)]
    pub(crate) counted: BTreeSet<usize>,
}

impl Upload {
    /// Move to a terminal state once every entry has been accounted for.
    /// Count the outcome of `entry`, replacing an earlier outcome for it.
    pub(crate) fn record(&mut self, entry: usize, outcome: Result<(), String>) {
        if self.counted.insert(entry) {
            self.processed += 1;
        } else {
            self.forget_error(entry);
        }
        if let Err(message) = outcome {
            self.failed += 1;
            self.errors.push(UploadError { entry, message });
        }
        self.settle();
    }

    /// Stop counting `entry` so a later outcome can take its place.
    pub(crate) fn reopen(&mut self, entry: usize) {
        if self.counted.remove(&entry) {
            self.processed -= 1;
            self.forget_error(entry);
        }
    }

    fn forget_error(&mut self, entry: usize) {
        if let Some(pos) = self.errors.iter().position(|e| e.entry == entry) {
            self.errors.remove(pos);
            self.failed -= 1;
        }
    }

    pub(crate) fn settle(&mut self) {
        if self.status.is_terminal() || self.processed < self.total {
            return;
        }
        self.status = if self.failed >= self.total {
            UploadStatus::Failed
        } else {
            UploadStatus::Completed
        };
    }
}

/// Input for [`crate::UploadRepository::create`].
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub filename: String,
    pub size_bytes: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_loosely() {
        assert_eq!("React".parse::<Platform>(), Ok(Platform::React));
        assert_eq!(
            "wave-lines".parse::<EffectType>(),
            Ok(EffectType::WaveLines)
        );
        assert_eq!(
            " typography ".parse::<EffectCategory>(),
            Ok(EffectCategory::Typography)
        );
        assert!("svg".parse::<Platform>().is_err());
    }

    #[test]
    fn every_type_has_a_category() {
        for t in EffectType::ALL {
            let c = t.category();
            assert!(EffectCategory::ALL.contains(&c));
            assert_eq!(t.as_str().parse::<EffectType>(), Ok(t));
        }
        assert_eq!(EffectType::Ripple.category(), EffectCategory::Interactive);
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_value(EffectType::CursorTrail).unwrap(),
            serde_json::json!("cursor_trail")
        );
        assert_eq!(
            serde_json::to_value(UploadStatus::Processing).unwrap(),
            serde_json::json!("processing")
        );
    }
}
