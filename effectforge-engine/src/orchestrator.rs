//! Runs the synthesis stages in order.

use std::collections::BTreeSet;

use effectforge_store::{NewEffect, Platform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::codegen::{GeneratedCode, JsGenerator};
use crate::decision::{DecisionEngine, EffectPlan};
use crate::error::EngineError;
use crate::nlp::{Analysis, NlpProcessor};
use crate::optimizer::{EffectParameters, ParameterOptimizer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisOptions {
    /// Overrides the generated display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A description to turn into an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub description: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub options: SynthesisOptions,
}

impl SynthesisRequest {
    pub fn new(description: impl Into<String>, platform: Platform) -> Self {
        Self {
            description: description.into(),
            platform,
            options: SynthesisOptions::default(),
        }
    }
}

/// Output of every stage for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    pub analysis: Analysis,
    pub plan: EffectPlan,
    pub parameters: EffectParameters,
    pub code: GeneratedCode,
    #[serde(skip)]
    user_tags: Vec<String>,
}

impl Synthesis {
    /// Concepts, the type slug and user tags; lowercase, deduplicated, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: BTreeSet<String> = self
            .analysis
            .concepts
            .iter()
            .map(|m| m.concept.as_str().to_owned())
            .collect();
        tags.insert(self.plan.effect_type.as_str().to_owned());
        tags.extend(
            self.user_tags
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
        tags.into_iter().collect()
    }

    pub fn into_new_effect(self, source_job_id: Option<Uuid>) -> NewEffect {
        let tags = self.tags();
        let parameters = serde_json::to_value(&self.parameters).unwrap_or(Value::Null);
        NewEffect {
            name: self.plan.name,
            description: self.analysis.description,
            effect_type: self.plan.effect_type,
            platform: self.plan.platform,
            code: self.code.source,
            parameters,
            tags,
            complexity: self.plan.complexity,
            confidence: self.plan.confidence,
            source_job_id,
        }
    }
}

/// The four synthesis stages wired together.
///
/// Each stage is also exposed on its own so callers can report progress
/// between them.
#[derive(Debug, Default, Clone)]
pub struct Orchestrator {
    nlp: NlpProcessor,
    decision: DecisionEngine,
    optimizer: ParameterOptimizer,
    generator: JsGenerator,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, description: &str) -> Result<Analysis, EngineError> {
        self.nlp.analyze(description)
    }

    /// Pick the effect type; a non-blank `name` replaces the generated one.
    pub fn plan(&self, analysis: &Analysis, platform: Platform, name: Option<&str>) -> EffectPlan {
        let mut plan = self.decision.decide(analysis, platform);
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            plan.name = name.to_owned();
        }
        plan
    }

    pub fn optimize(&self, plan: &EffectPlan, analysis: &Analysis) -> EffectParameters {
        self.optimizer.optimize(plan, analysis)
    }

    pub fn generate(
        &self,
        plan: &EffectPlan,
        parameters: &EffectParameters,
        analysis: &Analysis,
    ) -> Result<GeneratedCode, EngineError> {
        Ok(self
            .generator
            .generate(plan, parameters, &analysis.description, plan.platform)?)
    }

    pub fn assemble(
        &self,
        analysis: Analysis,
        plan: EffectPlan,
        parameters: EffectParameters,
        code: GeneratedCode,
        options: &SynthesisOptions,
    ) -> Synthesis {
        Synthesis {
            analysis,
            plan,
            parameters,
            code,
            user_tags: options.tags.clone(),
        }
    }

    /// Run every stage without pausing.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<Synthesis, EngineError> {
        let analysis = self.analyze(&request.description)?;
        let plan = self.plan(&analysis, request.platform, request.options.name.as_deref());
        let parameters = self.optimize(&plan, &analysis);
        let code = self.generate(&plan, &parameters, &analysis)?;
        debug!(
            effect_type = %plan.effect_type,
            platform = %plan.platform,
            confidence = plan.confidence,
            "synthesized effect"
        );
        Ok(self.assemble(analysis, plan, parameters, code, &request.options))
    }
}
