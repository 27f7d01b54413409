use effectforge_backend::state::AppState;
use effectforge_engine::samples::sample_requests;

/// Fill an empty library with the built-in sample effects.
///
/// Returns how many were added; a library that already has effects is left alone.
pub async fn seed_sample_library(state: &AppState) -> anyhow::Result<usize> {
    let summary = state.effects.summary().await?;
    if summary.total > 0 {
        tracing::info!(effects = summary.total, "library not empty; skipping samples");
        return Ok(0);
    }

    let mut seeded = 0;
    for request in sample_requests() {
        match state.orchestrator.synthesize(&request) {
            Ok(synthesis) => {
                state.effects.insert(synthesis.into_new_effect(None)).await?;
                seeded += 1;
            }
            Err(e) => {
                tracing::warn!(description = %request.description, error = %e, "sample failed to synthesize")
            }
        }
    }
    tracing::info!(seeded, "seeded sample library");
    Ok(seeded)
}
