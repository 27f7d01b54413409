//! Descriptions used to seed an empty library.

use effectforge_store::Platform;

use crate::orchestrator::SynthesisRequest;

pub const SAMPLE_DESCRIPTIONS: &[(&str, Platform)] = &[
    ("Warm fire particles rising slowly with glowing embers", Platform::Canvas),
    ("Heavy rain storm with fast blue streaks", Platform::Canvas),
    ("Gentle snow falling on a quiet winter night", Platform::Canvas),
    ("A dense starfield flying through deep space", Platform::Canvas),
    ("Calm ocean waves in teal and turquoise", Platform::Canvas),
    ("Slow aurora gradient background in violet and green", Platform::Canvas),
    (r#"Typewriter text reveal saying "Hello, world""#, Platform::React),
    ("Glowing neon cursor trail in pink and cyan", Platform::React),
    ("Ripples spreading on a pond when you click", Platform::Canvas),
    ("Golden firework explosion with bright sparkles", Platform::Canvas),
];

pub fn sample_requests() -> impl Iterator<Item = SynthesisRequest> {
    SAMPLE_DESCRIPTIONS
        .iter()
        .map(|(description, platform)| SynthesisRequest::new(*description, *platform))
}
