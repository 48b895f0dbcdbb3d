//! "Poetic" text transformation
//!
//! Whispers are stored next to a stylized version of themselves. The
//! stylization is a random pick from a fixed set of templates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Turns a user's text into its stylized form
pub trait Transformer: Send + Sync {
    fn transform(&self, text: &str) -> String;
}

const TEMPLATES: &[&str] = &[
    "In the hush between heartbeats: {}",
    "Softly, the wind carries this: {}",
    "Beneath a paper moon, someone whispers {}",
    "Like ink in rain: {}",
    "A secret folded into the dusk. {}",
    "Echoes drift across still water: {}",
    "Where the quiet things gather, {}",
    "Written on the back of a falling leaf: {}",
];

/// Picks a random template per call
pub struct TemplateTransformer {
    rng: Mutex<StdRng>,
}

impl TemplateTransformer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic template choice for tests and previews
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn templates() -> &'static [&'static str] {
        TEMPLATES
    }
}

impl Default for TemplateTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for TemplateTransformer {
    fn transform(&self, text: &str) -> String {
        let text = text.trim();
        let template = {
            // A poisoned lock still holds a usable rng
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            TEMPLATES.choose(&mut *rng).copied().unwrap_or("{}")
        };
        template.replacen("{}", text, 1)
    }
}

/// Returns the text unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTransformer;

impl Transformer for IdentityTransformer {
    fn transform(&self, text: &str) -> String {
        text.trim().to_string()
    }
}
