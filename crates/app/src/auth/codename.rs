//! Human-readable default token descriptions.

use rand::{Rng, rngs::OsRng, seq::SliceRandom};

/// Longest description the service will store.
pub const MAX_DESCRIPTION_CHARS: usize = 64;

const ADJECTIVES: &[&str] = &[
    "amber", "brave", "calm", "clever", "crimson", "daring", "eager", "fuzzy", "gentle",
    "golden", "hidden", "humble", "jolly", "keen", "lively", "lucky", "mellow", "misty",
    "nimble", "quiet", "rapid", "rusty", "silent", "silver", "sleepy", "swift", "tidy",
    "velvet", "witty", "zesty",
];

const ANIMALS: &[&str] = &[
    "badger", "beaver", "bison", "crane", "falcon", "ferret", "gecko", "heron", "ibex",
    "jackal", "koala", "lemur", "lynx", "marmot", "marten", "newt", "ocelot", "orca", "otter",
    "owl", "panda", "puffin", "quokka", "raven", "salmon", "stoat", "tapir", "walrus", "wombat",
    "yak",
];

/// Generate an `adjective-animal-NNNN` label.
#[must_use]
pub fn generate_codename() -> String {
    let mut rng = OsRng;

    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("otter");
    let suffix: u16 = rng.gen_range(0..10_000);

    format!("{adjective}-{animal}-{suffix:04}")
}

/// Trim a caller-supplied description, falling back to a codename when blank.
#[must_use]
pub fn description_or_codename(description: Option<&str>) -> String {
    match description.map(str::trim) {
        Some(description) if !description.is_empty() => {
            description.chars().take(MAX_DESCRIPTION_CHARS).collect()
        }
        _ => generate_codename(),
    }
}
