//! Random identifiers, human-readable names, tokens and moods.
//!
//! Every generated primary key, nick and secret in the service comes from
//! here. Identifiers are alphanumeric; names are lowercase words joined
//! with `-`.

use rand::distr::{Alphanumeric, SampleString};
use rand::seq::IndexedRandom;

/// Length of generated `uid` / `eid` values.
pub const ID_LEN: usize = 17;

/// Length of the random suffix in spool and sidekick names.
pub const NAME_SUFFIX_LEN: usize = 13;

/// Length of the lowercase tag that ends every nick.
pub const NICK_TAG_LEN: usize = 4;

/// Length of generated bearer and mail tokens.
pub const TOKEN_LEN: usize = 32;

const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "autumn", "bold", "brave", "bright", "calm", "clever", "cosmic", "crimson",
    "curious", "dapper", "dusty", "eager", "electric", "fancy", "frosty", "gentle", "golden",
    "happy", "hidden", "icy", "jolly", "keen", "lively", "lucky", "mellow", "misty", "nimble",
    "noble", "patient", "polished", "proud", "quiet", "rapid", "rusty", "silent", "silver",
    "snowy", "spry", "steady", "sunny", "swift", "tidy", "velvet", "wandering", "wild", "witty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "brook", "canyon", "cedar", "comet", "cove", "crane", "delta", "ember",
    "falcon", "fern", "fjord", "galaxy", "garden", "glacier", "harbor", "hawk", "heron", "island",
    "lantern", "maple", "meadow", "mesa", "moon", "otter", "owl", "pebble", "pine", "planet",
    "prairie", "quartz", "raven", "reef", "river", "sparrow", "spruce", "summit", "thicket",
    "tiger", "trail", "tundra", "valley", "voyager", "willow", "wolf", "wren", "zephyr",
];

/// Labels randomly assigned to new sidekicks.
pub const MOODS: &[&str] = &[
    "happy",
    "curious",
    "playful",
    "thoughtful",
    "sleepy",
    "grumpy",
    "cheerful",
    "focused",
    "mischievous",
    "serene",
];

/// Returns a random alphanumeric string of `size` characters.
#[must_use]
pub fn random_string(size: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), size)
}

/// Returns a human-readable name of `words` words joined by `-`.
///
/// All words but the last are adjectives; the last is a noun, e.g.
/// `"misty-golden-heron"`.
#[must_use]
pub fn random_name(words: usize) -> String {
    let mut rng = rand::rng();
    let mut parts: Vec<&str> = Vec::with_capacity(words);
    for i in 0..words {
        let pool = if i + 1 == words { NOUNS } else { ADJECTIVES };
        if let Some(word) = pool.choose(&mut rng) {
            parts.push(*word);
        }
    }
    parts.join("-")
}

/// Returns a nick: a [`random_name`] of `words` words followed by a short
/// lowercase alphanumeric tag, e.g. `"calm-owl-x7k2"`.
#[must_use]
pub fn random_nick(words: usize) -> String {
    let tag = random_string(NICK_TAG_LEN).to_ascii_lowercase();
    if words == 0 {
        return tag;
    }
    format!("{}-{tag}", random_name(words))
}

/// Returns an opaque bearer token.
#[must_use]
pub fn generate_token() -> String {
    random_string(TOKEN_LEN)
}

/// Picks a mood label for a new sidekick.
#[must_use]
pub fn random_mood() -> &'static str {
    MOODS.choose(&mut rand::rng()).copied().unwrap_or("happy")
}
