//! Seeds derived from human-readable labels.
//!
//! The same label always yields the same seed, so a run can be reproduced
//! from a name instead of a list of state words.

use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;
use tracing::debug;

use crate::creator::StreamCreator;
use crate::error::{Error, Result};
use crate::generator::Generator;

/// Candidates drawn before giving up on a label.
const MAX_ATTEMPTS: usize = 64;

/// Derive a valid seed for `G` from `label`.
pub fn state_from_label<G: Generator>(label: &str) -> Result<G::State> {
    let mut rng: ChaCha8Rng = Seeder::from(label).make_rng();
    for attempt in 0..MAX_ATTEMPTS {
        let candidate = G::seed_candidate(&mut rng);
        if G::validate_seed(&candidate).is_ok() {
            debug!(generator = G::NAME, label, attempt, "derived seed from label");
            return Ok(candidate);
        }
    }
    Err(Error::InvalidSeed(format!(
        "state_from_label(): no valid {} seed after {MAX_ATTEMPTS} candidates for label {label:?}",
        G::NAME
    )))
}

/// A default-spaced creator whose base state is derived from `label`.
pub fn creator_from_label<G: Generator>(label: &str) -> Result<StreamCreator<G>> {
    StreamCreator::with_seed(state_from_label::<G>(label)?)
}
