//! Bundles the four external ports behind a single `Arc` so the Room
//! Registry and Room Actor can be constructed with one argument instead of
//! four, mirroring how `EnhancedGameServer` groups its collaborators.

use std::sync::Arc;

use super::{Clock, Identity, Persistence, Random, SystemClock, SystemRandom};

pub struct Ports {
    pub clock: Arc<dyn Clock>,
    pub identity: Arc<dyn Identity>,
    pub persistence: Arc<dyn Persistence>,
    pub random: Arc<dyn Random>,
}

impl Ports {
    pub fn new(
        identity: Arc<dyn Identity>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            identity,
            persistence,
            random: Arc::new(SystemRandom),
        }
    }
}
