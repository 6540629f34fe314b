use std::sync::Arc;

use crate::{AlphaBeta, Greedy, Minimax, Mobility, RandomMover, Strategy};

/// Named bots available to a server, in registration order.
///
/// Names are case-sensitive and unique; registering a name twice replaces
/// the earlier strategy but keeps its position.
#[derive(Clone, Default)]
pub struct BotRoster {
    entries: Vec<(String, Arc<dyn Strategy>)>,
}

impl BotRoster {
    /// An empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock line-up.
    pub fn standard() -> Self {
        Self::new()
            .with("David", Greedy)
            .with("Roger", Mobility)
            .with("Minnie", Minimax::new(3))
            .with("Sasha senior", AlphaBeta::new(6))
            .with("Sasha junior", AlphaBeta::new(5))
            .with("Sasha intern", AlphaBeta::new(4))
            .with("Random", RandomMover::new(None))
    }

    /// Adds or replaces a bot.
    pub fn with(mut self, name: impl Into<String>, strategy: impl Strategy + 'static) -> Self {
        self.insert(name, Arc::new(strategy));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, strategy: Arc<dyn Strategy>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = strategy,
            None => self.entries.push((name, strategy)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, strategy)| Arc::clone(strategy))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for BotRoster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotRoster")
            .field("names", &self.names())
            .finish()
    }
}
