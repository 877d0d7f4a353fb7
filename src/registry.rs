//! Name → step lookup for routes declared by name, such as those in a
//! route table file.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::middleware::Step;
use crate::router::RouterError;

/// Registry of named steps.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    steps: HashMap<String, Step>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `step` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, step: Step) -> &mut Self {
        let name = name.into();
        if self.steps.insert(name.clone(), step).is_some() {
            warn!(name = %name, "Replacing previously registered step");
        } else {
            debug!(name = %name, "Step registered");
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.steps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up middleware names for `path`, failing on the first unknown one.
    pub(crate) fn resolve_all<S: AsRef<str>>(
        &self,
        path: &str,
        names: &[S],
    ) -> Result<Vec<Step>, RouterError> {
        names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| RouterError::UnknownMiddleware {
                        path: path.to_owned(),
                        name: name.as_ref().to_owned(),
                    })
            })
            .collect()
    }
}
