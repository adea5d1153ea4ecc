use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::job::Runnable;

/// Collects statically linked jobs during startup.
///
/// Registration happens only here; [`JobRegistryBuilder::build`] closes it and
/// hands back a read-only [`JobRegistry`].
#[derive(Default)]
pub struct JobRegistryBuilder {
    jobs: HashMap<String, Arc<dyn Runnable>>,
}

impl JobRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` under `name`. Names are unique and case-sensitive.
    pub fn register(
        mut self,
        name: impl Into<String>,
        job: impl Runnable + 'static,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.jobs.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(job_name = %name, "Registered job");
        self.jobs.insert(name, Arc::new(job));
        Ok(self)
    }

    pub fn build(self) -> JobRegistry {
        JobRegistry { jobs: self.jobs }
    }
}

/// Read-only mapping from job name to a statically linked implementation.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, Arc<dyn Runnable>>,
}

impl JobRegistry {
    pub fn builder() -> JobRegistryBuilder {
        JobRegistryBuilder::new()
    }

    /// Exact-match lookup. A miss is not an error; it sends resolution to the
    /// plugin loader.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Runnable>> {
        self.jobs.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRegistry")
            .field("jobs", &self.names())
            .finish()
    }
}
