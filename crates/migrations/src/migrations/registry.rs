//! Migration Registry - Explicit list of known migrations
//!
//! Migrations are registered once, in the order they must run, and the
//! migrator instantiates them from here.

use std::collections::HashSet;

use super::definitions::Migration;
use crate::error::{MigrationError, MigrationResult};

type MigrationConstructor = Box<dyn Fn() -> Box<dyn Migration> + Send + Sync>;

/// Ordered collection of migration constructors
#[derive(Default)]
pub struct MigrationRegistry {
    constructors: Vec<MigrationConstructor>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration type constructed through `Default`
    pub fn register<M>(&mut self) -> &mut Self
    where
        M: Migration + Default + 'static,
    {
        self.register_with(|| Box::new(M::default()))
    }

    /// Register a migration built by a custom constructor
    pub fn register_with<F>(&mut self, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Migration> + Send + Sync + 'static,
    {
        self.constructors.push(Box::new(constructor));
        self
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Versions of every registered migration, in registration order
    pub fn versions(&self) -> Vec<String> {
        self.constructors
            .iter()
            .map(|constructor| constructor().version().to_string())
            .collect()
    }

    /// Build a fresh instance of every registered migration
    pub fn instantiate(&self) -> Vec<Box<dyn Migration>> {
        self.constructors.iter().map(|constructor| constructor()).collect()
    }

    /// Check that no two registered migrations share a version
    pub fn validate(&self) -> MigrationResult<()> {
        let mut seen = HashSet::new();
        for version in self.versions() {
            if !seen.insert(version.clone()) {
                return Err(MigrationError::VersionConflict(format!(
                    "version '{}' is registered more than once",
                    version
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationRegistry")
            .field("versions", &self.versions())
            .finish()
    }
}
