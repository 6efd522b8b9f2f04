//! Process-wide engine state with an explicit init/reset lifecycle.
//!
//! The loaded class table, zone catalog and spatial index are bundled into
//! an immutable [`EngineContext`]. [`EngineState`] holds at most one context
//! at a time; readers clone the `Arc` and never block each other.

use std::sync::{Arc, PoisonError, RwLock};

use lcz_map_scenario::ThermalDeltaModel;
use lcz_map_spatial::SpatialIndex;
use lcz_map_zone::{ClassTable, ZoneBackend, ZoneCatalog, ZoneError};
use thiserror::Error;

use crate::config::EngineConfig;

/// Errors from the engine state lifecycle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// [`EngineState::get`] was called before [`EngineState::init`].
    #[error("Engine state has not been initialized")]
    NotInitialized,

    /// [`EngineState::init`] was called on an initialized state.
    #[error("Engine state is already initialized; reset it first")]
    AlreadyInitialized,
}

/// Everything derived from one zone source, ready for analysis.
#[derive(Debug)]
pub struct EngineContext {
    /// Active configuration.
    pub config: EngineConfig,
    /// Class table the catalog was built with.
    pub classes: ClassTable,
    /// Literature offsets over `classes`.
    pub model: ThermalDeltaModel,
    /// Ingested zones.
    pub catalog: ZoneCatalog,
    /// R-tree over `catalog`.
    pub index: SpatialIndex,
}

impl EngineContext {
    /// Wraps an already built catalog.
    #[must_use]
    pub fn new(config: EngineConfig, classes: ClassTable, catalog: ZoneCatalog) -> Self {
        let model = ThermalDeltaModel::new(&classes);
        let index = SpatialIndex::build(&catalog);
        Self {
            config,
            classes,
            model,
            catalog,
            index,
        }
    }

    /// Validates the configuration, ingests the source and indexes it.
    ///
    /// # Errors
    ///
    /// Returns a [`ZoneError`] if the configuration is inconsistent with the
    /// class table or ingestion fails.
    pub fn build<B: ZoneBackend + ?Sized>(
        config: EngineConfig,
        classes: ClassTable,
        source: &B,
    ) -> Result<Self, ZoneError> {
        config.validate(&classes)?;
        let catalog = ZoneCatalog::build(source, &classes)?;
        Ok(Self::new(config, classes, catalog))
    }
}

/// Holder for the single shared [`EngineContext`].
///
/// There is one writer at a time: `init` installs a context and `reset`
/// removes it. A context, once installed, is never mutated.
#[derive(Debug, Default)]
pub struct EngineState {
    inner: RwLock<Option<Arc<EngineContext>>>,
}

impl EngineState {
    /// Creates an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Installs a context.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::AlreadyInitialized`] if a context is installed.
    pub fn init(&self, context: EngineContext) -> Result<Arc<EngineContext>, StateError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(StateError::AlreadyInitialized);
        }
        let context = Arc::new(context);
        *guard = Some(Arc::clone(&context));
        drop(guard);

        log::info!(
            "Engine initialized with {} zones ({} backend)",
            context.catalog.len(),
            context.catalog.backend()
        );
        Ok(context)
    }

    /// Returns the installed context.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NotInitialized`] if no context is installed.
    pub fn get(&self) -> Result<Arc<EngineContext>, StateError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StateError::NotInitialized)
    }

    /// Whether a context is installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Removes and returns the installed context, if any.
    ///
    /// Readers holding the previous `Arc` keep a consistent view.
    pub fn reset(&self) -> Option<Arc<EngineContext>> {
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            log::info!("Engine state reset");
        }
        previous
    }
}
