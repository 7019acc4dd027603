//! Cascading selection state machine for the akvio query editor.
//!
//! Four ordered levels — MasterDevice → Device → Topic → DataKey — where
//! each level's valid choices depend on the previous level's selection.
//! This crate owns the logic that keeps them consistent:
//!
//! - **[`CascadeController`]** — Central facade. Seeds level state from
//!   the persisted selection, runs the one-time rehydration chain on
//!   [`initialize()`](CascadeController::initialize), cascades clearing
//!   and re-fetching on selection changes, and publishes a
//!   [`CascadeSnapshot`] through a `watch` channel after every transition.
//!
//! - **[`QueryStore`]** — The persisted selection (single source of
//!   truth) plus the commit signal that re-runs dependent computation.
//!   [`MemoryQueryStore`] is the in-process implementation.
//!
//! - **[`OptionProvider`]** — Async seam supplying candidate lists per
//!   level. `akvio-api` implements it over HTTP; tests script it.
//!
//! - Debounced search — keystrokes for the two searchable levels are
//!   coalesced to one fetch per 250 ms pause, with duplicate suppression.
//!
//! Overlapping fetches are resolved with per-level generation counters:
//! a load superseded by a cascade reset can never overwrite newer state.

pub mod controller;
pub mod debounce;
pub mod model;
pub mod provider;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use controller::{CascadeController, CascadeSnapshot};
pub use debounce::SEARCH_DEBOUNCE;
pub use model::{
    Device, DomainRef, LevelPhase, LevelState, Levels, PersistedSelection, RehydrationPhase,
    SelectableItem, SelectionLevel, SelectionPatch,
};
pub use provider::{DeviceFilter, OptionProvider, ProviderError};
pub use store::{MemoryQueryStore, QueryStore};
