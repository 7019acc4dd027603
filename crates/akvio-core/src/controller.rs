// ── Cascade controller ──
//
// Orchestrates the four-level selection cascade: which downstream
// selections are invalidated per user action, which option lists are
// re-fetched, and how loading state stays consistent while fetches
// overlap. Mediates between the OptionProvider, the QueryStore, and
// whatever surface renders the levels.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::debounce::{SEARCH_DEBOUNCE, SearchPipe};
use crate::model::{
    Levels, RehydrationPhase, SelectableItem, SelectionLevel, SelectionPatch,
};
use crate::model::LevelPhase;
use crate::provider::{DeviceFilter, OptionProvider};
use crate::store::QueryStore;

// ── Snapshot ─────────────────────────────────────────────────────────

/// Immutable view of the controller state, re-published through a
/// `watch` channel after every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSnapshot {
    pub levels: Levels,
    pub rehydration: RehydrationPhase,
}

// ── Controller ───────────────────────────────────────────────────────

/// The cascade state machine. Cheaply cloneable via `Arc` — clones share
/// state, which is what lets selection handlers and search-pipe tasks
/// mutate the same levels.
#[derive(Clone)]
pub struct CascadeController {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn OptionProvider>,
    store: Arc<dyn QueryStore>,
    state: Mutex<CascadeState>,
    snapshot: watch::Sender<CascadeSnapshot>,
    cancel: CancellationToken,
    pipes: OnceLock<SearchPipes>,
}

struct SearchPipes {
    master: SearchPipe,
    device: SearchPipe,
}

struct CascadeState {
    levels: Levels,
    rehydration: RehydrationPhase,
    /// Identity of the data source the levels were initialized against.
    source_id: Option<String>,
    /// Per-level fetch generations. A load captures its level's
    /// generation when issued and applies its result only if the
    /// generation is unchanged, so a fetch that was superseded by a
    /// cascade reset can never overwrite newer state.
    generations: [u64; 4],
}

impl CascadeController {
    /// Build a controller over a provider and store, seeding level state
    /// from the currently persisted selection. Does not fetch anything —
    /// call [`initialize`](Self::initialize) to run the rehydration pass.
    pub fn new(provider: Arc<dyn OptionProvider>, store: Arc<dyn QueryStore>) -> Self {
        Self::with_debounce(provider, store, SEARCH_DEBOUNCE)
    }

    /// Like [`new`](Self::new) with an explicit search debounce window.
    pub fn with_debounce(
        provider: Arc<dyn OptionProvider>,
        store: Arc<dyn QueryStore>,
        debounce: Duration,
    ) -> Self {
        let levels = Levels::seed(&store.current());
        let snapshot = CascadeSnapshot {
            levels: levels.clone(),
            rehydration: RehydrationPhase::Pending,
        };
        let (snapshot_tx, _) = watch::channel(snapshot);

        let controller = Self {
            inner: Arc::new(Inner {
                provider,
                store,
                state: Mutex::new(CascadeState {
                    levels,
                    rehydration: RehydrationPhase::Pending,
                    source_id: None,
                    generations: [0; 4],
                }),
                snapshot: snapshot_tx,
                cancel: CancellationToken::new(),
                pipes: OnceLock::new(),
            }),
        };

        controller.spawn_search_pipes(debounce);
        controller
    }

    /// Wire up one debounce pipe per searchable level. The pipe tasks
    /// hold controller clones and live until [`shutdown`](Self::shutdown).
    fn spawn_search_pipes(&self, debounce: Duration) {
        let master = {
            let ctrl = self.clone();
            SearchPipe::spawn(
                "master-device",
                debounce,
                self.inner.cancel.child_token(),
                move |text| {
                    let ctrl = ctrl.clone();
                    Box::pin(async move {
                        ctrl.load_master_options(non_empty(text), false).await;
                    })
                },
            )
        };

        let device = {
            let ctrl = self.clone();
            SearchPipe::spawn(
                "device",
                debounce,
                self.inner.cancel.child_token(),
                move |text| {
                    let ctrl = ctrl.clone();
                    Box::pin(async move {
                        // A device search is only meaningful under a selected
                        // master — its domain narrows the candidate listing.
                        let Some(master) = ctrl.inner.store.current().master_device else {
                            return;
                        };
                        ctrl.load_device_options(
                            non_empty(text),
                            DeviceFilter::for_master(&master),
                            false,
                        )
                        .await;
                    })
                },
            )
        };

        let _ = self.inner.pipes.set(SearchPipes { master, device });
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to state snapshots. A new value is published after
    /// every transition.
    pub fn subscribe(&self) -> watch::Receiver<CascadeSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> CascadeSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// The query store this controller persists into.
    pub fn store(&self) -> &Arc<dyn QueryStore> {
        &self.inner.store
    }

    /// Stop the search-pipe tasks. In-flight fetches are not cancelled;
    /// their results are dropped by the generation guard if stale.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn publish(&self, state: &CascadeState) {
        self.inner.snapshot.send_replace(CascadeSnapshot {
            levels: state.levels.clone(),
            rehydration: state.rehydration,
        });
    }

    // ── Initialization / rehydration ─────────────────────────────────

    /// Run the rehydration pass against the given data-source identity.
    ///
    /// No-op when a master/device load is already in flight, a chain is
    /// already running, or the identity is unchanged since the last pass
    /// started — mount and render can call this repeatedly. When the
    /// identity genuinely changes after a completed pass, all levels and
    /// persisted fields are hard-reset first (update without commit).
    ///
    /// With a complete persisted selection the chain is strictly
    /// sequential: master options → device options → topics → data keys,
    /// stopping at the first failure (downstream stages never run, no
    /// automatic retry, the surface stays usable). Without one, only
    /// master options are loaded and rehydration completes immediately.
    pub async fn initialize(&self, source_id: &str) {
        {
            let mut state = self.inner.state.lock().await;

            let master_loading = state.levels.get(SelectionLevel::MasterDevice).phase.is_loading();
            let device_loading = state.levels.get(SelectionLevel::Device).phase.is_loading();
            if master_loading || device_loading || state.rehydration == RehydrationPhase::InProgress
            {
                debug!("initialization skipped: load already in flight");
                return;
            }
            if state.source_id.as_deref() == Some(source_id)
                && state.rehydration.is_complete()
            {
                return;
            }

            if state.rehydration.is_complete() {
                debug!(source_id, "data source changed, resetting all levels");
                for level in SelectionLevel::ALL {
                    state.levels.reset(level);
                }
                for generation in &mut state.generations {
                    *generation += 1;
                }
                self.inner.store.update(SelectionPatch::clear_all());
            }

            state.source_id = Some(source_id.to_owned());
            state.rehydration = RehydrationPhase::InProgress;
            self.publish(&state);
        }

        let persisted = self.inner.store.current();

        if !self.load_master_options(None, true).await {
            self.finish_rehydration(RehydrationPhase::Pending).await;
            return;
        }

        if persisted.is_complete() {
            let (Some(master), Some(device_id), Some(topic)) = (
                persisted.master_device.clone(),
                persisted.device_id.clone(),
                persisted.topic.clone(),
            ) else {
                // Complete ids but no master payload to filter by — nothing
                // further can be rehydrated.
                self.finish_rehydration(RehydrationPhase::Complete).await;
                return;
            };

            let chain_ok = self
                .load_device_options(None, DeviceFilter::for_master(&master), true)
                .await
                && self.load_topic_options(device_id.clone(), true).await
                && self.load_data_key_options(device_id, topic).await;

            if !chain_ok {
                self.finish_rehydration(RehydrationPhase::Pending).await;
                return;
            }
        }

        self.finish_rehydration(RehydrationPhase::Complete).await;
        debug!(source_id, "initial loading complete");
    }

    /// Close out a rehydration pass. A failed chain drops back to
    /// `Pending` so a later mount or identity change can run again.
    async fn finish_rehydration(&self, phase: RehydrationPhase) {
        let mut state = self.inner.state.lock().await;
        state.rehydration = phase;
        self.publish(&state);
    }

    // ── Selection changes ────────────────────────────────────────────

    /// A master device was picked. Re-selecting the current value is a
    /// no-op; otherwise every downstream level is cleared synchronously
    /// (before any fetch resolves), the selection is persisted and
    /// committed, and device candidates are re-fetched under the new
    /// master's domain.
    pub async fn select_master_device(&self, item: SelectableItem) {
        let current = self.inner.store.current();
        if current.master_device_id.as_deref() == Some(item.key.as_str()) {
            return;
        }
        let Some(master) = item.device.clone() else {
            warn!(key = %item.key, "master selection without device payload ignored");
            return;
        };

        {
            let mut state = self.inner.state.lock().await;
            for level in SelectionLevel::MasterDevice.downstream() {
                state.generations[level.index()] += 1;
                state.levels.reset(*level);
            }
            state.levels.set_value(SelectionLevel::MasterDevice, Some(item));
            self.inner.store.update(SelectionPatch::master_device(master.clone()));
            self.inner.store.commit();
            self.publish(&state);
        }

        self.load_device_options(None, DeviceFilter::for_master(&master), true)
            .await;
    }

    /// A device was picked: clear topic/data-key, persist, commit,
    /// re-fetch topics for the device.
    pub async fn select_device(&self, item: SelectableItem) {
        let current = self.inner.store.current();
        if current.device_id.as_deref() == Some(item.key.as_str()) {
            return;
        }
        let Some(device) = item.device.clone() else {
            warn!(key = %item.key, "device selection without device payload ignored");
            return;
        };

        {
            let mut state = self.inner.state.lock().await;
            for level in SelectionLevel::Device.downstream() {
                state.generations[level.index()] += 1;
                state.levels.reset(*level);
            }
            state.levels.set_value(SelectionLevel::Device, Some(item));
            self.inner.store.update(SelectionPatch::device(device.clone()));
            self.inner.store.commit();
            self.publish(&state);
        }

        self.load_topic_options(device.id, true).await;
    }

    /// A topic was picked: persist it (clearing the data key), commit,
    /// and load data keys when a device is selected to load them for.
    pub async fn select_topic(&self, item: SelectableItem) {
        let current = self.inner.store.current();
        if current.topic.as_deref() == Some(item.key.as_str()) {
            return;
        }

        {
            let mut state = self.inner.state.lock().await;
            state.generations[SelectionLevel::DataKey.index()] += 1;
            state.levels.reset(SelectionLevel::DataKey);
            state.levels.set_value(SelectionLevel::Topic, Some(item.clone()));
            self.inner.store.update(SelectionPatch::topic(item.key.clone()));
            self.inner.store.commit();
            self.publish(&state);
        }

        if let Some(device_id) = current.device_id {
            self.load_data_key_options(device_id, item.key).await;
        }
    }

    /// A data key was picked. Leaf level: persist and commit, no cascade.
    pub async fn select_data_key(&self, item: SelectableItem) {
        let current = self.inner.store.current();
        if current.data_key.as_deref() == Some(item.key.as_str()) {
            return;
        }

        let mut state = self.inner.state.lock().await;
        state.levels.set_value(SelectionLevel::DataKey, Some(item.clone()));
        self.inner.store.update(SelectionPatch::data_key(item.key));
        self.inner.store.commit();
        self.publish(&state);
    }

    // ── Search input ─────────────────────────────────────────────────

    /// Raw text change in the master-device search field.
    ///
    /// The loading indicator is raised only for non-empty text: the
    /// input re-delivers its confirmed text when it loses focus, and
    /// that re-delivery must not re-show a spinner.
    pub async fn master_search_changed(&self, text: &str) {
        if !text.is_empty() {
            let mut state = self.inner.state.lock().await;
            state.levels.set_phase(SelectionLevel::MasterDevice, LevelPhase::Loading);
            self.publish(&state);
        }
        if let Some(pipes) = self.inner.pipes.get() {
            pipes.master.push(text);
        }
    }

    /// Raw text change in the device search field.
    pub async fn device_search_changed(&self, text: &str) {
        if !text.is_empty() {
            let mut state = self.inner.state.lock().await;
            state.levels.set_phase(SelectionLevel::Device, LevelPhase::Loading);
            self.publish(&state);
        }
        if let Some(pipes) = self.inner.pipes.get() {
            pipes.device.push(text);
        }
    }

    // ── Loads ────────────────────────────────────────────────────────
    //
    // Each load captures its level's generation before suspending and
    // applies the result only if the generation still matches — a load
    // superseded by a cascade reset is discarded. On failure the phase
    // flips to Failed and options/value are left at last-good state; no
    // error propagates further.

    async fn load_master_options(&self, search: Option<String>, show_loading: bool) -> bool {
        let generation = self
            .begin_load(SelectionLevel::MasterDevice, show_loading)
            .await;

        let result = self.inner.provider.list_master_candidates(search).await;

        self.apply_device_listing(SelectionLevel::MasterDevice, generation, result)
            .await
    }

    async fn load_device_options(
        &self,
        search: Option<String>,
        filter: DeviceFilter,
        show_loading: bool,
    ) -> bool {
        let generation = self.begin_load(SelectionLevel::Device, show_loading).await;

        let result = self
            .inner
            .provider
            .list_device_candidates(search, filter)
            .await;

        self.apply_device_listing(SelectionLevel::Device, generation, result)
            .await
    }

    /// Fetch topics for a device.
    ///
    /// Steady state (rehydration complete) means the topic list changed
    /// under an existing selection, so the current topic and data key
    /// are cleared and that clearing is committed. During rehydration
    /// the same load only seeds the options list — clearing would erase
    /// the very value being rehydrated.
    async fn load_topic_options(&self, device_id: String, show_loading: bool) -> bool {
        let generation = self.begin_load(SelectionLevel::Topic, show_loading).await;

        let result = self.inner.provider.list_topics(device_id).await;

        let mut state = self.inner.state.lock().await;
        if state.generations[SelectionLevel::Topic.index()] != generation {
            debug!("stale topic load discarded");
            return false;
        }

        match result {
            Ok(topics) => {
                let options = topics.into_iter().map(SelectableItem::plain).collect();
                if state.rehydration.is_complete() {
                    state.levels.set_value(SelectionLevel::Topic, None);
                    state.generations[SelectionLevel::DataKey.index()] += 1;
                    state.levels.reset(SelectionLevel::DataKey);
                    self.inner.store.update(SelectionPatch::clear_topic_and_data_key());
                    self.inner.store.commit();
                }
                state.levels.set_options(SelectionLevel::Topic, options);
                self.publish(&state);
                true
            }
            Err(error) => {
                warn!(%error, "topic load failed");
                state.levels.set_phase(SelectionLevel::Topic, LevelPhase::Failed);
                self.publish(&state);
                false
            }
        }
    }

    /// Fetch data keys for a device + topic. In steady state a refreshed
    /// key list also drops the currently selected key (the persisted key
    /// was already cleared by whichever action triggered this load).
    async fn load_data_key_options(&self, device_id: String, topic: String) -> bool {
        let generation = self.begin_load(SelectionLevel::DataKey, true).await;

        let result = self.inner.provider.list_data_keys(device_id, topic).await;

        let mut state = self.inner.state.lock().await;
        if state.generations[SelectionLevel::DataKey.index()] != generation {
            debug!("stale data-key load discarded");
            return false;
        }

        match result {
            Ok(keys) => {
                let options = keys.into_iter().map(SelectableItem::plain).collect();
                if state.rehydration.is_complete() {
                    state.levels.set_value(SelectionLevel::DataKey, None);
                }
                state.levels.set_options(SelectionLevel::DataKey, options);
                self.publish(&state);
                true
            }
            Err(error) => {
                warn!(%error, "data key load failed");
                state.levels.set_phase(SelectionLevel::DataKey, LevelPhase::Failed);
                self.publish(&state);
                false
            }
        }
    }

    /// Capture the level's generation and optionally raise its loading
    /// phase before suspending on a fetch.
    async fn begin_load(&self, level: SelectionLevel, show_loading: bool) -> u64 {
        let mut state = self.inner.state.lock().await;
        if show_loading {
            state.levels.set_phase(level, LevelPhase::Loading);
            self.publish(&state);
        }
        state.generations[level.index()]
    }

    /// Apply a device-listing result (master or device level) under the
    /// generation guard.
    async fn apply_device_listing(
        &self,
        level: SelectionLevel,
        generation: u64,
        result: Result<Vec<crate::model::Device>, crate::provider::ProviderError>,
    ) -> bool {
        let mut state = self.inner.state.lock().await;
        if state.generations[level.index()] != generation {
            debug!(%level, "stale device listing discarded");
            return false;
        }

        match result {
            Ok(devices) => {
                let options = devices.into_iter().map(SelectableItem::from).collect();
                state.levels.set_options(level, options);
                self.publish(&state);
                true
            }
            Err(error) => {
                warn!(%level, %error, "device listing failed");
                state.levels.set_phase(level, LevelPhase::Failed);
                self.publish(&state);
                false
            }
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
