// ── Selection domain types ──
//
// The four cascading levels, their per-level view state, and the
// persisted selection record the host stores with the panel query.

use serde::{Deserialize, Serialize};
use strum::Display;

// ── Levels ───────────────────────────────────────────────────────────

/// One of the four cascading selection slots, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SelectionLevel {
    MasterDevice,
    Device,
    Topic,
    DataKey,
}

impl SelectionLevel {
    /// All levels in dependency order.
    pub const ALL: [SelectionLevel; 4] = [
        Self::MasterDevice,
        Self::Device,
        Self::Topic,
        Self::DataKey,
    ];

    /// The levels strictly below this one, i.e. every level whose valid
    /// choices depend (transitively) on this level's selection.
    pub fn downstream(self) -> &'static [SelectionLevel] {
        match self {
            Self::MasterDevice => &[Self::Device, Self::Topic, Self::DataKey],
            Self::Device => &[Self::Topic, Self::DataKey],
            Self::Topic => &[Self::DataKey],
            Self::DataKey => &[],
        }
    }

    /// Whether this level carries a debounced search input.
    pub fn searchable(self) -> bool {
        matches!(self, Self::MasterDevice | Self::Device)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::MasterDevice => 0,
            Self::Device => 1,
            Self::Topic => 2,
            Self::DataKey => 3,
        }
    }
}

// ── Items ────────────────────────────────────────────────────────────

/// Reference to the domain a device belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRef {
    pub id: String,
}

/// A device as returned by the platform. The `domain.id` is what the
/// next level's candidate listing is filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub domain: DomainRef,
}

/// A single dropdown entry.
///
/// `device` is populated only for the MasterDevice and Device levels --
/// the payload is needed to read the domain id when cascading downward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableItem {
    pub label: String,
    pub key: String,
    pub device: Option<Device>,
}

impl SelectableItem {
    /// Plain label/key entry (topics and data keys).
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            key: value,
            device: None,
        }
    }

    /// Entry carrying a full device payload.
    pub fn for_device(device: Device) -> Self {
        Self {
            label: device.name.clone(),
            key: device.id.clone(),
            device: Some(device),
        }
    }
}

impl From<Device> for SelectableItem {
    fn from(device: Device) -> Self {
        Self::for_device(device)
    }
}

// ── Per-level state ──────────────────────────────────────────────────

/// Explicit load state for one level's option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LevelPhase {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// View state for one level: current value, fetched options, load phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelState {
    pub value: Option<SelectableItem>,
    pub options: Vec<SelectableItem>,
    pub phase: LevelPhase,
}

/// The four level states, indexable by [`SelectionLevel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    slots: [LevelState; 4],
}

impl Levels {
    /// Build initial level state from the persisted selection.
    ///
    /// Each persisted value is seeded as both the current value and the
    /// sole option, so a previously saved panel renders its selection
    /// immediately instead of flashing empty until the first fetch lands.
    pub fn seed(persisted: &PersistedSelection) -> Self {
        let mut levels = Self::default();

        let master = persisted.master_device.clone().map(SelectableItem::from);
        let device = persisted.device.clone().map(SelectableItem::from);
        let topic = persisted.topic.clone().map(SelectableItem::plain);
        let data_key = persisted.data_key.clone().map(SelectableItem::plain);

        for (level, item) in [
            (SelectionLevel::MasterDevice, master),
            (SelectionLevel::Device, device),
            (SelectionLevel::Topic, topic),
            (SelectionLevel::DataKey, data_key),
        ] {
            if let Some(item) = item {
                let slot = &mut levels.slots[level.index()];
                slot.options = vec![item.clone()];
                slot.value = Some(item);
            }
        }

        levels
    }

    pub fn get(&self, level: SelectionLevel) -> &LevelState {
        &self.slots[level.index()]
    }

    /// Replace a level's options and mark it loaded.
    ///
    /// The current value is never implicitly cleared by an options
    /// refresh, even when the new list no longer contains it -- clearing
    /// a value is always an explicit cascade action.
    pub fn set_options(&mut self, level: SelectionLevel, options: Vec<SelectableItem>) {
        let slot = &mut self.slots[level.index()];
        slot.options = options;
        slot.phase = LevelPhase::Loaded;
    }

    pub fn set_value(&mut self, level: SelectionLevel, value: Option<SelectableItem>) {
        self.slots[level.index()].value = value;
    }

    pub fn set_phase(&mut self, level: SelectionLevel, phase: LevelPhase) {
        self.slots[level.index()].phase = phase;
    }

    /// Clear value and options for a level (explicit cascade reset).
    pub fn reset(&mut self, level: SelectionLevel) {
        self.slots[level.index()] = LevelState::default();
    }
}

// ── Rehydration ──────────────────────────────────────────────────────

/// Progress of the one-time rehydration pass that rebuilds level state
/// from a previously persisted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RehydrationPhase {
    #[default]
    Pending,
    InProgress,
    Complete,
}

impl RehydrationPhase {
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

// ── Persisted selection ──────────────────────────────────────────────

/// The host-persisted selection record — the single source of truth for
/// "what is currently selected". Level values are views derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSelection {
    pub master_device_id: Option<String>,
    pub master_device: Option<Device>,
    pub device_id: Option<String>,
    pub device: Option<Device>,
    pub topic: Option<String>,
    pub data_key: Option<String>,
}

impl PersistedSelection {
    /// Whether a full rehydration chain should run: master id, device id,
    /// and topic were all saved with the panel.
    pub fn is_complete(&self) -> bool {
        self.master_device_id.is_some() && self.device_id.is_some() && self.topic.is_some()
    }

    /// Strict downstream dependency: dataKey ⇒ topic ⇒ deviceId ⇒ masterDeviceId.
    pub fn is_consistent(&self) -> bool {
        let implies = |a: bool, b: bool| !a || b;
        implies(self.data_key.is_some(), self.topic.is_some())
            && implies(self.topic.is_some(), self.device_id.is_some())
            && implies(self.device_id.is_some(), self.master_device_id.is_some())
    }

    /// Merge a patch into this selection.
    pub fn apply(&mut self, patch: SelectionPatch) {
        if let Some(master) = patch.master_device {
            self.master_device_id = master.as_ref().map(|d| d.id.clone());
            self.master_device = master;
        }
        if let Some(device) = patch.device {
            self.device_id = device.as_ref().map(|d| d.id.clone());
            self.device = device;
        }
        if let Some(topic) = patch.topic {
            self.topic = topic;
        }
        if let Some(data_key) = patch.data_key {
            self.data_key = data_key;
        }
    }
}

// ── Patch ────────────────────────────────────────────────────────────

/// Field-merge patch for [`QueryStore::update`](crate::store::QueryStore).
///
/// Outer `Option` = "touch this field at all", inner = the new value.
/// The constructors below always clear everything downstream of the
/// level they set, so the strict-dependency invariant holds by
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPatch {
    pub master_device: Option<Option<Device>>,
    pub device: Option<Option<Device>>,
    pub topic: Option<Option<String>>,
    pub data_key: Option<Option<String>>,
}

impl SelectionPatch {
    /// Select a master device; device, topic, and data key are cleared.
    pub fn master_device(device: Device) -> Self {
        Self {
            master_device: Some(Some(device)),
            device: Some(None),
            topic: Some(None),
            data_key: Some(None),
        }
    }

    /// Select a device; topic and data key are cleared.
    pub fn device(device: Device) -> Self {
        Self {
            device: Some(Some(device)),
            topic: Some(None),
            data_key: Some(None),
            ..Self::default()
        }
    }

    /// Select a topic; the data key is cleared.
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(Some(topic.into())),
            data_key: Some(None),
            ..Self::default()
        }
    }

    pub fn data_key(data_key: impl Into<String>) -> Self {
        Self {
            data_key: Some(Some(data_key.into())),
            ..Self::default()
        }
    }

    /// Clear the topic and data key (post-rehydration topic reload).
    pub fn clear_topic_and_data_key() -> Self {
        Self {
            topic: Some(None),
            data_key: Some(None),
            ..Self::default()
        }
    }

    /// Clear only the data key (post-rehydration data-key reload).
    pub fn clear_data_key() -> Self {
        Self {
            data_key: Some(None),
            ..Self::default()
        }
    }

    /// Clear every field (data-source identity change).
    pub fn clear_all() -> Self {
        Self {
            master_device: Some(None),
            device: Some(None),
            topic: Some(None),
            data_key: Some(None),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
