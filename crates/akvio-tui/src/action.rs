//! Actions dispatched through the app's central channel.

use akvio_core::{CascadeSnapshot, SelectableItem, SelectionLevel};

/// Everything that can happen in the TUI, from key presses to cascade
/// state updates arriving from the data bridge.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    /// Move focus to the next / previous selection level.
    FocusNext,
    FocusPrev,

    /// New cascade state published by the controller.
    SnapshotUpdated(CascadeSnapshot),
    /// The persisted query was committed (counter is monotonic).
    QueryCommitted(u64),

    /// Search text edited in a level's input field.
    SearchChanged(SelectionLevel, String),
    /// An option was picked in a level's dropdown.
    Select(SelectionLevel, SelectableItem),
}
