//! Dropdown — one cascading selection level as a focusable panel.
//!
//! Renders the level's current value (or a search input for the two
//! searchable levels), a loading spinner while a fetch is in flight,
//! and an option list while open. A level stays disabled until its
//! parent level has a value.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use tui_input::{Input, InputRequest};

use akvio_core::{CascadeSnapshot, LevelPhase, LevelState, SelectionLevel};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const SPINNER: throbber_widgets_tui::Set = throbber_widgets_tui::BRAILLE_SIX;

/// Human-facing texts per level, mirroring the selection hierarchy.
fn label(level: SelectionLevel) -> &'static str {
    match level {
        SelectionLevel::MasterDevice => "Master device",
        SelectionLevel::Device => "Device",
        SelectionLevel::Topic => "Topic",
        SelectionLevel::DataKey => "Data key",
    }
}

fn placeholder(level: SelectionLevel) -> &'static str {
    match level {
        SelectionLevel::MasterDevice => "Select a master device",
        SelectionLevel::Device => "Select a device",
        SelectionLevel::Topic => "Select a topic",
        SelectionLevel::DataKey => "Select a data key",
    }
}

fn no_options(level: SelectionLevel) -> &'static str {
    match level {
        SelectionLevel::MasterDevice => "No master devices available",
        SelectionLevel::Device => "No devices available",
        SelectionLevel::Topic => "No topics available",
        SelectionLevel::DataKey => "No data keys available",
    }
}

/// Map a key event onto a search-input edit. `tui_input`'s crossterm
/// backend is built against an older crossterm than ratatui needs, so
/// the translation is done by hand.
fn input_request(key: KeyEvent) -> Option<InputRequest> {
    match (key.modifiers, key.code) {
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            Some(InputRequest::InsertChar(c))
        }
        (KeyModifiers::CONTROL, KeyCode::Char('w')) => Some(InputRequest::DeletePrevWord),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => Some(InputRequest::DeleteLine),
        (_, KeyCode::Backspace) => Some(InputRequest::DeletePrevChar),
        (_, KeyCode::Delete) => Some(InputRequest::DeleteNextChar),
        (_, KeyCode::Left) => Some(InputRequest::GoToPrevChar),
        (_, KeyCode::Right) => Some(InputRequest::GoToNextChar),
        (_, KeyCode::Home) => Some(InputRequest::GoToStart),
        (_, KeyCode::End) => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

pub struct Dropdown {
    level: SelectionLevel,
    state: LevelState,
    /// Locked until the parent level has a value.
    enabled: bool,
    /// Option list visibility.
    open: bool,
    highlighted: usize,
    /// Search input, present only for the searchable levels.
    search: Option<Input>,
    tick: usize,
    focused: bool,
}

impl Dropdown {
    pub fn new(level: SelectionLevel) -> Self {
        Self {
            level,
            state: LevelState::default(),
            enabled: level == SelectionLevel::MasterDevice,
            open: false,
            highlighted: 0,
            search: level.searchable().then(Input::default),
            tick: 0,
            focused: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Re-derive view state from a cascade snapshot.
    fn apply_snapshot(&mut self, snapshot: &CascadeSnapshot) {
        self.state = snapshot.levels.get(self.level).clone();

        self.enabled = match self.level {
            SelectionLevel::MasterDevice => true,
            SelectionLevel::Device => snapshot
                .levels
                .get(SelectionLevel::MasterDevice)
                .value
                .is_some(),
            SelectionLevel::Topic => snapshot.levels.get(SelectionLevel::Device).value.is_some(),
            SelectionLevel::DataKey => snapshot.levels.get(SelectionLevel::Topic).value.is_some(),
        };

        if !self.enabled {
            self.open = false;
        }
        if !self.state.options.is_empty() {
            self.highlighted = self.highlighted.min(self.state.options.len() - 1);
        }
    }

    fn render_value_line(&self) -> Line<'_> {
        // A focused search input with text takes precedence over the value.
        if self.focused {
            if let Some(search) = &self.search {
                if !search.value().is_empty() {
                    return Line::from(vec![
                        Span::styled(search.value(), theme::value_style()),
                        Span::styled("█", theme::border_focused()),
                    ]);
                }
            }
        }

        match &self.state.value {
            Some(item) => Line::from(Span::styled(item.label.clone(), theme::value_style())),
            None => Line::from(Span::styled(
                placeholder(self.level),
                theme::placeholder_style(),
            )),
        }
    }

    fn status_span(&self) -> Option<Span<'_>> {
        match self.state.phase {
            LevelPhase::Loading => {
                let symbol = SPINNER.symbols[self.tick % SPINNER.symbols.len()];
                Some(Span::styled(format!("{symbol} "), theme::spinner_style()))
            }
            LevelPhase::Failed => Some(Span::styled("✗ load failed ", theme::error_style())),
            LevelPhase::Idle | LevelPhase::Loaded => None,
        }
    }
}

impl Component for Dropdown {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.enabled {
            return Ok(None);
        }

        match key.code {
            KeyCode::Enter => {
                if self.open {
                    let picked = self.state.options.get(self.highlighted).cloned();
                    self.open = false;
                    if let Some(search) = self.search.as_mut() {
                        search.reset();
                    }
                    if let Some(item) = picked {
                        return Ok(Some(Action::Select(self.level, item)));
                    }
                } else {
                    self.open = true;
                    self.highlighted = 0;
                }
            }

            KeyCode::Esc => {
                if self.open {
                    self.open = false;
                }
            }

            KeyCode::Up => {
                self.highlighted = self.highlighted.saturating_sub(1);
            }

            KeyCode::Down => {
                if !self.state.options.is_empty() {
                    self.highlighted = (self.highlighted + 1).min(self.state.options.len() - 1);
                }
            }

            _ => {
                // Everything else belongs to the search input, when there is one.
                if let Some(search) = self.search.as_mut() {
                    let Some(request) = input_request(key) else {
                        return Ok(None);
                    };
                    let before = search.value().to_owned();
                    search.handle(request);
                    let after = search.value().to_owned();
                    if after != before {
                        self.open = true;
                        return Ok(Some(Action::SearchChanged(self.level, after)));
                    }
                }
            }
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
            }
            Action::SnapshotUpdated(snapshot) => {
                self.apply_snapshot(snapshot);
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let border_style = if !self.enabled {
            theme::border_disabled()
        } else if self.focused {
            theme::border_focused()
        } else {
            theme::border_default()
        };

        let mut title = vec![Span::styled(format!(" {} ", label(self.level)), {
            if self.enabled {
                theme::title_style()
            } else {
                theme::border_disabled()
            }
        })];
        if let Some(status) = self.status_span() {
            title.push(status);
        }

        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style);

        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let mut lines = vec![self.render_value_line()];

        if self.open && self.focused {
            if self.state.options.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", no_options(self.level)),
                    theme::placeholder_style(),
                )));
            } else {
                for (idx, option) in self.state.options.iter().enumerate() {
                    let (marker, style) = if idx == self.highlighted {
                        ("▸ ", theme::option_selected())
                    } else {
                        ("  ", theme::option_row())
                    };
                    lines.push(Line::from(Span::styled(
                        format!("{marker}{}", option.label),
                        style,
                    )));
                }
            }
        }

        lines.truncate(usize::from(inner.height));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;

    use akvio_core::{Device, DomainRef, Levels, RehydrationPhase, SelectableItem};

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot_with_master() -> CascadeSnapshot {
        let mut levels = Levels::default();
        levels.set_value(
            SelectionLevel::MasterDevice,
            Some(SelectableItem::for_device(Device {
                id: "m1".into(),
                name: "Gateway A".into(),
                domain: DomainRef { id: "dom-1".into() },
            })),
        );
        levels.set_options(
            SelectionLevel::Device,
            vec![SelectableItem::plain("d1"), SelectableItem::plain("d2")],
        );
        CascadeSnapshot {
            levels,
            rehydration: RehydrationPhase::Complete,
        }
    }

    #[test]
    fn device_level_unlocks_when_master_is_selected() {
        let mut dropdown = Dropdown::new(SelectionLevel::Device);
        assert!(!dropdown.enabled);

        dropdown
            .update(&Action::SnapshotUpdated(snapshot_with_master()))
            .unwrap();
        assert!(dropdown.enabled);

        dropdown
            .update(&Action::SnapshotUpdated(CascadeSnapshot::default()))
            .unwrap();
        assert!(!dropdown.enabled);
    }

    #[test]
    fn enter_opens_then_selects_the_highlighted_option() {
        let mut dropdown = Dropdown::new(SelectionLevel::Device);
        dropdown.set_focused(true);
        dropdown
            .update(&Action::SnapshotUpdated(snapshot_with_master()))
            .unwrap();

        assert!(dropdown.handle_key_event(key(KeyCode::Enter)).unwrap().is_none());
        assert!(dropdown.is_open());

        assert!(dropdown.handle_key_event(key(KeyCode::Down)).unwrap().is_none());
        let action = dropdown.handle_key_event(key(KeyCode::Enter)).unwrap();
        match action {
            Some(Action::Select(SelectionLevel::Device, item)) => {
                assert_eq!(item.key, "d2");
            }
            other => panic!("expected Select action, got {other:?}"),
        }
        assert!(!dropdown.is_open());
    }

    #[test]
    fn typing_into_a_searchable_level_emits_search_changes() {
        let mut dropdown = Dropdown::new(SelectionLevel::MasterDevice);
        dropdown.set_focused(true);

        let action = dropdown.handle_key_event(key(KeyCode::Char('g'))).unwrap();
        match action {
            Some(Action::SearchChanged(SelectionLevel::MasterDevice, text)) => {
                assert_eq!(text, "g");
            }
            other => panic!("expected SearchChanged action, got {other:?}"),
        }
    }

    #[test]
    fn backspace_edits_the_search_text() {
        let mut dropdown = Dropdown::new(SelectionLevel::MasterDevice);
        dropdown.set_focused(true);
        dropdown.handle_key_event(key(KeyCode::Char('g'))).unwrap();
        dropdown.handle_key_event(key(KeyCode::Char('w'))).unwrap();

        let action = dropdown.handle_key_event(key(KeyCode::Backspace)).unwrap();
        match action {
            Some(Action::SearchChanged(SelectionLevel::MasterDevice, text)) => {
                assert_eq!(text, "g");
            }
            other => panic!("expected SearchChanged action, got {other:?}"),
        }
    }

    #[test]
    fn cursor_movement_does_not_emit_a_search_change() {
        let mut dropdown = Dropdown::new(SelectionLevel::MasterDevice);
        dropdown.set_focused(true);
        dropdown.handle_key_event(key(KeyCode::Char('g'))).unwrap();

        assert!(dropdown.handle_key_event(key(KeyCode::Left)).unwrap().is_none());
        assert!(dropdown.handle_key_event(key(KeyCode::Home)).unwrap().is_none());
    }

    #[test]
    fn disabled_level_ignores_input() {
        let mut dropdown = Dropdown::new(SelectionLevel::Device);
        dropdown.set_focused(true);

        assert!(dropdown.handle_key_event(key(KeyCode::Enter)).unwrap().is_none());
        assert!(!dropdown.is_open());
    }

    #[test]
    fn topic_level_has_no_search_input() {
        let mut dropdown = Dropdown::new(SelectionLevel::Topic);
        dropdown.set_focused(true);
        dropdown
            .update(&Action::SnapshotUpdated(snapshot_with_master()))
            .unwrap();

        assert!(dropdown.search.is_none());
    }
}
