//! Application core — event loop, focus management, action dispatch.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use akvio_core::{
    CascadeController, MemoryQueryStore, RehydrationPhase, SelectableItem, SelectionLevel,
};

use crate::action::Action;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::theme;
use crate::tui::Tui;
use crate::widgets::dropdown::Dropdown;

/// Top-level application state and event loop.
pub struct App {
    /// One dropdown per cascade level, in dependency order.
    dropdowns: Vec<Dropdown>,
    /// Index of the focused dropdown.
    focus: usize,
    /// Whether the app should keep running.
    running: bool,
    /// Rehydration phase for the status bar.
    rehydration: RehydrationPhase,
    /// Commit counter for the status bar.
    commits: u64,
    /// Action sender — components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// The cascade state machine.
    controller: CascadeController,
    /// Store backing the controller (observed for commit counts).
    store: Arc<MemoryQueryStore>,
    /// Data-source identity passed to initialization.
    source_id: String,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(
        controller: CascadeController,
        store: Arc<MemoryQueryStore>,
        source_id: String,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let dropdowns = SelectionLevel::ALL.into_iter().map(Dropdown::new).collect();

        Self {
            dropdowns,
            focus: 0,
            running: true,
            rehydration: RehydrationPhase::Pending,
            commits: 0,
            action_tx,
            action_rx,
            controller,
            store,
            source_id,
            data_cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        for dropdown in &mut self.dropdowns {
            dropdown.init(self.action_tx.clone())?;
        }
        if let Some(first) = self.dropdowns.first_mut() {
            first.set_focused(true);
        }

        // Bridge cascade state into the action channel
        {
            let controller = self.controller.clone();
            let store = Arc::clone(&self.store);
            let tx = self.action_tx.clone();
            let cancel = self.data_cancel.clone();
            tokio::spawn(async move {
                crate::data_bridge::spawn_data_bridge(controller, store, tx, cancel).await;
            });
        }

        // Kick off the rehydration pass
        {
            let controller = self.controller.clone();
            let source_id = self.source_id.clone();
            tokio::spawn(async move {
                controller.initialize(&source_id).await;
            });
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        self.controller.shutdown();
        events.stop();
        tui.exit()?;
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// everything else goes to the focused dropdown.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Some(Action::Quit)),

            (KeyModifiers::NONE, KeyCode::Tab) => return Ok(Some(Action::FocusNext)),
            (KeyModifiers::SHIFT, KeyCode::BackTab) => return Ok(Some(Action::FocusPrev)),

            // Esc quits unless the focused dropdown has a list to close
            (KeyModifiers::NONE, KeyCode::Esc) => {
                let open = self.dropdowns.get(self.focus).is_some_and(Dropdown::is_open);
                if !open {
                    return Ok(Some(Action::Quit));
                }
            }

            _ => {}
        }

        if let Some(dropdown) = self.dropdowns.get_mut(self.focus) {
            return dropdown.handle_key_event(key);
        }
        Ok(None)
    }

    /// Process a single action — update app state and propagate.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Render | Action::Resize(..) => {}

            Action::FocusNext => self.move_focus(true),
            Action::FocusPrev => self.move_focus(false),

            Action::QueryCommitted(count) => {
                self.commits = *count;
            }

            // Snapshot and tick updates go to every dropdown
            Action::SnapshotUpdated(snapshot) => {
                self.rehydration = snapshot.rehydration;
                for dropdown in &mut self.dropdowns {
                    dropdown.update(action)?;
                }
            }
            Action::Tick => {
                for dropdown in &mut self.dropdowns {
                    dropdown.update(action)?;
                }
            }

            Action::SearchChanged(level, text) => {
                self.dispatch_search(*level, text.clone());
            }

            Action::Select(level, item) => {
                self.dispatch_select(*level, item.clone());
            }
        }

        Ok(())
    }

    fn move_focus(&mut self, forward: bool) {
        if let Some(current) = self.dropdowns.get_mut(self.focus) {
            current.set_focused(false);
        }
        let len = self.dropdowns.len();
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
        if let Some(current) = self.dropdowns.get_mut(self.focus) {
            current.set_focused(true);
        }
    }

    /// Forward search text to the controller without blocking the loop.
    fn dispatch_search(&self, level: SelectionLevel, text: String) {
        let controller = self.controller.clone();
        match level {
            SelectionLevel::MasterDevice => {
                tokio::spawn(async move {
                    controller.master_search_changed(&text).await;
                });
            }
            SelectionLevel::Device => {
                tokio::spawn(async move {
                    controller.device_search_changed(&text).await;
                });
            }
            SelectionLevel::Topic | SelectionLevel::DataKey => {}
        }
    }

    /// Forward a selection to the controller without blocking the loop.
    fn dispatch_select(&self, level: SelectionLevel, item: SelectableItem) {
        let controller = self.controller.clone();
        tokio::spawn(async move {
            match level {
                SelectionLevel::MasterDevice => controller.select_master_device(item).await,
                SelectionLevel::Device => controller.select_device(item).await,
                SelectionLevel::Topic => controller.select_topic(item).await,
                SelectionLevel::DataKey => controller.select_data_key(item).await,
            }
        });
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Length(1), // Header
            Constraint::Fill(1),   // Master device
            Constraint::Fill(1),   // Device
            Constraint::Fill(1),   // Topic
            Constraint::Fill(1),   // Data key
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        let header = Line::from(Span::styled(" akvio query editor", theme::title_style()));
        frame.render_widget(Paragraph::new(header), layout[0]);

        for (idx, dropdown) in self.dropdowns.iter().enumerate() {
            dropdown.render(frame, layout[idx + 1]);
        }

        self.render_status_bar(frame, layout[5]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let phase = match self.rehydration {
            RehydrationPhase::Pending => {
                Span::styled("○ waiting", Style::default().fg(theme::BORDER_GRAY))
            }
            RehydrationPhase::InProgress => Span::styled(
                "◐ loading saved selection",
                Style::default().fg(theme::WARN_YELLOW),
            ),
            RehydrationPhase::Complete => {
                Span::styled("● ready", Style::default().fg(theme::OK_GREEN))
            }
        };

        let line = Line::from(vec![
            Span::raw(" "),
            phase,
            Span::styled(
                format!(" │ {} queries run │ ", self.commits),
                theme::key_hint(),
            ),
            Span::styled("Tab", theme::key_hint_key()),
            Span::styled(" next  ", theme::key_hint()),
            Span::styled("Enter", theme::key_hint_key()),
            Span::styled(" open/select  ", theme::key_hint()),
            Span::styled("Esc", theme::key_hint_key()),
            Span::styled(" quit", theme::key_hint()),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
