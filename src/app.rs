//! Voice Stopwatch window — egui/eframe presentation shell.
//!
//! # Architecture
//!
//! [`StopwatchApp`] renders the [`CoreSnapshot`] published by the core runner
//! and forwards user intents over the [`CoreCommand`] channel.  It holds no
//! timing logic of its own — every second counted, entry logged, and alarm
//! scheduled happens in the runner task.
//!
//! # Widget layout
//!
//! | Section | Content |
//! |---------|---------|
//! | Display | `MM:SS` readout, large monospace |
//! | Status  | one-line state description, input level meter while listening |
//! | Controls| Start / Stop primary button, Reset secondary |
//! | Comment | annotation field for the in-flight session |
//! | History | completed sessions with per-entry delete |
//!
//! Pressing `R` anywhere in the window requests a reset — except while the
//! comment field has focus, where the keystroke belongs to the text.

use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::timer::{format_seconds, CoreCommand, CoreSnapshot, SharedSnapshot, TimerState};

// ---------------------------------------------------------------------------
// StopwatchApp
// ---------------------------------------------------------------------------

/// eframe application — the Voice Stopwatch window.
pub struct StopwatchApp {
    /// Send user intents to the core runner.
    command_tx: mpsc::Sender<CoreCommand>,
    /// Read-only core state, republished by the runner after every transition.
    snapshot: SharedSnapshot,
    /// Local comment text, mirrored to the runner on change.
    comment: String,
    /// Application configuration (read-only after startup).
    config: AppConfig,
}

impl StopwatchApp {
    /// Create a new [`StopwatchApp`].
    ///
    /// * `command_tx` — sender end of the core command channel.
    /// * `snapshot`   — shared snapshot also held by the runner.
    /// * `config`     — loaded application configuration.
    pub fn new(
        command_tx: mpsc::Sender<CoreCommand>,
        snapshot: SharedSnapshot,
        config: AppConfig,
    ) -> Self {
        Self {
            command_tx,
            snapshot,
            comment: String::new(),
            config,
        }
    }

    fn send(&self, cmd: CoreCommand) {
        // The channel is deep enough that UI-rate sends never fill it; if the
        // runner is gone there is nobody left to act anyway.
        let _ = self.command_tx.try_send(cmd);
    }

    // ── Section renderers ────────────────────────────────────────────────

    fn draw_display(&self, ui: &mut egui::Ui, snap: &CoreSnapshot) {
        ui.vertical_centered(|ui| {
            ui.add_space(12.0);
            ui.label(
                egui::RichText::new(format_seconds(snap.display_seconds))
                    .monospace()
                    .size(64.0)
                    .color(egui::Color32::from_rgb(100, 170, 255)),
            );
        });
    }

    fn draw_status(&self, ui: &mut egui::Ui, snap: &CoreSnapshot) {
        let status = match snap.state {
            TimerState::Idle => "Press Start, then make a sound to begin timing".to_string(),
            TimerState::Listening => "Listening — make a sound to start the timer".to_string(),
            TimerState::Running => "Timing in progress...".to_string(),
            TimerState::Countdown => {
                format!("Countdown: {} seconds remaining", snap.display_seconds)
            }
            TimerState::Finished => "Done".to_string(),
        };

        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(status)
                    .size(13.0)
                    .color(egui::Color32::from_rgb(150, 150, 150)),
            );

            if snap.state == TimerState::Listening {
                ui.add_space(4.0);
                // Scale the meter so ordinary speech fills a useful range.
                let level = (snap.input_level * 4.0).min(1.0);
                ui.add(egui::ProgressBar::new(level).desired_width(220.0));
            }

            if let Some(message) = &snap.error_message {
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(message)
                        .size(13.0)
                        .color(egui::Color32::from_rgb(240, 140, 60)),
                );
            }
        });
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui, snap: &CoreSnapshot) {
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                // Centre the two fixed-width buttons.
                let total = 2.0 * 130.0 + ui.spacing().item_spacing.x;
                let pad = (ui.available_width() - total).max(0.0) / 2.0;
                ui.add_space(pad);

                let (label, enabled, cmd) = match snap.state {
                    TimerState::Idle if snap.is_busy => ("Starting...", false, None),
                    TimerState::Idle => ("Start", true, Some(CoreCommand::Start)),
                    TimerState::Listening => ("Listening...", false, None),
                    TimerState::Running => ("Stop", true, Some(CoreCommand::Stop)),
                    TimerState::Countdown => ("Counting down...", false, None),
                    TimerState::Finished => ("Done", false, None),
                };

                let start_stop = ui.add_enabled(
                    enabled,
                    egui::Button::new(label).min_size(egui::vec2(130.0, 32.0)),
                );
                if start_stop.clicked() {
                    if let Some(cmd) = cmd {
                        self.send(cmd);
                    }
                }

                let resettable = snap.state != TimerState::Idle
                    || snap.display_seconds > 0
                    || snap.error_message.is_some();
                let reset = ui.add_enabled(
                    resettable,
                    egui::Button::new("Reset").min_size(egui::vec2(130.0, 32.0)),
                );
                if reset.clicked() {
                    self.send(CoreCommand::Reset);
                }
            });
        });
    }

    /// Draw the comment field.  Returns `true` while it has keyboard focus
    /// so the `R` shortcut can be suppressed.
    fn draw_comment(&mut self, ui: &mut egui::Ui, snap: &CoreSnapshot) -> bool {
        ui.add_space(10.0);

        let editable = matches!(
            snap.state,
            TimerState::Listening | TimerState::Running | TimerState::Countdown
        );

        let response = ui.add_enabled(
            editable,
            egui::TextEdit::singleline(&mut self.comment)
                .hint_text("Add a comment")
                .desired_width(f32::INFINITY),
        );

        if response.changed() {
            self.send(CoreCommand::SetComment(self.comment.clone()));
        }

        // The runner consumes the draft when the session completes; mirror
        // that locally so the field empties with it.
        if snap.state == TimerState::Idle {
            self.comment.clear();
        }

        response.has_focus()
    }

    fn draw_history(&self, ui: &mut egui::Ui, snap: &CoreSnapshot) {
        ui.add_space(10.0);
        ui.separator();
        ui.label(egui::RichText::new("History").size(16.0).strong());

        if snap.history.is_empty() {
            ui.label(
                egui::RichText::new("No completed sessions yet")
                    .size(12.0)
                    .color(egui::Color32::from_rgb(120, 120, 120)),
            );
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for entry in &snap.history {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&entry.duration)
                            .monospace()
                            .size(16.0)
                            .strong(),
                    );

                    ui.vertical(|ui| {
                        if !entry.comment.is_empty() {
                            ui.label(egui::RichText::new(&entry.comment).size(12.0));
                        }
                        ui.label(
                            egui::RichText::new(
                                entry.completed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                            )
                            .size(10.0)
                            .color(egui::Color32::from_rgb(120, 120, 120)),
                        );
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Delete").clicked() {
                            self.send(CoreCommand::DeleteEntry(entry.id));
                        }
                    });
                });
                ui.separator();
            }
        });
    }
}

// ---------------------------------------------------------------------------
// eframe::App
// ---------------------------------------------------------------------------

impl eframe::App for StopwatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snap = self.snapshot.lock().unwrap().clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(4.0);
                ui.label(egui::RichText::new("Voice Stopwatch").size(22.0).strong());
            });

            self.draw_display(ui, &snap);
            self.draw_status(ui, &snap);
            self.draw_controls(ui, &snap);
            let comment_has_focus = self.draw_comment(ui, &snap);
            self.draw_history(ui, &snap);

            // Global reset shortcut, swallowed while typing a comment.
            if !comment_has_focus && ctx.input(|i| i.key_pressed(egui::Key::R)) {
                self.send(CoreCommand::Reset);
            }
        });

        // The display advances on the runner's clock, not on input events.
        ctx.request_repaint_after(Duration::from_millis(
            self.config.audio.poll_interval_ms.max(33),
        ));
    }
}
