use crate::chat::session::SubmitRejected;
use crate::chat::{ChatSession, Message, MessageId, Role};
use crate::config::Config;
use crate::theme::Theme;
use eframe::egui::{self, Align, CornerRadius, Layout, Rect, RichText, ScrollArea, TextStyle};
use std::time::{Duration, Instant};

pub mod clipboard;
pub mod schedule;
pub mod state;

use clipboard::Clipboard;
use state::{rows, submit_control, Row, ViewState};

// Repaint cadence while a reply streams in from the transport thread.
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(50);
const FOOTER_TEXT: &str = "2025. Made with \u{2764} by Ishita.";

struct MessageRow {
    bubble: Rect,
    copy_clicked: bool,
}

#[derive(Default)]
struct TranscriptRows {
    bubbles: Vec<Rect>,
    copy_request: Option<(MessageId, String)>,
}

pub struct ChatView {
    session: ChatSession,
    state: ViewState,
    clipboard: Box<dyn Clipboard>,
    theme: Theme,
    assistant_name: String,
    visuals_applied: bool,
}

impl ChatView {
    pub fn new(session: ChatSession, clipboard: Box<dyn Clipboard>, config: &Config) -> Self {
        Self {
            session,
            state: ViewState::new(config),
            clipboard,
            theme: Theme::default(),
            assistant_name: config.assistant_name.clone(),
            visuals_applied: false,
        }
    }

    fn input_id() -> egui::Id {
        egui::Id::new("chat_input")
    }

    fn render_bubble(ui: &mut egui::Ui, theme: &Theme, role: Role, text: &str, max_width: f32) -> Rect {
        let (fill, color) = match role {
            Role::User => (theme.user_bubble, theme.user_text),
            Role::Assistant => (theme.assistant_bubble, theme.assistant_text),
        };
        theme
            .bubble_frame(fill)
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.add(egui::Label::new(RichText::new(text).color(color)).wrap());
            })
            .response
            .rect
    }

    fn render_message(
        ui: &mut egui::Ui,
        theme: &Theme,
        message: &Message,
        show_copy: bool,
        copied: bool,
    ) -> MessageRow {
        let max_width = ui.available_width() * 0.8;
        match message.role {
            Role::User => {
                let bubble = ui
                    .allocate_ui_with_layout(
                        egui::vec2(ui.available_width(), 0.0),
                        Layout::right_to_left(Align::Min),
                        |ui| Self::render_bubble(ui, theme, Role::User, &message.content, max_width),
                    )
                    .inner;
                MessageRow {
                    bubble,
                    copy_clicked: false,
                }
            }
            Role::Assistant => {
                let mut copy_clicked = false;
                let bubble = ui
                    .horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = theme.spacing_8;
                        let bubble =
                            Self::render_bubble(ui, theme, Role::Assistant, &message.content, max_width);
                        if show_copy {
                            let (icon, hover) = if copied {
                                ("\u{2714}", "Copied!")
                            } else {
                                ("\u{1F4CB}", "Copy to clipboard")
                            };
                            copy_clicked = ui
                                .add(egui::Button::new(RichText::new(icon).color(theme.icon_idle)).frame(false))
                                .on_hover_text(hover)
                                .clicked();
                        }
                        bubble
                    })
                    .inner;
                MessageRow {
                    bubble,
                    copy_clicked,
                }
            }
        }
    }

    fn render_rows(&self, ui: &mut egui::Ui) -> TranscriptRows {
        let in_flight = self.session.is_in_flight();
        let mut out = TranscriptRows::default();

        for row in rows(&self.session) {
            let bubble = match row {
                Row::Message(message) => {
                    let copied = self.state.is_copied(&message.id);
                    let row = Self::render_message(ui, &self.theme, message, !in_flight, copied);
                    if row.copy_clicked {
                        out.copy_request = Some((message.id.clone(), message.content.clone()));
                    }
                    row.bubble
                }
                Row::Streaming(text) => {
                    let max_width = ui.available_width() * 0.8;
                    Self::render_bubble(ui, &self.theme, Role::Assistant, text, max_width)
                }
                Row::Thinking => {
                    self.theme
                        .bubble_frame(self.theme.assistant_bubble)
                        .show(ui, |ui| {
                            ui.label(
                                RichText::new(format!("{} is thinking...", self.assistant_name))
                                    .italics()
                                    .color(self.theme.text_muted),
                            );
                        })
                        .response
                        .rect
                }
            };
            out.bubbles.push(bubble);
        }
        out
    }

    fn render_transcript(&mut self, ui: &mut egui::Ui, height: f32, now: Instant) {
        let scroll = self.state.should_scroll(&self.session);
        let mut copy_request = None;

        self.theme.transcript_frame().show(ui, |ui| {
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .auto_shrink([false, false])
                .max_height(height)
                .show(ui, |ui| {
                    ui.set_min_height(height);
                    copy_request = self.render_rows(ui).copy_request;

                    if scroll {
                        ui.scroll_to_cursor(Some(Align::BOTTOM));
                    }
                });
        });

        if let Some((id, content)) = copy_request {
            self.state
                .copy_message(self.clipboard.as_mut(), &id, &content, now);
        }
    }

    fn submit_input(&mut self, ctx: &egui::Context, now: Instant) {
        match self.session.submit() {
            Ok(submission) => self.state.on_submitted(submission, now),
            Err(SubmitRejected::EmptyInput) => {
                ctx.memory_mut(|memory| memory.request_focus(Self::input_id()));
            }
            Err(reason @ SubmitRejected::InFlight) => tracing::debug!(%reason, "submit ignored"),
        }
    }

    fn render_composer(&mut self, ui: &mut egui::Ui, now: Instant) {
        let control = submit_control(self.state.is_compact(), &self.session);
        let input_enabled = !self.session.is_in_flight();
        let theme = &self.theme;
        let mut submit_now = false;

        ui.horizontal(|ui| {
            let input_width =
                (ui.available_width() - control.min_width - ui.spacing().item_spacing.x).max(0.0);
            let mut input = self.session.input().to_string();
            let response = ui.add_enabled(
                input_enabled,
                egui::TextEdit::singleline(&mut input)
                    .id(Self::input_id())
                    .hint_text("Type your message...")
                    .desired_width(input_width)
                    .min_size(egui::vec2(0.0, theme.button_height)),
            );
            if response.changed() {
                self.session.handle_input_change(input);
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit_now = true;
            }

            let clicked = ui
                .add_enabled(
                    control.enabled,
                    egui::Button::new(RichText::new(control.label).strong().color(theme.user_text))
                        .fill(theme.submit_fill(control.enabled))
                        .corner_radius(CornerRadius::same(theme.radius_pill))
                        .min_size(egui::vec2(control.min_width, theme.button_height)),
                )
                .on_hover_text(control.hover)
                .clicked();
            submit_now |= clicked;
        });

        if submit_now {
            self.submit_input(ui.ctx(), now);
        }

        if self.state.take_focus_request(!self.session.is_in_flight()) {
            ui.ctx().memory_mut(|memory| memory.request_focus(Self::input_id()));
        }
    }

    fn render_footer(&self, ui: &mut egui::Ui) {
        ui.allocate_ui_with_layout(
            egui::vec2(ui.available_width(), 0.0),
            Layout::right_to_left(Align::Min),
            |ui| {
                ui.label(
                    RichText::new(FOOTER_TEXT)
                        .small()
                        .italics()
                        .color(self.theme.text_muted.gamma_multiply(0.7)),
                );
            },
        );
    }

    fn render_center_panel(&mut self, ctx: &egui::Context, now: Instant) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let card_width = (available.x * 0.9).min(self.theme.card_max_width);
            let card_height = (available.y * 0.8).min(self.theme.card_max_height);
            let top_gap = ((available.y - card_height) / 2.0).max(0.0);

            ui.add_space(top_gap);
            ui.vertical_centered(|ui| {
                self.theme.card_frame().show(ui, |ui| {
                    ui.set_width(card_width);
                    ui.set_height(card_height);
                    ui.with_layout(Layout::top_down(Align::Min), |ui| {
                        let composer_height = self.theme.button_height + self.theme.spacing_20;
                        let footer_height =
                            ui.text_style_height(&TextStyle::Small) + ui.spacing().item_spacing.y;
                        let transcript_height = (ui.available_height()
                            - composer_height
                            - footer_height
                            - 2.0 * self.theme.spacing_20)
                            .max(120.0);
                        self.render_transcript(ui, transcript_height, now);
                        ui.add_space(self.theme.spacing_16);
                        self.render_composer(ui, now);
                        self.render_footer(ui);
                    });
                });
            });
        });
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        if self.session.is_in_flight() {
            ctx.request_repaint_after(STREAM_POLL_INTERVAL);
        }
        if let Some(deadline) = self.state.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

impl eframe::App for ChatView {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.visuals_applied {
            self.theme.apply_visuals(ctx);
            self.visuals_applied = true;
        }

        let now = Instant::now();
        self.session.drain_events();
        self.state.poll(now);
        self.state.observe_width(ctx.screen_rect().width());

        self.render_center_panel(ctx, now);
        self.schedule_repaint(ctx, now);
    }
}
