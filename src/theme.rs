use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub page_background: Color32,
    pub card_surface: Color32,
    pub list_surface: Color32,
    pub border_subtle: Color32,
    pub accent_primary: Color32,
    pub accent_disabled: Color32,
    pub user_bubble: Color32,
    pub user_text: Color32,
    pub assistant_bubble: Color32,
    pub assistant_text: Color32,
    pub text_muted: Color32,
    pub icon_idle: Color32,
    pub icon_hover: Color32,
    pub spacing_8: f32,
    pub spacing_16: f32,
    pub spacing_20: f32,
    pub radius_8: u8,
    pub radius_12: u8,
    pub radius_18: u8,
    pub radius_pill: u8,
    pub button_height: f32,
    pub card_max_width: f32,
    pub card_max_height: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            page_background: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            card_surface: Color32::WHITE,
            list_surface: Color32::from_rgb(0xF8, 0xF9, 0xFA),
            border_subtle: Color32::from_rgb(0xE0, 0xE0, 0xE0),
            accent_primary: Color32::from_rgb(0x00, 0x7B, 0xFF),
            accent_disabled: Color32::from_rgb(0xCC, 0xCC, 0xCC),
            user_bubble: Color32::from_rgb(0x00, 0x7B, 0xFF),
            user_text: Color32::WHITE,
            assistant_bubble: Color32::from_rgb(0xE9, 0xEC, 0xEF),
            assistant_text: Color32::from_rgb(0x33, 0x33, 0x33),
            text_muted: Color32::from_rgb(0x66, 0x66, 0x66),
            icon_idle: Color32::from_rgb(0x66, 0x66, 0x66),
            icon_hover: Color32::from_rgb(0x33, 0x33, 0x33),
            spacing_8: Self::P8,
            spacing_16: Self::P16,
            spacing_20: 20.0,
            radius_8: Self::R8,
            radius_12: Self::R12,
            radius_18: 18,
            radius_pill: 25,
            button_height: 40.0,
            card_max_width: 600.0,
            card_max_height: 700.0,
        }
    }
}

impl Theme {
    pub const R8: u8 = 8;
    pub const R12: u8 = 12;
    pub const P8: f32 = 8.0;
    pub const P16: f32 = 16.0;

    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::light();
        visuals.panel_fill = self.page_background;
        visuals.override_text_color = Some(self.assistant_text);
        visuals.widgets.inactive.bg_fill = self.card_surface;
        visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, self.border_subtle);
        visuals.widgets.hovered.fg_stroke.color = self.icon_hover;
        visuals.widgets.active.bg_stroke = Stroke::new(1.0, self.accent_primary);
        visuals.selection.bg_fill = self.accent_primary.gamma_multiply(0.3);
        visuals.selection.stroke = Stroke::new(1.0, self.accent_primary);
        visuals.extreme_bg_color = self.card_surface;
        visuals.hyperlink_color = self.accent_primary;

        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(10.0, 16.0);
        style.spacing.button_padding = egui::vec2(16.0, 10.0);
        style.text_styles.insert(TextStyle::Body, FontId::proportional(16.0));
        style.text_styles.insert(TextStyle::Button, FontId::proportional(16.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> Frame {
        Frame::new()
            .fill(self.card_surface)
            .inner_margin(Margin::same(self.spacing_20 as i8))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
            .shadow(egui::epaint::Shadow {
                offset: [0, 4],
                blur: 20,
                spread: 0,
                color: Color32::from_rgba_premultiplied(0, 0, 0, 26),
            })
    }

    pub fn transcript_frame(&self) -> Frame {
        Frame::new()
            .fill(self.list_surface)
            .inner_margin(Margin::same(self.spacing_20 as i8))
            .corner_radius(CornerRadius::same(self.radius_8))
            .stroke(Stroke::new(1.0, self.border_subtle))
    }

    pub fn bubble_frame(&self, fill: Color32) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::symmetric(self.spacing_16 as i8, 12))
            .corner_radius(CornerRadius::same(self.radius_18))
            .stroke(Stroke::NONE)
    }

    pub fn submit_fill(&self, enabled: bool) -> Color32 {
        if enabled {
            self.accent_primary
        } else {
            self.accent_disabled
        }
    }
}
