//! The Voice101 window.

use std::sync::Arc;
use std::time::Instant;

use eframe::egui;
use log::Level;

use crate::config::AppConfig;
use crate::controller::{Controller, Warning};
use crate::engines::xtts::XttsEngine;
use crate::player::RodioPlayer;
use crate::service::SynthesisService;

pub const WINDOW_TITLE: &str = "Voice101";
pub const WINDOW_WIDTH: f32 = 900.0;
pub const WINDOW_HEIGHT: f32 = 600.0;

enum Action {
    Speak,
    Play,
    Clear,
    Select(Option<String>),
}

pub struct Voice101App {
    controller: Controller<XttsEngine, RodioPlayer>,
    text: String,
    warning: Option<Warning>,
}

impl Voice101App {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &AppConfig) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let ctx = cc.egui_ctx.clone();
        let service = SynthesisService::new(XttsEngine::new(), config.xtts_params());
        let mut controller = Controller::new(config, service, RodioPlayer::new())
            .with_notifier(Arc::new(move || ctx.request_repaint()));
        controller.start_engine();

        Self {
            controller,
            text: String::new(),
            warning: None,
        }
    }

    fn handle(&mut self, action: Action) {
        let outcome = match action {
            Action::Speak => self.controller.speak(&self.text).map(|_| ()),
            // Blocks the window until the clip ends; outputs are short.
            Action::Play => self.controller.play(),
            Action::Clear => {
                self.controller.clear_log();
                Ok(())
            }
            Action::Select(preset) => {
                self.controller.select_preset(preset);
                Ok(())
            }
        };
        if let Err(warning) = outcome {
            self.warning = Some(warning);
        }
    }

    fn render_main(&mut self, ui: &mut egui::Ui) -> Vec<Action> {
        let mut actions = Vec::new();

        ui.vertical_centered(|ui| {
            ui.add_space(10.0);
            ui.label(egui::RichText::new(self.controller.status()).size(16.0));
            ui.add_space(10.0);

            ui.add(
                egui::TextEdit::singleline(&mut self.text)
                    .hint_text("Enter text...")
                    .desired_width(600.0),
            );
            ui.add_space(5.0);

            let mut selected = self.controller.selected_preset().map(str::to_string);
            egui::ComboBox::from_id_salt("preset")
                .width(300.0)
                .selected_text(selected.clone().unwrap_or_default())
                .show_ui(ui, |ui| {
                    for preset in self.controller.presets() {
                        ui.selectable_value(&mut selected, Some(preset.clone()), preset.as_str());
                    }
                });
            if selected.as_deref() != self.controller.selected_preset() {
                actions.push(Action::Select(selected));
            }
            ui.add_space(10.0);

            ui.horizontal(|ui| {
                // Center the three buttons under the combo box.
                ui.add_space((ui.available_width() - 300.0).max(0.0) / 2.0);
                let speak = egui::Button::new("Speak").corner_radius(10.0);
                if ui.add_enabled(self.controller.speak_enabled(), speak).clicked() {
                    actions.push(Action::Speak);
                }
                if ui.add(egui::Button::new("Play").corner_radius(10.0)).clicked() {
                    actions.push(Action::Play);
                }
                if ui.add(egui::Button::new("Clear").corner_radius(10.0)).clicked() {
                    actions.push(Action::Clear);
                }
            });
            ui.add_space(10.0);
        });

        egui::Frame::group(ui.style())
            .corner_radius(10.0)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .max_height(250.0)
                    .show(ui, |ui| {
                        for line in self.controller.console().lines() {
                            let color = match line.level {
                                Level::Error => egui::Color32::from_rgb(0xe0, 0x6c, 0x75),
                                Level::Warn => egui::Color32::from_rgb(0xe5, 0xc0, 0x7b),
                                _ => ui.visuals().text_color(),
                            };
                            ui.label(
                                egui::RichText::new(line.to_string())
                                    .monospace()
                                    .color(color),
                            );
                        }
                    });
            });

        actions
    }

    fn render_warning(&mut self, ctx: &egui::Context) {
        let Some(warning) = &self.warning else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(warning.title())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(warning.to_string());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.warning = None;
        }
    }
}

impl eframe::App for Voice101App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.tick(Instant::now());

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                // Keep the main view inert while a warning is up.
                ui.add_enabled_ui(self.warning.is_none(), |ui| self.render_main(ui))
                    .inner
            })
            .inner;
        for action in actions {
            self.handle(action);
        }

        self.render_warning(ctx);

        ctx.request_repaint_after(self.controller.until_next_poll(Instant::now()));
    }
}
