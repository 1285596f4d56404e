use eframe::egui;
use penguin_predictor::config::AppConfig;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PenguinApp {
    pub state: AppState,
}

impl PenguinApp {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for PenguinApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: input features ----
        egui::SidePanel::left("input_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        self.state.refresh_prediction();

        // ---- Central panel: prediction ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::prediction_panel(ui, &self.state);
        });
    }
}
