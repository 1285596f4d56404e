use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use penguin_predictor::data::schema::{CategoricalField, NumericField};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – input features
// ---------------------------------------------------------------------------

/// Render the left input panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Input features");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Categorical selectors ----
            for field in CategoricalField::ALL {
                let current = state.query.categorical(field).to_string();
                let mut picked: Option<&'static str> = None;
                ui.strong(field.label());
                egui::ComboBox::from_id_salt(field.name())
                    .selected_text(current.as_str())
                    .show_ui(ui, |ui: &mut Ui| {
                        for &value in field.vocabulary() {
                            if ui.selectable_label(current == value, value).clicked() {
                                picked = Some(value);
                            }
                        }
                    });
                if let Some(value) = picked {
                    state.set_categorical(field, value);
                }
                ui.add_space(4.0);
            }

            ui.separator();

            // ---- Numeric sliders ----
            for field in NumericField::ALL {
                let (lo, hi) = field.bounds();
                let mut value = state.query.numeric(field);
                ui.strong(field.label());
                if ui.add(egui::Slider::new(&mut value, lo..=hi)).changed() {
                    state.set_numeric(field, value);
                }
                ui.add_space(4.0);
            }

            ui.separator();

            // ---- Echo of the current query ----
            ui.strong("Current input");
            egui::Grid::new("query_grid")
                .striped(true)
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    for field in CategoricalField::ALL {
                        ui.label(field.name());
                        ui.label(state.query.categorical(field));
                        ui.end_row();
                    }
                    for field in NumericField::ALL {
                        ui.label(field.name());
                        ui.label(format!("{:.1}", state.query.numeric(field)));
                        ui.end_row();
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.report.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export results…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let name = state
                .dataset_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dataset".to_string());
            ui.label(format!("{name}: {} reference records", ds.len()));
        } else {
            ui.label("No dataset loaded");
        }

        ui.separator();

        if ui
            .add_enabled(state.dataset.is_some(), egui::Button::new("Retrain"))
            .on_hover_text("Fit a fresh forest on the reference data")
            .clicked()
        {
            state.retrain();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open penguins reference data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_dataset(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export prediction")
        .add_filter("CSV", &["csv"])
        .set_file_name("prediction.csv")
        .save_file();

    if let Some(path) = file {
        state.export_results(&path);
    }
}
