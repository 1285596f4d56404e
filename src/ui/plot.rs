use eframe::egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot};
use penguin_predictor::{PredictionReport, ResultRecord};

use crate::color::SpeciesColors;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Prediction view (central panel)
// ---------------------------------------------------------------------------

/// Render the predicted species, its probabilities and the exportable row.
pub fn prediction_panel(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a reference dataset to predict  (File → Open dataset…)");
        });
        return;
    }

    let Some(report) = &state.report else {
        ui.label("No prediction for the current input.");
        return;
    };

    ui.heading("Prediction");
    ui.label("Predicted species:");
    let label = report.predicted_label();
    ui.label(
        RichText::new(label)
            .size(24.0)
            .strong()
            .color(state.colors.color_for(label)),
    );

    for advisory in &report.advisories {
        ui.label(RichText::new(format!("⚠ {advisory}")).color(Color32::YELLOW));
    }

    ui.add_space(8.0);
    ui.strong("Prediction probability:");
    probability_chart(ui, report, &state.colors);

    ui.add_space(8.0);
    ui.strong("Results (File → Export results… to save as CSV):");
    results_table(ui, &report.result);
}

/// One bar per class, coloured per species, in class order.
fn probability_chart(ui: &mut Ui, report: &PredictionReport, colors: &SpeciesColors) {
    Plot::new("probability_plot")
        .legend(Legend::default())
        .height(220.0)
        .include_y(0.0)
        .include_y(1.0)
        .y_axis_label("Probability")
        .show_x(false)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for (i, (class, p)) in report.result.probabilities.iter().enumerate() {
                let color = colors.color_for(class);
                let bar = Bar::new(i as f64, *p)
                    .name(format!("{class}: {p:.3}"))
                    .fill(color)
                    .width(0.6);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(class).color(color));
            }
        });
}

fn results_table(ui: &mut Ui, result: &ResultRecord) {
    let headers = result.headers();
    let values = result.values();

    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::auto().at_least(60.0), headers.len())
        .header(20.0, |mut header| {
            for h in &headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(h.as_str());
                });
            }
        })
        .body(|mut body| {
            body.row(18.0, |mut row| {
                for v in &values {
                    row.col(|ui: &mut Ui| {
                        ui.label(v.as_str());
                    });
                }
            });
        });
}
