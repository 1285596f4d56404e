use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Species colours
// ---------------------------------------------------------------------------

/// One colour per class, assigned in class order so it never shifts between predictions.
#[derive(Debug, Clone)]
pub struct SpeciesColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl SpeciesColors {
    pub fn new(class_order: &[String]) -> Self {
        let palette = generate_palette(class_order.len());
        let mapping = class_order.iter().cloned().zip(palette).collect();
        SpeciesColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, species: &str) -> Color32 {
        self.mapping
            .get(species)
            .copied()
            .unwrap_or(self.default_color)
    }
}
