use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::MachineStatus;

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
// Fixed colors
// ---------------------------------------------------------------------------

/// Status colours used across all tabs: green running, amber idle,
/// red failure.
pub fn status_color(status: MachineStatus) -> Color32 {
    match status {
        MachineStatus::Running => Color32::from_rgb(0x2e, 0xcc, 0x71),
        MachineStatus::Idle => Color32::from_rgb(0xf3, 0x9c, 0x12),
        MachineStatus::Failure => Color32::from_rgb(0xe7, 0x4c, 0x3c),
    }
}

// ---------------------------------------------------------------------------
// Color mapping: machine id → Color32
// ---------------------------------------------------------------------------

/// Maps machine ids to distinct colours, stable for the life of a dataset.
#[derive(Debug, Clone)]
pub struct MachineColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl MachineColors {
    /// Build a colour per machine from the dataset's sorted machine list.
    pub fn new(machines: &[String]) -> Self {
        let palette = generate_palette(machines.len());
        let mapping: BTreeMap<String, Color32> = machines
            .iter()
            .cloned()
            .zip(palette.into_iter())
            .collect();

        MachineColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a machine.
    pub fn color_for(&self, machine: &str) -> Color32 {
        self.mapping
            .get(machine)
            .copied()
            .unwrap_or(self.default_color)
    }
}
