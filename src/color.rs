use eframe::egui::Color32;
use palette::{IntoColor, Lab, Mix, Srgb};

// ---------------------------------------------------------------------------
// Series colours
// ---------------------------------------------------------------------------

pub const GOLD: Color32 = Color32::from_rgb(212, 175, 55);
pub const CLOSE_MUTED: Color32 = Color32::from_rgba_premultiplied(128, 128, 128, 128);
pub const MA_30: Color32 = Color32::from_rgb(31, 119, 180);
pub const MA_90: Color32 = Color32::from_rgb(214, 39, 40);
pub const BAND_FILL: Color32 = Color32::from_rgba_premultiplied(25, 16, 0, 25);
pub const RETURNS: Color32 = Color32::from_rgb(44, 160, 44);
pub const RETURNS_LIGHT: Color32 = Color32::from_rgb(144, 238, 144);

// ---------------------------------------------------------------------------
// Diverging colour map for correlation values
// ---------------------------------------------------------------------------

/// Blue → near-white → red over `[-1, 1]`, interpolated in CIE Lab so the
/// lightness ramps evenly on both sides.
#[derive(Debug, Clone)]
pub struct DivergingColorMap {
    low: Lab,
    mid: Lab,
    high: Lab,
    nan_color: Color32,
}

impl Default for DivergingColorMap {
    fn default() -> Self {
        Self::new(
            Srgb::new(0.230, 0.299, 0.754),
            Srgb::new(0.865, 0.865, 0.865),
            Srgb::new(0.706, 0.016, 0.150),
        )
    }
}

impl DivergingColorMap {
    pub fn new(low: Srgb, mid: Srgb, high: Srgb) -> Self {
        Self {
            low: low.into_color(),
            mid: mid.into_color(),
            high: high.into_color(),
            nan_color: Color32::DARK_GRAY,
        }
    }

    /// Colour for a value in `[-1, 1]`; out-of-range values are clamped and
    /// NaN gets the neutral grey.
    pub fn color_for(&self, value: f64) -> Color32 {
        if value.is_nan() {
            return self.nan_color;
        }
        let t = value.clamp(-1.0, 1.0) as f32;
        let lab = if t < 0.0 {
            self.mid.mix(self.low, -t)
        } else {
            self.mid.mix(self.high, t)
        };
        let rgb: Srgb = lab.into_color();
        Color32::from_rgb(
            to_u8(rgb.red),
            to_u8(rgb.green),
            to_u8(rgb.blue),
        )
    }

    /// `(value, colour)` stops for a legend strip.
    pub fn legend_entries(&self, steps: usize) -> Vec<(f64, Color32)> {
        let steps = steps.max(2);
        (0..steps)
            .map(|i| {
                let v = -1.0 + 2.0 * i as f64 / (steps - 1) as f64;
                (v, self.color_for(v))
            })
            .collect()
    }
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
