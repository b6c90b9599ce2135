use crate::common::{Color, HsvColor};
use crate::pipeline::types::ColorCategory;

/// Maps colors onto a fixed set of names. Achromatic checks run before the hue
/// bands, and the hue bands tile [0, 1) without gaps so every color gets
/// exactly one name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorClassifier;

impl ColorClassifier {
    const ACHROMATIC_SATURATION: f64 = 0.1;
    const WHITE_VALUE: f64 = 0.9;
    const BLACK_VALUE: f64 = 0.1;

    // Upper (exclusive) hue bounds, in turns.
    const RED_LOW: f64 = 0.05;
    const ORANGE_HIGH: f64 = 0.10;
    const YELLOW_HIGH: f64 = 0.18;
    const GREEN_HIGH: f64 = 0.40;
    const BLUE_HIGH: f64 = 0.70;
    const PURPLE_HIGH: f64 = 0.85;
    const RED_HIGH: f64 = 0.95;

    const DARK_BLUE_VALUE: f64 = 0.3;
    const LIGHT_BLUE_VALUE: f64 = 0.7;

    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, color: Color) -> ColorCategory {
        self.classify_hsv(color.to_hsv())
    }

    pub fn classify_hsv(&self, hsv: HsvColor) -> ColorCategory {
        let HsvColor {
            hue: h,
            saturation: s,
            value: v,
        } = hsv;

        if s < Self::ACHROMATIC_SATURATION && v > Self::WHITE_VALUE {
            return ColorCategory::White;
        }
        if v < Self::BLACK_VALUE {
            return ColorCategory::Black;
        }
        if s < Self::ACHROMATIC_SATURATION {
            return ColorCategory::Gray;
        }

        if h < Self::RED_LOW || h > Self::RED_HIGH {
            ColorCategory::Red
        } else if h < Self::ORANGE_HIGH {
            ColorCategory::Orange
        } else if h < Self::YELLOW_HIGH {
            ColorCategory::Yellow
        } else if h < Self::GREEN_HIGH {
            ColorCategory::Green
        } else if h < Self::BLUE_HIGH {
            if v < Self::DARK_BLUE_VALUE {
                ColorCategory::DarkBlue
            } else if v < Self::LIGHT_BLUE_VALUE {
                ColorCategory::Blue
            } else {
                ColorCategory::LightBlue
            }
        } else if h < Self::PURPLE_HIGH {
            ColorCategory::Purple
        } else {
            ColorCategory::Pink
        }
    }

    pub fn same_category(&self, a: Color, b: Color) -> bool {
        self.classify(a) == self.classify(b)
    }
}
