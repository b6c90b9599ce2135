use image::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit RGB color. Equality is exact per channel; use [`Color::distance`]
/// when closeness matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const NEUTRAL_GRAY: Color = Color::new(128, 128, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Builds a color from floating point channels, truncating toward zero and
    /// clamping into [0, 255].
    pub fn from_channels_truncated(channels: [f64; 3]) -> Self {
        let [r, g, b] = channels.map(|c| c.trunc().clamp(0.0, 255.0) as u8);
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &Color) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    pub fn to_hsv(&self) -> HsvColor {
        HsvColor::from(*self)
    }

    /// `"R G B"`, the form the lighting actuator expects.
    pub fn to_wire_payload(&self) -> String {
        format!("{} {} {}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<Rgb<u8>> for Color {
    fn from(px: Rgb<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<&Rgb<u8>> for Color {
    fn from(px: &Rgb<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb(color.channels())
    }
}

/// HSV with every component in [0, 1]; hue is a fraction of a full turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvColor {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl From<Color> for HsvColor {
    fn from(color: Color) -> Self {
        let r = color.r as f64 / 255.0;
        let g = color.g as f64 / 255.0;
        let b = color.b as f64 / 255.0;

        let max = r.max(g.max(b));
        let min = r.min(g.min(b));
        let d = max - min;

        let hue = if d == 0.0 {
            0.0
        } else if max == r {
            ((g - b) / d).rem_euclid(6.0) / 6.0
        } else if max == g {
            ((b - r) / d + 2.0) / 6.0
        } else {
            ((r - g) / d + 4.0) / 6.0
        };

        let saturation = if max == 0.0 { 0.0 } else { d / max };

        Self {
            // rem_euclid can land exactly on 1.0 for tiny negative inputs
            hue: if hue >= 1.0 { 0.0 } else { hue },
            saturation,
            value: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_is_zero_for_identical_colors() {
        let c = Color::new(12, 200, 99);
        assert_eq!(c.distance(&c), 0.0);
    }

    #[test]
    fn distance_obeys_metric_laws() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let a = Color::new(rng.random(), rng.random(), rng.random());
            let b = Color::new(rng.random(), rng.random(), rng.random());
            let c = Color::new(rng.random(), rng.random(), rng.random());
            assert!(approx(a.distance(&b), b.distance(&a)));
            assert!(a.distance(&c) <= a.distance(&b) + b.distance(&c) + 1e-9);
        }
    }

    #[test]
    fn distance_matches_pythagoras() {
        let a = Color::new(0, 0, 0);
        let b = Color::new(30, 40, 0);
        assert!(approx(a.distance(&b), 50.0));
    }

    #[test]
    fn hsv_of_primaries() {
        let red = Color::new(255, 0, 0).to_hsv();
        assert!(approx(red.hue, 0.0) && approx(red.saturation, 1.0) && approx(red.value, 1.0));

        let green = Color::new(0, 255, 0).to_hsv();
        assert!(approx(green.hue, 1.0 / 3.0));

        let blue = Color::new(0, 0, 255).to_hsv();
        assert!(approx(blue.hue, 2.0 / 3.0));
    }

    #[test]
    fn hsv_of_achromatic_colors_has_no_saturation() {
        let gray = Color::NEUTRAL_GRAY.to_hsv();
        assert_eq!(gray.hue, 0.0);
        assert_eq!(gray.saturation, 0.0);
        assert!(approx(gray.value, 128.0 / 255.0));

        let black = Color::BLACK.to_hsv();
        assert_eq!(black.saturation, 0.0);
        assert_eq!(black.value, 0.0);
    }

    #[test]
    fn hue_for_magenta_side_of_red_wraps_below_one() {
        let hsv = Color::new(255, 0, 10).to_hsv();
        assert!(hsv.hue > 0.95 && hsv.hue < 1.0);
    }

    #[test]
    fn truncating_constructor_clamps() {
        let c = Color::from_channels_truncated([-3.5, 127.9, 300.0]);
        assert_eq!(c, Color::new(0, 127, 255));
    }

    #[test]
    fn wire_payload_is_space_separated() {
        assert_eq!(Color::new(123, 45, 200).to_wire_payload(), "123 45 200");
    }
}
