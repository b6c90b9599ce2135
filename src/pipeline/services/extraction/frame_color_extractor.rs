use image::{imageops::FilterType, DynamicImage, RgbImage};
use indexmap::IndexMap;

use crate::common::Color;

/// Picks the most frequent sufficiently vivid color of a frame.
#[derive(Debug, Clone)]
pub struct FrameColorExtractor {
    downsample_size: u32,
    vividness_threshold: f64,
    fallback: Color,
}

impl FrameColorExtractor {
    pub const DEFAULT_DOWNSAMPLE_SIZE: u32 = 50;
    pub const DEFAULT_VIVIDNESS_THRESHOLD: f64 = 0.15;

    pub fn new() -> Self {
        Self {
            downsample_size: Self::DEFAULT_DOWNSAMPLE_SIZE,
            vividness_threshold: Self::DEFAULT_VIVIDNESS_THRESHOLD,
            fallback: Color::NEUTRAL_GRAY,
        }
    }

    pub fn with_downsample_size(mut self, size: u32) -> Self {
        self.downsample_size = size.max(1);
        self
    }

    /// Both saturation and value must strictly exceed this for a color to count.
    pub fn with_vividness_threshold(mut self, threshold: f64) -> Self {
        self.vividness_threshold = threshold;
        self
    }

    pub fn vividness_threshold(&self) -> f64 {
        self.vividness_threshold
    }

    pub fn downsample_size(&self) -> u32 {
        self.downsample_size
    }

    /// Returns the dominant vivid color, or neutral gray when the frame has
    /// none (black desktop, grayscale content).
    pub fn extract(&self, image: &DynamicImage) -> Color {
        let small = image
            .resize_exact(self.downsample_size, self.downsample_size, FilterType::Lanczos3)
            .to_rgb8();

        self.ranked_colors(&small)
            .into_iter()
            .map(|(color, _)| color)
            .find(|color| self.is_vivid(*color))
            .unwrap_or(self.fallback)
    }

    pub fn is_vivid(&self, color: Color) -> bool {
        let hsv = color.to_hsv();
        hsv.saturation > self.vividness_threshold && hsv.value > self.vividness_threshold
    }

    /// Distinct colors by descending count; ties keep scan order.
    fn ranked_colors(&self, image: &RgbImage) -> Vec<(Color, u32)> {
        let mut color_counts: IndexMap<Color, u32> = IndexMap::new();
        for px in image.pixels() {
            *color_counts.entry(Color::from(px)).or_insert(0) += 1;
        }

        let mut sorted: Vec<(Color, u32)> = color_counts.into_iter().collect();
        sorted.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
        sorted
    }
}

impl Default for FrameColorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn solid_vivid_frame_returns_its_color() {
        let extractor = FrameColorExtractor::new();
        assert_eq!(
            extractor.extract(&solid(320, 200, [200, 10, 10])),
            Color::new(200, 10, 10)
        );
    }

    #[test]
    fn dark_frame_falls_back_to_gray() {
        let extractor = FrameColorExtractor::new();
        assert_eq!(extractor.extract(&solid(64, 64, [10, 10, 10])), Color::NEUTRAL_GRAY);
    }

    #[test]
    fn monochrome_frames_fall_back_to_gray() {
        let extractor = FrameColorExtractor::new();
        for level in [0u8, 60, 128, 255] {
            assert_eq!(
                extractor.extract(&solid(80, 45, [level, level, level])),
                Color::NEUTRAL_GRAY
            );
        }
    }

    #[test]
    fn most_frequent_vivid_color_wins_over_dominant_gray() {
        // left 60% gray, then 30% blue, 10% green
        let image = RgbImage::from_fn(100, 100, |x, _| {
            if x < 60 {
                Rgb([90, 90, 90])
            } else if x < 90 {
                Rgb([20, 40, 220])
            } else {
                Rgb([30, 200, 40])
            }
        });
        let extractor = FrameColorExtractor::new().with_downsample_size(100);
        assert_eq!(
            extractor.extract(&DynamicImage::ImageRgb8(image)),
            Color::new(20, 40, 220)
        );
    }

    #[test]
    fn stricter_threshold_skips_muted_colors() {
        // saturation ~0.2, value ~0.78
        let muted = [200, 170, 160];
        let image = RgbImage::from_fn(10, 10, |x, _| {
            if x < 7 {
                Rgb(muted)
            } else {
                Rgb([250, 20, 20])
            }
        });
        let image = DynamicImage::ImageRgb8(image);

        let relaxed = FrameColorExtractor::new().with_downsample_size(10);
        assert_eq!(relaxed.extract(&image), Color::from(Rgb(muted)));

        let strict = FrameColorExtractor::new()
            .with_downsample_size(10)
            .with_vividness_threshold(0.3);
        assert_eq!(strict.extract(&image), Color::new(250, 20, 20));
    }

    #[test]
    fn ranking_breaks_ties_by_first_appearance() {
        let image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([0, 0, 255])
            } else {
                Rgb([255, 0, 0])
            }
        });
        let ranked = FrameColorExtractor::new().ranked_colors(&image);
        assert_eq!(ranked[0], (Color::new(0, 0, 255), 1));
        assert_eq!(ranked[1], (Color::new(255, 0, 0), 1));
    }
}
