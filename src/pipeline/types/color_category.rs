use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse, human-readable color names used for stability and cooldown checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorCategory {
    White,
    Black,
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    DarkBlue,
    Blue,
    LightBlue,
    Purple,
    Pink,
}

impl ColorCategory {
    pub const ALL: [ColorCategory; 12] = [
        ColorCategory::White,
        ColorCategory::Black,
        ColorCategory::Gray,
        ColorCategory::Red,
        ColorCategory::Orange,
        ColorCategory::Yellow,
        ColorCategory::Green,
        ColorCategory::DarkBlue,
        ColorCategory::Blue,
        ColorCategory::LightBlue,
        ColorCategory::Purple,
        ColorCategory::Pink,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColorCategory::White => "White",
            ColorCategory::Black => "Black",
            ColorCategory::Gray => "Gray",
            ColorCategory::Red => "Red",
            ColorCategory::Orange => "Orange",
            ColorCategory::Yellow => "Yellow",
            ColorCategory::Green => "Green",
            ColorCategory::DarkBlue => "Dark Blue",
            ColorCategory::Blue => "Blue",
            ColorCategory::LightBlue => "Light Blue",
            ColorCategory::Purple => "Purple",
            ColorCategory::Pink => "Pink",
        }
    }
}

impl fmt::Display for ColorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
