//! Vision snapshot types.
//!
//! A [`VisionSnapshot`] is one complete recognition pass over the game
//! client: an unordered set of text regions. Snapshots are immutable once
//! built and are shared behind `Arc` by the engine.

use serde::{Deserialize, Serialize};

/// Pixel coordinate in the game client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Same point shifted by `(dx, dy)`.
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Size of the game client area in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSize {
    pub width: i32,
    pub height: i32,
}

impl ClientSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2, self.height / 2)
    }

    /// Whether `point` lies in the bottom-right corner: the right quarter
    /// of the width and the bottom quarter of the height.
    pub const fn in_bottom_right_corner(&self, point: ScreenPoint) -> bool {
        point.x * 4 >= self.width * 3 && point.y * 4 >= self.height * 3
    }

    /// The close button position used for dismissing overlays.
    pub const fn close_button(&self) -> ScreenPoint {
        ScreenPoint::new(self.width - 70, 50)
    }
}

impl Default for ClientSize {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// A single piece of recognised on-screen text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub confidence: f32,
    pub center: ScreenPoint,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, confidence: f32, center: ScreenPoint) -> Self {
        Self {
            text: text.into(),
            confidence,
            center,
        }
    }

    pub fn matches(&self, needle: &str, mode: TextMatch) -> bool {
        match mode {
            TextMatch::Contains => self.text.contains(needle),
            TextMatch::Exact => self.text == needle,
        }
    }
}

/// How a wanted string is compared against a region's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    #[default]
    Contains,
    Exact,
}

/// One recognition pass. May be empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisionSnapshot {
    pub regions: Vec<TextRegion>,
}

impl VisionSnapshot {
    pub fn new(regions: Vec<TextRegion>) -> Self {
        Self { regions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// First region whose text contains `needle`.
    pub fn find(&self, needle: &str) -> Option<&TextRegion> {
        self.find_with(needle, TextMatch::Contains)
    }

    pub fn find_with(&self, needle: &str, mode: TextMatch) -> Option<&TextRegion> {
        self.regions.iter().find(|r| r.matches(needle, mode))
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.find(needle).is_some()
    }

    /// True when any region contains any of `needles`.
    pub fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.contains(n))
    }

    /// First region containing `needle` that also satisfies `predicate`.
    pub fn find_where<F>(&self, needle: &str, predicate: F) -> Option<&TextRegion>
    where
        F: Fn(&TextRegion) -> bool,
    {
        self.regions
            .iter()
            .find(|r| r.text.contains(needle) && predicate(r))
    }

    /// Copy of this snapshot keeping only confident, long-enough regions.
    pub fn filtered(&self, confidence_threshold: f32, min_text_length: usize) -> Self {
        let regions = self
            .regions
            .iter()
            .filter(|r| r.confidence >= confidence_threshold)
            .filter(|r| r.text.chars().count() >= min_text_length)
            .cloned()
            .collect();
        Self { regions }
    }
}

impl FromIterator<TextRegion> for VisionSnapshot {
    fn from_iter<I: IntoIterator<Item = TextRegion>>(iter: I) -> Self {
        Self {
            regions: iter.into_iter().collect(),
        }
    }
}
