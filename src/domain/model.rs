use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// English Metric Units per inch (the unit used by PresentationML).
pub const EMU_PER_INCH: f64 = 914_400.0;

pub fn inches(value: f64) -> f64 {
    value * EMU_PER_INCH
}

/// One reported venue and the images discovered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessRecord {
    pub name: String,
    pub source_dir: PathBuf,
    pub venue_capture: Option<PathBuf>,
    pub price_images: Vec<PathBuf>,
    pub interior_images: Vec<PathBuf>,
}

impl BusinessRecord {
    pub fn new(name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            venue_capture: None,
            price_images: Vec::new(),
            interior_images: Vec::new(),
        }
    }

    pub fn has_assets(&self) -> bool {
        self.venue_capture.is_some()
            || !self.price_images.is_empty()
            || !self.interior_images.is_empty()
    }
}

/// Scanned businesses keyed by folder name.
///
/// Folder names are assumed unique per scan root. When two folders share a
/// name the later insert replaces the earlier one and the replaced record is
/// handed back to the caller.
#[derive(Debug, Clone, Default)]
pub struct BusinessMap {
    entries: BTreeMap<String, BusinessRecord>,
}

impl BusinessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: BusinessRecord) -> Option<BusinessRecord> {
        self.entries.insert(record.name.clone(), record)
    }

    pub fn remove(&mut self, name: &str) -> Option<BusinessRecord> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&BusinessRecord> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Records in alphabetical order of name.
    pub fn into_sorted(self) -> Vec<BusinessRecord> {
        self.entries.into_values().collect()
    }
}

impl IntoIterator for BusinessMap {
    type Item = (String, BusinessRecord);
    type IntoIter = btree_map::IntoIter<String, BusinessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<BusinessRecord> for BusinessMap {
    fn from_iter<I: IntoIterator<Item = BusinessRecord>>(iter: I) -> Self {
        let mut map = Self::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// An image whose pixel dimensions have been read from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub path: PathBuf,
    pub size: ImageSize,
}

impl ImageAsset {
    pub fn new(path: impl Into<PathBuf>, size: ImageSize) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.size.aspect_ratio()
    }
}

/// Axis-aligned rectangle in EMU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// True when `other` lies inside `self`, allowing `tolerance` EMU of rounding.
    pub fn contains(&self, other: &Rect, tolerance: f64) -> bool {
        other.left >= self.left - tolerance
            && other.top >= self.top - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    /// A `width` x `height` rectangle centred inside `self`.
    pub fn centered(&self, width: f64, height: f64) -> Rect {
        Rect::new(
            self.left + (self.width - width) / 2.0,
            self.top + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

/// Fractions of the source image trimmed from each edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crop {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Crop {
    /// Central square crop, or `None` for an image that is already square.
    pub fn center_square(size: ImageSize) -> Option<Crop> {
        let (w, h) = (f64::from(size.width), f64::from(size.height));
        if size.width > size.height {
            let edge = (w - h) / 2.0 / w;
            Some(Crop {
                left: edge,
                top: 0.0,
                right: edge,
                bottom: 0.0,
            })
        } else if size.height > size.width {
            let edge = (h - w) / 2.0 / h;
            Some(Crop {
                left: 0.0,
                top: edge,
                right: 0.0,
                bottom: edge,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Index of the image within the group being laid out.
    pub image: usize,
    pub rect: Rect,
    pub crop: Option<Crop>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlideLayoutPlan {
    pub placements: Vec<Placement>,
}

impl SlideLayoutPlan {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Smallest rectangle covering every placement.
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.placements.first()?.rect;
        let (mut left, mut top, mut right, mut bottom) =
            (first.left, first.top, first.right(), first.bottom());
        for placement in &self.placements[1..] {
            left = left.min(placement.rect.left);
            top = top.min(placement.rect.top);
            right = right.max(placement.rect.right());
            bottom = bottom.max(placement.rect.bottom());
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub size_pt: f64,
    pub bold: bool,
    /// BCP 47 tag; empty when unset.
    pub language: String,
}

/// A picture to embed, with an optional central crop.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    pub path: PathBuf,
    pub crop: Option<Crop>,
}

impl ImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            crop: None,
        }
    }

    pub fn with_crop(mut self, crop: Option<Crop>) -> Self {
        self.crop = crop;
        self
    }
}

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideSize {
    pub width: f64,
    pub height: f64,
}

impl SlideSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Full,
    /// Only the first `n` businesses in resolved order.
    Sample(usize),
}

impl RunMode {
    pub fn limit(&self, total: usize) -> usize {
        match self {
            RunMode::Full => total,
            RunMode::Sample(n) => (*n).min(total),
        }
    }

    /// Sample runs write `<stem>_sample<n>.<ext>` beside the configured output.
    pub fn output_path(&self, base: &Path) -> PathBuf {
        match self {
            RunMode::Full => base.to_path_buf(),
            RunMode::Sample(n) => {
                let stem = base
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "deck".to_string());
                let file_name = match base.extension() {
                    Some(ext) => format!("{}_sample{}.{}", stem, n, ext.to_string_lossy()),
                    None => format!("{}_sample{}", stem, n),
                };
                base.with_file_name(file_name)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub businesses_found: usize,
    pub businesses_emitted: usize,
    pub slides_added: usize,
    pub pictures_placed: usize,
    pub warnings: usize,
    /// `None` when nothing was written (no businesses found).
    pub output_path: Option<PathBuf>,
    pub elapsed: Duration,
}
