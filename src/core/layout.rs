//! Placement rectangles for one to three images per slide.
//!
//! All geometry is in EMU. The content box is the slide minus its margins;
//! every plan stays inside it and is centred on it.

use crate::config::Margins;
use crate::domain::model::{
    Crop, ImageAsset, ImageSize, Placement, Rect, SlideLayoutPlan, SlideSize,
};

/// Height over width for price-list boxes in a multi-image row.
const PRICE_ROW_ASPECT: f64 = 9.0 / 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPlanner {
    content: Rect,
    gap: f64,
}

impl LayoutPlanner {
    pub fn new(slide: SlideSize, margins: Margins, gap: f64) -> Self {
        let width = (slide.width - margins.left - margins.right).max(0.0);
        let height = (slide.height - margins.top - margins.bottom).max(0.0);
        Self::with_content(Rect::new(margins.left, margins.top, width, height), gap)
    }

    pub fn with_content(content: Rect, gap: f64) -> Self {
        Self { content, gap }
    }

    pub fn content(&self) -> Rect {
        self.content
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Whole image inside the box, aspect preserved, centred.
    pub fn fit(&self, size: ImageSize) -> SlideLayoutPlan {
        let aspect = size.aspect_ratio();
        let (width, height) = if aspect > self.content.aspect_ratio() {
            (self.content.width, self.content.width / aspect)
        } else {
            (self.content.height * aspect, self.content.height)
        };
        single(self.content.centered(width, height), None)
    }

    /// Central square crop scaled to the shorter side of the box.
    pub fn fill_square(&self, size: ImageSize) -> SlideLayoutPlan {
        let side = self.content.width.min(self.content.height);
        single(self.content.centered(side, side), Crop::center_square(size))
    }

    /// Equal squares side by side, separated by the gap.
    pub fn square_row(&self, sizes: &[ImageSize]) -> SlideLayoutPlan {
        if sizes.is_empty() {
            return SlideLayoutPlan::default();
        }
        let count = sizes.len() as f64;
        let side = ((self.content.width - (count - 1.0) * self.gap) / count)
            .min(self.content.height)
            .max(0.0);
        let crops = sizes.iter().map(|size| Crop::center_square(*size));
        self.row(side, side, crops)
    }

    /// Price-list images: one image fits by height first, several share the
    /// width in fixed 16:9 boxes.
    pub fn price_row(&self, sizes: &[ImageSize]) -> SlideLayoutPlan {
        match sizes {
            [] => SlideLayoutPlan::default(),
            [size] => {
                let aspect = size.aspect_ratio();
                let (mut width, mut height) = (self.content.height * aspect, self.content.height);
                if width > self.content.width {
                    width = self.content.width;
                    height = width / aspect;
                }
                single(self.content.centered(width, height), None)
            }
            _ => {
                let count = sizes.len() as f64;
                let mut width = ((self.content.width - (count - 1.0) * self.gap) / count).max(0.0);
                let mut height = width * PRICE_ROW_ASPECT;
                if height > self.content.height {
                    height = self.content.height;
                    width = height / PRICE_ROW_ASPECT;
                }
                self.row(width, height, sizes.iter().map(|_| None))
            }
        }
    }

    /// Layout for an interior group: one image fills a square, two or three
    /// share a square row.
    pub fn image_group(&self, sizes: &[ImageSize]) -> SlideLayoutPlan {
        match sizes {
            [size] => self.fill_square(*size),
            _ => self.square_row(sizes),
        }
    }

    fn row(
        &self,
        width: f64,
        height: f64,
        crops: impl ExactSizeIterator<Item = Option<Crop>>,
    ) -> SlideLayoutPlan {
        let count = crops.len() as f64;
        let row_width = count * width + (count - 1.0) * self.gap;
        let row = self.content.centered(row_width, height);

        let placements = crops
            .enumerate()
            .map(|(image, crop)| Placement {
                image,
                rect: Rect::new(
                    row.left + image as f64 * (width + self.gap),
                    row.top,
                    width,
                    height,
                ),
                crop,
            })
            .collect();
        SlideLayoutPlan { placements }
    }
}

fn single(rect: Rect, crop: Option<Crop>) -> SlideLayoutPlan {
    SlideLayoutPlan {
        placements: vec![Placement {
            image: 0,
            rect,
            crop,
        }],
    }
}

/// Splits images into slide groups.
///
/// An image wider than `wide_threshold` stands alone. Other images are
/// collected greedily with the immediately following non-wide images, up to
/// `max_group` per slide.
pub fn group_images(
    images: &[ImageAsset],
    wide_threshold: f64,
    max_group: usize,
) -> Vec<Vec<ImageAsset>> {
    let max_group = max_group.max(1);
    let is_wide = |image: &ImageAsset| image.aspect_ratio() > wide_threshold;

    let mut groups = Vec::new();
    let mut index = 0;
    while index < images.len() {
        let current = &images[index];
        index += 1;
        if is_wide(current) {
            groups.push(vec![current.clone()]);
            continue;
        }

        let mut group = vec![current.clone()];
        while group.len() < max_group && index < images.len() && !is_wide(&images[index]) {
            group.push(images[index].clone());
            index += 1;
        }
        groups.push(group);
    }
    groups
}
