//! Turns one business record into its slides.

use crate::config::{LayoutConfig, TextConfig};
use crate::core::layout::{group_images, LayoutPlanner};
use crate::domain::events::{ProgressEvent, SlideKind};
use crate::domain::model::{
    inches, BusinessRecord, ImageAsset, ImageSource, Rect, SlideLayoutPlan, SlideSize, TextStyle,
};
use crate::domain::ports::{DocumentBuilder, ImageProbe, ProgressSink};
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Height of the deck cover title box.
const DECK_TITLE_HEIGHT_IN: f64 = 1.5;

/// Price images per slide.
const PRICE_CHUNK: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub slides: usize,
    pub pictures: usize,
}

impl std::ops::AddAssign for EmitStats {
    fn add_assign(&mut self, other: Self) {
        self.slides += other.slides;
        self.pictures += other.pictures;
    }
}

pub struct SlideEmitter<'a, P: ImageProbe> {
    planner: LayoutPlanner,
    layout: &'a LayoutConfig,
    text: &'a TextConfig,
    style: TextStyle,
    slide: SlideSize,
    probe: &'a P,
}

impl<'a, P: ImageProbe> SlideEmitter<'a, P> {
    pub fn new(
        slide: SlideSize,
        layout: &'a LayoutConfig,
        text: &'a TextConfig,
        probe: &'a P,
    ) -> Self {
        Self {
            planner: LayoutPlanner::new(slide, layout.margins(), layout.gap_emu()),
            layout,
            text,
            style: text.style(),
            slide,
            probe,
        }
    }

    /// Title strip above the content box.
    pub fn title_rect(&self) -> Rect {
        let left = inches(self.layout.margin_left);
        Rect::new(
            left,
            inches(self.layout.title_top),
            (self.slide.width - left - inches(self.layout.margin_right)).max(0.0),
            inches(self.layout.title_height),
        )
    }

    pub fn emit_deck_cover<D, S>(&self, doc: &mut D, sink: &mut S) -> Result<EmitStats>
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        doc.add_slide()?;
        let title = self.title_rect();
        let height = inches(DECK_TITLE_HEIGHT_IN);
        let rect = Rect::new(title.left, (self.slide.height - height) / 2.0, title.width, height);
        self.place_text(doc, rect, &self.text.deck_title, sink);
        Ok(self.finish_slide(SlideKind::DeckCover, 0, sink))
    }

    /// Cover, price slides, then image-group slides for `business`.
    pub fn emit_business<D, S>(
        &self,
        doc: &mut D,
        business: &BusinessRecord,
        sink: &mut S,
    ) -> Result<EmitStats>
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        let mut stats = self.emit_cover(doc, business, sink)?;

        let prices = self.probe_images(&business.price_images, sink);
        for chunk in prices.chunks(PRICE_CHUNK) {
            let sizes: Vec<_> = chunk.iter().map(|image| image.size).collect();
            let plan = self.planner.price_row(&sizes);
            let heading = &self.text.price_heading;
            stats += self.emit_plan_slide(doc, SlideKind::PriceList, heading, &plan, chunk, sink)?;
        }

        let interiors = self.probe_images(&business.interior_images, sink);
        for group in group_images(&interiors, self.layout.wide_threshold, self.layout.max_group) {
            let sizes: Vec<_> = group.iter().map(|image| image.size).collect();
            let plan = self.planner.image_group(&sizes);
            let heading = &self.text.interior_heading;
            stats +=
                self.emit_plan_slide(doc, SlideKind::ImageGroup, heading, &plan, &group, sink)?;
        }

        tracing::debug!(
            "{}: {} slides, {} pictures",
            business.name,
            stats.slides,
            stats.pictures
        );
        Ok(stats)
    }

    fn emit_cover<D, S>(
        &self,
        doc: &mut D,
        business: &BusinessRecord,
        sink: &mut S,
    ) -> Result<EmitStats>
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        doc.add_slide()?;
        self.place_text(doc, self.title_rect(), &business.name, sink);

        let mut pictures = 0;
        if let Some(capture) = &business.venue_capture {
            if let Some(image) = self.probe(capture, sink) {
                let plan = self.planner.fit(image.size);
                pictures = self.place_plan(doc, &plan, std::slice::from_ref(&image), sink);
            }
        }
        Ok(self.finish_slide(SlideKind::BusinessCover, pictures, sink))
    }

    fn emit_plan_slide<D, S>(
        &self,
        doc: &mut D,
        kind: SlideKind,
        heading: &str,
        plan: &SlideLayoutPlan,
        images: &[ImageAsset],
        sink: &mut S,
    ) -> Result<EmitStats>
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        doc.add_slide()?;
        if !heading.trim().is_empty() {
            self.place_text(doc, self.title_rect(), heading, sink);
        }
        let pictures = self.place_plan(doc, plan, images, sink);
        Ok(self.finish_slide(kind, pictures, sink))
    }

    fn finish_slide<S: ProgressSink>(
        &self,
        kind: SlideKind,
        pictures: usize,
        sink: &mut S,
    ) -> EmitStats {
        sink.report(ProgressEvent::SlideAdded { kind, pictures });
        EmitStats { slides: 1, pictures }
    }

    fn place_text<D, S>(&self, doc: &mut D, rect: Rect, text: &str, sink: &mut S)
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        if let Err(e) = doc.add_text_box(rect, text, &self.style) {
            sink.report(ProgressEvent::PlacementFailed {
                target: format!("text '{}'", text),
                reason: e.to_string(),
            });
        }
    }

    /// Places each planned picture; returns how many landed on the slide.
    fn place_plan<D, S>(
        &self,
        doc: &mut D,
        plan: &SlideLayoutPlan,
        images: &[ImageAsset],
        sink: &mut S,
    ) -> usize
    where
        D: DocumentBuilder,
        S: ProgressSink,
    {
        let mut placed = 0;
        for placement in &plan.placements {
            let Some(image) = images.get(placement.image) else {
                continue;
            };
            let source = ImageSource::new(&image.path).with_crop(placement.crop);
            match doc.add_picture(placement.rect, &source) {
                Ok(()) => placed += 1,
                Err(e) => sink.report(ProgressEvent::PlacementFailed {
                    target: image.path.display().to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        placed
    }

    /// Readable images in input order; the rest are reported and dropped.
    pub fn probe_images<S: ProgressSink>(
        &self,
        paths: &[PathBuf],
        sink: &mut S,
    ) -> Vec<ImageAsset> {
        paths.iter().filter_map(|path| self.probe(path, sink)).collect()
    }

    fn probe<S: ProgressSink>(&self, path: &Path, sink: &mut S) -> Option<ImageAsset> {
        match self.probe.dimensions(path) {
            Ok(size) if size.width > 0 && size.height > 0 => Some(ImageAsset::new(path, size)),
            Ok(_) => {
                sink.report(ProgressEvent::ImageSkipped {
                    path: path.to_path_buf(),
                    reason: "image has no pixels".to_string(),
                });
                None
            }
            Err(e) => {
                sink.report(ProgressEvent::ImageSkipped {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::progress::CollectingSink;
    use crate::domain::model::ImageSize;
    use crate::utils::error::DeckError;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeProbe {
        sizes: HashMap<PathBuf, ImageSize>,
    }

    impl FakeProbe {
        fn with(mut self, path: &str, width: u32, height: u32) -> Self {
            self.sizes.insert(PathBuf::from(path), ImageSize::new(width, height));
            self
        }
    }

    impl ImageProbe for FakeProbe {
        fn dimensions(&self, path: &Path) -> Result<ImageSize> {
            self.sizes.get(path).copied().ok_or_else(|| DeckError::UnsupportedImage {
                path: path.to_path_buf(),
            })
        }
    }

    #[derive(Debug, PartialEq)]
    enum Op {
        Slide,
        Text(String),
        Picture(PathBuf, bool),
    }

    #[derive(Default)]
    struct RecordingDoc {
        ops: Vec<Op>,
        slides: usize,
        reject: Option<PathBuf>,
    }

    impl DocumentBuilder for RecordingDoc {
        fn slide_size(&self) -> SlideSize {
            SlideSize::new(inches(13.333), inches(7.5))
        }

        fn slide_count(&self) -> usize {
            self.slides
        }

        fn add_slide(&mut self) -> Result<usize> {
            self.slides += 1;
            self.ops.push(Op::Slide);
            Ok(self.slides - 1)
        }

        fn add_text_box(&mut self, _rect: Rect, text: &str, _style: &TextStyle) -> Result<()> {
            self.ops.push(Op::Text(text.to_string()));
            Ok(())
        }

        fn add_picture(&mut self, _rect: Rect, image: &ImageSource) -> Result<()> {
            if self.reject.as_deref() == Some(image.path.as_path()) {
                return Err(DeckError::document("rejected"));
            }
            self.ops.push(Op::Picture(image.path.clone(), image.crop.is_some()));
            Ok(())
        }

        fn save(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn business() -> BusinessRecord {
        let mut record = BusinessRecord::new("Alpha", "/root/Alpha");
        record.venue_capture = Some(PathBuf::from("cap.png"));
        record.price_images = vec![PathBuf::from("p1.jpg"), PathBuf::from("p2.jpg")];
        record.interior_images = vec![
            PathBuf::from("i1.jpg"),
            PathBuf::from("i2.jpg"),
            PathBuf::from("wide.jpg"),
        ];
        record
    }

    fn probe() -> FakeProbe {
        FakeProbe::default()
            .with("cap.png", 1600, 900)
            .with("p1.jpg", 800, 1200)
            .with("p2.jpg", 800, 1200)
            .with("i1.jpg", 800, 1000)
            .with("i2.jpg", 900, 1000)
            .with("wide.jpg", 2000, 1000)
    }

    #[test]
    fn test_business_slide_sequence() {
        let (layout, text) = (LayoutConfig::default(), TextConfig::default());
        let probe = probe();
        let mut doc = RecordingDoc::default();
        let emitter = SlideEmitter::new(doc.slide_size(), &layout, &text, &probe);
        let mut sink = CollectingSink::default();

        let stats = emitter.emit_business(&mut doc, &business(), &mut sink).unwrap();
        assert_eq!(stats, EmitStats { slides: 4, pictures: 6 });

        assert_eq!(
            doc.ops,
            vec![
                Op::Slide,
                Op::Text("Alpha".into()),
                Op::Picture("cap.png".into(), false),
                Op::Slide,
                Op::Text("가격표".into()),
                Op::Picture("p1.jpg".into(), false),
                Op::Picture("p2.jpg".into(), false),
                Op::Slide,
                Op::Text("인테리어".into()),
                Op::Picture("i1.jpg".into(), true),
                Op::Picture("i2.jpg".into(), true),
                Op::Slide,
                Op::Text("인테리어".into()),
                Op::Picture("wide.jpg".into(), true),
            ]
        );
        let kinds: Vec<SlideKind> = sink
            .events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::SlideAdded { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                SlideKind::BusinessCover,
                SlideKind::PriceList,
                SlideKind::ImageGroup,
                SlideKind::ImageGroup
            ]
        );
    }

    #[test]
    fn test_price_images_split_three_per_slide() {
        let (layout, text) = (LayoutConfig::default(), TextConfig::default());
        let probe = FakeProbe::default()
            .with("p1.jpg", 800, 1200)
            .with("p2.jpg", 800, 1200)
            .with("p3.jpg", 800, 1200)
            .with("p4.jpg", 800, 1200);
        let mut record = BusinessRecord::new("Delta", "/root/Delta");
        record.price_images = ["p1.jpg", "p2.jpg", "p3.jpg", "p4.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let mut doc = RecordingDoc::default();
        let emitter = SlideEmitter::new(doc.slide_size(), &layout, &text, &probe);
        let mut sink = CollectingSink::default();
        let stats = emitter.emit_business(&mut doc, &record, &mut sink).unwrap();

        assert_eq!(stats, EmitStats { slides: 3, pictures: 4 });
        let slides: Vec<(SlideKind, usize)> = sink
            .events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::SlideAdded { kind, pictures } => Some((*kind, *pictures)),
                _ => None,
            })
            .collect();
        assert_eq!(
            slides,
            vec![
                (SlideKind::BusinessCover, 0),
                (SlideKind::PriceList, 3),
                (SlideKind::PriceList, 1),
            ]
        );
    }

    #[test]
    fn test_unreadable_images_are_skipped() {
        let (layout, text) = (LayoutConfig::default(), TextConfig::default());
        let probe = FakeProbe::default().with("i2.jpg", 900, 1000);
        let mut record = BusinessRecord::new("Beta", "/root/Beta");
        record.venue_capture = Some(PathBuf::from("missing.png"));
        record.interior_images = vec![PathBuf::from("broken.jpg"), PathBuf::from("i2.jpg")];

        let mut doc = RecordingDoc::default();
        let emitter = SlideEmitter::new(doc.slide_size(), &layout, &text, &probe);
        let mut sink = CollectingSink::default();
        let stats = emitter.emit_business(&mut doc, &record, &mut sink).unwrap();

        assert_eq!(stats, EmitStats { slides: 2, pictures: 1 });
        assert_eq!(
            sink.events
                .iter()
                .filter(|e| matches!(e, ProgressEvent::ImageSkipped { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_placement_failure_does_not_stop_slide() {
        let (layout, text) = (LayoutConfig::default(), TextConfig::default());
        let probe = probe();
        let mut doc = RecordingDoc {
            reject: Some(PathBuf::from("p1.jpg")),
            ..RecordingDoc::default()
        };
        let emitter = SlideEmitter::new(doc.slide_size(), &layout, &text, &probe);
        let mut sink = CollectingSink::default();

        let stats = emitter.emit_business(&mut doc, &business(), &mut sink).unwrap();
        assert_eq!(stats.pictures, 5);
        assert!(doc.ops.contains(&Op::Picture("p2.jpg".into(), false)));
        assert!(sink
            .events
            .iter()
            .any(|e| matches!(
                e,
                ProgressEvent::PlacementFailed { target, .. } if target == "p1.jpg"
            )));
    }

    #[test]
    fn test_empty_heading_is_omitted() {
        let layout = LayoutConfig::default();
        let text = TextConfig {
            price_heading: String::new(),
            ..TextConfig::default()
        };
        let probe = probe();
        let mut record = BusinessRecord::new("Gamma", "/root/Gamma");
        record.price_images = vec![PathBuf::from("p1.jpg")];

        let mut doc = RecordingDoc::default();
        let emitter = SlideEmitter::new(doc.slide_size(), &layout, &text, &probe);
        emitter
            .emit_business(&mut doc, &record, &mut CollectingSink::default())
            .unwrap();
        assert_eq!(
            doc.ops,
            vec![
                Op::Slide,
                Op::Text("Gamma".into()),
                Op::Slide,
                Op::Picture("p1.jpg".into(), false),
            ]
        );
    }

    #[test]
    fn test_deck_cover_is_vertically_centred() {
        let (layout, text) = (LayoutConfig::default(), TextConfig::default());
        let probe = FakeProbe::default();
        let mut doc = RecordingDoc::default();
        let emitter = SlideEmitter::new(doc.slide_size(), &layout, &text, &probe);
        let stats = emitter
            .emit_deck_cover(&mut doc, &mut CollectingSink::default())
            .unwrap();

        assert_eq!(stats, EmitStats { slides: 1, pictures: 0 });
        assert_eq!(doc.ops, vec![Op::Slide, Op::Text("업체 정보".into())]);
        let title = emitter.title_rect();
        assert!((title.width - inches(12.333)).abs() < 1.0);
    }
}
