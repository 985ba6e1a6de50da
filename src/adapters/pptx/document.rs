use super::package::TemplatePackage;
use super::parts::{
    self, image_content_type, relative_target, Relationship, CONTENT_TYPES_PART, CT_SLIDE,
    MEDIA_PART_PREFIX, MIN_SLIDE_ID, PRESENTATION_PART, PRESENTATION_RELS_PART, REL_SLIDE,
    SLIDE_PART_PREFIX,
};
use super::slide::SlideDraft;
use crate::domain::model::{ImageSource, Rect, SlideSize, TextStyle};
use crate::domain::ports::DocumentBuilder;
use crate::utils::error::{DeckError, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Image copied into the package when it is saved.
#[derive(Debug, Clone)]
struct MediaPart {
    part_name: String,
    source: PathBuf,
}

/// A presentation opened from a template; new slides are appended after the
/// template's own slides.
#[derive(Debug)]
pub struct PptxDocument {
    template: TemplatePackage,
    slide_size: SlideSize,
    template_slides: usize,
    layout_part: String,
    next_slide_number: u32,
    next_slide_id: u32,
    next_presentation_rel: u32,
    next_media_number: u32,
    slides: Vec<SlideDraft>,
    media: Vec<MediaPart>,
}

impl PptxDocument {
    /// Opens `path` and selects the layout new slides are based on.
    pub fn open(path: &Path, layout_index: usize) -> Result<Self> {
        let template = TemplatePackage::open(path)?;
        let info = parts::read_presentation_info(template.require(PRESENTATION_PART)?)?;
        let max_rel = parts::max_relationship_id(
            template.require(PRESENTATION_RELS_PART)?,
            PRESENTATION_RELS_PART,
        )?;
        let layout_part = template.slide_layout(layout_index)?;
        let (width, height) = info.slide_size;

        tracing::info!(
            "Opened template {} ({} slides, {}x{} EMU, layout {})",
            path.display(),
            info.slide_count,
            width,
            height,
            layout_part
        );

        Ok(Self {
            next_slide_number: template.max_part_number(SLIDE_PART_PREFIX, ".xml") + 1,
            next_slide_id: (info.max_slide_id + 1).max(MIN_SLIDE_ID),
            next_presentation_rel: max_rel + 1,
            next_media_number: 1,
            slide_size: SlideSize::new(width as f64, height as f64),
            template_slides: info.slide_count,
            layout_part,
            template,
            slides: Vec::new(),
            media: Vec::new(),
        })
    }

    fn current_slide(&mut self) -> Result<&mut SlideDraft> {
        self.slides
            .last_mut()
            .ok_or_else(|| DeckError::document("no slide has been added yet"))
    }

    fn register_media(&mut self, source: &Path) -> Result<String> {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| image_content_type(ext).is_some())
            .ok_or_else(|| DeckError::UnsupportedImage {
                path: source.to_path_buf(),
            })?;

        if !fs::metadata(source)?.is_file() {
            return Err(DeckError::UnsupportedImage {
                path: source.to_path_buf(),
            });
        }

        let part_name = loop {
            let candidate = format!(
                "{}deck_image{}.{}",
                MEDIA_PART_PREFIX, self.next_media_number, extension
            );
            self.next_media_number += 1;
            if !self.template.contains(&candidate) {
                break candidate;
            }
        };

        self.media.push(MediaPart {
            part_name: part_name.clone(),
            source: source.to_path_buf(),
        });
        Ok(part_name)
    }

    fn write_package<W: Write + io::Seek>(&self, out: W) -> Result<W> {
        let mut zip = ZipWriter::new(out);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let slide_entries: Vec<(u32, String)> = self
            .slides
            .iter()
            .map(|slide| (slide.slide_id, slide.presentation_rel.clone()))
            .collect();
        let slide_relationships: Vec<Relationship> = self
            .slides
            .iter()
            .map(|slide| Relationship {
                id: slide.presentation_rel.clone(),
                kind: REL_SLIDE,
                target: relative_target(PRESENTATION_PART, &slide.part_name),
            })
            .collect();

        let mut defaults: BTreeMap<String, &'static str> = BTreeMap::new();
        for media in &self.media {
            if let Some((_, ext)) = media.part_name.rsplit_once('.') {
                if let Some(content_type) = image_content_type(ext) {
                    defaults.insert(ext.to_string(), content_type);
                }
            }
        }
        let defaults: Vec<(String, &'static str)> = defaults.into_iter().collect();
        let overrides: Vec<(String, &'static str)> = self
            .slides
            .iter()
            .map(|slide| (slide.part_name.clone(), CT_SLIDE))
            .collect();

        // [Content_Types].xml 放在第一個
        let content_types = parts::extend_content_types(
            self.template.require(CONTENT_TYPES_PART)?,
            &defaults,
            &overrides,
        )?;
        zip.start_file(CONTENT_TYPES_PART, deflated)?;
        zip.write_all(&content_types)?;

        for (name, data) in self.template.parts() {
            let patched = match name.as_str() {
                CONTENT_TYPES_PART => continue,
                PRESENTATION_PART => Some(parts::insert_slide_ids(data, &slide_entries)?),
                PRESENTATION_RELS_PART => Some(parts::append_relationships(
                    data,
                    PRESENTATION_RELS_PART,
                    &slide_relationships,
                )?),
                _ => None,
            };
            zip.start_file(name.as_str(), deflated)?;
            zip.write_all(patched.as_deref().unwrap_or(data))?;
        }

        for slide in &self.slides {
            zip.start_file(slide.part_name.as_str(), deflated)?;
            zip.write_all(slide.to_xml()?.as_bytes())?;
            zip.start_file(slide.rels_part_name(), deflated)?;
            zip.write_all(slide.rels_xml(&self.layout_part)?.as_bytes())?;
        }

        for media in &self.media {
            zip.start_file(media.part_name.as_str(), stored)?;
            let mut source = File::open(&media.source)?;
            io::copy(&mut source, &mut zip)?;
        }

        Ok(zip.finish()?)
    }
}

impl DocumentBuilder for PptxDocument {
    fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    fn slide_count(&self) -> usize {
        self.template_slides + self.slides.len()
    }

    fn add_slide(&mut self) -> Result<usize> {
        let part_name = format!("{}{}.xml", SLIDE_PART_PREFIX, self.next_slide_number);
        let presentation_rel = format!("rId{}", self.next_presentation_rel);
        let slide = SlideDraft::new(part_name, self.next_slide_id, presentation_rel);

        self.next_slide_number += 1;
        self.next_slide_id += 1;
        self.next_presentation_rel += 1;
        self.slides.push(slide);
        Ok(self.slide_count() - 1)
    }

    fn add_text_box(&mut self, rect: Rect, text: &str, style: &TextStyle) -> Result<()> {
        self.current_slide()?.add_text_box(rect, text, style);
        Ok(())
    }

    fn add_picture(&mut self, rect: Rect, image: &ImageSource) -> Result<()> {
        self.current_slide()?;
        let media_part = self.register_media(&image.path)?;
        let description = image
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.current_slide()?
            .add_picture(rect, media_part, description, image.crop);
        Ok(())
    }

    /// Writes to a sibling staging file and renames it over `path`.
    fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut staging = path.as_os_str().to_owned();
        staging.push(".part");
        let staging = PathBuf::from(staging);

        let written = File::create(&staging)
            .map_err(DeckError::from)
            .and_then(|file| self.write_package(BufWriter::new(file)))
            .and_then(|mut out| out.flush().map_err(DeckError::from));

        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        fs::rename(&staging, path)?;
        tracing::info!(
            "Wrote {} ({} new slides, {} images)",
            path.display(),
            self.slides.len(),
            self.media.len()
        );
        Ok(())
    }
}
