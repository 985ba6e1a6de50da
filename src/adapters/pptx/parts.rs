//! Package part names and streaming edits of the template's XML parts.
//!
//! Template parts are copied event by event; only the elements a new slide
//! needs are inserted, so everything else in the template survives unchanged.

use crate::utils::error::{DeckError, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashSet;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
pub const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
pub const SLIDE_PART_PREFIX: &str = "ppt/slides/slide";
pub const SLIDE_LAYOUT_PART_PREFIX: &str = "ppt/slideLayouts/slideLayout";
pub const MEDIA_PART_PREFIX: &str = "ppt/media/";

pub const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Default 4:3 slide size used when the template has no `p:sldSz`.
pub const DEFAULT_SLIDE_SIZE: (i64, i64) = (9_144_000, 6_858_000);

/// Smallest slide id PresentationML allows.
pub const MIN_SLIDE_ID: u32 = 256;

/// Content type for an image extension, if embeddable.
pub fn image_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// `N` from `<prefix>N<suffix>`.
pub fn part_number(part_name: &str, prefix: &str, suffix: &str) -> Option<u32> {
    part_name
        .strip_prefix(prefix)?
        .strip_suffix(suffix)?
        .parse()
        .ok()
}

/// Relationship target of `target_part` as seen from `source_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();
    let (target_dir, file) = target.split_at(target.len() - 1);

    let common = source_dir
        .iter()
        .zip(target_dir)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; source_dir.len() - common];
    segments.extend_from_slice(&target_dir[common..]);
    segments.extend_from_slice(file);
    segments.join("/")
}

/// Facts read from `ppt/presentation.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationInfo {
    pub slide_size: (i64, i64),
    pub slide_count: usize,
    pub max_slide_id: u32,
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// `"p:"` for `p:presentation`, empty for an unprefixed name.
fn prefix_of(qualified_name: &[u8]) -> String {
    match qualified_name.iter().position(|b| *b == b':') {
        Some(i) => String::from_utf8_lossy(&qualified_name[..=i]).into_owned(),
        None => String::new(),
    }
}

pub fn read_presentation_info(xml: &[u8]) -> Result<PresentationInfo> {
    let mut reader = Reader::from_reader(xml);
    let mut info = PresentationInfo {
        slide_size: DEFAULT_SLIDE_SIZE,
        slide_count: 0,
        max_slide_id: 0,
    };
    let mut size_seen = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| DeckError::xml(PRESENTATION_PART, e))?
        {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"sldSz" if !size_seen => {
                    let cx = attribute(e, b"cx").and_then(|v| v.parse().ok());
                    let cy = attribute(e, b"cy").and_then(|v| v.parse().ok());
                    if let (Some(cx), Some(cy)) = (cx, cy) {
                        info.slide_size = (cx, cy);
                    }
                    size_seen = true;
                }
                b"sldId" => {
                    info.slide_count += 1;
                    if let Some(id) = attribute(e, b"id").and_then(|v| v.parse::<u32>().ok()) {
                        info.max_slide_id = info.max_slide_id.max(id);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(info)
}

/// Highest `rIdN` in a relationships part.
pub fn max_relationship_id(xml: &[u8], part: &str) -> Result<u32> {
    let mut reader = Reader::from_reader(xml);
    let mut max = 0;
    loop {
        match reader.read_event().map_err(|e| DeckError::xml(part, e))? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let Some(n) = attribute(e, b"Id")
                    .as_deref()
                    .and_then(|id| id.strip_prefix("rId"))
                    .and_then(|n| n.parse::<u32>().ok())
                {
                    max = max.max(n);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(max)
}

/// Registers slides in `p:sldIdLst`, creating the list before `p:sldSz`
/// when the template has none.
pub fn insert_slide_ids(xml: &[u8], entries: &[(u32, String)]) -> Result<Vec<u8>> {
    let part = PRESENTATION_PART;

    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + entries.len() * 48));
    let mut prefix = String::new();
    let mut inserted = entries.is_empty();

    loop {
        let event = reader.read_event().map_err(|e| DeckError::xml(part, e))?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"presentation" => {
                prefix = prefix_of(e.name().as_ref());
            }
            Event::End(e) if !inserted && e.local_name().as_ref() == b"sldIdLst" => {
                write_slide_ids(&mut writer, &prefix, entries)?;
                inserted = true;
            }
            Event::Empty(e) if !inserted && e.local_name().as_ref() == b"sldIdLst" => {
                writer
                    .write_event(Event::Start(e.borrow()))
                    .map_err(|e| DeckError::xml(part, e))?;
                write_slide_ids(&mut writer, &prefix, entries)?;
                writer.write_event(Event::End(e.to_end())).map_err(|e| DeckError::xml(part, e))?;
                inserted = true;
                continue;
            }
            Event::Start(e) | Event::Empty(e)
                if !inserted && e.local_name().as_ref() == b"sldSz" =>
            {
                write_slide_id_list(&mut writer, &prefix, entries)?;
                inserted = true;
            }
            Event::End(e) if !inserted && e.local_name().as_ref() == b"presentation" => {
                write_slide_id_list(&mut writer, &prefix, entries)?;
                inserted = true;
            }
            _ => {}
        }
        writer.write_event(event).map_err(|e| DeckError::xml(part, e))?;
    }

    Ok(writer.into_inner())
}

fn write_slide_id_list(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    entries: &[(u32, String)],
) -> Result<()> {
    let name = format!("{}sldIdLst", prefix);
    writer
        .write_event(Event::Start(BytesStart::new(name.as_str())))
        .map_err(|e| DeckError::xml(PRESENTATION_PART, e))?;
    write_slide_ids(writer, prefix, entries)?;
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(|e| DeckError::xml(PRESENTATION_PART, e))
}

fn write_slide_ids(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    entries: &[(u32, String)],
) -> Result<()> {
    for (id, rel_id) in entries {
        let mut element = BytesStart::new(format!("{}sldId", prefix));
        element.push_attribute(("id", id.to_string().as_str()));
        element.push_attribute(("r:id", rel_id.as_str()));
        writer
            .write_event(Event::Empty(element))
            .map_err(|e| DeckError::xml(PRESENTATION_PART, e))?;
    }
    Ok(())
}

/// A relationship to append to an existing `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
}

pub fn append_relationships(
    xml: &[u8],
    part: &str,
    relationships: &[Relationship],
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + relationships.len() * 160));

    loop {
        let event = reader.read_event().map_err(|e| DeckError::xml(part, e))?;
        match &event {
            Event::Eof => break,
            Event::End(e) if e.local_name().as_ref() == b"Relationships" => {
                let prefix = prefix_of(e.name().as_ref());
                for rel in relationships {
                    let mut element = BytesStart::new(format!("{}Relationship", prefix));
                    element.push_attribute(("Id", rel.id.as_str()));
                    element.push_attribute(("Type", rel.kind));
                    element.push_attribute(("Target", rel.target.as_str()));
                    writer.write_event(Event::Empty(element)).map_err(|e| DeckError::xml(part, e))?;
                }
            }
            _ => {}
        }
        writer.write_event(event).map_err(|e| DeckError::xml(part, e))?;
    }

    Ok(writer.into_inner())
}

/// Adds missing `Default` extensions and an `Override` per new part.
pub fn extend_content_types(
    xml: &[u8],
    defaults: &[(String, &'static str)],
    overrides: &[(String, &'static str)],
) -> Result<Vec<u8>> {
    let part = CONTENT_TYPES_PART;
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + overrides.len() * 128));
    let mut known_extensions: HashSet<String> = HashSet::new();
    let mut known_parts: HashSet<String> = HashSet::new();

    loop {
        let event = reader.read_event().map_err(|e| DeckError::xml(part, e))?;
        match &event {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"Default" => {
                    if let Some(ext) = attribute(e, b"Extension") {
                        known_extensions.insert(ext.to_ascii_lowercase());
                    }
                }
                b"Override" => {
                    if let Some(name) = attribute(e, b"PartName") {
                        known_parts.insert(name);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"Types" => {
                let prefix = prefix_of(e.name().as_ref());
                for (extension, content_type) in defaults {
                    if known_extensions.insert(extension.to_ascii_lowercase()) {
                        let mut element = BytesStart::new(format!("{}Default", prefix));
                        element.push_attribute(("Extension", extension.as_str()));
                        element.push_attribute(("ContentType", *content_type));
                        writer
                            .write_event(Event::Empty(element))
                            .map_err(|e| DeckError::xml(part, e))?;
                    }
                }
                for (part_name, content_type) in overrides {
                    let part_name = format!("/{}", part_name.trim_start_matches('/'));
                    if known_parts.contains(&part_name) {
                        continue;
                    }
                    let mut element = BytesStart::new(format!("{}Override", prefix));
                    element.push_attribute(("PartName", part_name.as_str()));
                    element.push_attribute(("ContentType", *content_type));
                    writer.write_event(Event::Empty(element)).map_err(|e| DeckError::xml(part, e))?;
                }
            }
            _ => {}
        }
        writer.write_event(event).map_err(|e| DeckError::xml(part, e))?;
    }

    Ok(writer.into_inner())
}
