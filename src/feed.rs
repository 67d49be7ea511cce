//! Tolerant RSS/Atom feed extraction.
//!
//! Real-world feeds are frequently malformed, so parsing has to be
//! forgiving: tag matching is case-insensitive, attributes on field tags are
//! ignored unless asked for, and a reader error abandons the rest of the
//! document while keeping every block already scanned. The streaming reader
//! walks `<item>` (RSS) or `<entry>` (Atom) containers and flattens each
//! into a list of fields that the `extract_*` helpers query with first-match
//! semantics.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use tracing::{debug, instrument};

use crate::models::RawRecord;
use crate::text::{clean, shorten};
use crate::utils::parse_date;

/// Summaries are pre-truncated at extraction time.
const SUMMARY_MAX_CHARS: usize = 240;

static ATOM_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<feed\b").unwrap());

/// One element inside an item/entry block: lowercased tag name, attributes,
/// and accumulated inner text (nested markup reads as a word break).
#[derive(Debug)]
struct TagField {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
}

fn event_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_lowercase()
}

fn collect_attrs(start: &BytesStart<'_>) -> Vec<(String, String)> {
    start
        .attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).to_lowercase(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect()
}

/// Scan every `<container>` block in the document into a flat field list.
///
/// Stops quietly at the first unrecoverable reader error; whatever parsed
/// before the error is kept.
fn scan_blocks(document: &str, container: &str) -> Vec<Vec<TagField>> {
    let mut reader = Reader::from_str(document);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut blocks: Vec<Vec<TagField>> = Vec::new();
    let mut block: Option<Vec<TagField>> = None;
    let mut field: Option<TagField> = None;
    // nesting depth of markup inside the current field element
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = event_name(start.name().as_ref());
                if block.is_none() {
                    if name == container {
                        block = Some(Vec::new());
                    }
                } else if field.is_none() {
                    field = Some(TagField {
                        name,
                        attrs: collect_attrs(&start),
                        text: String::new(),
                    });
                    depth = 0;
                } else {
                    depth += 1;
                    if let Some(f) = field.as_mut() {
                        f.text.push(' ');
                    }
                }
            }
            Ok(Event::Empty(start)) => {
                let name = event_name(start.name().as_ref());
                if let Some(fields) = block.as_mut() {
                    match field.as_mut() {
                        None => fields.push(TagField {
                            name,
                            attrs: collect_attrs(&start),
                            text: String::new(),
                        }),
                        Some(f) => f.text.push(' '),
                    }
                }
            }
            Ok(Event::End(end)) => {
                let name = event_name(end.name().as_ref());
                if block.is_none() {
                    continue;
                }
                if depth > 0 && field.is_some() {
                    depth -= 1;
                    if let Some(f) = field.as_mut() {
                        f.text.push(' ');
                    }
                    continue;
                }
                // closes the current field; a container end while a field
                // was still open means the field's close tag went missing
                if let (Some(f), Some(fields)) = (field.take(), block.as_mut()) {
                    fields.push(f);
                }
                if name == container {
                    if let Some(done) = block.take() {
                        blocks.push(done);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(f) = field.as_mut() {
                    match text.xml_content() {
                        Ok(decoded) => f.text.push_str(&decoded),
                        // leave the raw reference in place; the sanitizer
                        // decodes what it can
                        Err(_) => f.text.push_str(&String::from_utf8_lossy(text.as_ref())),
                    }
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(f) = field.as_mut() {
                    f.text.push_str(&String::from_utf8_lossy(cdata.as_ref()));
                }
            }
            Ok(Event::GeneralRef(reference)) => {
                if let Some(f) = field.as_mut() {
                    f.text.push('&');
                    f.text.push_str(&String::from_utf8_lossy(&reference));
                    f.text.push(';');
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                debug!(%error, "abandoning malformed feed document mid-scan");
                break;
            }
        }
    }

    blocks
}

/// First field matching `tag` (names are stored lowercased), cleaned.
fn extract_text(block: &[TagField], tag: &str) -> String {
    block
        .iter()
        .find(|f| f.name == tag)
        .map(|f| clean(&f.text))
        .unwrap_or_default()
}

/// Cleaned text of every field matching `tag`, empties dropped.
fn extract_text_list(block: &[TagField], tag: &str) -> Vec<String> {
    block
        .iter()
        .filter(|f| f.name == tag)
        .map(|f| clean(&f.text))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Attribute value from the first `tag` field that carries `attr`.
fn extract_attr(block: &[TagField], tag: &str, attr: &str) -> String {
    block
        .iter()
        .filter(|f| f.name == tag)
        .find_map(|f| {
            f.attrs
                .iter()
                .find(|(key, _)| key == attr)
                .map(|(_, value)| value.clone())
        })
        .unwrap_or_default()
}

/// First synonym tag whose cleaned text is non-empty.
fn first_text(block: &[TagField], tags: &[&str]) -> String {
    tags.iter()
        .map(|tag| extract_text(block, tag))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// First timestamp tag whose value parses.
fn first_parsed_date(block: &[TagField], tags: &[&str]) -> Option<DateTime<Utc>> {
    tags.iter().find_map(|tag| parse_date(&extract_text(block, tag)))
}

fn extract_rss_items(document: &str, source_name: &str) -> Vec<RawRecord> {
    scan_blocks(document, "item")
        .into_iter()
        .map(|block| RawRecord {
            source: source_name.to_string(),
            title: extract_text(&block, "title"),
            summary: shorten(
                &first_text(&block, &["description", "content:encoded", "content"]),
                SUMMARY_MAX_CHARS,
            ),
            url: extract_text(&block, "link"),
            published_at: first_parsed_date(&block, &["pubdate", "dc:date", "updated"]),
            keywords: extract_text_list(&block, "category"),
        })
        .collect()
}

fn extract_atom_entries(document: &str, source_name: &str) -> Vec<RawRecord> {
    scan_blocks(document, "entry")
        .into_iter()
        .map(|block| {
            // Atom links come either as inline text or as a bare href
            // attribute on a self-closing element
            let inline = extract_text(&block, "link");
            let url = if inline.is_empty() {
                clean(&extract_attr(&block, "link", "href"))
            } else {
                inline
            };
            RawRecord {
                source: source_name.to_string(),
                title: extract_text(&block, "title"),
                summary: shorten(&first_text(&block, &["summary", "content"]), SUMMARY_MAX_CHARS),
                url,
                published_at: first_parsed_date(&block, &["updated", "published"]),
                keywords: extract_text_list(&block, "category"),
            }
        })
        .collect()
}

/// Extract raw candidate records from one feed document.
///
/// A document carrying a top-level `<feed>` marker is read as Atom entries;
/// anything else is read as RSS items. Records missing a non-empty title or
/// URL are dropped here; everything else (dedup, freshness, categories) is
/// the normalizer's job. Document order is preserved.
#[instrument(level = "debug", skip(document), fields(source = %source_name, bytes = document.len()))]
pub fn parse_feed(document: &str, source_name: &str) -> Vec<RawRecord> {
    let candidates = if ATOM_MARKER.is_match(document) {
        extract_atom_entries(document, source_name)
    } else {
        extract_rss_items(document, source_name)
    };
    candidates
        .into_iter()
        .filter(|record| !record.title.is_empty() && !record.url.is_empty())
        .collect()
}
