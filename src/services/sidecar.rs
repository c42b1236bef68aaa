//! Sidecar metadata file store
//!
//! Reads and writes the per-title NFO-style XML sidecar carrying the
//! provenance-tagged date. The managed fields are a `dateadded` element, an
//! optional `premiered` element, a source audit comment, and a marker
//! attribute on the root element that lets later passes trust the file as a
//! cache. Everything else in the file — hand-authored or written by other
//! tools — is passed through untouched on rewrite.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, warn};

use super::provenance::{DateRecord, Provenance};

const MANAGED_ATTR: &str = "datewarden_managed";
const UPDATED_ATTR: &str = "last_updated";
const COMMENT_TAG: &str = "managed by datewarden";

/// Managed fields extracted from a sidecar file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidecarData {
    pub date_added: Option<DateTime<Utc>>,
    pub premiered: Option<DateTime<Utc>>,
    pub source: Option<Provenance>,
    /// True when the root element carries our managed marker
    pub managed: bool,
}

impl SidecarData {
    /// The cached record this file represents, if it was written by us and
    /// is complete enough to reuse without querying anything.
    pub fn cached_record(&self) -> Option<DateRecord> {
        if !self.managed {
            return None;
        }
        let date = self.date_added?;
        let source = self.source.clone()?;
        Some(DateRecord::new(date, source).with_secondary(self.premiered))
    }
}

/// Parse the date formats that show up in sidecars: RFC 3339, bare dates,
/// and space-separated local timestamps
pub fn parse_sidecar_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn format_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Sidecar file reader/writer
#[derive(Debug, Clone)]
pub struct SidecarStore {
    /// Emit a `lockdata` element so media servers leave managed fields alone
    pub lock_metadata: bool,
}

impl SidecarStore {
    pub fn new(lock_metadata: bool) -> Self {
        Self { lock_metadata }
    }

    /// Read the managed fields from a sidecar file.
    ///
    /// A missing file yields `None`. A malformed file is not an error:
    /// whatever fields were parsed before the malformation are returned,
    /// matching the rule that a parse failure means "nothing found here".
    pub fn read(path: &Path) -> Option<SidecarData> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self::parse(&content))
    }

    /// Parse sidecar content into its managed fields
    pub fn parse(content: &str) -> SidecarData {
        let mut data = SidecarData::default();
        let mut reader = Reader::from_str(content);
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut current_field: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if !seen_root {
                        seen_root = true;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == MANAGED_ATTR.as_bytes() {
                                if let Ok(v) = attr.unescape_value() {
                                    data.managed = v == "true";
                                }
                            }
                        }
                    } else if depth == 1 {
                        let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                        if matches!(name.as_str(), "dateadded" | "premiered" | "aired") {
                            current_field = Some(name);
                        }
                    }
                    depth += 1;
                }
                Ok(Event::Text(t)) => {
                    if let Some(field) = &current_field {
                        if let Ok(text) = t.unescape() {
                            let parsed = parse_sidecar_date(&text);
                            match field.as_str() {
                                "dateadded" => data.date_added = data.date_added.or(parsed),
                                "premiered" | "aired" => {
                                    data.premiered = data.premiered.or(parsed)
                                }
                                _ => {}
                            }
                        }
                    }
                }
                Ok(Event::Comment(c)) => {
                    let text = String::from_utf8_lossy(&c);
                    if text.contains(COMMENT_TAG) {
                        if let Some(rest) = text.split("source:").nth(1) {
                            data.source = Some(Provenance::parse(rest.trim()));
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    depth = depth.saturating_sub(1);
                    current_field = None;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Sidecar parse error, keeping fields read so far");
                    break;
                }
            }
        }

        data
    }

    /// Write the resolved record into the sidecar at `path`, creating the
    /// file with the given root element name if it does not exist, and
    /// otherwise rewriting it in place while preserving foreign elements.
    pub fn write(&self, path: &Path, root_name: &str, record: &DateRecord) -> Result<()> {
        let output = match fs::read_to_string(path) {
            Ok(existing) => self
                .rewrite(&existing, record)
                .with_context(|| format!("rewriting sidecar {}", path.display()))?,
            Err(_) => self.render_new(root_name, record)?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(path, output).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), source = %record.source, "Wrote sidecar");
        Ok(())
    }

    /// Elements we own at the top level of the document. `premiered` is only
    /// claimed when the record carries a secondary date to write.
    fn owned_element(&self, name: &str, record: &DateRecord) -> bool {
        match name {
            "dateadded" => true,
            "lockdata" => self.lock_metadata,
            "premiered" => record.secondary_date.is_some(),
            _ => false,
        }
    }

    fn rewrite(&self, existing: &str, record: &DateRecord) -> Result<String> {
        let mut reader = Reader::from_str(existing);
        let mut writer = Writer::new(Vec::new());
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut skipping = 0usize;
        // Indentation between elements belongs to whatever follows it; it
        // is held back until that neighbor is known to survive, otherwise
        // repeated rewrites pile up blank lines.
        let mut held_indent = None;

        loop {
            let event = reader.read_event()?;
            match event {
                Event::Eof => break,
                Event::Start(_) if skipping > 0 => {
                    skipping += 1;
                }
                Event::End(_) if skipping > 0 => {
                    skipping -= 1;
                }
                _ if skipping > 0 => {}
                Event::Text(t) if t.iter().all(|b| b.is_ascii_whitespace()) => {
                    if let Some(prev) = held_indent.replace(Event::Text(t)) {
                        writer.write_event(prev)?;
                    }
                }
                Event::Start(e) => {
                    if !seen_root {
                        if let Some(indent) = held_indent.take() {
                            writer.write_event(indent)?;
                        }
                        seen_root = true;
                        depth += 1;
                        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                        let mut root = BytesStart::new(name);
                        for attr in e.attributes().flatten() {
                            let key = attr.key.as_ref();
                            if key == MANAGED_ATTR.as_bytes() || key == UPDATED_ATTR.as_bytes() {
                                continue;
                            }
                            root.push_attribute(attr);
                        }
                        root.push_attribute((MANAGED_ATTR, "true"));
                        root.push_attribute((UPDATED_ATTR, format_date(&Utc::now()).as_str()));
                        writer.write_event(Event::Start(root))?;
                        self.write_managed_fields(&mut writer, record)?;
                    } else {
                        let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                        if depth == 1 && self.owned_element(&name, record) {
                            skipping = 1;
                            held_indent = None;
                        } else {
                            if let Some(indent) = held_indent.take() {
                                writer.write_event(indent)?;
                            }
                            depth += 1;
                            writer.write_event(Event::Start(e))?;
                        }
                    }
                }
                Event::End(e) => {
                    if let Some(indent) = held_indent.take() {
                        writer.write_event(indent)?;
                    }
                    depth = depth.saturating_sub(1);
                    writer.write_event(Event::End(e))?;
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    if depth == 1 && self.owned_element(&name, record) {
                        held_indent = None;
                    } else {
                        if let Some(indent) = held_indent.take() {
                            writer.write_event(indent)?;
                        }
                        writer.write_event(Event::Empty(e))?;
                    }
                }
                Event::Comment(c) => {
                    if String::from_utf8_lossy(&c).contains(COMMENT_TAG) {
                        held_indent = None;
                    } else {
                        if let Some(indent) = held_indent.take() {
                            writer.write_event(indent)?;
                        }
                        writer.write_event(Event::Comment(c))?;
                    }
                }
                other => {
                    if let Some(indent) = held_indent.take() {
                        writer.write_event(indent)?;
                    }
                    writer.write_event(other)?;
                }
            }
        }
        if let Some(indent) = held_indent {
            writer.write_event(indent)?;
        }

        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn render_new(&self, root_name: &str, record: &DateRecord) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;

        let mut root = BytesStart::new(root_name.to_string());
        root.push_attribute((MANAGED_ATTR, "true"));
        root.push_attribute((UPDATED_ATTR, format_date(&Utc::now()).as_str()));
        writer.write_event(Event::Start(root))?;
        self.write_managed_fields(&mut writer, record)?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        writer.write_event(Event::End(BytesEnd::new(root_name.to_string())))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_managed_fields(&self, writer: &mut Writer<Vec<u8>>, record: &DateRecord) -> Result<()> {
        let indent = || Event::Text(BytesText::from_escaped("\n  "));

        writer.write_event(indent())?;
        writer.write_event(Event::Comment(BytesText::from_escaped(format!(
            " {} | source: {} ",
            COMMENT_TAG, record.source
        ))))?;

        if let Some(date) = &record.date {
            writer.write_event(indent())?;
            writer.write_event(Event::Start(BytesStart::new("dateadded")))?;
            writer.write_event(Event::Text(BytesText::new(&format_date(date))))?;
            writer.write_event(Event::End(BytesEnd::new("dateadded")))?;
        }

        if let Some(secondary) = &record.secondary_date {
            writer.write_event(indent())?;
            writer.write_event(Event::Start(BytesStart::new("premiered")))?;
            writer.write_event(Event::Text(BytesText::new(&format_date(secondary))))?;
            writer.write_event(Event::End(BytesEnd::new("premiered")))?;
        }

        if self.lock_metadata {
            writer.write_event(indent())?;
            writer.write_event(Event::Start(BytesStart::new("lockdata")))?;
            writer.write_event(Event::Text(BytesText::new("true")))?;
            writer.write_event(Event::End(BytesEnd::new("lockdata")))?;
        }

        Ok(())
    }
}
