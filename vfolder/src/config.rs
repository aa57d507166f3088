/*
 * config.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! View settings storage: per virtual folder URI, the sort, view flags and
//! recently-deleted list size used when its view is opened. Kept in
//! `VIEW_SETTINGS_FILE` next to the UI's config.xml; callers pass the full path.
//! All XML read/write uses the quick_xml parser/writer; no regex or hand parsing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use thiserror::Error;

use crate::view::{SortOrder, SortType, ViewFlags};

/// File name of the view settings, in the Tagliacarte config directory (~/.tagliacarte).
pub const VIEW_SETTINGS_FILE: &str = "vfolders.xml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("invalid value for <{element}>: {value}")]
    Invalid { element: String, value: String },
}

/// Settings for one virtual folder's view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    pub sort_type: SortType,
    pub sort_order: SortOrder,
    pub view_flags: ViewFlags,
    /// How many user-deleted Message-IDs are remembered for re-matching.
    pub recently_deleted: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sort_type: SortType::ByDate,
            sort_order: SortOrder::Descending,
            view_flags: ViewFlags::empty(),
            recently_deleted: crate::view::RecentlyDeleted::default_capacity(),
        }
    }
}

/// Settings for `uri`, or the defaults when the file or the entry does not exist.
pub fn view_settings_for(path: &Path, uri: &str) -> Result<ViewSettings, ConfigError> {
    Ok(load_view_settings(path)?.remove(uri).unwrap_or_default())
}

/// Load all view settings keyed by virtual folder URI. A missing file yields an empty map.
pub fn load_view_settings(path: &Path) -> Result<HashMap<String, ViewSettings>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    parse_view_settings(&content)
}

fn invalid(element: &[u8], value: &str) -> ConfigError {
    ConfigError::Invalid {
        element: String::from_utf8_lossy(element).into_owned(),
        value: value.to_string(),
    }
}

/// Parse XML settings. Expects <vfolders><view><uri>...</uri><sort-type>...</sort-type>...</view>...</vfolders>.
/// Unknown elements are ignored; missing elements keep their defaults.
fn parse_view_settings(content: &str) -> Result<HashMap<String, ViewSettings>, ConfigError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = HashMap::new();
    let mut current_uri = String::new();
    let mut current = ViewSettings::default();
    let mut in_view = false;
    let mut element_name = Vec::<u8>::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(ConfigError::Xml(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = e.name();
                let name = name.as_ref();
                if name == b"view" {
                    in_view = true;
                    current_uri.clear();
                    current = ViewSettings::default();
                } else if in_view {
                    element_name.clear();
                    element_name.extend_from_slice(name);
                }
            }
            Ok(Event::Text(e)) => {
                if !in_view || element_name.is_empty() {
                    continue;
                }
                let text = e.unescape().map_err(|e| ConfigError::Xml(e.to_string()))?.trim().to_string();
                match element_name.as_slice() {
                    b"uri" => current_uri = text,
                    b"sort-type" => {
                        current.sort_type = text.parse().map_err(|_| invalid(&element_name, &text))?;
                    }
                    b"sort-order" => {
                        current.sort_order = text.parse().map_err(|_| invalid(&element_name, &text))?;
                    }
                    b"view-flags" => {
                        let bits: u32 = text.parse().map_err(|_| invalid(&element_name, &text))?;
                        current.view_flags = ViewFlags::from_bits_truncate(bits);
                    }
                    b"recently-deleted" => {
                        current.recently_deleted = text.parse().map_err(|_| invalid(&element_name, &text))?;
                    }
                    _ => {}
                }
                element_name.clear();
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"view" {
                    if !current_uri.is_empty() {
                        out.insert(std::mem::take(&mut current_uri), current.clone());
                    }
                    in_view = false;
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Save settings for one virtual folder, merging with the entries already on disk.
pub fn save_view_settings(path: &Path, uri: &str, settings: &ViewSettings) -> Result<(), ConfigError> {
    let mut entries = load_view_settings(path)?;
    entries.insert(uri.to_string(), settings.clone());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = view_settings_xml_to_bytes(&entries)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(tmp, path)?;
    Ok(())
}

fn write_text_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), ConfigError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| ConfigError::Xml(e.to_string()))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| ConfigError::Xml(e.to_string()))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| ConfigError::Xml(e.to_string()))?;
    Ok(())
}

/// Build settings XML into a byte vector (UTF-8). Entries are written in URI order.
fn view_settings_xml_to_bytes(entries: &HashMap<String, ViewSettings>) -> Result<Vec<u8>, ConfigError> {
    let mut out = Vec::new();
    let mut writer = Writer::new_with_indent(&mut out, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| ConfigError::Xml(e.to_string()))?;
    writer
        .write_event(Event::Start(BytesStart::new("vfolders")))
        .map_err(|e| ConfigError::Xml(e.to_string()))?;
    let mut uris: Vec<&String> = entries.keys().collect();
    uris.sort_unstable();
    for uri in uris {
        let s = &entries[uri];
        writer
            .write_event(Event::Start(BytesStart::new("view")))
            .map_err(|e| ConfigError::Xml(e.to_string()))?;
        write_text_element(&mut writer, "uri", uri)?;
        write_text_element(&mut writer, "sort-type", s.sort_type.as_str())?;
        write_text_element(&mut writer, "sort-order", s.sort_order.as_str())?;
        write_text_element(&mut writer, "view-flags", &s.view_flags.bits().to_string())?;
        write_text_element(&mut writer, "recently-deleted", &s.recently_deleted.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("view")))
            .map_err(|e| ConfigError::Xml(e.to_string()))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("vfolders")))
        .map_err(|e| ConfigError::Xml(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNREAD: &str = "mailbox://nobody@Local%20Folders/Unread";

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = view_settings_for(&dir.path().join(VIEW_SETTINGS_FILE), UNREAD).unwrap();
        assert_eq!(settings, ViewSettings::default());
    }

    #[test]
    fn save_merges_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(VIEW_SETTINGS_FILE);
        let grouped = ViewSettings {
            sort_type: SortType::BySubject,
            sort_order: SortOrder::Ascending,
            view_flags: ViewFlags::GROUP_BY_SORT | ViewFlags::THREADED_DISPLAY,
            recently_deleted: 5,
        };
        save_view_settings(&path, UNREAD, &grouped).unwrap();
        save_view_settings(&path, "mailbox://nobody@Local%20Folders/Flagged", &ViewSettings::default()).unwrap();

        let all = load_view_settings(&path).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[UNREAD], grouped);
    }

    #[test]
    fn uri_with_markup_characters_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VIEW_SETTINGS_FILE);
        let uri = "imap://a@b/Search?q=<x>&y";
        save_view_settings(&path, uri, &ViewSettings::default()).unwrap();
        assert!(load_view_settings(&path).unwrap().contains_key(uri));
    }

    #[test]
    fn bad_sort_type_is_rejected() {
        let xml = "<vfolders><view><uri>x</uri><sort-type>size</sort-type></view></vfolders>";
        assert!(matches!(parse_view_settings(xml), Err(ConfigError::Invalid { .. })));
    }
}
