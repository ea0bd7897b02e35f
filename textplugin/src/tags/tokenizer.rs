// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Attribute-aware scanner for `<cms-plugin ...>...</cms-plugin>` elements.
//!
//! Only ASCII delimiters drive state transitions, so every offset produced
//! here falls on a UTF-8 boundary of the scanned string.

use std::ops::Range;

/// Element name of reference tags.
pub const TAG_NAME: &str = "cms-plugin";
const OPEN_PREFIX: &[u8] = b"<cms-plugin";
const CLOSE_PREFIX: &[u8] = b"</cms-plugin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAttribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Byte range of the value inside the scanned text (quotes excluded).
    pub value: Option<Range<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag {
    pub start: usize,
    pub end: usize,
    pub attributes: Vec<RawAttribute>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawElement {
    pub open: OpenTag,
    /// Content between the open and close tags (empty for `/>`).
    pub content: Range<usize>,
    /// End of the whole element, close tag included.
    pub end: usize,
}

#[derive(Debug, Clone, Copy)]
enum State {
    BeforeName,
    Name { start: usize },
    AfterName { name: (usize, usize) },
    BeforeValue { name: (usize, usize) },
    Quoted { name: (usize, usize), quote: u8, start: usize },
    Unquoted { name: (usize, usize), start: usize },
}

/// Scan every top-level plugin element of `text`, left to right.
///
/// Elements that never close are skipped as plain text. Nested elements are
/// part of their parent's content.
#[cfg(test)]
pub(crate) fn scan(text: &str) -> Vec<RawElement> {
    let mut top_level = Vec::new();
    let mut cursor = 0;
    for element in elements(text) {
        if element.open.start >= cursor {
            cursor = element.end;
            top_level.push(element);
        }
    }
    top_level
}

/// Every complete plugin element of `text`, nested ones included, ordered by
/// where they open.
///
/// One pass pairs each close tag with the innermost pending open tag. Open
/// tags left pending never close and stay plain text. A tag cut off by the
/// end of input ends the scan.
pub(crate) fn elements(text: &str) -> Vec<RawElement> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut pending: Vec<OpenTag> = Vec::new();
    let mut i = 0;

    while let Some(offset) = bytes[i..].iter().position(|b| *b == b'<') {
        let pos = i + offset;
        if let Some(end) = close_tag_end(bytes, pos) {
            if let Some(open) = pending.pop() {
                found.push(RawElement {
                    content: open.end..pos,
                    end,
                    open,
                });
            }
            i = end;
            continue;
        }
        match parse_open_tag(text, pos) {
            Some(open) if open.self_closing => {
                i = open.end;
                found.push(RawElement {
                    content: open.end..open.end,
                    end: open.end,
                    open,
                });
            }
            Some(open) => {
                i = open.end;
                pending.push(open);
            }
            None if starts_open_tag(bytes, pos) => break,
            None => i = pos + 1,
        }
    }

    found.sort_by_key(|element| element.open.start);
    found
}

/// Parse an open tag starting at `start` (which must point at `<`).
pub(crate) fn parse_open_tag(text: &str, start: usize) -> Option<OpenTag> {
    let bytes = text.as_bytes();
    if !starts_open_tag(bytes, start) {
        return None;
    }
    let name_end = start + OPEN_PREFIX.len();

    let mut attributes = Vec::new();
    let mut state = State::BeforeName;
    let mut i = name_end;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::BeforeName => match b {
                b'>' => return Some(open_tag(start, i + 1, attributes, false)),
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    return Some(open_tag(start, i + 2, attributes, true));
                }
                b'/' => {}
                _ if b.is_ascii_whitespace() => {}
                _ => state = State::Name { start: i },
            },
            State::Name { start: name_start } => match b {
                b'=' => {
                    state = State::BeforeValue {
                        name: (name_start, i),
                    }
                }
                b'>' | b'/' => {
                    attributes.push(attribute(text, (name_start, i), None));
                    state = State::BeforeName;
                    continue;
                }
                _ if b.is_ascii_whitespace() => {
                    state = State::AfterName {
                        name: (name_start, i),
                    }
                }
                _ => {}
            },
            State::AfterName { name } => match b {
                b'=' => state = State::BeforeValue { name },
                _ if b.is_ascii_whitespace() => {}
                _ => {
                    attributes.push(attribute(text, name, None));
                    state = State::BeforeName;
                    continue;
                }
            },
            State::BeforeValue { name } => match b {
                b'"' | b'\'' => {
                    state = State::Quoted {
                        name,
                        quote: b,
                        start: i + 1,
                    }
                }
                b'>' => {
                    attributes.push(attribute(text, name, Some(i..i)));
                    state = State::BeforeName;
                    continue;
                }
                _ if b.is_ascii_whitespace() => {}
                _ => state = State::Unquoted { name, start: i },
            },
            State::Quoted {
                name,
                quote,
                start: value_start,
            } => {
                if b == quote {
                    attributes.push(attribute(text, name, Some(value_start..i)));
                    state = State::BeforeName;
                }
            }
            State::Unquoted {
                name,
                start: value_start,
            } => {
                if b == b'>' || b.is_ascii_whitespace() {
                    attributes.push(attribute(text, name, Some(value_start..i)));
                    state = State::BeforeName;
                    continue;
                }
            }
        }
        i += 1;
    }

    None
}

fn open_tag(start: usize, end: usize, attributes: Vec<RawAttribute>, self_closing: bool) -> OpenTag {
    OpenTag {
        start,
        end,
        attributes,
        self_closing,
    }
}

fn attribute(text: &str, name: (usize, usize), value: Option<Range<usize>>) -> RawAttribute {
    RawAttribute {
        name: text[name.0..name.1].to_ascii_lowercase(),
        value,
    }
}

/// Whether an open tag name starts at `pos`; a tag that starts but never
/// ends only runs out at the end of input.
fn starts_open_tag(bytes: &[u8], pos: usize) -> bool {
    let name_end = pos + OPEN_PREFIX.len();
    if bytes.len() < name_end || !bytes[pos..name_end].eq_ignore_ascii_case(OPEN_PREFIX) {
        return false;
    }
    matches!(
        bytes.get(name_end),
        Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/'
    )
}

fn close_tag_end(bytes: &[u8], pos: usize) -> Option<usize> {
    let name_end = pos + CLOSE_PREFIX.len();
    if bytes.len() < name_end || !bytes[pos..name_end].eq_ignore_ascii_case(CLOSE_PREFIX) {
        return None;
    }
    let mut i = name_end;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    (bytes.get(i) == Some(&b'>')).then_some(i + 1)
}
