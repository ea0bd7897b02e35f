// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Reference tags embedded in text bodies.
//!
//! A reference is a `cms-plugin` element whose open tag carries a numeric
//! `id`. Other `cms-plugin` elements are ordinary markup: they pass through
//! untouched and references inside them are still found.

mod markup;
mod tokenizer;

pub use markup::{PluginTag, plugin_to_tag};
pub use tokenizer::TAG_NAME;

use crate::fragments::FragmentId;
use std::ops::Range;

/// References of `body` in document order.
pub fn extract(body: &str) -> Vec<PluginTag> {
    locate(body).into_iter().map(|(_, tag)| tag).collect()
}

/// Target ids of `body` in document order, duplicates kept.
pub fn id_list(body: &str) -> Vec<FragmentId> {
    locate(body).into_iter().map(|(_, tag)| tag.id()).collect()
}

/// Replace every reference with `replace(tag)`, left to right.
///
/// Text outside references is copied unchanged.
pub fn substitute<F>(body: &str, mut replace: F) -> String
where
    F: FnMut(&PluginTag) -> String,
{
    let located = locate(body);
    if located.is_empty() {
        return body.to_string();
    }

    let mut output = String::with_capacity(body.len());
    let mut last = 0;
    for (range, tag) in &located {
        output.push_str(&body[last..range.start]);
        output.push_str(&replace(tag));
        last = range.end;
    }
    output.push_str(&body[last..]);
    output
}

fn locate(body: &str) -> Vec<(Range<usize>, PluginTag)> {
    let mut found = Vec::new();
    let mut cursor = 0;
    for element in tokenizer::elements(body) {
        if element.open.start < cursor {
            continue;
        }
        match PluginTag::from_element(body, &element) {
            Some(tag) => {
                cursor = element.end;
                found.push((element.open.start..element.end, tag));
            }
            None => cursor = element.open.end,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_references_in_order() {
        let body = concat!(
            r#"<p>Intro <cms-plugin alt="Link - a "title="Link - a" id="5"></cms-plugin>"#,
            r#" and <cms-plugin id="6"></cms-plugin> then <cms-plugin id="5"></cms-plugin></p>"#
        );
        assert_eq!(id_list(body), vec![FragmentId(5), FragmentId(6), FragmentId(5)]);
    }

    #[test]
    fn substitute_with_identity_round_trips() {
        let body = concat!(
            "<h1>T</h1>",
            r#"<cms-plugin alt="x > y "title="x > y" id="1">old</cms-plugin>"#,
            "<p>mid</p>",
            r#"<cms-plugin id='2'/>"#,
            "tail"
        );
        let rebuilt = substitute(body, |tag| tag.to_markup());
        assert_eq!(rebuilt, body);
        assert_eq!(extract(&rebuilt), extract(body));
        assert_eq!(extract(body).len(), 2);
    }

    #[test]
    fn substitute_replaces_exactly_the_element() {
        let body = r#"a<cms-plugin id="1">x</cms-plugin>b"#;
        assert_eq!(substitute(body, |_| "Z".to_string()), "aZb");
        assert_eq!(substitute(body, |tag| tag.with_content("")), r#"a<cms-plugin id="1"></cms-plugin>b"#);
    }

    #[test]
    fn elements_without_numeric_id_are_plain_markup() {
        let body = concat!(
            r#"<cms-plugin class="wrapper"><cms-plugin id="3">in</cms-plugin></cms-plugin>"#,
            r#"<cms-plugin id="abc"></cms-plugin><cms-plugin id="">x</cms-plugin>"#
        );
        assert_eq!(id_list(body), vec![FragmentId(3)]);
        let replaced = substitute(body, |_| "R".to_string());
        assert_eq!(
            replaced,
            concat!(
                r#"<cms-plugin class="wrapper">R</cms-plugin>"#,
                r#"<cms-plugin id="abc"></cms-plugin><cms-plugin id="">x</cms-plugin>"#
            )
        );
    }

    #[test]
    fn body_without_references_is_untouched() {
        let body = "<p>plain <b>text</b> with a stray < sign</p>";
        assert!(extract(body).is_empty());
        assert_eq!(substitute(body, |_| unreachable!()), body);
    }

    #[test]
    fn unclosed_reference_is_left_verbatim() {
        let body = r#"<cms-plugin id="1"><cms-plugin id="2"></cms-plugin>"#;
        assert_eq!(id_list(body), vec![FragmentId(2)]);
    }
}
