// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::tags;

/// Cleans bodies submitted through the editor. Reference tags survive with
/// the attributes the editor needs; everything scriptable is dropped.
pub struct HtmlSanitizer {
    cleaner: ammonia::Builder<'static>,
}

impl HtmlSanitizer {
    pub fn new() -> Self {
        let mut cleaner = ammonia::Builder::default();
        cleaner
            .strip_comments(true)
            .add_tags(&[tags::TAG_NAME, "span", "figure", "figcaption"])
            .add_tag_attributes(tags::TAG_NAME, &["id", "alt", "title", "render-plugin"])
            .link_rel(Some("noopener noreferrer"))
            .rm_tags(&["link", "iframe", "object", "embed"]);
        Self { cleaner }
    }

    pub fn clean(&self, html: &str) -> String {
        self.cleaner.clean(html).to_string()
    }
}

impl Default for HtmlSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::FragmentId;

    #[test]
    fn strips_scripts_and_handlers() {
        let sanitizer = HtmlSanitizer::new();
        let clean = sanitizer.clean(
            r#"<p onclick="evil()">Hi<script>alert(1)</script><a href="javascript:alert(2)">x</a></p>"#,
        );
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("<script"));
        assert!(!clean.contains("alert(1)"));
        assert!(!clean.contains("javascript:"));
        assert!(clean.contains("<p>Hi"));
    }

    #[test]
    fn keeps_reference_tags() {
        let sanitizer = HtmlSanitizer::new();
        let clean = sanitizer.clean(
            r#"<p><cms-plugin alt="Link - a "title="Link - a" id="12" onmouseover="x()">a</cms-plugin></p>"#,
        );
        let found = tags::extract(&clean);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), FragmentId(12));
        assert!(!clean.contains("onmouseover"));
    }
}
