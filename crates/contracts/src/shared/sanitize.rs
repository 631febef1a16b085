//! HTML/text sanitization for user input

use ammonia::Builder;
use maplit::hashset;
use serde::{Deserialize, Serialize};

/// How user input is cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeMode {
    /// Strip every tag, keep the text content
    #[default]
    Text,
    /// Keep the formatting tags allowed in legal documents
    Html,
}

/// Clean `input` according to `mode`.
///
/// `script` and `style` elements are dropped together with their content in
/// both modes. Text output is trimmed.
pub fn sanitize(input: &str, mode: SanitizeMode) -> String {
    match mode {
        SanitizeMode::Text => Builder::empty()
            .clean_content_tags(hashset!["script", "style"])
            .clean(input)
            .to_string()
            .trim()
            .to_string(),
        SanitizeMode::Html => Builder::empty()
            .tags(hashset![
                "p", "br", "strong", "em", "u", "ol", "ul", "li", "h1", "h2", "h3", "h4", "h5",
                "h6", "blockquote"
            ])
            .generic_attributes(hashset!["class", "id"])
            .clean_content_tags(hashset!["script", "style"])
            .clean(input)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_mode_strips_tags() {
        assert_eq!(
            sanitize("  <b>Pièce d'identité</b><script>alert(1)</script> ", SanitizeMode::Text),
            "Pièce d'identité"
        );
    }

    #[test]
    fn test_html_mode_keeps_allowed_tags() {
        assert_eq!(
            sanitize(
                r#"<p class="loi" onclick="x()">Article 1</p><iframe src="x"></iframe>"#,
                SanitizeMode::Html
            ),
            r#"<p class="loi">Article 1</p>"#
        );
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let input = "Demande de permis de construire";
        assert_eq!(sanitize(input, SanitizeMode::Text), input);
        assert_eq!(sanitize(input, SanitizeMode::Html), input);
    }
}
