use contracts::shared::sanitize::{sanitize, SanitizeMode};

/// Clean user-supplied content before it reaches the DOM.
///
/// Logs a warning when anything had to be removed.
pub fn sanitize_user_input(input: &str, mode: SanitizeMode) -> String {
    let clean = sanitize(input, mode);
    if clean != input.trim() {
        log::warn!("sanitized user input ({} -> {} bytes)", input.len(), clean.len());
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_keeps_allowed_markup() {
        assert_eq!(
            sanitize_user_input("<p>Article <em>3</em></p>", SanitizeMode::Html),
            "<p>Article <em>3</em></p>"
        );
    }

    #[test]
    fn test_script_is_removed() {
        assert_eq!(
            sanitize_user_input("<p>ok</p><script>steal()</script>", SanitizeMode::Html),
            "<p>ok</p>"
        );
        assert_eq!(sanitize_user_input("<b>Loi</b> 08-09", SanitizeMode::Text), "Loi 08-09");
    }
}
