use reqwest::Url;

/// `https://wa.me/{phone}?text=...` with the text URL-encoded. `None` when no
/// phone number is configured.
pub fn chat_link(phone: &str, text: &str) -> Option<String> {
    if phone.is_empty() {
        return None;
    }
    match Url::parse_with_params(&format!("https://wa.me/{phone}"), [("text", text)]) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            log::warn!("Could not build chat link for '{phone}': {e}");
            None
        }
    }
}
