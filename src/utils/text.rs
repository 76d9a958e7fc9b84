/// Convert a symbol, exchange or other label into a safe filesystem slug.
pub fn file_slug(label: &str) -> Option<String> {
    let mut slug = String::new();

    for ch in label.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if matches!(ch, ' ' | '-' | '_' | '.') {
            slug.push(if ch == ' ' { '_' } else { ch });
        }
    }

    let slug = slug.trim_matches('.');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_lowercase())
    }
}
