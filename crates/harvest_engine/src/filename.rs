/// Filesystem-safe export name: `{sanitized}.csv`, or `{fallback}.csv` when nothing
/// usable is left of `raw`.
pub fn output_filename(raw: &str, fallback: &str) -> String {
    let stem = match sanitize(raw) {
        Some(stem) => stem,
        None => sanitize(fallback).unwrap_or_else(|| "export".to_string()),
    };
    format!("{stem}.csv")
}

/// Directory name for a persistent browser profile. Same rules as export names;
/// blank names map to `default`.
pub fn profile_dir_name(raw: &str) -> String {
    sanitize(raw).unwrap_or_else(|| "default".to_string())
}

fn sanitize(input: &str) -> Option<String> {
    let kept: String = input
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let mut name = kept.trim().replace(' ', "-");
    if name.is_empty() {
        return None;
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    Some(name)
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::{output_filename, profile_dir_name};

    #[test]
    fn strips_punctuation_and_hyphenates_spaces() {
        assert_eq!(output_filename("  Ventas: julio/2024 ", "all"), "Ventas-julio2024.csv");
        assert_eq!(output_filename("año_nuevo", "all"), "año_nuevo.csv");
    }

    #[test]
    fn blank_names_use_fallback() {
        assert_eq!(output_filename("?!/", "all_chats"), "all_chats.csv");
        assert_eq!(output_filename("", ""), "export.csv");
        assert_eq!(profile_dir_name("   "), "default");
    }

    #[test]
    fn reserved_device_names_are_suffixed() {
        assert_eq!(output_filename("con", "all"), "con_.csv");
        assert_eq!(profile_dir_name("work laptop"), "work-laptop");
    }
}
