/// UI helpers shared between the TUI and plain-stdout modes.
use chrono::{Local, Timelike};

// ── File icons ────────────────────────────────────────────────────────────────

/// Icon name for a file extension. Total: anything unmapped gets `"file"`.
pub fn file_icon(extension: &str) -> &'static str {
    match extension {
        "pdf"          => "file-pdf",
        "docx" | "doc" => "file-word",
        "xlsx" | "xls" => "file-excel",
        "csv"          => "file-csv",
        "txt"          => "file-alt",
        "pptx" | "ppt" => "file-powerpoint",
        "jpg" | "jpeg" | "png" | "gif" => "file-image",
        _              => "file",
    }
}

/// Icon name for a registry row — folders get their own icon regardless of extension.
pub fn row_icon(kind: &str, extension: &str) -> &'static str {
    if kind == "folder" {
        "folder"
    } else {
        file_icon(extension)
    }
}

/// Terminal glyph for an icon name.
pub fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "folder"          => "▸",
        "file-pdf"        => "◆",
        "file-word"       => "◇",
        "file-excel"      => "▦",
        "file-csv"        => "▤",
        "file-alt"        => "≡",
        "file-powerpoint" => "▣",
        "file-image"      => "◐",
        _                 => "○",
    }
}

// ── Time ──────────────────────────────────────────────────────────────────────

/// Current local time as `hh:mm AM`.
pub fn clock_now() -> String {
    format_clock(&Local::now())
}

/// Two-digit 12-hour clock with an AM/PM suffix, e.g. `09:05 PM`.
pub fn format_clock<T: Timelike>(t: &T) -> String {
    let (pm, hour) = t.hour12();
    format!("{:02}:{:02} {}", hour, t.minute(), if pm { "PM" } else { "AM" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_file_icon_table() {
        let cases = vec![
            ("pdf", "file-pdf"),
            ("docx", "file-word"),
            ("doc", "file-word"),
            ("xlsx", "file-excel"),
            ("xls", "file-excel"),
            ("csv", "file-csv"),
            ("txt", "file-alt"),
            ("pptx", "file-powerpoint"),
            ("ppt", "file-powerpoint"),
            ("jpg", "file-image"),
            ("jpeg", "file-image"),
            ("png", "file-image"),
            ("gif", "file-image"),
        ];
        for (ext, icon) in cases {
            assert_eq!(file_icon(ext), icon, "wrong icon for {ext}");
        }
    }

    #[test]
    fn test_file_icon_default() {
        assert_eq!(file_icon("rs"), "file");
        assert_eq!(file_icon(""), "file");
        // Lookup is exact — the registry already lowercases extensions
        assert_eq!(file_icon("PDF"), "file");
    }

    #[test]
    fn test_row_icon_folder() {
        assert_eq!(row_icon("folder", ""), "folder");
        assert_eq!(row_icon("file", "pdf"), "file-pdf");
    }

    #[test]
    fn test_format_clock() {
        let t = NaiveTime::from_hms_opt(21, 5, 0).unwrap();
        assert_eq!(format_clock(&t), "09:05 PM");
        let t = NaiveTime::from_hms_opt(0, 30, 0).unwrap();
        assert_eq!(format_clock(&t), "12:30 AM");
        let t = NaiveTime::from_hms_opt(12, 0, 59).unwrap();
        assert_eq!(format_clock(&t), "12:00 PM");
    }
}
