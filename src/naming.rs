//! Folder and file naming conventions.
//!
//! Category folders may carry an ordering prefix (`01-exterior`, `02-living_room`).
//! The prefix is kept in the category key (it is the filter key and must
//! round-trip to the folder) but dropped from the display label:
//!
//! - `exterior` → "Exterior"
//! - `01-living-room` → "Living Room"
//! - `master_suite` → "Master Suite"
//! - `02` → "02" (number only: the folder name is the label)
//!
//! Output files are always JPEG, so every output name is the source's
//! relative name with its extension normalized to `.jpg`.

/// Result of parsing a folder name like `01-living-room`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g. `1` from `01-living-room`).
    pub number: Option<u32>,
    /// Words after the prefix, split on `-`, `_` and whitespace.
    pub words: Vec<String>,
}

/// Parse a folder name following the optional `NN-name` convention.
pub fn parse_folder_name(name: &str) -> ParsedName {
    let (number, rest) = match name.find(|c: char| c == '-' || c == '_') {
        Some(pos) => match name[..pos].parse::<u32>() {
            Ok(num) => (Some(num), &name[pos + 1..]),
            Err(_) => (None, name),
        },
        None => match name.parse::<u32>() {
            Ok(num) => (Some(num), ""),
            Err(_) => (None, name),
        },
    };

    let words = rest
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    ParsedName { number, words }
}

/// Title-case a single word: first character upper, the rest lower.
fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Display label for a category folder.
pub fn category_label(folder: &str) -> String {
    let parsed = parse_folder_name(folder);
    if parsed.words.is_empty() {
        return folder.to_string();
    }
    parsed
        .words
        .iter()
        .map(|w| title_case_word(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the extension of a `/`-separated relative name with `.jpg`.
///
/// `exterior/front.PNG` → `exterior/front.jpg`, `01.jpeg` → `01.jpg`.
pub fn jpeg_output_name(relative: &str) -> String {
    let (dir, file) = match relative.rfind('/') {
        Some(pos) => (&relative[..=pos], &relative[pos + 1..]),
        None => ("", relative),
    };
    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(pos) => &file[..pos],
    };
    format!("{dir}{stem}.jpg")
}
