//! Folder-name grammars and identifier normalization.
//!
//! Recognition is pure and total: a name either matches one of the four
//! grammars or it doesn't, and classification never touches the
//! filesystem. Precedence when a name could be read several ways is
//! category > center > member > other.

use crate::domain::{CellValue, MONTHS, STANDARD_CATEGORIES};
use once_cell::sync::Lazy;
use regex::Regex;

static CENTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());
static MEMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}_.+$").unwrap());
static CATEGORY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}\.[A-Z_]+$").unwrap());

/// What a folder name was recognized as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderKind {
    /// One of the eight standard top-level categories.
    Category(&'static str),
    /// A 4-digit center code.
    Center,
    /// `<6-digit-id>_<name>`.
    Member,
    /// `<2-digit>.<INDONESIAN MONTH>`.
    Month,
    /// Anything else; preserved, never dropped.
    Other,
}

/// True for exactly four decimal digits.
pub fn is_center_folder(name: &str) -> bool {
    CENTER_RE.is_match(name)
}

/// True for `<6 digits>_<suffix>`.
pub fn is_member_folder(name: &str) -> bool {
    MEMBER_RE.is_match(name)
}

/// True when `name` is one of the eight standard categories.
pub fn is_standard_category(name: &str) -> bool {
    STANDARD_CATEGORIES.contains(&name)
}

/// True for `NN.<month>` with a valid Indonesian month name.
pub fn is_month_folder(name: &str) -> bool {
    match name.split_once('.') {
        Some((code, month)) => {
            code.len() == 2
                && code.bytes().all(|b| b.is_ascii_digit())
                && MONTHS.iter().any(|(_, m)| *m == month)
        }
        None => false,
    }
}

/// Classify a folder name with the fixed precedence.
pub fn classify_folder(name: &str) -> FolderKind {
    if let Some(category) = STANDARD_CATEGORIES.iter().copied().find(|c| *c == name) {
        return FolderKind::Category(category);
    }
    if CATEGORY_RE.is_match(name) && is_month_folder(name) {
        return FolderKind::Month;
    }
    if is_center_folder(name) {
        return FolderKind::Center;
    }
    if is_member_folder(name) {
        return FolderKind::Member;
    }
    FolderKind::Other
}

/// Split a member folder name into its id and derived display name.
/// Returns `None` when the name does not match the member grammar.
pub fn split_member_folder(name: &str) -> Option<(&str, &str)> {
    if !is_member_folder(name) {
        return None;
    }
    name.split_once('_')
}

/// Coerce a center code to 4-digit zero-padded text. Empty on failure.
pub fn normalize_center(value: &str) -> String {
    normalize_digits(value, 4)
}

/// Coerce a member id to 6-digit zero-padded text. Empty on failure.
pub fn normalize_member(value: &str) -> String {
    normalize_digits(value, 6)
}

/// Normalization shared by both identifier widths: trim, drop a
/// fractional tail left over from float-typed spreadsheet cells, parse
/// as an unsigned integer, zero-pad. Anything unparseable (or wider
/// than the target) yields the empty string; callers exclude such rows
/// from joins rather than erroring.
fn normalize_digits(value: &str, width: usize) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let integral = match trimmed.split_once('.') {
        Some((head, _)) => head,
        None => trimmed,
    };
    match integral.parse::<u64>() {
        Ok(n) => {
            let padded = format!("{n:0width$}");
            if padded.len() > width {
                String::new()
            } else {
                padded
            }
        }
        Err(_) => String::new(),
    }
}

/// Normalize an identifier arriving as a spreadsheet cell. Numeric
/// cells go through their integral rendering so `7.0` and `"7"` agree.
pub fn normalize_cell(value: &CellValue, width: usize) -> String {
    normalize_digits(&value.display(), width)
}

/// Build the composite join key, or `None` when either half is empty.
pub fn composite_key(center: &str, member_id: &str) -> Option<String> {
    if center.is_empty() || member_id.is_empty() {
        None
    } else {
        Some(format!("{center}_{member_id}"))
    }
}
