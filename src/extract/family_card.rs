//! Family-card number extraction from scanned PDFs.
//!
//! Card scans are the `02*` files inside member folders. The number
//! sits in the document header, so only the top 20 % of page one is
//! OCR'd, after grayscale conversion, projection-variance deskew
//! (−20..=20° in 1° steps), contrast ×3.0, sharpening and
//! autocontrast. Three OCR passes with different page-segmentation
//! modes are concatenated before the search ladder runs.
//!
//! Rasterization and OCR are external tools (`pdftoppm`, `tesseract`);
//! when either cannot be located the pass fails per file with
//! `OcrUnavailable` and the batch continues.

use crate::domain::is_sync_artifact;
use crate::error::{AuditError, Result};
use crate::progress::{ProgressSink, RunControl};
use crate::scan::MemberScan;
use image::{DynamicImage, GrayImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

const RASTER_DPI: u32 = 400;
/// Fraction of the page height holding the card header.
const HEADER_FRACTION: f64 = 0.2;
/// Deskew search range in whole degrees.
const DESKEW_RANGE_DEG: i32 = 20;
const BINARIZE_THRESHOLD: u8 = 128;

static SIXTEEN_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{16}\b").unwrap());
static GROUPED_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[\s.-]?\d{4}[\s.-]?\d{4}[\s.-]?\d{4}").unwrap());
static FLEXIBLE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{15,18}").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s.-]").unwrap());

/// Locations of the external rasterizer and OCR engine.
#[derive(Debug, Clone, Default)]
pub struct OcrTools {
    /// Directory holding the poppler binaries; `None` probes `PATH`.
    pub poppler_path: Option<PathBuf>,
}

impl OcrTools {
    fn pdftoppm(&self) -> PathBuf {
        match &self.poppler_path {
            Some(dir) => dir.join("pdftoppm"),
            None => PathBuf::from("pdftoppm"),
        }
    }

    fn tesseract(&self) -> PathBuf {
        PathBuf::from("tesseract")
    }
}

/// One checked card scan.
#[derive(Debug, Clone)]
pub struct FamilyCardCheck {
    pub center: String,
    pub member_folder: String,
    pub file_name: String,
    pub path: PathBuf,
    pub number: Option<String>,
    pub validation: FamilyCardValidation,
    /// Empty on success, the failure description otherwise.
    pub error: String,
}

/// Validation verdict for an extracted number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyCardValidation {
    pub valid: bool,
    pub length: usize,
    pub reason: String,
}

/// Validate a candidate family-card number: exactly sixteen decimal
/// digits.
pub fn validate_family_card(number: Option<&str>) -> FamilyCardValidation {
    let Some(raw) = number else {
        return FamilyCardValidation {
            valid: false,
            length: 0,
            reason: "NO KK kosong".to_string(),
        };
    };
    let trimmed: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if trimmed.is_empty() {
        return FamilyCardValidation {
            valid: false,
            length: 0,
            reason: "NO KK kosong".to_string(),
        };
    }
    if trimmed.len() != 16 {
        return FamilyCardValidation {
            valid: false,
            length: trimmed.len(),
            reason: format!(
                "panjang tidak sesuai (harus 16 digit, saat ini {})",
                trimmed.len()
            ),
        };
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return FamilyCardValidation {
            valid: false,
            length: trimmed.len(),
            reason: "NO KK harus berisi angka saja".to_string(),
        };
    }
    FamilyCardValidation {
        valid: true,
        length: 16,
        reason: "format NO KK valid (16 digit angka)".to_string(),
    }
}

/// Replace glyphs OCR habitually confuses with digits.
pub fn clean_ocr_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'b' => '6',
            'B' => '8',
            'O' | 'o' => '0',
            'l' | 'I' => '1',
            'S' => '5',
            'Z' => '2',
            other => other,
        })
        .collect()
}

/// Search ladder over the concatenated OCR text. `raw` is the text as
/// recognized; the cleaned form is derived here.
pub fn find_family_card_number(raw: &str) -> Option<String> {
    let cleaned = clean_ocr_text(raw);

    if let Some(m) = SIXTEEN_DIGITS.find(&cleaned) {
        return Some(m.as_str().to_string());
    }
    if let Some(m) = SIXTEEN_DIGITS.find(raw) {
        return Some(m.as_str().to_string());
    }
    for m in GROUPED_DIGITS.find_iter(&cleaned) {
        let joined = SEPARATORS.replace_all(m.as_str(), "").to_string();
        if joined.len() == 16 && joined.bytes().all(|b| b.is_ascii_digit()) {
            return Some(joined);
        }
    }
    for m in FLEXIBLE_DIGITS.find_iter(&cleaned) {
        if let Some(number) = pick_sixteen_window(m.as_str()) {
            return Some(number);
        }
    }
    None
}

/// Resolve an over-long digit run to a 16-digit window, preferring
/// windows that carry the provincial prefix `33`. Runs of 15 digits
/// are likely a dropped glyph and are rejected.
fn pick_sixteen_window(digits: &str) -> Option<String> {
    match digits.len() {
        16 => Some(digits.to_string()),
        17 => {
            let head = &digits[..16];
            let tail = &digits[1..];
            if head.starts_with("33") {
                Some(head.to_string())
            } else if tail.starts_with("33") {
                Some(tail.to_string())
            } else {
                Some(head.to_string())
            }
        }
        _ => None,
    }
}

/// Full per-file pipeline: rasterize page one, preprocess the header
/// band, OCR it three ways, run the search ladder.
pub fn extract_family_card_number(pdf: &Path, tools: &OcrTools) -> Result<Option<String>> {
    let workspace = Workspace::create()?;

    let page = rasterize_first_page(pdf, tools, &workspace)?;
    let header = preprocess_header(&page);

    let header_path = workspace.dir.join("header.png");
    header
        .save(&header_path)
        .map_err(|e| AuditError::Io(std::io::Error::other(e)))?;

    let text = run_ocr_passes(&header_path, tools)?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(find_family_card_number(&text))
}

/// Check every `02*` PDF across the scanned member folders. Per-file
/// failures are recorded on the row; pause and cancel are honored
/// between files, never mid-OCR.
pub fn check_family_cards(
    scan: &MemberScan,
    tools: &OcrTools,
    control: &RunControl,
    progress: &dyn ProgressSink,
) -> Vec<FamilyCardCheck> {
    let targets: Vec<(usize, String, PathBuf)> = scan
        .members
        .iter()
        .enumerate()
        .flat_map(|(idx, member)| {
            card_scans(&member.path)
                .into_iter()
                .map(move |(name, path)| (idx, name, path))
        })
        .collect();

    progress.begin("Checking family cards", Some(targets.len() as u64));
    let mut checks = Vec::with_capacity(targets.len());
    for (member_idx, file_name, path) in targets {
        if !control.wait_if_paused() {
            break;
        }
        let member = &scan.members[member_idx];
        let (number, error) = match extract_family_card_number(&path, tools) {
            Ok(number) => (number, String::new()),
            Err(e) => (None, e.to_string()),
        };
        let validation = validate_family_card(number.as_deref());
        progress.advance(&file_name);
        checks.push(FamilyCardCheck {
            center: member.center.clone(),
            member_folder: member.folder_name.clone(),
            file_name,
            path,
            number,
            validation,
            error,
        });
    }
    progress.finish();
    checks
}

/// The `02*.pdf` files directly inside a member folder.
fn card_scans(member_dir: &Path) -> Vec<(String, PathBuf)> {
    let mut scans = Vec::new();
    if let Ok(entries) = fs::read_dir(member_dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_sync_artifact(&name) || !name.starts_with("02") {
                continue;
            }
            if !name.to_lowercase().ends_with(".pdf") {
                continue;
            }
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                scans.push((name, entry.path()));
            }
        }
    }
    scans.sort();
    scans
}

/// Crop the header band and run the enhancement chain.
fn preprocess_header(page: &DynamicImage) -> GrayImage {
    let header_height = ((page.height() as f64) * HEADER_FRACTION).round() as u32;
    let header = page.crop_imm(0, 0, page.width(), header_height.max(1));
    let gray = header.to_luma8();
    let deskewed = deskew(&gray);
    let contrasted = scale_contrast(&deskewed, 3.0);
    let sharpened = image::imageops::unsharpen(&contrasted, 2.0, 2);
    autocontrast(&sharpened)
}

/// Find the rotation in −20..=20° (1° steps) that maximizes the
/// variance of the horizontal ink projection, then apply it. The
/// search is exhaustive, so the result is deterministic.
fn deskew(gray: &GrayImage) -> GrayImage {
    let mut best_angle = 0i32;
    let mut best_variance = projection_variance(gray);

    for angle in -DESKEW_RANGE_DEG..=DESKEW_RANGE_DEG {
        if angle == 0 {
            continue;
        }
        let rotated = rotate_degrees(gray, angle);
        let variance = projection_variance(&rotated);
        if variance > best_variance {
            best_variance = variance;
            best_angle = angle;
        }
    }

    if best_angle == 0 {
        gray.clone()
    } else {
        tracing::debug!("deskewing header by {best_angle} degrees");
        rotate_degrees(gray, best_angle)
    }
}

fn rotate_degrees(gray: &GrayImage, degrees: i32) -> GrayImage {
    let theta = (degrees as f32).to_radians();
    rotate_about_center(gray, theta, Interpolation::Bilinear, image::Luma([255u8]))
}

/// Variance of per-row dark-pixel counts; higher means text rows are
/// better aligned with the raster.
fn projection_variance(gray: &GrayImage) -> f64 {
    let height = gray.height() as usize;
    if height == 0 {
        return 0.0;
    }
    let mut projection = vec![0f64; height];
    for (_, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] < BINARIZE_THRESHOLD {
            projection[y as usize] += 1.0;
        }
    }
    let mean = projection.iter().sum::<f64>() / height as f64;
    projection.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / height as f64
}

/// Linear contrast scaling around mid-gray, matching a ×`factor`
/// enhancement.
fn scale_contrast(gray: &GrayImage, factor: f32) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        let value = (pixel.0[0] as f32 - 128.0) * factor + 128.0;
        pixel.0[0] = value.clamp(0.0, 255.0) as u8;
    }
    out
}

/// Stretch the observed intensity range to full scale.
fn autocontrast(gray: &GrayImage) -> GrayImage {
    let (mut min, mut max) = (u8::MAX, u8::MIN);
    for pixel in gray.pixels() {
        min = min.min(pixel.0[0]);
        max = max.max(pixel.0[0]);
    }
    if min >= max {
        return gray.clone();
    }
    let span = (max - min) as f32;
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = (((pixel.0[0] - min) as f32 / span) * 255.0).round() as u8;
    }
    out
}

/// Rasterize page one at 400 DPI through `pdftoppm`.
fn rasterize_first_page(
    pdf: &Path,
    tools: &OcrTools,
    workspace: &Workspace,
) -> Result<DynamicImage> {
    let prefix = workspace.dir.join("page");
    let output = Command::new(tools.pdftoppm())
        .arg("-png")
        .arg("-r")
        .arg(RASTER_DPI.to_string())
        .arg("-f")
        .arg("1")
        .arg("-l")
        .arg("1")
        .arg(pdf)
        .arg(&prefix)
        .output()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AuditError::OcrUnavailable { tool: "pdftoppm" }
            } else {
                AuditError::Io(e)
            }
        })?;
    if !output.status.success() {
        return Err(AuditError::Io(std::io::Error::other(format!(
            "pdftoppm failed on {}: {}",
            pdf.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ))));
    }

    // pdftoppm appends the page number with tool-version-dependent
    // zero padding; take whatever landed beside the prefix.
    let page_file = fs::read_dir(&workspace.dir)?
        .flatten()
        .map(|e| e.path())
        .find(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("page"))
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            AuditError::Io(std::io::Error::other(format!(
                "pdftoppm produced no page for {}",
                pdf.display()
            )))
        })?;

    image::open(&page_file).map_err(|e| AuditError::Io(std::io::Error::other(e)))
}

/// Three OCR passes with different segmentation modes, concatenated.
fn run_ocr_passes(image_path: &Path, tools: &OcrTools) -> Result<String> {
    let pass_args: [&[&str]; 3] = [
        &["--psm", "6", "-c", "tessedit_char_whitelist=0123456789"],
        &["--psm", "11", "-c", "tessedit_char_whitelist=0123456789"],
        &["--psm", "6"],
    ];

    let mut all_text = String::new();
    for args in pass_args {
        let output = Command::new(tools.tesseract())
            .arg(image_path)
            .arg("stdout")
            .args(["-l", "eng"])
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    AuditError::OcrUnavailable { tool: "tesseract" }
                } else {
                    AuditError::Io(e)
                }
            })?;
        if output.status.success() {
            all_text.push_str(&String::from_utf8_lossy(&output.stdout));
            all_text.push('\n');
        } else {
            tracing::warn!(
                "tesseract pass failed on {}: {}",
                image_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
    }
    Ok(all_text)
}

/// Scratch directory for rasterized pages; removed on drop.
struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn create() -> Result<Self> {
        let dir = std::env::temp_dir().join(format!(
            "arsip-audit-ocr-{}-{}",
            std::process::id(),
            chrono::Local::now().format("%H%M%S%f")
        ));
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_map_recovers_digits() {
        // Raw OCR with a digit-b confusion inside the number.
        let raw = "NO KK 3302b40302052186";
        let number = find_family_card_number(raw).expect("number");
        assert_eq!(number, "3302640302052186");
        assert!(validate_family_card(Some(&number)).valid);
    }

    #[test]
    fn exact_sixteen_digits_wins_first() {
        let raw = "header 3302040302052186 footer";
        assert_eq!(
            find_family_card_number(raw).as_deref(),
            Some("3302040302052186")
        );
    }

    #[test]
    fn grouped_digits_are_joined() {
        let raw = "NO KK 3302 0403 0205 2186";
        assert_eq!(
            find_family_card_number(raw).as_deref(),
            Some("3302040302052186")
        );
    }

    #[test]
    fn seventeen_digit_window_prefers_provincial_prefix() {
        // Leading stray digit; the 16-digit tail starts with 33.
        assert_eq!(
            pick_sixteen_window("93302040302052186").as_deref(),
            Some("3302040302052186")
        );
        // Neither window starts with 33: the head wins.
        assert_eq!(
            pick_sixteen_window("12345678901234567").as_deref(),
            Some("1234567890123456")
        );
        assert_eq!(pick_sixteen_window("330204030205218"), None);
    }

    #[test]
    fn fifteen_digits_are_not_accepted() {
        assert_eq!(find_family_card_number("330204030205218"), None);
    }

    #[test]
    fn validation_reasons() {
        assert!(!validate_family_card(None).valid);
        assert_eq!(validate_family_card(None).reason, "NO KK kosong");
        let short = validate_family_card(Some("12345"));
        assert!(!short.valid);
        assert_eq!(short.length, 5);
        let letters = validate_family_card(Some("33020403020521AB"));
        assert!(!letters.valid);
        assert_eq!(letters.reason, "NO KK harus berisi angka saja");
        assert!(validate_family_card(Some("3302040302052186")).valid);
    }

    #[test]
    fn deskew_restores_horizontal_text_rows() {
        // Synthetic image: dark horizontal bands, then rotated by 5°.
        let mut img = GrayImage::from_pixel(120, 120, image::Luma([255u8]));
        for y in (20..100).step_by(16) {
            for band in 0..4 {
                for x in 10..110 {
                    img.put_pixel(x, y + band, image::Luma([0u8]));
                }
            }
        }
        let skewed = rotate_degrees(&img, 5);
        let fixed = deskew(&skewed);
        assert!(projection_variance(&fixed) > projection_variance(&skewed));
    }

    #[test]
    fn autocontrast_stretches_range() {
        let mut img = GrayImage::from_pixel(4, 1, image::Luma([100u8]));
        img.put_pixel(3, 0, image::Luma([150u8]));
        let stretched = autocontrast(&img);
        assert_eq!(stretched.get_pixel(0, 0).0[0], 0);
        assert_eq!(stretched.get_pixel(3, 0).0[0], 255);
    }
}
