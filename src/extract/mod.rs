//! Field extraction from archived documents: fixed cells of the
//! funding-request workbook and the family-card number OCR pass.

pub mod family_card;
pub mod funding;

pub use family_card::{
    check_family_cards, clean_ocr_text, extract_family_card_number, find_family_card_number,
    validate_family_card, FamilyCardCheck, FamilyCardValidation, OcrTools,
};
pub use funding::{extract_funding_fields, scan_funding_requests, FundingFields, FundingRequest};
