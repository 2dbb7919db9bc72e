//! Presentation-independent helpers for posts, comments and tags.

use time::{
    OffsetDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::domain::error::DomainError;

/// File extensions accepted for post images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];

/// Number of characters kept from a post body in list teasers.
pub const TEASER_LENGTH: usize = 200;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// First [`TEASER_LENGTH`] characters of `text`. Counts Unicode scalar values,
/// so multi-byte text is never split inside a character.
pub fn teaser(text: &str) -> String {
    match text.char_indices().nth(TEASER_LENGTH) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

pub fn format_human_date(value: OffsetDateTime) -> String {
    value
        .date()
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| value.date().to_string())
}

pub fn format_iso_datetime(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| value.unix_timestamp().to_string())
}

/// Trim a required text field, rejecting blank input.
pub fn require_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::empty_field(field));
    }
    Ok(trimmed.to_string())
}

/// Lower-cased extension of an uploaded image name, rejecting anything that
/// is not a known image type.
pub fn image_extension(filename: &str) -> Result<String, DomainError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(DomainError::validation(format!(
            "`{filename}` is not an image ({})",
            IMAGE_EXTENSIONS.join(", ")
        )))
    }
}
