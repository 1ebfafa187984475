//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_FILENAME_LEN: usize = 255;

/// Validates an uploaded file name: non-blank, bounded, no control characters or path separators.
///
/// # Examples
///
/// ```ignore
/// validate_filename("kickoff.jpg")    // Ok
/// validate_filename("   ")            // Err - blank
/// validate_filename("../etc/passwd")  // Err - separator
/// ```
pub fn validate_filename(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("filename_blank");
        err.message = Some("File name must not be blank".into());
        return Err(err);
    }

    if name.chars().count() > MAX_FILENAME_LEN {
        let mut err = ValidationError::new("filename_length");
        err.message = Some(
            format!(
                "File name must be at most {MAX_FILENAME_LEN} characters (got {})",
                name.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    if name
        .chars()
        .any(|c| c.is_control() || c == '/' || c == '\\')
    {
        let mut err = ValidationError::new("filename_format");
        err.message = Some("File name must not contain control characters or separators".into());
        return Err(err);
    }

    Ok(())
}
