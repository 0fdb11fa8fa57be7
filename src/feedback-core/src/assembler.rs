//! Builds the final result from the human's text and images.

use chrono::Local;

use crate::error::ValidationEmpty;
use crate::model::{FeedbackResult, ImageAttachment, Outcome};

/// Reject a submission that has neither text nor images.
pub fn check_submission(text: &str, image_count: usize) -> Result<(), ValidationEmpty> {
    if text.trim().is_empty() && image_count == 0 {
        return Err(ValidationEmpty);
    }
    Ok(())
}

/// Combine trimmed text and an image snapshot into a submitted result.
pub fn assemble(
    text: &str,
    images: Vec<ImageAttachment>,
) -> Result<FeedbackResult, ValidationEmpty> {
    check_submission(text, images.len())?;

    let text = text.trim();
    Ok(FeedbackResult {
        text: (!text.is_empty()).then(|| text.to_string()),
        images,
        submitted_at: Local::now(),
        outcome: Outcome::Submitted,
    })
}
