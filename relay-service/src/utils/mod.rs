use service_core::error::AppError;

/// Returns the first candidate that is present and not blank, or `default`.
pub fn first_non_empty<'a, I>(candidates: I, default: &'a str) -> &'a str
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .unwrap_or(default)
}

/// Unwraps a required input field; absent or blank values are a
/// `ValidationError` carrying `message`.
pub fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError(message.to_string()))
}
