/// Character policies for user-supplied names
///
/// | Input                       | Allowed characters                 |
/// |-----------------------------|------------------------------------|
/// | username, password          | letters, digits, `_`               |
/// | project name, task name     | letters, digits, `_`, space        |
/// | names taken from the path   | letters, digits, `_`               |
///
/// "Letters and digits" are Unicode alphanumerics. E-mail addresses,
/// deadlines and user references are not subject to these policies.
/// Length limits are enforced on the request payloads.

use crate::error::ServiceError;

pub const INVALID_CHARACTERS: &str = "Use only alphabet letters and numbers";

/// Letters, digits and `_`
pub fn is_identifier(value: &str) -> bool {
    value.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Letters, digits, `_` and space
pub fn is_display_name(value: &str) -> bool {
    value.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ' ')
}

/// Validates every credential field (username, password)
pub fn check_credentials(fields: &[(&str, &str)]) -> Result<(), ServiceError> {
    check_all(fields, is_identifier)
}

/// Validates project and task names
pub fn check_display_names(fields: &[(&str, &str)]) -> Result<(), ServiceError> {
    check_all(fields, is_display_name)
}

/// Validates a name extracted from the URL path
pub fn check_path_segment(field: &str, value: &str) -> Result<(), ServiceError> {
    check_all(&[(field, value)], is_identifier)
}

fn check_all(fields: &[(&str, &str)], policy: fn(&str) -> bool) -> Result<(), ServiceError> {
    match fields.iter().find(|(_, value)| !policy(value)) {
        Some((field, _)) => {
            tracing::debug!(field = %field, "Validation error: disallowed characters");
            Err(ServiceError::validation(INVALID_CHARACTERS))
        }
        None => Ok(()),
    }
}
