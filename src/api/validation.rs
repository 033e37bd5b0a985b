use super::ApiError;

/// Upper bound on user IDs accepted by the lookup route; anything larger
/// is treated as malformed input rather than a lookup miss.
const MAX_USER_ID: i32 = 99_999_999;

/// Helper-level username rule: 3 to 20 characters.
#[must_use]
pub fn validate_username(username: &str) -> bool {
    (3..=20).contains(&username.chars().count())
}

/// Helper-level password rule: 8 to 50 characters.
#[must_use]
pub fn validate_password(password: &str) -> bool {
    (8..=50).contains(&password.chars().count())
}

/// Thread titles: 5 to 50 characters after trimming.
#[must_use]
pub fn validate_thread_title(title: &str) -> bool {
    (5..=50).contains(&title.trim().chars().count())
}

/// Thread content: 10 to 500 characters after trimming.
#[must_use]
pub fn validate_thread_content(content: &str) -> bool {
    (10..=500).contains(&content.trim().chars().count())
}

/// Reply content: 5 to 300 characters after trimming.
#[must_use]
pub fn validate_reply_content(content: &str) -> bool {
    (5..=300).contains(&content.trim().chars().count())
}

/// Parse and range-check a user ID taken from a lookup path.
pub fn validate_user_id(raw: &str) -> Result<i32, ApiError> {
    let id: i32 = raw
        .parse()
        .map_err(|_| ApiError::validation("Invalid user ID"))?;

    if id <= 0 || id > MAX_USER_ID {
        return Err(ApiError::validation("Invalid user ID"));
    }

    Ok(id)
}

/// Parse a user ID for update/delete paths, which only require a
/// well-formed integer; out-of-range values fall through to a 404.
pub fn parse_user_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation("Invalid user ID"))
}

pub fn validate_thread_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid thread ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_reply_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid reply ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}
