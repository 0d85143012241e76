//! Application-wide constants

/// Prefix of the form key of every custom question; the question id follows.
pub const CUSTOM_QUESTION_PREFIX: &str = "custom_question_";

/// Separator used when a multi-select answer is stored as text.
/// A choice containing this separator cannot be split back out.
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

/// Session key holding the authenticated user's id.
/// Written by the login flow, which lives outside this crate.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Longest question label organizers may enter.
pub const MAX_QUESTION_LABEL_LENGTH: u64 = 255;
