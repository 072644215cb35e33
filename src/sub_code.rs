use serde_json::Value as JsonValue;

/// Provider sub-codes treated as success.
///
/// `200` is success, `201` (transfer pending) and `202` (transfer acknowledged)
/// are non-fatal.
pub const ACCEPTED_SUB_CODES: [&str; 3] = ["200", "201", "202"];

/// Returns `true` if `sub_code` is in the accepted set. Unknown codes fail.
#[must_use]
pub fn is_success(sub_code: &str) -> bool {
    ACCEPTED_SUB_CODES.contains(&sub_code)
}

/// Reads the `subCode` field of a response body.
///
/// The provider sends it as a string; a JSON number is read as its decimal form.
#[must_use]
pub fn extract(body: &JsonValue) -> Option<String> {
    match body.get("subCode")? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
