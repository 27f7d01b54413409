use serde::Serialize;

use crate::error::ApiError;

/// One rejected field of a request body.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// `{"validation": {field: {code, message}}}`; the first issue per field wins.
pub fn to_payload(issues: &[ValidationIssue]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for issue in issues {
        if map.contains_key(&issue.field) {
            continue;
        }
        map.insert(
            issue.field.clone(),
            serde_json::json!({ "code": issue.code, "message": issue.message }),
        );
    }
    serde_json::json!({ "validation": serde_json::Value::Object(map) })
}

impl From<Vec<ValidationIssue>> for ApiError {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        ApiError::Validation(to_payload(&issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keeps_first_issue_per_field() {
        let payload = to_payload(&[
            ValidationIssue::new("name", "empty", "name must not be empty"),
            ValidationIssue::new("name", "too_long", "name is too long"),
            ValidationIssue::new("tags", "too_many", "too many tags"),
        ]);
        assert_eq!(payload["validation"]["name"]["code"], "empty");
        assert_eq!(payload["validation"]["tags"]["message"], "too many tags");
    }
}
