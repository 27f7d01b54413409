use effectforge_store::Platform;
use serde::Deserialize;
use serde_json::Value;

use crate::handlers::effects::dto::GenerateEffectDto;
use crate::state::UploadLimits;
use crate::validation::ValidationIssue;

pub const MAX_FILENAME_CHARS: usize = 255;

/// Body of `POST /uploads`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadDto {
    pub filename: Option<String>,
    pub content: Option<String>,
    pub platform: Option<String>,
}

/// A checked upload, with its entries split out but not yet validated.
#[derive(Debug)]
pub struct ParsedUpload {
    pub filename: String,
    pub size_bytes: usize,
    pub platform: Platform,
    /// One slot per entry, in file order. `Err` holds why the entry is unusable.
    pub entries: Vec<Result<GenerateEffectDto, String>>,
}

impl CreateUploadDto {
    pub fn validate(&self, limits: &UploadLimits) -> Result<ParsedUpload, Vec<ValidationIssue>> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        let filename = self.filename.as_deref().map(str::trim).unwrap_or("");
        if filename.is_empty() {
            issues.push(ValidationIssue::new(
                "filename",
                "required",
                "filename is required",
            ));
        } else if filename.chars().count() > MAX_FILENAME_CHARS {
            issues.push(ValidationIssue::new(
                "filename",
                "too_long",
                format!("filename must be <= {MAX_FILENAME_CHARS} chars"),
            ));
        } else if filename
            .chars()
            .any(|c| c.is_control() || c == '/' || c == '\\')
        {
            issues.push(ValidationIssue::new(
                "filename",
                "invalid_content",
                "filename must not contain path separators or control characters",
            ));
        }

        let platform = match self.platform.as_deref().map(str::trim) {
            None | Some("") => Platform::default(),
            Some(raw) => raw.parse::<Platform>().unwrap_or_else(|_| {
                issues.push(ValidationIssue::new(
                    "platform",
                    "invalid_platform",
                    "platform must be canvas or react",
                ));
                Platform::default()
            }),
        };

        let content = self.content.as_deref().unwrap_or("");
        let mut entries = Vec::new();
        if content.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "content",
                "required",
                "content is required",
            ));
        } else if content.len() > limits.max_bytes {
            issues.push(ValidationIssue::new(
                "content",
                "too_large",
                format!("content must be <= {} bytes", limits.max_bytes),
            ));
        } else {
            match parse_entries(content) {
                Ok(parsed) if parsed.is_empty() => issues.push(ValidationIssue::new(
                    "content",
                    "no_entries",
                    "content has no descriptions",
                )),
                Ok(parsed) if parsed.len() > limits.max_entries => {
                    issues.push(ValidationIssue::new(
                        "content",
                        "too_many_entries",
                        format!("content must have at most {} entries", limits.max_entries),
                    ))
                }
                Ok(parsed) => entries = parsed,
                Err(message) => {
                    issues.push(ValidationIssue::new("content", "invalid_json", message))
                }
            }
        }

        if !issues.is_empty() {
            return Err(issues);
        }
        Ok(ParsedUpload {
            filename: filename.to_string(),
            size_bytes: content.len(),
            platform,
            entries,
        })
    }
}

/// Split upload content into entries.
///
/// Content starting with `[` is a JSON array whose items are description
/// strings or effect objects. Anything else is one description per line;
/// blank lines and `#` comments are skipped.
pub fn parse_entries(content: &str) -> Result<Vec<Result<GenerateEffectDto, String>>, String> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.starts_with('[') {
        let items: Vec<Value> = serde_json::from_str(trimmed)
            .map_err(|e| format!("content is not a valid JSON array: {e}"))?;
        return Ok(items.into_iter().map(entry_from_value).collect());
    }
    Ok(trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| Ok(GenerateEffectDto::from_description(line)))
        .collect())
}

fn entry_from_value(value: Value) -> Result<GenerateEffectDto, String> {
    match value {
        Value::String(description) => Ok(GenerateEffectDto::from_description(description)),
        Value::Object(_) => serde_json::from_value(value).map_err(|e| format!("invalid entry: {e}")),
        _ => Err("entry must be a string or an object".to_string()),
    }
}

/// One line per issue, e.g. `description: description is required`.
pub fn describe_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> UploadLimits {
        UploadLimits {
            max_entries: 3,
            max_bytes: 1024,
        }
    }

    #[test]
    fn lines_skip_blanks_and_comments() {
        let entries = parse_entries("# effects\nfire embers\n\n  rain at night  \n").unwrap();
        let descriptions: Vec<_> = entries
            .into_iter()
            .map(|e| e.unwrap().description.unwrap())
            .collect();
        assert_eq!(descriptions, vec!["fire embers", "rain at night"]);
    }

    #[test]
    fn json_arrays_mix_strings_and_objects() {
        let entries = parse_entries(
            r#"[ "snow", {"description": "waves", "platform": "react", "tags": ["sea"]}, 42 ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].as_ref().unwrap().description.as_deref(), Some("snow"));
        let object = entries[1].as_ref().unwrap();
        assert_eq!(object.platform.as_deref(), Some("react"));
        assert_eq!(object.tags.as_deref(), Some(&["sea".to_string()][..]));
        assert!(entries[2].is_err());
    }

    #[test]
    fn broken_json_is_rejected() {
        assert!(parse_entries("[\"unterminated").is_err());
    }

    #[test]
    fn enforces_limits() {
        let dto = CreateUploadDto {
            filename: Some("batch.txt".into()),
            content: Some("a\nb\nc\nd".into()),
            platform: None,
        };
        let issues = dto.validate(&limits()).unwrap_err();
        assert_eq!(issues[0].code, "too_many_entries");

        let dto = CreateUploadDto {
            filename: Some("batch.txt".into()),
            content: Some("x".repeat(2000)),
            platform: None,
        };
        assert_eq!(dto.validate(&limits()).unwrap_err()[0].code, "too_large");

        let dto = CreateUploadDto {
            filename: Some("../etc/passwd".into()),
            content: Some("# only a comment".into()),
            platform: Some("flash".into()),
        };
        let codes: Vec<_> = dto
            .validate(&limits())
            .unwrap_err()
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, vec!["invalid_content", "invalid_platform", "no_entries"]);
    }

    #[test]
    fn accepts_a_valid_upload() {
        let dto = CreateUploadDto {
            filename: Some(" effects.txt ".into()),
            content: Some("fire\nrain\n".into()),
            platform: Some("react".into()),
        };
        let parsed = dto.validate(&limits()).unwrap();
        assert_eq!(parsed.filename, "effects.txt");
        assert_eq!(parsed.size_bytes, 10);
        assert_eq!(parsed.platform, Platform::React);
        assert_eq!(parsed.entries.len(), 2);
    }
}
