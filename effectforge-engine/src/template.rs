//! Minimal `{{ name }}` templates.
//!
//! A template is parsed once into literal and placeholder segments. Rendering
//! substitutes values verbatim; substituted text is never scanned for further
//! placeholders.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TemplateError;

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_owned()));
            }
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open
                .find(CLOSE)
                .ok_or(TemplateError::Unterminated(offset + start))?;
            let name = after_open[..end].trim();
            if !NAME_REGEX.is_match(name) {
                return Err(TemplateError::InvalidName(name.to_owned()));
            }
            segments.push(Segment::Placeholder(name.to_owned()));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_owned()));
        }
        Ok(Self { segments })
    }

    /// Placeholder names in order of first use.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn render(&self, values: &HashMap<String, String>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingValue(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render in one go.
pub fn render(source: &str, values: &HashMap<String, String>) -> Result<String, TemplateError> {
    Template::parse(source)?.render(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn renders_placeholders_with_optional_spaces() {
        let out = render(
            "class {{name}} { speed = {{ speed }}; again = {{name}}; }",
            &values(&[("name", "Fire"), ("speed", "2")]),
        )
        .unwrap();
        assert_eq!(out, "class Fire { speed = 2; again = Fire; }");
    }

    #[test]
    fn lists_placeholders_once() {
        let t = Template::parse("{{a}}{{b}} {{a}} {{_c1}}").unwrap();
        assert_eq!(t.placeholders(), vec!["a", "b", "_c1"]);
        assert!(Template::parse("plain { js }").unwrap().placeholders().is_empty());
    }

    #[test]
    fn substituted_values_are_not_expanded() {
        let out = render("{{x}}", &values(&[("x", "{{y}}")])).unwrap();
        assert_eq!(out, "{{y}}");
    }

    #[test]
    fn missing_value_is_an_error() {
        assert_eq!(
            render("a {{b}}", &values(&[])),
            Err(TemplateError::MissingValue("b".into()))
        );
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert_eq!(
            Template::parse("abc {{name"),
            Err(TemplateError::Unterminated(4))
        );
        assert_eq!(
            Template::parse("{{ok}} then {{ oops"),
            Err(TemplateError::Unterminated(12))
        );
        assert_eq!(
            Template::parse("{{1abc}}"),
            Err(TemplateError::InvalidName("1abc".into()))
        );
        assert_eq!(
            Template::parse("{{}}"),
            Err(TemplateError::InvalidName(String::new()))
        );
        assert_eq!(
            Template::parse("{{a-b}}"),
            Err(TemplateError::InvalidName("a-b".into()))
        );
    }
}
