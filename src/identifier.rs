//! Identifier Generator
//!
//! Turns a notification payload into the key its alerts are stored under.
//!
//! A template mixes literal text with `{field}` references into the payload:
//!
//! ```text
//! {groupLabels.alertname}_{receiver}   ->  Test_webhook
//! {version}-{status}                   ->  4-firing
//! ```
//!
//! Field names are matched case-insensitively with `-` and `_` ignored, so
//! `{group-labels.alertname}` and `{GroupLabels.alertname}` are equivalent.
//! A leading `.` is ignored as well. Map fields (`groupLabels`,
//! `commonLabels`, `commonAnnotations`) take exactly one key, which is
//! matched verbatim. `{{` and `}}` produce literal braces.
//!
//! Templates are compiled once. Every structural problem (bad braces, unknown
//! field, wrong shape, no field reference at all) is reported by
//! [`IdGenerator::new`]; rendering can only fail when the payload lacks a
//! referenced map key or the result is empty.
//!
//! Rendering is deterministic and does not enforce uniqueness: two payloads
//! that render to the same identifier overwrite each other in the store.

use std::fmt;
use std::str::FromStr;

use crate::types::{LabelSet, Message};

/// Errors found while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed field reference starting at byte {position}")]
    UnclosedReference { position: usize },
    #[error("unexpected '{brace}' at byte {position} (use '{brace}{brace}' for a literal brace)")]
    UnexpectedBrace { brace: char, position: usize },
    #[error("empty field reference at byte {position}")]
    EmptyReference { position: usize },
    #[error("unknown field '{field}'")]
    UnknownField { field: String },
    #[error("field '{field}' is not a map and takes no key")]
    UnexpectedKey { field: &'static str },
    #[error("field '{field}' is a map and needs a key, e.g. '{{{field}.alertname}}'")]
    MissingKey { field: &'static str },
    #[error("field '{field}' takes a single key, got '{key}'")]
    NestedKey { field: &'static str, key: String },
    #[error(
        "template '{template}' references no payload field, so every notification would share one id \
         (references use single braces, e.g. '{{groupLabels.alertname}}_{{receiver}}')"
    )]
    NoFieldReference { template: String },
}

/// Errors found while rendering a compiled template against a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("payload has no {field} entry named '{key}'")]
    MissingKey { field: &'static str, key: String },
    #[error("template rendered an empty identifier")]
    EmptyIdentifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarField {
    Version,
    GroupKey,
    TruncatedAlerts,
    Receiver,
    Status,
    ExternalUrl,
}

impl ScalarField {
    const fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::GroupKey => "groupKey",
            Self::TruncatedAlerts => "truncatedAlerts",
            Self::Receiver => "receiver",
            Self::Status => "status",
            Self::ExternalUrl => "externalURL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapField {
    GroupLabels,
    CommonLabels,
    CommonAnnotations,
}

impl MapField {
    const fn name(self) -> &'static str {
        match self {
            Self::GroupLabels => "groupLabels",
            Self::CommonLabels => "commonLabels",
            Self::CommonAnnotations => "commonAnnotations",
        }
    }

    fn select(self, msg: &Message) -> &LabelSet {
        match self {
            Self::GroupLabels => &msg.group_labels,
            Self::CommonLabels => &msg.common_labels,
            Self::CommonAnnotations => &msg.common_annotations,
        }
    }
}

enum Field {
    Scalar(ScalarField),
    Map(MapField),
}

impl Field {
    fn lookup(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let field = match normalized.as_str() {
            "version" => Self::Scalar(ScalarField::Version),
            "groupkey" => Self::Scalar(ScalarField::GroupKey),
            "truncatedalerts" => Self::Scalar(ScalarField::TruncatedAlerts),
            "receiver" => Self::Scalar(ScalarField::Receiver),
            "status" => Self::Scalar(ScalarField::Status),
            "externalurl" => Self::Scalar(ScalarField::ExternalUrl),
            "grouplabels" => Self::Map(MapField::GroupLabels),
            "commonlabels" => Self::Map(MapField::CommonLabels),
            "commonannotations" => Self::Map(MapField::CommonAnnotations),
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Scalar(ScalarField),
    MapEntry(MapField, String),
}

/// A compiled identifier template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    source: String,
    segments: Vec<Segment>,
}

impl IdGenerator {
    /// Compile `template`, rejecting anything that could not render.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|(_, next)| *next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|(_, next)| *next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnexpectedBrace { brace: '}', position }),
                '{' => {
                    let mut reference = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(TemplateError::UnexpectedBrace {
                                    brace: '{',
                                    position: inner_pos,
                                })
                            }
                            _ => reference.push(inner),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedReference { position });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_reference(&reference, position)?);
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Err(TemplateError::NoFieldReference {
                template: template.to_string(),
            });
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Render the identifier for `msg`.
    pub fn render(&self, msg: &Message) -> Result<String, RenderError> {
        let mut id = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => id.push_str(text),
                Segment::Scalar(field) => match field {
                    ScalarField::Version => id.push_str(&msg.version),
                    ScalarField::GroupKey => id.push_str(&msg.group_key),
                    ScalarField::TruncatedAlerts => id.push_str(&msg.truncated_alerts.to_string()),
                    ScalarField::Receiver => id.push_str(&msg.receiver),
                    ScalarField::Status => id.push_str(&msg.status),
                    ScalarField::ExternalUrl => id.push_str(&msg.external_url),
                },
                Segment::MapEntry(field, key) => {
                    let value = field.select(msg).get(key).ok_or_else(|| RenderError::MissingKey {
                        field: field.name(),
                        key: key.clone(),
                    })?;
                    id.push_str(value);
                }
            }
        }

        if id.is_empty() {
            return Err(RenderError::EmptyIdentifier);
        }
        Ok(id)
    }

    /// The template text this generator was compiled from.
    pub fn template(&self) -> &str {
        &self.source
    }
}

fn parse_reference(reference: &str, position: usize) -> Result<Segment, TemplateError> {
    let reference = reference.trim();
    let reference = reference.strip_prefix('.').unwrap_or(reference);
    if reference.is_empty() {
        return Err(TemplateError::EmptyReference { position });
    }

    let (name, key) = match reference.split_once('.') {
        Some((name, key)) => (name, Some(key)),
        None => (reference, None),
    };

    let field = Field::lookup(name).ok_or_else(|| TemplateError::UnknownField {
        field: name.to_string(),
    })?;

    match (field, key) {
        (Field::Scalar(scalar), None) => Ok(Segment::Scalar(scalar)),
        (Field::Scalar(scalar), Some(_)) => Err(TemplateError::UnexpectedKey {
            field: scalar.name(),
        }),
        (Field::Map(map), None) => Err(TemplateError::MissingKey { field: map.name() }),
        (Field::Map(map), Some(key)) if key.is_empty() => {
            Err(TemplateError::MissingKey { field: map.name() })
        }
        (Field::Map(map), Some(key)) if key.contains('.') => Err(TemplateError::NestedKey {
            field: map.name(),
            key: key.to_string(),
        }),
        (Field::Map(map), Some(key)) => Ok(Segment::MapEntry(map, key.to_string())),
    }
}

impl FromStr for IdGenerator {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::DEFAULT_ID_TEMPLATE;

    fn sample_message() -> Message {
        let mut msg = Message {
            version: "4".to_string(),
            group_key: "{}:{alertname=\"Test\"}".to_string(),
            truncated_alerts: 2,
            receiver: "webhook".to_string(),
            status: "firing".to_string(),
            external_url: "http://localhost:9093".to_string(),
            ..Message::default()
        };
        msg.group_labels.insert("alertname".to_string(), "Test".to_string());
        msg.common_labels.insert("job".to_string(), "prometheus24".to_string());
        msg
    }

    #[test]
    fn test_default_template() {
        let generator = IdGenerator::new(DEFAULT_ID_TEMPLATE).unwrap();
        assert_eq!(generator.render(&sample_message()).unwrap(), "Test_webhook");
    }

    #[test]
    fn test_version_status_template() {
        let generator = IdGenerator::new("{version}-{status}").unwrap();
        assert_eq!(generator.render(&sample_message()).unwrap(), "4-firing");
    }

    #[test]
    fn test_field_name_spellings_are_equivalent() {
        let msg = sample_message();
        for template in [
            "{groupLabels.alertname}_{receiver}",
            "{group-labels.alertname}_{Receiver}",
            "{group_labels.alertname}_{RECEIVER}",
            "{ .GroupLabels.alertname }_{ .Receiver }",
        ] {
            let generator = IdGenerator::new(template).unwrap();
            assert_eq!(generator.render(&msg).unwrap(), "Test_webhook", "template {template}");
        }
    }

    #[test]
    fn test_all_scalar_fields() {
        let generator =
            IdGenerator::new("{version}|{groupKey}|{truncatedAlerts}|{receiver}|{status}|{externalURL}")
                .unwrap();
        assert_eq!(
            generator.render(&sample_message()).unwrap(),
            "4|{}:{alertname=\"Test\"}|2|webhook|firing|http://localhost:9093"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let generator = IdGenerator::new("{{{receiver}}}").unwrap();
        assert_eq!(generator.render(&sample_message()).unwrap(), "{webhook}");
    }

    #[test]
    fn test_literal_only_template_is_rejected() {
        for template in ["static", "", "{{literal}}"] {
            assert_eq!(
                IdGenerator::new(template).unwrap_err(),
                TemplateError::NoFieldReference {
                    template: template.to_string()
                },
                "template {template:?}"
            );
        }
    }

    #[test]
    fn test_double_brace_references_are_rejected() {
        let err = IdGenerator::new("{{ .GroupLabels.alertname }}_{{ .Receiver }}").unwrap_err();
        assert!(matches!(err, TemplateError::NoFieldReference { .. }), "got {err:?}");
        assert!(err.to_string().contains("{groupLabels.alertname}_{receiver}"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let generator = IdGenerator::new("{commonLabels.job}/{receiver}").unwrap();
        let msg = sample_message();
        let first = generator.render(&msg).unwrap();
        for _ in 0..10 {
            assert_eq!(generator.render(&msg).unwrap(), first);
        }
    }

    #[test]
    fn test_malformed_templates_fail_at_compile_time() {
        assert_eq!(
            IdGenerator::new("{receiver").unwrap_err(),
            TemplateError::UnclosedReference { position: 0 }
        );
        assert_eq!(
            IdGenerator::new("a}b").unwrap_err(),
            TemplateError::UnexpectedBrace { brace: '}', position: 1 }
        );
        assert_eq!(
            IdGenerator::new("{rec{eiver}").unwrap_err(),
            TemplateError::UnexpectedBrace { brace: '{', position: 4 }
        );
        assert_eq!(
            IdGenerator::new("x{ }").unwrap_err(),
            TemplateError::EmptyReference { position: 1 }
        );
        assert_eq!(
            IdGenerator::new("{alerts}").unwrap_err(),
            TemplateError::UnknownField { field: "alerts".to_string() }
        );
        assert_eq!(
            IdGenerator::new("{receiver.name}").unwrap_err(),
            TemplateError::UnexpectedKey { field: "receiver" }
        );
        assert_eq!(
            IdGenerator::new("{groupLabels}").unwrap_err(),
            TemplateError::MissingKey { field: "groupLabels" }
        );
        assert_eq!(
            IdGenerator::new("{groupLabels.}").unwrap_err(),
            TemplateError::MissingKey { field: "groupLabels" }
        );
        assert_eq!(
            IdGenerator::new("{commonLabels.a.b}").unwrap_err(),
            TemplateError::NestedKey { field: "commonLabels", key: "a.b".to_string() }
        );
    }

    #[test]
    fn test_missing_map_key_fails_at_render_time() {
        let generator = IdGenerator::new("{commonAnnotations.summary}").unwrap();
        let err = generator.render(&sample_message()).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingKey {
                field: "commonAnnotations",
                key: "summary".to_string()
            }
        );
    }

    #[test]
    fn test_empty_identifier_is_rejected() {
        let generator = IdGenerator::new("{receiver}").unwrap();
        assert_eq!(
            generator.render(&Message::default()).unwrap_err(),
            RenderError::EmptyIdentifier
        );
    }

    #[test]
    fn test_distinct_payloads_can_collide() {
        let generator = IdGenerator::new("{receiver}").unwrap();
        let a = sample_message();
        let b = Message {
            status: "resolved".to_string(),
            ..sample_message()
        };
        assert_ne!(a, b);
        assert_eq!(generator.render(&a).unwrap(), generator.render(&b).unwrap());
    }

    #[test]
    fn test_from_str_and_display() {
        let generator: IdGenerator = "{receiver}".parse().unwrap();
        assert_eq!(generator.to_string(), "{receiver}");
        assert_eq!(generator.template(), "{receiver}");
    }
}
