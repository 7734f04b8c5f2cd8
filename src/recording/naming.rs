// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File name templates for saved takes.
//!
//! Placeholders:
//! - `{now}` / `{now:<strftime>}`: local save time (default `%Y%m%d%H%M%S`)
//! - `{events}`: number of events in the take
//! - `{notes}`: number of note on/off events
//! - `{guid}`: a random UUID
//!
//! `{{` and `}}` produce literal braces.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use thiserror::Error;
use uuid::Uuid;

use crate::split::Window;

/// Date format used by a bare `{now}`
pub const DEFAULT_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Problems found while parsing a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("path template is empty")]
    Empty,

    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("unclosed '{{' at offset {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at offset {0}")]
    UnmatchedClose(usize),

    #[error("invalid date format '{0}'")]
    InvalidDateFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Now(String),
    Events,
    Notes,
    Guid,
}

/// Values substituted into a template
#[derive(Debug, Clone)]
pub struct NameContext {
    pub now: DateTime<Local>,
    pub events: usize,
    pub notes: usize,
    pub guid: Uuid,
}

impl NameContext {
    /// Context for saving `window` right now
    pub fn for_window(window: &Window) -> Self {
        Self {
            now: Local::now(),
            events: window.len(),
            notes: window.note_count(),
            guid: Uuid::new_v4(),
        }
    }
}

/// A validated path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FileNameTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(placeholder(&body)?);
                }
                '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute every placeholder
    pub fn render(&self, context: &NameContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Now(format) => out.push_str(&context.now.format(format).to_string()),
                Segment::Events => out.push_str(&context.events.to_string()),
                Segment::Notes => out.push_str(&context.notes.to_string()),
                Segment::Guid => out.push_str(&context.guid.to_string()),
            }
        }
        out
    }

    /// Render into a path
    pub fn path_for(&self, context: &NameContext) -> PathBuf {
        PathBuf::from(self.render(context))
    }
}

impl FromStr for FileNameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FileNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn placeholder(body: &str) -> Result<Segment, TemplateError> {
    let (name, format) = match body.split_once(':') {
        Some((name, format)) => (name, Some(format)),
        None => (body, None),
    };

    match (name.trim().to_ascii_lowercase().as_str(), format) {
        ("now", None) => Ok(Segment::Now(DEFAULT_DATE_FORMAT.to_string())),
        ("now", Some(format)) => {
            let invalid = format.is_empty()
                || StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
            if invalid {
                Err(TemplateError::InvalidDateFormat(format.to_string()))
            } else {
                Ok(Segment::Now(format.to_string()))
            }
        }
        ("events", None) => Ok(Segment::Events),
        ("notes", None) => Ok(Segment::Notes),
        ("guid", None) => Ok(Segment::Guid),
        _ => Err(TemplateError::UnknownPlaceholder(body.to_string())),
    }
}
