//! Prompt templates.
//!
//! Templates are prompty-style files: optional YAML front matter with the
//! model parameters, then a body split into messages by role marker lines
//! (`system:`, `user:`, `assistant:`). Each message body supports
//! `{{ path.to.value }}` substitution and `{% for x in list %}...{% endfor %}`
//! loops over arrays in the render inputs.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use ragline_core::{ChatMessage, Error, GenerationParams, Result, Role};

/// Name of the intent mapping template.
pub const INTENT_MAPPING: &str = "intent_mapping";

/// Name of the grounded chat template.
pub const GROUNDED_CHAT: &str = "grounded_chat";

const BUILTIN_INTENT_MAPPING: &str = include_str!("../assets/intent_mapping.prompty");
const BUILTIN_GROUNDED_CHAT: &str = include_str!("../assets/grounded_chat.prompty");

const TAG_PATTERN: &str = r"\{%-?\s*(?:for\s+(\w+)\s+in\s+([\w.]+)|(endfor))\s*-?%\}";
const VAR_PATTERN: &str = r"\{\{\s*([\w.]+)\s*\}\}";

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    model: ModelSection,
}

#[derive(Debug, Default, Deserialize)]
struct ModelSection {
    #[serde(default)]
    parameters: ModelParameters,
}

#[derive(Debug, Default, Deserialize)]
struct ModelParameters {
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    response_format: Option<ResponseFormatSpec>,
}

#[derive(Debug, Deserialize)]
struct ResponseFormatSpec {
    #[serde(rename = "type")]
    format_type: String,
}

/// A parsed prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub description: String,
    pub params: GenerationParams,
    sections: Vec<(Role, String)>,
    tag_re: Regex,
    var_re: Regex,
}

impl PromptTemplate {
    /// Parse template source text.
    pub fn parse(source: &str) -> Result<Self> {
        let (front, body) = split_front_matter(source)?;

        let params = GenerationParams {
            temperature: front.model.parameters.temperature,
            max_tokens: front.model.parameters.max_tokens,
            json_response: front
                .model
                .parameters
                .response_format
                .map(|f| f.format_type == "json_object")
                .unwrap_or(false),
        };

        let tag_re = Regex::new(TAG_PATTERN)
            .map_err(|e| Error::Config(format!("template tag pattern: {}", e)))?;
        let var_re = Regex::new(VAR_PATTERN)
            .map_err(|e| Error::Config(format!("template variable pattern: {}", e)))?;

        let template = Self {
            name: front.name.unwrap_or_default(),
            description: front.description.unwrap_or_default(),
            params,
            sections: split_sections(body),
            tag_re,
            var_re,
        };
        if template.sections.is_empty() {
            return Err(Error::Config(format!(
                "prompt template '{}' has no messages",
                template.name
            )));
        }
        Ok(template)
    }

    /// Role of each message section, in order.
    pub fn roles(&self) -> Vec<Role> {
        self.sections.iter().map(|(role, _)| *role).collect()
    }

    /// Render every section against `inputs` (a JSON object).
    ///
    /// Sections that render to blank text are dropped.
    pub fn render(&self, inputs: &Value) -> Result<Vec<ChatMessage>> {
        let scope = match inputs {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(Error::InvalidInput(
                    "prompt inputs must be a JSON object".to_string(),
                ))
            }
        };

        let mut messages = Vec::with_capacity(self.sections.len());
        for (role, text) in &self.sections {
            let rendered = self.render_text(text, &scope)?;
            let rendered = rendered.trim();
            if !rendered.is_empty() {
                messages.push(ChatMessage::new(*role, rendered));
            }
        }
        Ok(messages)
    }

    fn render_text(&self, text: &str, scope: &Map<String, Value>) -> Result<String> {
        let Some(open) = self.tag_re.captures(text) else {
            return Ok(self.substitute(text, scope));
        };
        let whole = open.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let (Some(var), Some(path)) = (open.get(1), open.get(2)) else {
            return Err(Error::Config(
                "'endfor' without a matching 'for' in prompt template".to_string(),
            ));
        };

        // Find the matching endfor, honouring nested loops.
        let mut depth = 1;
        let mut close = None;
        for tag in self.tag_re.captures_iter(&text[whole.1..]) {
            let m = tag.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            if tag.get(3).is_some() {
                depth -= 1;
                if depth == 0 {
                    close = Some((whole.1 + m.0, whole.1 + m.1));
                    break;
                }
            } else {
                depth += 1;
            }
        }
        let Some(close) = close else {
            return Err(Error::Config(format!(
                "unclosed 'for {} in {}' in prompt template",
                var.as_str(),
                path.as_str()
            )));
        };

        let mut out = self.substitute(&text[..whole.0], scope);
        let body = &text[whole.1..close.0];
        match lookup(scope, path.as_str()) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let mut inner = scope.clone();
                    inner.insert(var.as_str().to_string(), item.clone());
                    out.push_str(&self.render_text(body, &inner)?);
                }
            }
            Some(_) => {
                return Err(Error::Config(format!(
                    "'{}' is not a list and cannot be looped over",
                    path.as_str()
                )))
            }
        }
        out.push_str(&self.render_text(&text[close.1..], scope)?);
        Ok(out)
    }

    fn substitute(&self, text: &str, scope: &Map<String, Value>) -> String {
        self.var_re
            .replace_all(text, |caps: &regex::Captures| {
                lookup(scope, &caps[1]).map(value_text).unwrap_or_default()
            })
            .into_owned()
    }
}

fn split_front_matter(source: &str) -> Result<(FrontMatter, &str)> {
    let source = source.trim_start_matches('\u{feff}');
    let trimmed = source.trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return Ok((FrontMatter::default(), source));
    };
    let rest = rest.trim_start_matches(['\r', '\n']);

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let front: FrontMatter = if yaml.trim().is_empty() {
                FrontMatter::default()
            } else {
                serde_yaml::from_str(yaml)
                    .map_err(|e| Error::Config(format!("invalid template front matter: {}", e)))?
            };
            return Ok((front, body));
        }
        offset += line.len();
    }
    Err(Error::Config(
        "template front matter is not terminated by '---'".to_string(),
    ))
}

fn role_marker(line: &str) -> Option<Role> {
    match line.trim().to_ascii_lowercase().as_str() {
        "system:" => Some(Role::System),
        "user:" => Some(Role::User),
        "assistant:" => Some(Role::Assistant),
        _ => None,
    }
}

/// Split the body on role marker lines. Text before the first marker is
/// treated as a system message.
fn split_sections(body: &str) -> Vec<(Role, String)> {
    let mut sections: Vec<(Role, String)> = Vec::new();
    let mut current = (Role::System, String::new());
    let mut seen_marker = false;

    for line in body.lines() {
        if let Some(role) = role_marker(line) {
            if seen_marker || !current.1.trim().is_empty() {
                sections.push(std::mem::replace(&mut current, (role, String::new())));
            } else {
                current.0 = role;
            }
            seen_marker = true;
            continue;
        }
        current.1.push_str(line);
        current.1.push('\n');
    }
    if seen_marker || !current.1.trim().is_empty() {
        sections.push(current);
    }
    sections
}

fn lookup<'a>(scope: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut value = scope.get(parts.next()?)?;
    for part in parts {
        value = match value {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves template names to parsed templates.
///
/// A template named `name` is read from `<dir>/<name>.prompty` when a
/// directory is configured and the file exists, and otherwise comes from
/// the built-in set.
#[derive(Debug, Clone, Default)]
pub struct PromptStore {
    dir: Option<PathBuf>,
}

impl PromptStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Store serving only the built-in templates.
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn load(&self, name: &str) -> Result<PromptTemplate> {
        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{}.prompty", name));
            if path.is_file() {
                debug!(template = name, path = %path.display(), "Loading prompt template");
                let source = std::fs::read_to_string(&path)?;
                return PromptTemplate::parse(&source);
            }
        }

        let source = match name {
            INTENT_MAPPING => BUILTIN_INTENT_MAPPING,
            GROUNDED_CHAT => BUILTIN_GROUNDED_CHAT,
            other => {
                return Err(Error::Config(format!(
                    "unknown prompt template '{}'",
                    other
                )))
            }
        };
        debug!(template = name, "Using built-in prompt template");
        PromptTemplate::parse(source)
    }
}
