//! Prompt templates for tubeqa.
//!
//! Templates use `{name}` placeholders; `{{` and `}}` produce literal braces.
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use crate::error::{Result, TubeqaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq)]
enum Part<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Names of all placeholders used by the template.
    pub fn placeholders(&self) -> BTreeSet<String> {
        parse(&self.template)
            .into_iter()
            .filter_map(|part| match part {
                Part::Placeholder(name) => Some(name.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Check that the template uses every required placeholder.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        let present = self.placeholders();
        for name in names {
            if !present.contains(*name) {
                return Err(TubeqaError::Config(format!(
                    "prompt template does not use required placeholder {{{}}}",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Render the template. Fails without producing output if any
    /// placeholder has no value.
    pub fn render(&self, vars: &HashMap<String, String>) -> Result<String> {
        let parts = parse(&self.template);

        if let Some(missing) = parts.iter().find_map(|part| match part {
            Part::Placeholder(name) if !vars.contains_key(*name) => Some(*name),
            _ => None,
        }) {
            return Err(TubeqaError::MissingPlaceholder(missing.to_string()));
        }

        let mut out = String::with_capacity(self.template.len());
        for part in parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Brace(c) => out.push(c),
                Part::Placeholder(name) => out.push_str(&vars[name]),
            }
        }
        Ok(out)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a template into literal text, escaped braces and placeholders.
/// Braces that do not form an escape or a valid placeholder stay literal.
fn parse(template: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;
    let bytes = template.as_bytes();

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                push_literal(&mut parts, template, literal_start, i);
                parts.push(Part::Brace('{'));
                i += 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                push_literal(&mut parts, template, literal_start, i);
                parts.push(Part::Brace('}'));
                i += 2;
                literal_start = i;
            }
            b'{' => match template[i + 1..].find('}') {
                Some(len) if is_placeholder_name(&template[i + 1..i + 1 + len]) => {
                    push_literal(&mut parts, template, literal_start, i);
                    parts.push(Part::Placeholder(&template[i + 1..i + 1 + len]));
                    i += len + 2;
                    literal_start = i;
                }
                _ => i += 1,
            },
            _ => i += 1,
        }
    }
    push_literal(&mut parts, template, literal_start, bytes.len());
    parts
}

fn push_literal<'a>(parts: &mut Vec<Part<'a>>, template: &'a str, start: usize, end: usize) {
    if end > start {
        parts.push(Part::Literal(&template[start..end]));
    }
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub qa: QaPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompt for video summarization. Uses `{transcript}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub template: PromptTemplate,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            template: PromptTemplate::new(
                r#"You are an AI assistant tasked with summarizing YouTube video transcripts. Provide concise, informative summaries that capture the main points of the video content.

Instructions:
1. Summarize the transcript in a single concise paragraph.
2. Ignore any timestamps in your summary.
3. Focus on the spoken content (Text) of the video.

Note: In the transcript, "Text" refers to the spoken words in the video, and "Start" indicates the timestamp when that part begins in the video.

Please summarize the following YouTube video transcript:

{transcript}"#,
            ),
        }
    }
}

/// Prompt for question answering. Uses `{context}` and `{question}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    pub template: PromptTemplate,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            template: PromptTemplate::new(
                r#"You are an expert assistant providing detailed answers based on the following video content.

Relevant Video Context:
{context}

Based on the above context, please answer the following question:
Question: {question}"#,
            ),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }
        }

        prompts.validate()?;
        Ok(prompts)
    }

    /// Check that each template uses the placeholders the pipeline fills in.
    pub fn validate(&self) -> Result<()> {
        self.summary.template.require(&["transcript"])?;
        self.qa.template.require(&["context", "question"])?;
        Ok(())
    }

    /// Render the summary prompt for a transcript.
    pub fn render_summary(&self, transcript: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        self.render_with_custom(&self.summary.template, &vars)
    }

    /// Render the question-answering prompt.
    pub fn render_qa(&self, context: &str, question: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.render_with_custom(&self.qa.template, &vars)
    }

    /// Render a template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &PromptTemplate,
        vars: &HashMap<String, String>,
    ) -> Result<String> {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        template.render(&merged)
    }
}
