use serde_json::Value;

use super::safety::{sanitize_untrusted_text, truncate_chars};
use crate::calculators::CalculatorKind;
use crate::chat::{ChatRole, ChatTurn};
use crate::pages::PageKind;

pub const SALES_HISTORY_TURNS: usize = 6;
/// Upper bound on a rendered prompt, enforced by the chat endpoint.
pub const MAX_PROMPT_CHARS: usize = 8_000;
const SALES_TURN_CHARS: usize = 800;
const MAX_PAGE_CHARS: usize = 200;
const NO_HISTORY: &str = "(no earlier messages)";
pub const MAX_PROMPT_RECOMMENDATIONS: usize = 3;

const PERSONA: &str = "You are the PromptCraft assistant for an online course that teaches professionals to write effective AI prompts.";
const GENERIC_CALCULATOR_INSTRUCTION: &str = "Explain what these results mean for the visitor in plain language, highlight the most useful number, and suggest one practical next step.";
const EMPTY_VALUE: &str = "";

/// Which calculator a result explanation is about. Keys outside the known set
/// still render, with the generic instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalculatorTopic {
    Known(CalculatorKind),
    Unrecognized(String),
}

impl CalculatorTopic {
    pub fn from_key(key: &str) -> Self {
        CalculatorKind::parse(key)
            .map(Self::Known)
            .unwrap_or_else(|| Self::Unrecognized(key.trim().to_string()))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Known(kind) => kind.title(),
            Self::Unrecognized(key) if key.is_empty() => "Business calculator",
            Self::Unrecognized(key) => key,
        }
    }
}

impl From<CalculatorKind> for CalculatorTopic {
    fn from(kind: CalculatorKind) -> Self {
        Self::Known(kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptContext {
    CalculatorInsight {
        topic: CalculatorTopic,
        inputs: Value,
        results: Value,
    },
    SalesChat {
        page: String,
        visitor_message: String,
        history: Vec<ChatTurn>,
    },
    Recommendations {
        page: String,
        results: Option<Value>,
        interests: Vec<String>,
    },
}

/// Renders the instruction string for `context`. Pure and total: absent
/// fields interpolate as empty text.
pub fn build_prompt(context: &PromptContext) -> String {
    match context {
        PromptContext::CalculatorInsight {
            topic,
            inputs,
            results,
        } => calculator_prompt(topic, inputs, results),
        PromptContext::SalesChat {
            page,
            visitor_message,
            history,
        } => sales_prompt(page, visitor_message, history),
        PromptContext::Recommendations {
            page,
            results,
            interests,
        } => recommendations_prompt(page, results.as_ref(), interests),
    }
}

fn calculator_prompt(topic: &CalculatorTopic, inputs: &Value, results: &Value) -> String {
    let instruction = match topic {
        CalculatorTopic::Known(CalculatorKind::ContentSpeed) => {
            "Explain how much faster this visitor could produce content with AI-assisted writing, point out the weekly and yearly hours saved, and mention that better prompts reduce editing time."
        }
        CalculatorTopic::Known(CalculatorKind::PromptRoi) => {
            "Explain the return on investment of prompt-writing training for this team, point out the yearly dollar savings and payback period, and keep the tone practical rather than salesy."
        }
        CalculatorTopic::Unrecognized(_) => GENERIC_CALCULATOR_INSTRUCTION,
    };

    format!(
        "{PERSONA}\n\nCalculator: {label}\n\nVisitor inputs:\n{inputs}\n\nCalculated results:\n{results}\n\n{instruction}\nKeep the answer under 150 words. Use **bold** for key numbers.",
        label = topic.label(),
        inputs = field_lines(inputs),
        results = field_lines(results),
    )
}

fn sales_prompt(page: &str, visitor_message: &str, history: &[ChatTurn]) -> String {
    let page_focus = match PageKind::classify(page) {
        PageKind::Pricing => {
            "The visitor is comparing plans; answer plan questions directly and mention the team discount when relevant."
        }
        PageKind::Course => {
            "The visitor is reading about the course; explain what they will learn and how long it takes."
        }
        PageKind::Calculator => {
            "The visitor is using a calculator; relate your answer to time and cost savings."
        }
        PageKind::Content => {
            "The visitor is interested in AI-assisted content writing; give concrete prompt-writing tips."
        }
        PageKind::Glossary | PageKind::Blog => {
            "The visitor is learning concepts; answer clearly and suggest a related lesson."
        }
        PageKind::Home | PageKind::Other => {
            "Help the visitor understand whether the course fits their goals."
        }
    };

    let page = truncate_chars(page.trim(), MAX_PAGE_CHARS);
    let message = sanitize_untrusted_text(visitor_message);
    let render = |conversation: &str| {
        format!(
            "{PERSONA}\nYou are a friendly sales assistant. {page_focus}\n\nCurrent page: {page}\n\nRecent conversation:\n{conversation}\n\nVisitor: {message}\n\nReply in at most three short paragraphs. Never invent prices or guarantees."
        )
    };

    let fixed_chars = render("").chars().count() + NO_HISTORY.len();
    let conversation = budget_history(history, MAX_PROMPT_CHARS.saturating_sub(fixed_chars));
    if conversation.is_empty() {
        render(NO_HISTORY)
    } else {
        render(&conversation)
    }
}

/// Renders the most recent turns that fit in `budget` characters, oldest
/// first. Each turn is clipped to [`SALES_TURN_CHARS`] before counting.
fn budget_history(history: &[ChatTurn], budget: usize) -> String {
    let start = history.len().saturating_sub(SALES_HISTORY_TURNS);
    let mut kept = Vec::new();
    let mut used = 0;

    for turn in history[start..].iter().rev() {
        let speaker = match turn.role {
            ChatRole::User => "Visitor",
            ChatRole::Assistant => "Assistant",
        };
        let content = truncate_chars(&sanitize_untrusted_text(&turn.content), SALES_TURN_CHARS);
        let line = format!("{speaker}: {content}");
        let cost = line.chars().count() + usize::from(!kept.is_empty());
        if used + cost > budget {
            break;
        }
        used += cost;
        kept.push(line);
    }

    kept.reverse();
    kept.join("\n")
}

fn recommendations_prompt(page: &str, results: Option<&Value>, interests: &[String]) -> String {
    let results = results.map_or_else(|| "(none)".to_string(), field_lines);
    let interests = interests
        .iter()
        .map(|interest| sanitize_untrusted_text(interest))
        .filter(|interest| !interest.is_empty())
        .collect::<Vec<_>>();
    let interests = if interests.is_empty() {
        "(none)".to_string()
    } else {
        interests.join(", ")
    };

    format!(
        "{PERSONA}\n\nRecommend up to {MAX_PROMPT_RECOMMENDATIONS} next steps for this visitor.\n\nCurrent page: {page}\nVisitor interests: {interests}\nCalculator results:\n{results}\n\nRespond with JSON only, in this shape:\n{{\"recommendations\":[{{\"type\":\"course|calculator|resource|upsell\",\"title\":\"\",\"description\":\"\",\"url\":\"/path\",\"priority\":\"high|medium|low\",\"cta\":\"\",\"reasoning\":\"\"}}]}}\nUse site-relative URLs only.",
        page = page.trim(),
    )
}

/// Flattens a JSON object into `- path: value` lines so every leaf value
/// appears verbatim in the prompt.
fn field_lines(value: &Value) -> String {
    let mut lines = Vec::new();
    flatten_into("", value, &mut lines);
    if lines.is_empty() {
        return "(none provided)".to_string();
    }
    lines.join("\n")
}

fn flatten_into(path: &str, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Object(entries) => {
            for (key, nested) in entries {
                let nested_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                flatten_into(&nested_path, nested, lines);
            }
        }
        Value::Array(items) => {
            let rendered = items
                .iter()
                .map(scalar_text)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if !path.is_empty() {
                lines.push(format!("- {path}: {rendered}"));
            }
        }
        scalar => {
            if !path.is_empty() {
                lines.push(format!("- {path}: {}", scalar_text(scalar)));
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => EMPTY_VALUE.to_string(),
        Value::String(text) => sanitize_untrusted_text(text),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}
