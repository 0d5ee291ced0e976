//! Coarse page classification from a request path.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Pricing,
    Calculator,
    Content,
    Course,
    Glossary,
    Blog,
    Other,
}

impl PageKind {
    /// Substring match on the lowercased path. Earlier arms win, so
    /// `/calculators/content-speed` is a calculator page.
    pub fn classify(path: &str) -> Self {
        let normalized = path.trim().to_ascii_lowercase();
        let path_only = normalized
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        if path_only.is_empty() {
            return Self::Home;
        }
        if path_only.contains("pricing") {
            return Self::Pricing;
        }
        if path_only.contains("calculator") {
            return Self::Calculator;
        }
        if path_only.contains("content") {
            return Self::Content;
        }
        if path_only.contains("course") {
            return Self::Course;
        }
        if path_only.contains("glossary") {
            return Self::Glossary;
        }
        if path_only.contains("blog") {
            return Self::Blog;
        }

        Self::Other
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Pricing => "pricing",
            Self::Calculator => "calculator",
            Self::Content => "content",
            Self::Course => "course",
            Self::Glossary => "glossary",
            Self::Blog => "blog",
            Self::Other => "other",
        }
    }
}
