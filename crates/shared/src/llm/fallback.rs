//! Canned responses used when the completion endpoint fails.

use super::prompts::CalculatorTopic;
use super::recommendations::{
    MAX_RECOMMENDATIONS, Recommendation, RecommendationKind, RecommendationPriority,
};
use crate::calculators::CalculatorKind;
use crate::pages::PageKind;

pub const COURSE_URL: &str = "/courses/prompt-writing-fundamentals";
pub const ADVANCED_COURSE_URL: &str = "/courses/advanced-prompt-engineering";
pub const CONTENT_SPEED_URL: &str = "/calculators/content-speed";
pub const PROMPT_LIBRARY_URL: &str = "/resources/prompt-library";

const MIN_FALLBACK_RECOMMENDATIONS: usize = 3;

const GENERIC_CALCULATOR_EXPLANATION: &str = "These results show where better prompts can save your team time. Small improvements in how you brief an AI tool add up quickly across a year of work. Our **Prompt Writing Fundamentals** course walks through the techniques behind these numbers.";
const GENERIC_SALES_REPLY: &str = "Thanks for your question! Our **Prompt Writing Fundamentals** course teaches practical techniques for getting reliable results from AI tools. Feel free to ask about the curriculum, pricing, or how it fits your role.";

pub fn fallback_calculator_explanation(topic: &CalculatorTopic) -> &'static str {
    match topic {
        CalculatorTopic::Known(CalculatorKind::ContentSpeed) => {
            "AI-assisted writing can multiply your drafting speed, even after time for review and editing. The hours saved each week compound into **weeks of reclaimed time** per year. Well-structured prompts are what keep editing time low, which is exactly what our course teaches."
        }
        CalculatorTopic::Known(CalculatorKind::PromptRoi) => {
            "Prompt-writing training pays for itself when your team spends real time on writing work. The yearly savings above compare the time recovered against a **one-time course cost per seat**. Higher adoption across the team shortens the payback period."
        }
        CalculatorTopic::Unrecognized(_) => GENERIC_CALCULATOR_EXPLANATION,
    }
}

pub fn fallback_sales_reply(page: &str) -> &'static str {
    match PageKind::classify(page) {
        PageKind::Pricing => {
            "Every plan includes lifetime access to the course materials and future updates. Teams of five or more qualify for a **team discount**. Happy to help you pick the right option!"
        }
        PageKind::Calculator => {
            "The calculator estimates time and cost savings from better prompting. If you share your results, I can help you interpret them, or you can explore the course to see how those savings are achieved."
        }
        PageKind::Content => {
            "AI can speed up blog posts, emails, and product copy dramatically when the prompts are well structured. Our course includes **ready-to-use prompt templates** for each content type."
        }
        PageKind::Course => {
            "The course covers prompt structure, context setting, iteration, and evaluation through short lessons and hands-on exercises. Most learners finish in **about two weeks** at a relaxed pace."
        }
        PageKind::Glossary => {
            "The glossary explains the key terms you will meet when working with AI models. Each concept is covered in depth, with examples, inside the course."
        }
        PageKind::Blog => {
            "Our articles share practical prompt-writing tips. For a structured path from basics to advanced techniques, take a look at the **Prompt Writing Fundamentals** course."
        }
        PageKind::Home | PageKind::Other => GENERIC_SALES_REPLY,
    }
}

/// Static recommendation list: always the course, plus items driven by the
/// page and whether calculator results are present. Between 3 and
/// [`MAX_RECOMMENDATIONS`] items.
pub fn fallback_recommendations(page: &str, has_results: bool) -> Vec<Recommendation> {
    let mut items = vec![course_recommendation()];

    if page.to_ascii_lowercase().contains("content") {
        items.push(Recommendation {
            kind: RecommendationKind::Calculator,
            title: "Content Speed Calculator".to_string(),
            description: "Estimate how many hours AI-assisted writing could save you each week."
                .to_string(),
            url: CONTENT_SPEED_URL.to_string(),
            priority: RecommendationPriority::Medium,
            cta: "Calculate my savings".to_string(),
            reasoning: "You are exploring AI content writing.".to_string(),
        });
    }

    if has_results {
        items.push(Recommendation {
            kind: RecommendationKind::Upsell,
            title: "Advanced Prompt Engineering".to_string(),
            description: "Go beyond the fundamentals with chaining, evaluation, and team workflows."
                .to_string(),
            url: ADVANCED_COURSE_URL.to_string(),
            priority: RecommendationPriority::Medium,
            cta: "See the advanced course".to_string(),
            reasoning: "Your results show meaningful savings worth scaling.".to_string(),
        });
    }

    if items.len() < MIN_FALLBACK_RECOMMENDATIONS {
        items.push(Recommendation {
            kind: RecommendationKind::Resource,
            title: "Prompt Library".to_string(),
            description: "Browse tested prompt templates for common business tasks.".to_string(),
            url: PROMPT_LIBRARY_URL.to_string(),
            priority: RecommendationPriority::Low,
            cta: "Browse prompts".to_string(),
            reasoning: "Templates are the quickest way to see good prompts in action.".to_string(),
        });
    }

    if items.len() < MIN_FALLBACK_RECOMMENDATIONS {
        items.push(Recommendation {
            kind: RecommendationKind::Calculator,
            title: "Prompt ROI Calculator".to_string(),
            description: "See what prompt-writing training could return for your team."
                .to_string(),
            url: "/calculators/prompt-roi".to_string(),
            priority: RecommendationPriority::Low,
            cta: "Estimate ROI".to_string(),
            reasoning: "Quantify the value before you commit.".to_string(),
        });
    }

    items.truncate(MAX_RECOMMENDATIONS);
    items
}

fn course_recommendation() -> Recommendation {
    Recommendation {
        kind: RecommendationKind::Course,
        title: "Prompt Writing Fundamentals".to_string(),
        description: "Learn to write prompts that get reliable, on-brand results from AI tools."
            .to_string(),
        url: COURSE_URL.to_string(),
        priority: RecommendationPriority::High,
        cta: "Start learning".to_string(),
        reasoning: "The core course behind every technique on this site.".to_string(),
    }
}
