// src/generator.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AgentError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Informative,
    Casual,
    Persuasive,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    #[default]
    Short,
    Medium,
    Long,
}

impl Length {
    fn sections(&self) -> usize {
        match self {
            Length::Short => 2,
            Length::Medium => 4,
            Length::Long => 6,
        }
    }
}

impl FromStr for Style {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "informative" => Ok(Style::Informative),
            "casual" => Ok(Style::Casual),
            "persuasive" => Ok(Style::Persuasive),
            other => Err(AgentError::InvalidInput(format!("unknown style: {other}"))),
        }
    }
}

impl FromStr for Length {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Length::Short),
            "medium" => Ok(Length::Medium),
            "long" => Ok(Length::Long),
            other => Err(AgentError::InvalidInput(format!("unknown length: {other}"))),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Style::Informative => "informative",
            Style::Casual => "casual",
            Style::Persuasive => "persuasive",
        })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Length::Short => "short",
            Length::Medium => "medium",
            Length::Long => "long",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedPost {
    pub title: String,
    pub slug: String,
    pub style: Style,
    pub length: Length,
    pub content: String,
    pub word_count: usize,
}

// (heading, body) templates; `{topic}` is substituted.
const SECTIONS: &[(&str, &str)] = &[
    ("What is {topic}?", "{topic} covers a set of ideas and practices that come up again and again once you start looking."),
    ("Why {topic} matters", "Teams that take {topic} seriously tend to ship with fewer surprises and recover faster when things go wrong."),
    ("Getting started with {topic}", "Start small: pick one workflow, apply {topic} to it, and measure what changes before expanding."),
    ("Common mistakes", "The usual pitfalls with {topic} are doing too much at once and skipping the feedback loop."),
    ("Tools and resources", "Plenty of tooling exists around {topic}; prefer what your team already knows over what is newest."),
    ("Looking ahead", "{topic} keeps evolving, so revisit your assumptions every few months."),
];

fn intro(style: Style, topic: &str) -> String {
    match style {
        Style::Informative => format!("This article gives an overview of {topic} and the key points worth knowing."),
        Style::Casual => format!("So you've been hearing about {topic} everywhere? Let's talk about it."),
        Style::Persuasive => format!("If you are not paying attention to {topic} yet, you should be. Here's why."),
    }
}

fn conclusion(style: Style, topic: &str) -> String {
    match style {
        Style::Informative => format!("In summary, {topic} rewards a steady, measured approach."),
        Style::Casual => format!("That's the gist of {topic}. Give it a try and see how it goes!"),
        Style::Persuasive => format!("Don't wait: start applying {topic} today and stay ahead of the curve."),
    }
}

fn title_for(style: Style, topic: &str) -> String {
    match style {
        Style::Informative => format!("A Guide to {topic}"),
        Style::Casual => format!("Let's Talk About {topic}"),
        Style::Persuasive => format!("Why You Need {topic} Now"),
    }
}

/// Lowercase, hyphen-separated, no whitespace.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

pub fn generate_blog_post(topic: &str, style: Style, length: Length) -> Result<GeneratedPost> {
    let topic = topic.split_whitespace().collect::<Vec<_>>().join(" ");
    if topic.is_empty() {
        return Err(AgentError::InvalidInput("topic must not be empty".into()));
    }

    let title = title_for(style, &topic);
    let mut content = format!("# {title}\n\n{}\n", intro(style, &topic));
    for (heading, body) in SECTIONS.iter().take(length.sections()) {
        content.push_str(&format!(
            "\n## {}\n\n{}\n",
            heading.replace("{topic}", &topic),
            body.replace("{topic}", &topic)
        ));
    }
    content.push_str(&format!("\n{}\n", conclusion(style, &topic)));

    Ok(GeneratedPost {
        slug: slugify(&title),
        word_count: content.split_whitespace().count(),
        title,
        style,
        length,
        content,
    })
}
