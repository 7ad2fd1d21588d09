//! Lenient parsing of free-text oracle replies.
//!
//! Replies are prose, so nothing here fails: every field falls back to a
//! default and records that it did through [`ParsedField`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use vshorts_models::ParsedField;

pub const DEFAULT_SCORE: u8 = 5;
pub const DEFAULT_TITLE: &str = "Interesting moment";
pub const DEFAULT_VIEWS: u64 = 1000;

/// Scale hints like "(1-10)" that would otherwise be read as scores.
static SCALE_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(\s*1\s*(?:[-–]|to)\s*10\s*\)|\bscale\s+of\s+1\s*(?:[-–]|to)\s*10\b").unwrap()
});

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// `Emotional response: 8` as a line of its own, list markers and bold allowed.
static EMOTIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s>#*-]*(?:\d+[.)]\s*)?(?:\*\*)?emotional\s+(?:response|impact|score)(?:\*\*)?\s*[:–-]\s*(?:\*\*)?\s*(\d{1,2})\b",
    )
    .unwrap()
});

static VIRAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s>#*-]*(?:\d+[.)]\s*)?(?:\*\*)?viral(?:ity)?\s+(?:potential|score)(?:\*\*)?\s*[:–-]\s*(?:\*\*)?\s*(\d{1,2})\b",
    )
    .unwrap()
});

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s>#*-]*(?:\d+[.)]\s*)?(?:\*\*)?(?:suggested\s+|clickbait\s+|catchy\s+)?title(?:\*\*)?\s*[:–-]\s*(.+)$",
    )
    .unwrap()
});

static VIEW_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+|\d+").unwrap());

/// Cheap screening score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreScore {
    /// 1..10
    pub score: ParsedField<u8>,
    pub reply: String,
}

/// Expensive per-window assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedScore {
    /// 1..10
    pub emotional: ParsedField<u8>,
    /// 1..10
    pub viral: ParsedField<u8>,
    pub title: ParsedField<String>,
    /// The full reply
    pub description: String,
}

/// Estimated reach of a finished short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEstimate {
    pub views: ParsedField<u64>,
    pub analysis: String,
}

/// First number in the reply, clamped to 1..=10; 5 when there is none.
pub fn parse_pre_score(reply: &str) -> PreScore {
    let text = strip_scale_hints(reply);
    let found = FIRST_NUMBER
        .find(&text)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(clamp_score);

    PreScore {
        score: ParsedField::from_option(found, DEFAULT_SCORE),
        reply: reply.trim().to_string(),
    }
}

/// Emotional and viral scores, title and free text from a detailed reply.
pub fn parse_detailed(reply: &str) -> DetailedScore {
    let text = strip_scale_hints(reply);

    DetailedScore {
        emotional: ParsedField::from_option(labelled_score(&EMOTIONAL, &text), DEFAULT_SCORE),
        viral: ParsedField::from_option(labelled_score(&VIRAL, &text), DEFAULT_SCORE),
        title: ParsedField::from_option(parse_title(&text), DEFAULT_TITLE.to_string()),
        description: reply.trim().to_string(),
    }
}

/// First number in the reply with thousands separators removed; 1000 when
/// there is none.
pub fn parse_views(reply: &str) -> ViewEstimate {
    let found = VIEW_COUNT
        .find(reply)
        .and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok());

    ViewEstimate {
        views: ParsedField::from_option(found, DEFAULT_VIEWS),
        analysis: reply.trim().to_string(),
    }
}

fn strip_scale_hints(reply: &str) -> String {
    SCALE_HINT.replace_all(reply, "").into_owned()
}

fn labelled_score(pattern: &Regex, text: &str) -> Option<u8> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(clamp_score)
}

fn parse_title(text: &str) -> Option<String> {
    let raw = TITLE.captures(text)?.get(1)?.as_str();
    let title = raw
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '“' | '”' | '«' | '»'))
        .trim();

    (!title.is_empty()).then(|| title.to_string())
}

fn clamp_score(value: u64) -> u8 {
    value.clamp(1, 10) as u8
}
