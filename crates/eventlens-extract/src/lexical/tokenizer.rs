//! Script-aware tokenizer for mixed Latin / Japanese event text.
//!
//! Latin words keep inner `.`, `-`, `_` when followed by a letter or digit
//! ("Next.js", "gRPC-web") and trailing `+`/`#` ("C++", "C#"). Japanese text
//! has no spaces, so runs of katakana and kanji become content tokens while
//! hiragana runs (particles, okurigana) act as stopwords.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Role of a token in candidate generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Participates in the co-occurrence graph and in phrases.
    Content,
    /// Ends a phrase but is otherwise ignored.
    Stop,
    /// Punctuation or symbols.
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Katakana,
    Kanji,
    Hiragana,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    /// Lowercased surface; graph node key.
    pub norm: String,
    pub kind: TokenKind,
    /// Whitespace separated this token from the previous one.
    pub space_before: bool,
}

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
        "been", "before", "but", "by", "can", "do", "does", "each", "for", "from", "has",
        "have", "how", "if", "in", "into", "is", "it", "its", "just", "may", "more", "most",
        "no", "not", "of", "on", "once", "only", "or", "other", "our", "out", "over", "so",
        "some", "such", "than", "that", "the", "their", "them", "then", "there", "these",
        "they", "this", "those", "through", "to", "too", "up", "us", "very", "was", "we",
        "were", "what", "when", "where", "which", "while", "who", "will", "with", "would",
        "you", "your", "join", "please", "welcome", "event", "events",
    ]
    .into_iter()
    .collect()
});

fn script_of(c: char) -> Option<Script> {
    match c {
        '\u{3041}'..='\u{309F}' => Some(Script::Hiragana),
        '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
            Some(Script::Katakana)
        }
        '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{3005}' => Some(Script::Kanji),
        c if c.is_alphanumeric() => Some(Script::Latin),
        _ => None,
    }
}

fn is_latin(c: char) -> bool {
    script_of(c) == Some(Script::Latin)
}

/// Split text into tokens, preserving order.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut space_before = false;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            space_before = true;
            i += 1;
            continue;
        }

        let start = i;
        let (kind, script) = match script_of(c) {
            Some(Script::Latin) => {
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    let next_latin = chars.get(i + 1).copied().is_some_and(is_latin);
                    if is_latin(ch) || ch == '+' || ch == '#' {
                        i += 1;
                    } else if matches!(ch, '.' | '-' | '_' | '\'') && next_latin {
                        i += 1;
                    } else {
                        break;
                    }
                }
                (TokenKind::Content, Some(Script::Latin))
            }
            Some(script) => {
                i += 1;
                while i < chars.len() && script_of(chars[i]) == Some(script) {
                    i += 1;
                }
                let kind = if script == Script::Hiragana {
                    TokenKind::Stop
                } else {
                    TokenKind::Content
                };
                (kind, Some(script))
            }
            None => {
                i += 1;
                (TokenKind::Break, None)
            }
        };

        let surface: String = chars[start..i].iter().collect();
        let norm = surface.to_lowercase();
        let kind = match (kind, script) {
            (TokenKind::Content, Some(Script::Latin)) if is_latin_stopword(&norm) => {
                TokenKind::Stop
            }
            (k, _) => k,
        };

        tokens.push(Token {
            surface,
            norm,
            kind,
            space_before,
        });
        space_before = false;
    }

    tokens
}

fn is_latin_stopword(norm: &str) -> bool {
    norm.chars().count() < 2
        || norm.chars().all(|c| c.is_ascii_digit())
        || STOPWORDS.contains(norm)
}
