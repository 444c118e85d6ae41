/// Deterministic command interpretation.
///
/// Korean and English phrasings are both recognised. Each slot (operation,
/// author, chart kind, post id, fields) is filled by an ordered list of
/// patterns where the first match wins.
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use super::fields::{extract_fields, extract_post_id};
use super::CommandInterpreter;
use crate::metrics;
use crate::models::{AuthorSelection, ChartKind, Operation, ParsedCommand};

/// Confidence reported for commands resolved by pattern matching.
pub const PATTERN_CONFIDENCE: f32 = 0.6;

pub const MISSING_AUTHOR: &str = "could not find an author name in the command";

/// Chart-kind synonyms. Checked top to bottom; the first kind with a hit wins.
pub struct KindKeywords {
    pub kind: ChartKind,
    pub korean: &'static [&'static str],
    pub english: &'static [&'static str],
}

pub const CHART_KEYWORDS: [KindKeywords; 4] = [
    KindKeywords {
        kind: ChartKind::Line,
        korean: &["선그래프", "라인", "선형", "꺾은선"],
        english: &["line", "lines", "linear", "trend"],
    },
    KindKeywords {
        kind: ChartKind::Pie,
        korean: &["원그래프", "파이", "원형"],
        english: &["pie", "circle", "circular"],
    },
    KindKeywords {
        kind: ChartKind::Donut,
        korean: &["도넛", "도너츠"],
        english: &["donut", "doughnut", "ring"],
    },
    KindKeywords {
        kind: ChartKind::Bar,
        korean: &["막대그래프", "막대", "바차트", "바"],
        english: &["bar", "bars", "column", "columns"],
    },
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("invalid interpreter pattern")
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

static ENGLISH_KIND_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CHART_KEYWORDS
        .iter()
        .map(|entry| compile(&format!(r"(?i)\b(?:{})\b", entry.english.join("|"))))
        .collect()
});

static DELETE_VERB: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)삭제|지워|지우|\b(?:delete|remove)\b"));

static UPDATE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)수정|변경|바꿔|바꾸|\b(?:update|change|edit|modify|rename|set)\b")
});

static CREATE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)(?:게시글|글|포스트)\s*(?:을|를)?\s*(?:새로\s*)?(?:작성|추가|등록|올려)|\b(?:create|add|write|publish)\b[^.!?]*\bposts?\b|\bnew\s+post\b",
    )
});

static LIST_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)목록|리스트|\blist\b|\bshow\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?posts\b|\ball\s+posts\b",
    )
});

static CHART_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)차트|그래프|그려|시각화|\b(?:chart|graph|plot|visuali[sz]e)\b")
});

static ALL_AUTHORS: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)모든\s*(?:사람들?|작성자|사용자)|전체\s*(?:사람들?|작성자|데이터)|\ball\s+(?:the\s+)?(?:authors|users|people|writers)\b|\bevery(?:one|body)\b",
    )
});

/// Bare "everything" adverbs; only mean all authors when no name is given.
static ALL_AUTHORS_LOOSE: LazyLock<Regex> = LazyLock::new(|| compile(r"모두|전부"));

static KOREAN_KIND_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CHART_KEYWORDS
        .iter()
        .map(|entry| compile(&format!(r"(?:^|\W)(?:{})", entry.korean.join("|"))))
        .collect()
});

/// Two or more name tokens joined by commas, `and`, `&`, `및` or a trailing 과/와.
static AUTHOR_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)\b[\w'’]+?(?:(?:\s*,\s*(?:and\s+)?|\s+and\s+|\s*&\s*|\s*및\s*|(?:과|와)\s+)[\w'’]+?)+\b",
    )
});

static CHAIN_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\s*,\s*(?:and\s+)?|\s+and\s+|\s*&\s*|\s*및\s*|(?:과|와)\s+")
});

static POSSESSIVES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[r"(\w+)의(?:\s|$)", r"(?i)\b(\w+)['’]s\b"]));

static SINGLE_AUTHOR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(\w+)의\s*(?:데이터|값|수치|글|게시글|차트|그래프|자료)",
        r"(?i)\b(\w+)['’]s\b",
        r"(\w+)\s*작성자",
        r"(\w+)\s*님",
        r#""([^"]+)""#,
        r"'([^']+)'",
        r"“([^”]+)”",
        r"(?i)\b(?:data|values?|numbers|posts?|charts?|graphs?|figures)\s+(?:of|for|by|from)\s+(\w+)",
        r"(?i)\b(?:for|by|of)\s+(\w+)",
        r"(\w+)의(?:\s|$)",
        r"(\w+?)(?:이|가)?\s*(?:쓴|작성한)",
        r"(?i)\b(\w+)\s+(?:data|values|numbers|posts)\b",
        r"(\w+)\s+(?:데이터|자료)",
    ])
});

static CREATE_AUTHOR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(\S+?)(?:으로|로)\s*(?:새\s*)?(?:게시글|글)",
        r"(?i)\b(?:by|as|from)\s+(\w+)",
    ])
});

static DELETE_AUTHOR: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(\S+?)(?:의)?\s*(?:모든\s*)?(?:게시글|글)\s*(?:을|를)?\s*(?:모두\s*|전부\s*)?(?:삭제|지워)",
        r"(?i)\b(?:delete|remove)\s+(?:all\s+)?(?:of\s+)?(?:the\s+)?posts?\s+(?:by|from|of)\s+(\w+)",
        r"(?i)\b(?:delete|remove)\s+(?:all\s+(?:of\s+)?)?(\w+)['’]s\s+posts?",
    ])
});

const STOPWORDS: &[&str] = &[
    // english
    "a", "an", "the", "me", "my", "our", "your", "his", "her", "their", "it", "this", "that",
    "all", "some", "each", "every", "and", "or", "for", "of", "by", "from", "as", "to", "with",
    "data", "value", "values", "number", "numbers", "figures", "post", "posts", "chart",
    "charts", "graph", "graphs", "plot", "show", "draw", "display", "make", "render", "get",
    "see", "give", "compare", "visualize", "visualise", "please", "numeric", "author",
    "authors", "everyone", "everybody", "users", "people",
    // korean
    "데이터", "자료", "차트", "그래프", "게시글", "글", "값", "수치", "모든", "전체", "사람",
    "사람들", "작성자", "모두", "전부", "나", "내", "우리", "저", "제",
];

/// Trim possessive suffixes and reject generic nouns.
fn clean_name(raw: &str) -> Option<String> {
    let mut name = raw.trim().trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”')).trim();

    loop {
        let stripped = name
            .strip_suffix("'s")
            .or_else(|| name.strip_suffix("’s"))
            .or_else(|| name.strip_suffix('의'))
            .or_else(|| name.strip_suffix('님'))
            .map(str::trim_end);
        match stripped {
            Some(rest) if !rest.is_empty() => name = rest,
            _ => break,
        }
    }

    let lowered = name.to_lowercase();
    let is_keyword = CHART_KEYWORDS
        .iter()
        .any(|k| k.korean.contains(&name) || k.english.contains(&lowered.as_str()));

    if name.is_empty()
        || STOPWORDS.contains(&lowered.as_str())
        || is_keyword
        || name.chars().all(|c| c.is_ascii_digit())
    {
        None
    } else {
        Some(name.to_string())
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

fn first_name(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| clean_name(m.as_str()))
    })
}

/// Resolve the chart kind from the synonym table, defaulting to bar.
pub fn detect_chart_kind(text: &str) -> ChartKind {
    CHART_KEYWORDS
        .iter()
        .zip(KOREAN_KIND_PATTERNS.iter().zip(ENGLISH_KIND_PATTERNS.iter()))
        .find(|(_, (korean, english))| korean.is_match(text) || english.is_match(text))
        .map(|(entry, _)| entry.kind)
        .unwrap_or_default()
}

/// Author selection for chart commands: all-authors keyword, then a
/// conjunction list, then several possessives, then a single name.
/// A bare 모두/전부 selects all authors only when no name was found.
pub fn extract_chart_authors(text: &str) -> AuthorSelection {
    if ALL_AUTHORS.is_match(text) {
        return AuthorSelection::All;
    }

    let mut possessive = Vec::new();
    for re in POSSESSIVES.iter() {
        for caps in re.captures_iter(text) {
            if let Some(name) = caps.get(1).and_then(|m| clean_name(m.as_str())) {
                push_unique(&mut possessive, name);
            }
        }
    }

    for chain in AUTHOR_CHAIN.find_iter(text) {
        let mut names = Vec::new();
        for token in CHAIN_SEPARATOR.split(chain.as_str()) {
            if let Some(name) = clean_name(token) {
                push_unique(&mut names, name);
            }
        }
        // "hong's revenue and profit" names one owner, not a list
        let owner_outside = possessive.iter().any(|p| !names.contains(p));
        if names.len() >= 2 && !owner_outside {
            return AuthorSelection::Many(names);
        }
    }

    if possessive.len() >= 2 {
        return AuthorSelection::Many(possessive);
    }

    match first_name(&SINGLE_AUTHOR, text) {
        Some(name) => AuthorSelection::Single(name),
        None if ALL_AUTHORS_LOOSE.is_match(text) => AuthorSelection::All,
        None => AuthorSelection::default(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternInterpreter;

impl PatternInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Interpret without touching metrics; never fails.
    pub fn parse(&self, text: &str) -> ParsedCommand {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ParsedCommand::invalid(text, "enter a command");
        }

        let post_id = extract_post_id(trimmed);
        let mentions_chart = CHART_NOUN.is_match(trimmed);

        let mut command = if DELETE_VERB.is_match(trimmed) {
            self.parse_delete(text, trimmed, post_id)
        } else if UPDATE_VERB.is_match(trimmed) && (post_id.is_some() || !mentions_chart) {
            self.parse_update(text, trimmed, post_id)
        } else if CREATE_VERB.is_match(trimmed) {
            self.parse_create(text, trimmed)
        } else if LIST_PHRASE.is_match(trimmed) && !mentions_chart {
            self.parse_list(text, trimmed)
        } else {
            self.parse_chart(text, trimmed)
        };

        command.chart_kind = detect_chart_kind(trimmed);
        command
    }

    fn parse_delete(&self, original: &str, text: &str, post_id: Option<i64>) -> ParsedCommand {
        let mut command = ParsedCommand::new(original, Operation::Delete);
        command.confidence = PATTERN_CONFIDENCE;

        if post_id.is_some() {
            command.post_id = post_id;
            return command;
        }

        match first_name(&DELETE_AUTHOR, text).or_else(|| first_name(&SINGLE_AUTHOR, text)) {
            Some(author) => {
                command.authors = AuthorSelection::Single(author);
                command
            }
            None => ParsedCommand::invalid(
                original,
                "specify a post number or an author to delete, e.g. '3번 게시글 삭제' or 'delete posts by hong'",
            ),
        }
    }

    fn parse_update(&self, original: &str, text: &str, post_id: Option<i64>) -> ParsedCommand {
        let Some(id) = post_id else {
            return ParsedCommand::invalid(
                original,
                "specify which post to update, e.g. '3번 게시글 제목을 '새 제목'으로 바꿔'",
            );
        };

        let fields = extract_fields(text);
        if fields.is_empty() {
            return ParsedCommand::invalid(original, "no field to change was found");
        }

        let mut command = ParsedCommand::new(original, Operation::Update);
        command.post_id = Some(id);
        command.fields = fields;
        command.confidence = PATTERN_CONFIDENCE;
        command
    }

    fn parse_create(&self, original: &str, text: &str) -> ParsedCommand {
        let mut fields = extract_fields(text);
        if fields.title.is_none() {
            return ParsedCommand::invalid(original, "a new post needs a title");
        }

        let author = fields
            .author
            .clone()
            .or_else(|| first_name(&CREATE_AUTHOR, text));
        let Some(author) = author else {
            return ParsedCommand::invalid(original, "a new post needs an author");
        };
        fields.author = Some(author.clone());

        let mut command = ParsedCommand::new(original, Operation::Create);
        command.authors = AuthorSelection::Single(author);
        command.fields = fields;
        command.confidence = PATTERN_CONFIDENCE;
        command
    }

    fn parse_list(&self, original: &str, text: &str) -> ParsedCommand {
        let mut command = ParsedCommand::new(original, Operation::List);
        if let Some(author) = first_name(&SINGLE_AUTHOR, text) {
            command.authors = AuthorSelection::Single(author);
        }
        command.confidence = PATTERN_CONFIDENCE;
        command
    }

    fn parse_chart(&self, original: &str, text: &str) -> ParsedCommand {
        let authors = extract_chart_authors(text);
        if authors.is_none() {
            return ParsedCommand::invalid(original, MISSING_AUTHOR);
        }

        let mut command = ParsedCommand::new(original, Operation::Chart);
        command.authors = authors;
        command.confidence = PATTERN_CONFIDENCE;
        command
    }
}

#[async_trait]
impl CommandInterpreter for PatternInterpreter {
    async fn interpret(&self, text: &str) -> ParsedCommand {
        let command = self.parse(text);
        let outcome = if command.valid { "answered" } else { "invalid" };
        metrics::record_interpretation(self.name(), outcome);
        command
    }

    fn name(&self) -> &str {
        "pattern"
    }
}
