/// Post id references and field/value pairs inside management commands.
use regex::Regex;
use std::sync::LazyLock;

use crate::models::PostFields;

static POST_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d+)\s*번",
        r"#\s*(\d+)",
        r"게시글\s*(\d+)",
        r"(?i)\bpost\s*(?:no\.?|number|id)?\s*(\d+)\b",
        r"(?i)\bid\s*[:=]?\s*(\d+)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid post id pattern"))
    .collect()
});

/// Korean particles (attached to the label) or `:`/`=`/`is` between a label and its value.
const LABEL_SEPARATOR: &str = r"(?:\s*[:=]|은|는|을|를|이|가|\s+is\b)?\s*";

const QUOTED_TEXT: &str = r#"["'“‘]([^"'”’]+)["'”’]"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Author,
    Title,
    Content,
    Value,
    Category,
}

impl Field {
    const ALL: [Field; 5] = [
        Field::Author,
        Field::Title,
        Field::Content,
        Field::Value,
        Field::Category,
    ];

    fn korean_labels(&self) -> &'static str {
        match self {
            Field::Author => "작성자",
            Field::Title => "제목",
            Field::Content => "내용|본문",
            Field::Value => "수치(?:값)?|숫자|값",
            Field::Category => "카테고리|분류",
        }
    }

    fn english_labels(&self) -> &'static str {
        match self {
            Field::Author => "author",
            Field::Title => "title|titled|called|named",
            Field::Content => "content|body|text",
            Field::Value => "value|numeric_value|amount",
            Field::Category => "category",
        }
    }

    fn label(&self) -> String {
        format!(
            r"(?:{}|(?i:\b(?:{})\b))",
            self.korean_labels(),
            self.english_labels()
        )
    }

    /// Capture group matching the value itself in "change X to Y" forms.
    fn change_value(&self) -> &'static str {
        match self {
            Field::Value => r"(-?\d+(?:\.\d+)?)",
            _ => r#"["'“‘]?([^"'”’,;]+?)["'”’]?"#,
        }
    }

    /// Labelled value without quotes, e.g. `value 250.5` or `category: 매출`.
    fn plain_value(&self) -> String {
        match self {
            Field::Value => format!("{}{}(-?\\d+(?:\\.\\d+)?)", self.label(), LABEL_SEPARATOR),
            Field::Author | Field::Category => format!(r"{}{}(\w+)", self.label(), LABEL_SEPARATOR),
            Field::Title | Field::Content => {
                format!(r#"{}\s*[:=]\s*([^,;\n"'“‘]+)"#, self.label())
            }
        }
    }
}

struct FieldPatterns {
    field: Field,
    /// "제목을 'x'로 바꿔"
    change_korean: Regex,
    /// "change the title of post 3 to x"
    change_english: Regex,
    quoted: Option<Regex>,
    plain: Regex,
}

static FIELD_PATTERNS: LazyLock<Vec<FieldPatterns>> = LazyLock::new(|| {
    Field::ALL
        .iter()
        .map(|field| {
            let change_korean = format!(
                r"(?:{})(?:을|를|은|는|이|가)?\s*{}\s*(?:으로|로)\s*(?:바꿔|바꾸|수정|변경)",
                field.korean_labels(),
                field.change_value()
            );
            let change_english = format!(
                r"(?i)\b(?:{})\b(?:\s+of\s+(?:post\s*)?#?\s*\d+)?\s+to\s+{}\s*(?:$|[,;]|\s+and\b)",
                field.english_labels(),
                field.change_value()
            );
            let quoted = match field {
                Field::Value => None,
                _ => Some(
                    Regex::new(&format!("{}{}{}", field.label(), LABEL_SEPARATOR, QUOTED_TEXT))
                        .expect("invalid quoted field pattern"),
                ),
            };

            FieldPatterns {
                field: *field,
                change_korean: Regex::new(&change_korean).expect("invalid field pattern"),
                change_english: Regex::new(&change_english).expect("invalid field pattern"),
                quoted,
                plain: Regex::new(&field.plain_value()).expect("invalid field pattern"),
            }
        })
        .collect()
});

/// First post id reference in the text (`3번`, `#3`, `게시글 3`, `post 3`).
pub fn extract_post_id(text: &str) -> Option<i64> {
    POST_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Collect every field/value pair. For each field the first matching form wins,
/// in the order: change form, quoted label, plain label.
pub fn extract_fields(text: &str) -> PostFields {
    let mut fields = PostFields::default();

    for patterns in FIELD_PATTERNS.iter() {
        let raw = [
            Some(&patterns.change_korean),
            Some(&patterns.change_english),
            patterns.quoted.as_ref(),
            Some(&patterns.plain),
        ]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()));

        let Some(raw) = raw.and_then(|v| clean_value(&v)) else {
            continue;
        };

        match patterns.field {
            Field::Author => fields.author = Some(raw),
            Field::Title => fields.title = Some(raw),
            Field::Content => fields.content = Some(raw),
            Field::Category => fields.category = Some(raw),
            Field::Value => fields.numeric_value = raw.parse().ok(),
        }
    }

    fields
}

fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
