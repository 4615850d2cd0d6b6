//! Code highlighting for the HTML renderer.
//!
//! Highlighted output is HTML: token text is escaped and wrapped in
//! `<span class="hljs-{kind}">` elements, everything else is escaped as-is.

use regex::Regex;

use crate::sanitize::sanitize_html;

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),
}

/// A syntax highlighting engine keyed by language name.
pub trait Highlighter {
    /// Whether `language` (or one of its aliases) is supported.
    fn is_known(&self, language: &str) -> bool;

    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError>;

    /// Highlight with whichever known language fits `code` best.
    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError>;
}

/// Knows no languages; escapes code without markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn is_known(&self, _language: &str) -> bool {
        false
    }

    fn highlight(&self, _code: &str, language: &str) -> Result<String, HighlightError> {
        Err(HighlightError::UnknownLanguage(language.to_string()))
    }

    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError> {
        Ok(sanitize_html(code))
    }
}

/// Token classes, in the order their alternatives are tried.
const TOKEN_KINDS: [&str; 6] = ["comment", "string", "tag", "keyword", "literal", "number"];

const NUMBER: &str = r"\b(?:0[xX][0-9a-fA-F]+|\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\b";

struct LanguageDef {
    name: &'static str,
    aliases: &'static [&'static str],
    comments: &'static [&'static str],
    strings: &'static [&'static str],
    tags: &'static [&'static str],
    keywords: &'static [&'static str],
    literals: &'static [&'static str],
    case_insensitive: bool,
}

const DOUBLE_QUOTED: &str = r#""(?:[^"\\]|\\.)*""#;
const SINGLE_QUOTED: &str = r"'(?:[^'\\\n]|\\.)*'";
const C_COMMENTS: &[&str] = &[r"//[^\n]*", r"/\*[\s\S]*?\*/"];
const HASH_COMMENT: &[&str] = &[r"#[^\n]*"];

const LANGUAGES: &[LanguageDef] = &[
    LanguageDef {
        name: "rust",
        aliases: &["rs"],
        comments: C_COMMENTS,
        strings: &[DOUBLE_QUOTED, r"'(?:[^'\\\n]|\\.)'"],
        tags: &[],
        keywords: &[
            "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
            "enum", "extern", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
            "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
            "trait", "type", "unsafe", "use", "where", "while",
        ],
        literals: &["true", "false", "None", "Some", "Ok", "Err"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "javascript",
        aliases: &["js", "jsx", "mjs"],
        comments: C_COMMENTS,
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED, r"`(?:[^`\\]|\\.)*`"],
        tags: &[],
        keywords: &[
            "async", "await", "break", "case", "catch", "class", "const", "continue",
            "default", "delete", "do", "else", "export", "extends", "finally", "for",
            "function", "if", "import", "in", "instanceof", "let", "new", "of", "return",
            "static", "switch", "this", "throw", "try", "typeof", "var", "void", "while",
            "yield",
        ],
        literals: &["true", "false", "null", "undefined", "NaN"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "typescript",
        aliases: &["ts", "tsx"],
        comments: C_COMMENTS,
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED, r"`(?:[^`\\]|\\.)*`"],
        tags: &[],
        keywords: &[
            "abstract", "as", "async", "await", "break", "case", "catch", "class", "const",
            "continue", "declare", "default", "enum", "export", "extends", "for", "function",
            "if", "implements", "import", "interface", "keyof", "let", "namespace", "new",
            "private", "protected", "public", "readonly", "return", "this", "throw", "try",
            "type", "typeof", "while",
        ],
        literals: &["true", "false", "null", "undefined"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "python",
        aliases: &["py"],
        comments: HASH_COMMENT,
        strings: &[
            r#""""[\s\S]*?""""#,
            r"'''[\s\S]*?'''",
            DOUBLE_QUOTED,
            SINGLE_QUOTED,
        ],
        tags: &[],
        keywords: &[
            "and", "as", "assert", "async", "await", "break", "class", "continue", "def",
            "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
            "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
            "return", "try", "while", "with", "yield",
        ],
        literals: &["True", "False", "None"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "json",
        aliases: &[],
        comments: &[],
        strings: &[DOUBLE_QUOTED],
        tags: &[],
        keywords: &[],
        literals: &["true", "false", "null"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "bash",
        aliases: &["sh", "shell", "zsh"],
        comments: HASH_COMMENT,
        strings: &[DOUBLE_QUOTED, r"'[^']*'"],
        tags: &[],
        keywords: &[
            "case", "do", "done", "echo", "elif", "else", "esac", "export", "fi", "for",
            "function", "if", "in", "local", "return", "then", "until", "while",
        ],
        literals: &["true", "false"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "html",
        aliases: &["xml", "htm", "svg"],
        comments: &[r"<!--[\s\S]*?-->"],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        tags: &[r"</?[A-Za-z][\w:\-]*", r"/?>"],
        keywords: &[],
        literals: &[],
        case_insensitive: false,
    },
    LanguageDef {
        name: "css",
        aliases: &["scss"],
        comments: &[r"/\*[\s\S]*?\*/"],
        strings: &[DOUBLE_QUOTED, SINGLE_QUOTED],
        tags: &[r"@[\w\-]+"],
        keywords: &["important", "inherit", "initial", "unset", "auto", "none"],
        literals: &[],
        case_insensitive: false,
    },
    LanguageDef {
        name: "sql",
        aliases: &[],
        comments: &[r"--[^\n]*", r"/\*[\s\S]*?\*/"],
        strings: &[SINGLE_QUOTED],
        tags: &[],
        keywords: &[
            "select", "from", "where", "insert", "into", "values", "update", "set", "delete",
            "create", "table", "drop", "alter", "join", "left", "right", "inner", "outer",
            "on", "group", "by", "order", "having", "limit", "as", "and", "or", "not",
        ],
        literals: &["null", "true", "false"],
        case_insensitive: true,
    },
];

struct Language {
    name: &'static str,
    aliases: &'static [&'static str],
    tokens: Regex,
}

impl Language {
    fn compile(def: &LanguageDef) -> Result<Self, regex::Error> {
        let words = |words: &[&str]| {
            let body = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            if def.case_insensitive {
                format!(r"(?i:\b(?:{body})\b)")
            } else {
                format!(r"\b(?:{body})\b")
            }
        };

        let mut alternatives = Vec::new();
        for kind in TOKEN_KINDS {
            let pattern = match kind {
                "comment" if !def.comments.is_empty() => def.comments.join("|"),
                "string" if !def.strings.is_empty() => def.strings.join("|"),
                "tag" if !def.tags.is_empty() => def.tags.join("|"),
                "keyword" if !def.keywords.is_empty() => words(def.keywords),
                "literal" if !def.literals.is_empty() => words(def.literals),
                "number" => NUMBER.to_string(),
                _ => continue,
            };
            alternatives.push(format!("(?P<{kind}>{pattern})"));
        }

        Ok(Self {
            name: def.name,
            aliases: def.aliases,
            tokens: Regex::new(&alternatives.join("|"))?,
        })
    }

    fn matches_name(&self, language: &str) -> bool {
        self.name.eq_ignore_ascii_case(language)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(language))
    }

    fn render(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len() * 2);
        let mut last = 0;
        for caps in self.tokens.captures_iter(code) {
            let Some((kind, token)) = TOKEN_KINDS
                .iter()
                .find_map(|kind| caps.name(kind).map(|m| (*kind, m)))
            else {
                continue;
            };
            out.push_str(&sanitize_html(&code[last..token.start()]));
            out.push_str(&format!(
                r#"<span class="hljs-{kind}">{}</span>"#,
                sanitize_html(token.as_str())
            ));
            last = token.end();
        }
        out.push_str(&sanitize_html(&code[last..]));
        out
    }

    fn keyword_score(&self, code: &str) -> usize {
        self.tokens
            .captures_iter(code)
            .filter(|caps| caps.name("keyword").is_some())
            .count()
    }
}

/// Regex-driven highlighter for a fixed set of common languages.
pub struct SyntaxHighlighter {
    languages: Vec<Language>,
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let languages = LANGUAGES
            .iter()
            .filter_map(|def| match Language::compile(def) {
                Ok(language) => Some(language),
                Err(e) => {
                    log::error!("Failed to compile highlighter for {}: {e}", def.name);
                    None
                }
            })
            .collect();
        Self { languages }
    }

    /// Canonical names of every supported language.
    pub fn languages(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.languages.iter().map(|language| language.name)
    }

    fn find(&self, language: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.matches_name(language))
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntaxHighlighter {
    fn is_known(&self, language: &str) -> bool {
        self.find(language).is_some()
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        self.find(language)
            .map(|l| l.render(code))
            .ok_or_else(|| HighlightError::UnknownLanguage(language.to_string()))
    }

    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError> {
        let best = self
            .languages
            .iter()
            .map(|language| (language.keyword_score(code), language))
            .filter(|(score, _)| *score > 0)
            .fold(None::<(usize, &Language)>, |best, candidate| match best {
                Some(current) if current.0 >= candidate.0 => Some(current),
                _ => Some(candidate),
            });

        Ok(match best {
            Some((_, language)) => language.render(code),
            None => sanitize_html(code),
        })
    }
}
