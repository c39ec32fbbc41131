//! Jack tokenizer.
//!
//! Scans source text once, stripping comments as it goes (so line numbers
//! stay accurate through multi-line block comments rather than needing a
//! separate stripping pass), and fully pre-tokenizes into a `Vec<SourceToken>`
//! up front. The parser then drives a plain index cursor over that vector.

use common::Diagnostic;

const MAX_INT_CONST: u32 = 32767;

static KEYWORDS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "class" => "class",
    "constructor" => "constructor",
    "function" => "function",
    "method" => "method",
    "field" => "field",
    "static" => "static",
    "var" => "var",
    "int" => "int",
    "char" => "char",
    "boolean" => "boolean",
    "void" => "void",
    "true" => "true",
    "false" => "false",
    "null" => "null",
    "this" => "this",
    "let" => "let",
    "do" => "do",
    "if" => "if",
    "else" => "else",
    "while" => "while",
    "return" => "return",
};

static SYMBOLS: phf::Set<char> = phf::phf_set! {
    '{', '}', '(', ')', '[', ']', '.', ',', ';',
    '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(&'static str),
    Symbol(char),
    IntConst(u16),
    StringConst(String),
    Identifier(String),
}

impl Token {
    /// The XML tag nand2tetris tooling uses for this token kind.
    #[must_use]
    pub fn xml_tag(&self) -> &'static str {
        match self {
            Self::Keyword(_) => "keyword",
            Self::Symbol(_) => "symbol",
            Self::IntConst(_) => "integerConstant",
            Self::StringConst(_) => "stringConstant",
            Self::Identifier(_) => "identifier",
        }
    }

    /// A human-readable rendering for syntax error messages, e.g. `symbol '('`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Keyword(k) => format!("keyword '{k}'"),
            Self::Symbol(c) => format!("symbol '{c}'"),
            Self::IntConst(n) => format!("integer constant {n}"),
            Self::StringConst(s) => format!("string constant \"{s}\""),
            Self::Identifier(s) => format!("identifier '{s}'"),
        }
    }

    #[must_use]
    pub fn xml_escaped_value(&self) -> String {
        let raw = match self {
            Self::Keyword(k) => (*k).to_string(),
            Self::Symbol(c) => c.to_string(),
            Self::IntConst(n) => n.to_string(),
            Self::StringConst(s) => s.clone(),
            Self::Identifier(s) => s.clone(),
        };
        escape_xml(&raw)
    }
}

/// XML-escapes `&`, `<`, `>`, `"` in that order (escaping `&` last would
/// double-escape the ampersands introduced by the earlier substitutions).
#[must_use]
pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceToken {
    pub token: Token,
    pub line: u32,
}

fn tokenize(source: &str) -> Result<Vec<SourceToken>, Diagnostic> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 1u32;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                if chars[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }
            if i >= chars.len() {
                return Err(Diagnostic::lexical(line, "unterminated block comment"));
            }
            i += 2;
        } else if c == '"' {
            let start_line = line;
            i += 1;
            let mut value = String::new();
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\n' {
                    return Err(Diagnostic::lexical(
                        start_line,
                        "string constant may not contain a newline",
                    ));
                }
                value.push(chars[i]);
                i += 1;
            }
            if i >= chars.len() {
                return Err(Diagnostic::lexical(start_line, "unterminated string constant"));
            }
            i += 1;
            tokens.push(SourceToken {
                token: Token::StringConst(value),
                line: start_line,
            });
        } else if c.is_ascii_digit() {
            let start_line = line;
            let mut digits = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                digits.push(chars[i]);
                i += 1;
            }
            let value: u32 = digits
                .parse()
                .map_err(|_| Diagnostic::lexical(start_line, format!("invalid integer constant '{digits}'")))?;
            if value > MAX_INT_CONST {
                return Err(Diagnostic::lexical(
                    start_line,
                    format!("integer constant {value} exceeds {MAX_INT_CONST}"),
                ));
            }
            tokens.push(SourceToken {
                token: Token::IntConst(value as u16),
                line: start_line,
            });
        } else if c.is_alphabetic() || c == '_' {
            let start_line = line;
            let mut word = String::new();
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                word.push(chars[i]);
                i += 1;
            }
            let token = KEYWORDS
                .get(word.as_str())
                .map_or_else(|| Token::Identifier(word.clone()), |kw| Token::Keyword(kw));
            tokens.push(SourceToken { token, line: start_line });
        } else if SYMBOLS.contains(&c) {
            tokens.push(SourceToken {
                token: Token::Symbol(c),
                line,
            });
            i += 1;
        } else {
            return Err(Diagnostic::lexical(line, format!("unexpected character '{c}'")));
        }
    }

    Ok(tokens)
}

/// A pre-tokenized cursor with one-token lookahead.
///
/// `curr` and `peek` are both seeded at construction time rather than
/// requiring an initial `advance()` call, resolving the source ambiguity
/// noted for tokenizer implementations that peek without a dedicated
/// initialization step.
pub struct Tokenizer {
    tokens: Vec<SourceToken>,
    pos: usize,
}

impl Tokenizer {
    pub fn new(source: &str) -> Result<Self, Diagnostic> {
        let tokens = tokenize(source)?;
        Ok(Self { tokens, pos: 0 })
    }

    #[must_use]
    pub fn has_more_tokens(&self) -> bool {
        self.pos < self.tokens.len()
    }

    #[must_use]
    pub fn curr(&self) -> Option<&SourceToken> {
        self.tokens.get(self.pos)
    }

    #[must_use]
    pub fn peek(&self) -> Option<&SourceToken> {
        self.tokens.get(self.pos + 1)
    }

    pub fn advance(&mut self) {
        if self.has_more_tokens() {
            self.pos += 1;
        }
    }

    /// The line of the current token, or the line of the last token seen
    /// (for "unexpected end of input" diagnostics after the stream is spent).
    #[must_use]
    pub fn line(&self) -> u32 {
        self.curr()
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_minimal_class() {
        let tokens = tokenize("class Foo {\n}\n").unwrap();
        assert_eq!(
            tokens,
            vec![
                SourceToken { token: Token::Keyword("class"), line: 1 },
                SourceToken { token: Token::Identifier("Foo".into()), line: 1 },
                SourceToken { token: Token::Symbol('{'), line: 1 },
                SourceToken { token: Token::Symbol('}'), line: 2 },
            ]
        );
    }

    #[test]
    fn strips_line_and_block_comments_while_tracking_lines() {
        let tokens = tokenize("// header\nlet x = 1; /* block\nspans lines */ let y = 2;\n").unwrap();
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![2, 2, 2, 2, 2, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn strips_doc_comments_identically_to_block_comments() {
        let tokens = tokenize("/** doc\n * comment\n */\nclass Foo {}").unwrap();
        assert_eq!(tokens[0].token, Token::Keyword("class"));
        assert_eq!(tokens[0].line, 4);
    }

    #[test]
    fn string_constants_strip_quotes_and_allow_reserved_words_inside() {
        let tokens = tokenize("\"class static\"").unwrap();
        assert_eq!(tokens[0].token, Token::StringConst("class static".into()));
    }

    #[test]
    fn rejects_integer_constants_over_32767() {
        let err = tokenize("32768").unwrap_err();
        assert!(err.to_string().contains("exceeds 32767"), "{err}");
    }

    #[test]
    fn accepts_the_maximum_integer_constant() {
        let tokens = tokenize("32767").unwrap();
        assert_eq!(tokens[0].token, Token::IntConst(32767));
    }

    #[test]
    fn rejects_newlines_inside_string_constants() {
        let err = tokenize("\"broken\nstring\"").unwrap_err();
        assert!(err.to_string().contains("newline"), "{err}");
    }

    #[test]
    fn xml_escapes_reserved_characters_in_order() {
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("\"q\""), "&quot;q&quot;");
    }

    #[test]
    fn cursor_is_seeded_before_any_advance_call() {
        let tokenizer = Tokenizer::new("class Foo {}").unwrap();
        assert_eq!(tokenizer.curr().unwrap().token, Token::Keyword("class"));
        assert_eq!(tokenizer.peek().unwrap().token, Token::Identifier("Foo".into()));
    }
}
