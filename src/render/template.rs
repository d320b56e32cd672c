//! A small action-template language
//!
//! Plain text passes through untouched. `{{ name "arg" ... }}` calls a
//! function from a [`FuncTable`] and splices in its output. Supported
//! syntax:
//!
//! - double-quoted (`"a\"b"`) and raw (`` `a` ``) string arguments
//! - `{{- ` / ` -}}` trim whitespace on that side of the action
//! - `{{/* comment */}}` renders nothing
//! - `{{ .Field }}` renders empty; there is no data context
//! - `{{ "literal" }}` renders the literal
//!
//! Unknown function names render empty rather than failing.

use std::collections::BTreeMap;
use std::fmt;

const LEFT: &str = "{{";
const RIGHT: &str = "}}";

/// Parse or execution failure, with the 1-based line of the action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for TemplateError {}

fn error(line: usize, message: impl Into<String>) -> TemplateError {
    TemplateError {
        line,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Literal(String),
    Field,
    Call {
        name: String,
        args: Vec<String>,
        line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Field(String),
    Str(String),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

/// A template function: receives already-unquoted string arguments
pub type TemplateFn<'a> = Box<dyn Fn(&[String]) -> Result<String, String> + 'a>;

struct Entry<'a> {
    arity: usize,
    call: TemplateFn<'a>,
}

/// Named functions available to templates.
///
/// Lookup is explicit: a registered name is arity-checked and called; an
/// unregistered name falls back to an empty string.
#[derive(Default)]
pub struct FuncTable<'a> {
    funcs: BTreeMap<String, Entry<'a>>,
}

impl<'a> FuncTable<'a> {
    pub fn new() -> Self {
        Self {
            funcs: BTreeMap::new(),
        }
    }

    /// Register `name` taking exactly `arity` arguments
    pub fn register(
        mut self,
        name: &str,
        arity: usize,
        call: impl Fn(&[String]) -> Result<String, String> + 'a,
    ) -> Self {
        self.funcs.insert(
            name.to_string(),
            Entry {
                arity,
                call: Box::new(call),
            },
        );
        self
    }

    fn call(&self, name: &str, args: &[String]) -> Result<String, String> {
        match self.funcs.get(name) {
            Some(entry) => {
                if args.len() != entry.arity {
                    return Err(format!(
                        "wrong number of args for {}: want {} got {}",
                        name,
                        entry.arity,
                        args.len()
                    ));
                }
                (entry.call)(args)
            }
            None => Ok(String::new()),
        }
    }
}

impl Template {
    /// Parse template source
    pub fn parse(src: &str) -> Result<Self, TemplateError> {
        let mut nodes = Vec::new();
        let mut pos = 0;
        let mut trim_next = false;

        while pos < src.len() {
            let Some(rel) = src[pos..].find(LEFT) else {
                let mut text = &src[pos..];
                if trim_next {
                    text = text.trim_start();
                }
                if !text.is_empty() {
                    nodes.push(Node::Text(text.to_string()));
                }
                break;
            };

            let open = pos + rel;
            let line = 1 + src[..open].matches('\n').count();
            let mut text = &src[pos..open];
            if trim_next {
                text = text.trim_start();
            }

            let mut start = open + LEFT.len();
            let rest = &src[start..];
            if rest.starts_with('-') && rest[1..].starts_with(|c: char| c.is_ascii_whitespace()) {
                text = text.trim_end();
                start += 1;
            }
            if !text.is_empty() {
                nodes.push(Node::Text(text.to_string()));
            }

            let (node, end, trim_right) = parse_action(src, start, line)?;
            if let Some(node) = node {
                nodes.push(node);
            }
            pos = end;
            trim_next = trim_right;
        }

        Ok(Self { nodes })
    }

    /// Execute against a function table
    pub fn render(&self, funcs: &FuncTable<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(text) | Node::Literal(text) => out.push_str(text),
                Node::Field => {}
                Node::Call { name, args, line } => {
                    let value = funcs.call(name, args).map_err(|m| error(*line, m))?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

/// Lex one action starting just after `{{` (and any left trim marker).
///
/// Returns the node (`None` for comments), the byte offset after `}}`,
/// and whether a right trim marker was present.
fn parse_action(
    src: &str,
    start: usize,
    line: usize,
) -> Result<(Option<Node>, usize, bool), TemplateError> {
    let mut tokens = Vec::new();
    let mut comment = false;
    let mut i = start;

    let (end, trim_right) = loop {
        let before = i;
        while let Some(c) = src[i..].chars().next().filter(char::is_ascii_whitespace) {
            i += c.len_utf8();
        }
        let spaced = i > before;
        let rest = &src[i..];

        if rest.starts_with(RIGHT) {
            break (i + RIGHT.len(), false);
        }
        if spaced && rest.starts_with("-}}") {
            break (i + 3, true);
        }

        let Some(c) = rest.chars().next() else {
            return Err(error(line, "unclosed action"));
        };

        match c {
            '/' if rest.starts_with("/*") => {
                let close = rest[2..]
                    .find("*/")
                    .ok_or_else(|| error(line, "unclosed comment"))?;
                i += 2 + close + 2;
                comment = true;
            }
            '"' => {
                let (value, len) = lex_quoted(rest, line)?;
                tokens.push(Token::Str(value));
                i += len;
            }
            '`' => {
                let close = rest[1..]
                    .find('`')
                    .ok_or_else(|| error(line, "unterminated raw quoted string"))?;
                tokens.push(Token::Str(rest[1..1 + close].to_string()));
                i += close + 2;
            }
            '.' => {
                let len = 1 + ident_len(&rest[1..]);
                tokens.push(Token::Field(rest[1..len].to_string()));
                i += len;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let len = ident_len(rest);
                tokens.push(Token::Ident(rest[..len].to_string()));
                i += len;
            }
            other => {
                return Err(error(
                    line,
                    format!("unexpected {:?} in action", other),
                ))
            }
        }
    };

    let mut tokens = tokens.into_iter();
    let node = match tokens.next() {
        None if comment => None,
        None => return Err(error(line, "missing value for command")),
        Some(_) if comment => return Err(error(line, "comment must be the only item in an action")),
        Some(Token::Field(name)) => {
            if tokens.next().is_some() {
                return Err(error(
                    line,
                    format!("can't give argument to non-function .{}", name),
                ));
            }
            Some(Node::Field)
        }
        Some(Token::Str(value)) => {
            if tokens.next().is_some() {
                return Err(error(line, "can't give argument to a string constant"));
            }
            Some(Node::Literal(value))
        }
        Some(Token::Ident(name)) => {
            let args = tokens
                .map(|t| match t {
                    Token::Str(s) => Ok(s),
                    Token::Ident(word) => Err(error(
                        line,
                        format!("expected a quoted string argument to {}, got {}", name, word),
                    )),
                    Token::Field(field) => Err(error(
                        line,
                        format!("expected a quoted string argument to {}, got .{}", name, field),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(Node::Call { name, args, line })
        }
    };

    Ok((node, end, trim_right))
}

fn ident_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len())
}

/// Lex a double-quoted string at the start of `s`; returns the value and
/// the number of bytes consumed including both quotes
fn lex_quoted(s: &str, line: usize) -> Result<(String, usize), TemplateError> {
    let mut value = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((value, idx + 1)),
            '\n' => break,
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                value.push(match escaped {
                    '"' => '"',
                    '\\' => '\\',
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => {
                        return Err(error(
                            line,
                            format!("unknown escape sequence \\{}", other),
                        ))
                    }
                });
            }
            c => value.push(c),
        }
    }
    Err(error(line, "unterminated quoted string"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funcs() -> FuncTable<'static> {
        FuncTable::new()
            .register("greet", 1, |args| Ok(format!("hello {}", args[0])))
            .register("zero", 0, |_| Ok("0".to_string()))
            .register("fail", 0, |_| Err("boom".to_string()))
    }

    fn render(src: &str) -> Result<String, TemplateError> {
        Template::parse(src)?.render(&funcs())
    }

    #[test]
    fn plain_text_unchanged() {
        let src = "worker_processes 1;\nevents { worker_connections 1024; }\n";
        assert_eq!(render(src).unwrap(), src);
        assert_eq!(render("").unwrap(), "");
    }

    #[test]
    fn calls_with_arguments() {
        assert_eq!(render("a {{greet \"world\"}} b").unwrap(), "a hello world b");
        assert_eq!(render("{{ greet `raw\\n` }}").unwrap(), "hello raw\\n");
        assert_eq!(render("{{zero}}{{ zero }}").unwrap(), "00");
    }

    #[test]
    fn quoted_escapes() {
        assert_eq!(render(r#"{{greet "a\"b\\c"}}"#).unwrap(), "hello a\"b\\c");
        assert!(render(r#"{{greet "\q"}}"#).is_err());
    }

    #[test]
    fn unknown_function_renders_empty() {
        assert_eq!(render("x{{missing \"a\" \"b\"}}y").unwrap(), "xy");
    }

    #[test]
    fn fields_render_empty() {
        assert_eq!(render("x{{.Port}}y{{ . }}z").unwrap(), "xyz");
        assert!(render("{{.Port \"a\"}}").is_err());
    }

    #[test]
    fn literal_and_comment() {
        assert_eq!(render("{{\"lit\"}}").unwrap(), "lit");
        assert_eq!(render("a{{/* note */}}b").unwrap(), "ab");
        assert!(render("{{/* note */ zero}}").is_err());
    }

    #[test]
    fn trim_markers() {
        assert_eq!(render("a  \n {{- zero -}} \n  b").unwrap(), "a0b");
        assert_eq!(render("a {{- zero}} b").unwrap(), "a0 b");
        assert_eq!(render("a {{zero -}} b").unwrap(), "a 0b");
    }

    #[test]
    fn wrong_arity_is_error() {
        let err = render("line1\n{{zero \"x\"}}").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("wrong number of args for zero"));

        assert!(render("{{greet}}").is_err());
    }

    #[test]
    fn function_error_propagates() {
        let err = render("{{fail}}").unwrap_err();
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(render("{{zero").unwrap_err().message, "unclosed action");
        assert!(render("{{greet \"open}}").is_err());
        assert!(render("{{}}").is_err());
        assert!(render("{{greet bare}}").is_err());
        assert!(render("{{ 42 }}").is_err());
        assert!(render("{{/* open }}").is_err());
    }

    #[test]
    fn braces_inside_strings() {
        assert_eq!(render("{{greet \"}}\"}}").unwrap(), "hello }}");
    }

    #[test]
    fn lone_closing_braces_are_text() {
        assert_eq!(render("map }} end").unwrap(), "map }} end");
    }
}
