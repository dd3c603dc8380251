use anyhow::{Context as _, Result};
use regex::Regex;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

/// Reads a setup script and returns its statements in file order.
///
/// `backslash_escapes` makes `\` escape the next character inside quoted text,
/// as MySQL and MariaDB do by default.
pub async fn load(path: &Path, batch_separator: &str, backslash_escapes: bool) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(vec![]);
    }

    let normalized = normalize(&content, batch_separator, backslash_escapes)?;
    Ok(split(&normalized, backslash_escapes))
}

/// Turns batch separator lines into statement terminators, drops `--` comments
/// and folds line endings and tabs into single spaces. Quoted text is copied
/// as is.
pub fn normalize(content: &str, batch_separator: &str, backslash_escapes: bool) -> Result<String> {
    let separator = batch_separator_pattern(batch_separator)?;

    let mut out = String::with_capacity(content.len());
    let mut line_start = 0;
    // The current line began outside quotes and block comments.
    let mut plain_line = true;
    let mut after_cr = false;

    for (c, context) in Scanner::new(content, backslash_escapes) {
        let line_break = context == Context::Code && (c == '\n' || c == '\r');

        match context {
            Context::LineComment => {}
            Context::Quoted => {
                plain_line = false;
                out.push(c);
            }
            Context::BlockComment => {
                plain_line = false;
                out.push(if c.is_whitespace() { ' ' } else { c });
            }
            Context::Code if line_break => {
                if !(c == '\n' && after_cr) {
                    end_line(&mut out, line_start, plain_line, separator.as_ref());
                    out.push(' ');
                    line_start = out.len();
                    plain_line = true;
                }
            }
            Context::Code => out.push(if c == '\t' { ' ' } else { c }),
        }

        after_cr = line_break && c == '\r';
    }
    end_line(&mut out, line_start, plain_line, separator.as_ref());

    Ok(out)
}

fn end_line(out: &mut String, line_start: usize, plain_line: bool, separator: Option<&Regex>) {
    if let Some(re) = separator {
        if plain_line && re.is_match(&out[line_start..]) {
            out.truncate(line_start);
            out.push(';');
        }
    }
}

fn batch_separator_pattern(batch_separator: &str) -> Result<Option<Regex>> {
    let keyword = batch_separator.trim();
    if keyword.is_empty() {
        return Ok(None);
    }

    let re = Regex::new(&format!(r"(?i)^\s*{}\s*$", regex::escape(keyword)))?;
    Ok(Some(re))
}

/// Splits script text on `;`, ignoring terminators inside quoted text and
/// comments. Fragments holding nothing but comments are dropped.
pub fn split(normalized: &str, backslash_escapes: bool) -> Vec<String> {
    let mut statements = vec![];
    let mut current = String::new();
    let mut has_code = false;

    for (c, context) in Scanner::new(normalized, backslash_escapes) {
        match context {
            Context::Code if c == ';' => {
                if has_code {
                    push_statement(&mut statements, &current);
                }
                current.clear();
                has_code = false;
                continue;
            }
            Context::LineComment => continue,
            Context::Code | Context::Quoted => has_code |= !c.is_whitespace(),
            // MySQL runs the body of /*! ... */ comments.
            Context::BlockComment => has_code |= c == '!' && current.ends_with("/*"),
        }
        current.push(c);
    }
    if has_code {
        push_statement(&mut statements, &current);
    }

    statements
}

fn push_statement(statements: &mut Vec<String>, fragment: &str) {
    let statement = fragment.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Code,
    Quoted,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Code,
    Quote(char),
    Escaped(char),
    LineComment,
    BlockCommentOpen,
    BlockComment,
    BlockCommentClose,
}

/// Tags every character of a script with the lexical context it belongs to.
/// Comment and quote delimiters belong to the comment or quote they delimit.
struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    state: State,
    backslash_escapes: bool,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, backslash_escapes: bool) -> Scanner<'a> {
        Scanner {
            chars: text.chars().peekable(),
            state: State::Code,
            backslash_escapes,
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = (char, Context);

    fn next(&mut self) -> Option<(char, Context)> {
        let c = self.chars.next()?;
        let next = self.chars.peek().copied();

        let (state, context) = match self.state {
            State::Code => match (c, next) {
                ('\'' | '"' | '`', _) => (State::Quote(c), Context::Quoted),
                ('-', Some('-')) => (State::LineComment, Context::LineComment),
                ('/', Some('*')) => (State::BlockCommentOpen, Context::BlockComment),
                _ => (State::Code, Context::Code),
            },
            State::Quote(q) if c == q => (State::Code, Context::Quoted),
            State::Quote(q) if c == '\\' && self.backslash_escapes => {
                (State::Escaped(q), Context::Quoted)
            }
            State::Quote(q) | State::Escaped(q) => (State::Quote(q), Context::Quoted),
            // The newline that ends a line comment is ordinary code.
            State::LineComment if c == '\n' || c == '\r' => (State::Code, Context::Code),
            State::LineComment => (State::LineComment, Context::LineComment),
            State::BlockCommentOpen => (State::BlockComment, Context::BlockComment),
            State::BlockComment if c == '*' && next == Some('/') => {
                (State::BlockCommentClose, Context::BlockComment)
            }
            State::BlockComment => (State::BlockComment, Context::BlockComment),
            State::BlockCommentClose => (State::Code, Context::BlockComment),
        };

        self.state = state;
        Some((c, context))
    }
}
