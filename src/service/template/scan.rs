// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural scan of Go-style templates.
//!
//! The scanner lexes `{{ ... }}` actions into tokens, builds a small syntax tree and
//! walks it to collect every field the template reads from its data, such as
//! `.database_host` in `{{ .database_host }}`. Only the first segment of a field
//! path is collected: `.db.host` yields `db`.
//!
//! Text outside actions is never inspected. Bodies of `define` and `block`, and the
//! data passed to `template` invocations, are not scanned.

use crate::domain::{ConfigError, Result};

/// A lexed token inside an action.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `.a.b`, stored as its segments.
    Field(Vec<String>),
    /// Field access on a parenthesized value, as in `(f).a`.
    Chain,
    Dot,
    Variable,
    Ident(String),
    Literal,
    LeftParen,
    RightParen,
    Pipe,
    Declare,
    Assign,
    Comma,
}

#[derive(Debug)]
enum Item {
    Text,
    Action(Vec<Token>),
}

/// A node of a scanned template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    List(Vec<Node>),
    Text,
    Action(Pipe),
    Field(Vec<String>),
    If(Branch),
    Range(Branch),
    With(Branch),
    Pipe(Pipe),
    /// `template`, `define` or `block`; never traversed.
    Template,
    /// Literals, identifiers, variables and other leaves without fields.
    Other,
}

/// The condition and bodies of an `if`, `range` or `with`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch {
    pub(crate) pipe: Pipe,
    pub(crate) list: Box<Node>,
    pub(crate) else_list: Option<Box<Node>>,
}

/// A pipeline: commands separated by `|`, each a list of arguments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipe {
    pub(crate) commands: Vec<Vec<Node>>,
}

fn template_error(message: impl Into<String>) -> ConfigError {
    ConfigError::TemplateError {
        message: message.into(),
    }
}

fn starts_with_at(chars: &[char], pos: usize, pattern: &str) -> bool {
    pattern
        .chars()
        .enumerate()
        .all(|(i, c)| chars.get(pos + i) == Some(&c))
}

fn find(chars: &[char], from: usize, pattern: &str) -> Option<usize> {
    (from..chars.len()).find(|&pos| starts_with_at(chars, pos, pattern))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn lex(text: &str) -> Result<Vec<Item>> {
    let chars: Vec<char> = text.chars().collect();
    let mut items = Vec::new();
    let mut pos = 0;

    loop {
        let Some(start) = find(&chars, pos, "{{") else {
            if pos < chars.len() {
                items.push(Item::Text);
            }
            return Ok(items);
        };
        if start > pos {
            items.push(Item::Text);
        }
        pos = start + 2;

        if chars.get(pos) == Some(&'-') && chars.get(pos + 1).is_some_and(|c| c.is_whitespace()) {
            pos += 2;
        }

        if starts_with_at(&chars, pos, "/*") {
            let end = find(&chars, pos + 2, "*/")
                .ok_or_else(|| template_error("unclosed comment"))?;
            pos = end + 2;
            while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
                pos += 1;
            }
            if chars.get(pos) == Some(&'-') {
                pos += 1;
            }
            if !starts_with_at(&chars, pos, "}}") {
                return Err(template_error("comment ends before closing delimiter"));
            }
            pos += 2;
            continue;
        }

        let (tokens, next) = lex_action(&chars, pos)?;
        items.push(Item::Action(tokens));
        pos = next;
    }
}

fn lex_action(chars: &[char], mut pos: usize) -> Result<(Vec<Token>, usize)> {
    let mut tokens = Vec::new();

    loop {
        let Some(&c) = chars.get(pos) else {
            return Err(template_error("unclosed action"));
        };

        if starts_with_at(chars, pos, "}}") {
            return Ok((tokens, pos + 2));
        }

        if c.is_whitespace() {
            while chars.get(pos).is_some_and(|c| c.is_whitespace()) {
                pos += 1;
            }
            if starts_with_at(chars, pos, "-}}") {
                return Ok((tokens, pos + 3));
            }
            continue;
        }

        match c {
            '(' => {
                tokens.push(Token::LeftParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                pos += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                pos += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            ':' if chars.get(pos + 1) == Some(&'=') => {
                tokens.push(Token::Declare);
                pos += 2;
            }
            '=' => {
                tokens.push(Token::Assign);
                pos += 1;
            }
            '"' | '\'' => {
                pos = lex_quoted(chars, pos, c)?;
                tokens.push(Token::Literal);
            }
            '`' => {
                let end = find(chars, pos + 1, "`")
                    .ok_or_else(|| template_error("unterminated raw quoted string"))?;
                pos = end + 1;
                tokens.push(Token::Literal);
            }
            '.' if chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit()) => {
                pos = lex_number(chars, pos);
                tokens.push(Token::Literal);
            }
            '.' => {
                let chained = pos > 0 && chars[pos - 1] == ')';
                let (segments, next) = lex_path(chars, pos);
                pos = next;
                tokens.push(if chained {
                    Token::Chain
                } else if segments.is_empty() {
                    Token::Dot
                } else {
                    Token::Field(segments)
                });
            }
            '$' => {
                pos += 1;
                while chars.get(pos).is_some_and(|c| is_ident_char(*c)) {
                    pos += 1;
                }
                let (_, next) = lex_path(chars, pos);
                pos = next;
                tokens.push(Token::Variable);
            }
            '+' | '-' if chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit() || *c == '.') => {
                pos = lex_number(chars, pos);
                tokens.push(Token::Literal);
            }
            c if c.is_ascii_digit() => {
                pos = lex_number(chars, pos);
                tokens.push(Token::Literal);
            }
            c if is_ident_char(c) => {
                let start = pos;
                while chars.get(pos).is_some_and(|c| is_ident_char(*c)) {
                    pos += 1;
                }
                tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            }
            other => {
                return Err(template_error(format!("unexpected {:?} in action", other)));
            }
        }
    }
}

/// Reads `.a.b.c` starting at a dot. Returns no segments for a lone dot.
fn lex_path(chars: &[char], mut pos: usize) -> (Vec<String>, usize) {
    let mut segments = Vec::new();
    while chars.get(pos) == Some(&'.') {
        let start = pos + 1;
        let mut end = start;
        while chars.get(end).is_some_and(|c| is_ident_char(*c)) {
            end += 1;
        }
        if end == start {
            // a lone dot
            return (segments, start);
        }
        segments.push(chars[start..end].iter().collect());
        pos = end;
    }
    (segments, pos)
}

fn lex_quoted(chars: &[char], mut pos: usize, quote: char) -> Result<usize> {
    pos += 1;
    loop {
        match chars.get(pos) {
            None | Some('\n') => return Err(template_error("unterminated quoted string")),
            Some('\\') => pos += 2,
            Some(c) if *c == quote => return Ok(pos + 1),
            Some(_) => pos += 1,
        }
    }
}

fn lex_number(chars: &[char], mut pos: usize) -> usize {
    pos += 1;
    while chars
        .get(pos)
        .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
    {
        // a sign only continues a number after an exponent marker
        if matches!(chars[pos], '+' | '-') && !matches!(chars[pos - 1], 'e' | 'E' | 'p' | 'P') {
            break;
        }
        pos += 1;
    }
    pos
}

/// How a list ended.
enum End {
    Eof,
    End,
    /// `{{else ...}}` with the tokens following `else`.
    Else(Vec<Token>),
}

struct Parser {
    items: std::vec::IntoIter<Item>,
}

impl Parser {
    fn list(&mut self) -> Result<(Vec<Node>, End)> {
        let mut nodes = Vec::new();
        while let Some(item) = self.items.next() {
            let tokens = match item {
                Item::Text => {
                    nodes.push(Node::Text);
                    continue;
                }
                Item::Action(tokens) => tokens,
            };

            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.as_str(),
                None => return Err(template_error("missing value for command")),
                _ => "",
            };
            match keyword {
                "end" => return Ok((nodes, End::End)),
                "else" => return Ok((nodes, End::Else(tokens[1..].to_vec()))),
                "if" | "range" | "with" => {
                    let keyword = keyword.to_string();
                    nodes.push(self.branch(&keyword, &tokens[1..])?);
                }
                "define" | "block" => {
                    match self.list()? {
                        (_, End::End) => {}
                        _ => return Err(template_error(format!("unterminated {}", keyword))),
                    }
                    nodes.push(Node::Template);
                }
                "template" => nodes.push(Node::Template),
                "break" | "continue" => nodes.push(Node::Other),
                _ => nodes.push(Node::Action(Cursor::new(&tokens).pipeline(false)?)),
            }
        }
        Ok((nodes, End::Eof))
    }

    fn branch(&mut self, keyword: &str, tokens: &[Token]) -> Result<Node> {
        let pipe = Cursor::new(tokens).pipeline(false)?;
        let (list, end) = self.list()?;

        let else_list = match end {
            End::End => None,
            End::Eof => return Err(template_error(format!("unexpected EOF in {}", keyword))),
            End::Else(rest) => match rest.first() {
                None => match self.list()? {
                    (nodes, End::End) => Some(Box::new(Node::List(nodes))),
                    _ => {
                        return Err(template_error(format!(
                            "expected end after else in {}",
                            keyword
                        )))
                    }
                },
                // `else if` and `else with` share the enclosing end
                Some(Token::Ident(word)) if word == keyword && keyword != "range" => {
                    Some(Box::new(Node::List(vec![self.branch(keyword, &rest[1..])?])))
                }
                Some(_) => {
                    return Err(template_error(format!(
                        "unexpected else clause in {}",
                        keyword
                    )))
                }
            },
        };

        let branch = Branch {
            pipe,
            list: Box::new(Node::List(list)),
            else_list,
        };
        Ok(match keyword {
            "if" => Node::If(branch),
            "range" => Node::Range(branch),
            _ => Node::With(branch),
        })
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    /// Skips `$x :=`, `$x =` and `$i, $e :=` at the start of a pipeline.
    fn skip_declarations(&mut self) {
        let rest = &self.tokens[self.pos.min(self.tokens.len())..];
        let skip = match rest {
            [Token::Variable, Token::Declare | Token::Assign, ..] => 2,
            [
                Token::Variable,
                Token::Comma,
                Token::Variable,
                Token::Declare | Token::Assign,
                ..,
            ] => 4,
            _ => 0,
        };
        self.pos += skip;
    }

    fn pipeline(&mut self, nested: bool) -> Result<Pipe> {
        self.skip_declarations();

        let mut commands = Vec::new();
        let mut args = Vec::new();
        loop {
            match self.next() {
                None if nested => return Err(template_error("unclosed left paren")),
                None => break,
                Some(Token::RightParen) if nested => break,
                Some(Token::RightParen) => return Err(template_error("unexpected right paren")),
                Some(Token::Pipe) => {
                    if args.is_empty() {
                        return Err(template_error("missing command before pipe"));
                    }
                    commands.push(std::mem::take(&mut args));
                }
                Some(Token::LeftParen) => args.push(Node::Pipe(self.pipeline(true)?)),
                Some(Token::Field(path)) => args.push(Node::Field(path.clone())),
                Some(Token::Chain) => {}
                Some(_) => args.push(Node::Other),
            }
        }

        if !args.is_empty() {
            commands.push(args);
        }
        if commands.is_empty() {
            return Err(template_error("missing value for command"));
        }
        Ok(Pipe { commands })
    }
}

/// Parses `text` into a syntax tree.
pub(crate) fn parse(text: &str) -> Result<Node> {
    let mut parser = Parser {
        items: lex(text)?.into_iter(),
    };
    match parser.list()? {
        (nodes, End::Eof) => Ok(Node::List(nodes)),
        (_, End::End) => Err(template_error("unexpected {{end}}")),
        (_, End::Else(_)) => Err(template_error("unexpected {{else}}")),
    }
}

/// Collects the first segment of every field referenced under `node`, in order of
/// first appearance.
pub(crate) fn walk(node: &Node, found: &mut Vec<String>) {
    match node {
        Node::List(nodes) => nodes.iter().for_each(|n| walk(n, found)),
        Node::Action(pipe) | Node::Pipe(pipe) => walk_pipe(pipe, found),
        Node::Field(path) => {
            if let Some(first) = path.first() {
                if !found.contains(first) {
                    found.push(first.clone());
                }
            }
        }
        Node::If(branch) | Node::Range(branch) | Node::With(branch) => {
            walk_pipe(&branch.pipe, found);
            walk(&branch.list, found);
            if let Some(else_list) = &branch.else_list {
                walk(else_list, found);
            }
        }
        Node::Text | Node::Template | Node::Other => {}
    }
}

fn walk_pipe(pipe: &Pipe, found: &mut Vec<String>) {
    for command in &pipe.commands {
        for arg in command {
            walk(arg, found);
        }
    }
}

/// Returns the top-level fields referenced by `text`.
pub(crate) fn fields(text: &str) -> Result<Vec<String>> {
    let root = parse(text)?;
    let mut found = Vec::new();
    walk(&root, &mut found);
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields() {
        let found = fields(r#"{"host": "{{ .db_host }}", "port": {{.dbPort}}}"#).unwrap();
        assert_eq!(found, vec!["db_host", "dbPort"]);
    }

    #[test]
    fn test_first_segment_only() {
        assert_eq!(fields("{{ .db.host }} {{ .db.port }}").unwrap(), vec!["db"]);
    }

    #[test]
    fn test_pipelines_and_arguments() {
        let found = fields(r#"{{ .a | printf "%s-%s" .b }} {{ default "x" (lower .c) }}"#).unwrap();
        assert_eq!(found, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_branches() {
        let text = "{{ if .flag }}{{ .yes }}\
                    {{ else if .other }}{{ .maybe }}{{ else }}{{ .no }}{{ end }}\
                    {{ range $i, $e := .items }}{{ $e }}{{ .inner }}{{ else }}{{ .empty }}{{ end }}\
                    {{ with .ctx }}{{ . }}{{ end }}";
        let found = fields(text).unwrap();
        assert_eq!(
            found,
            vec!["flag", "yes", "other", "maybe", "no", "items", "inner", "empty", "ctx"]
        );
    }

    #[test]
    fn test_ignored_constructs() {
        let text = r#"{{/* .comment */}}{{ $x := .assigned }}{{ $x.field }}
            {{ define "sub" }}{{ .hidden }}{{ end }}{{ template "sub" .passed }}
            {{ (secret "path").password }} plain .text {{- .trimmed -}}"#;
        let found = fields(text).unwrap();
        assert_eq!(found, vec!["assigned", "trimmed"]);
    }

    #[test]
    fn test_literals_do_not_confuse_lexer() {
        let found = fields(r#"{{ print "}}" `{{.raw}}` 'x' -1.5e+3 .5 }}{{ .after }}"#).unwrap();
        assert_eq!(found, vec!["after"]);
    }

    #[test]
    fn test_structure_errors() {
        assert!(fields("{{ if .a }}").is_err());
        assert!(fields("{{ end }}").is_err());
        assert!(fields("{{ .a ").is_err());
        assert!(fields("{{ (.a }}").is_err());
        assert!(fields("{{ }}").is_err());
    }

    #[test]
    fn test_tree_shape() {
        let root = parse("x{{ if .a }}{{ end }}").unwrap();
        let Node::List(nodes) = root else {
            panic!("expected list");
        };
        assert_eq!(nodes[0], Node::Text);
        let Node::If(branch) = &nodes[1] else {
            panic!("expected if");
        };
        assert_eq!(branch.pipe.commands, vec![vec![Node::Field(vec!["a".to_string()])]]);
        assert!(branch.else_list.is_none());
    }
}
