//! Block keyword nesting: `for`/`if`/`csv`/`var`/`list`/`script`/`sql`.
//!
//! The tracker sees every line before section and setting recognition. Lines
//! inside an open body (`csv` rows, script text, multi-line `var`/`list`
//! values) are consumed here and never reach the setting scanner.

use crate::grammar::diag::{Diagnostic, Range, codes};
use crate::grammar::text_range::{Keyword, TextRange, scan_keyword};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static FOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)[ \t]+in[ \t]+(\S.*)$").expect("for regex is valid"));

static DECLARATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)[ \t]*=[ \t]*(.*)$").expect("declaration regex is valid"));

static CSV_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)[ \t]+from[ \t]+(\S+)").expect("csv regex is valid"));

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("identifier regex is valid"));

/// What the tracker did with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line was a keyword or body text; do not scan it further.
    Consumed,
    /// The line carries no block keyword.
    NotKeyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    /// `csv` rows; `None` until the header row is seen.
    Csv { columns: Option<usize> },
    /// Free text: script, sql, multi-line var or list.
    Opaque,
}

#[derive(Debug, Clone)]
struct Body {
    kind: BodyKind,
    closer: Keyword,
}

#[derive(Debug, Clone)]
struct Frame {
    token: TextRange,
    loop_variable: Option<String>,
}

impl Frame {
    fn keyword(&self) -> Option<Keyword> {
        self.token.keyword()
    }
}

/// Stack of open keyword blocks plus declared variable names.
#[derive(Debug, Default)]
pub struct KeywordTracker {
    frames: Vec<Frame>,
    body: Option<Body>,
    names: BTreeSet<String>,
}

impl KeywordTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` was declared by `list`/`var`/`csv`/`import` or is the
    /// variable of an open `for`.
    pub fn is_declared(&self, name: &str) -> bool {
        self.names.contains(name)
            || self
                .frames
                .iter()
                .any(|f| f.loop_variable.as_deref() == Some(name))
    }

    /// Process one comment-blanked line.
    pub fn process_line(
        &mut self,
        line: &str,
        line_number: usize,
        issues: &mut Vec<Diagnostic>,
    ) -> LineOutcome {
        if let Some(body) = self.body.as_mut() {
            let token = scan_keyword(line, line_number, false);
            if let Some(token) = token
                && token.keyword() == Some(body.closer)
            {
                self.body = None;
                self.close(token, issues);
            } else if let BodyKind::Csv { columns } = &mut body.kind {
                check_csv_row(columns, line, line_number, issues);
            }
            return LineOutcome::Consumed;
        }

        let Some(token) = scan_keyword(line, line_number, false) else {
            return LineOutcome::NotKeyword;
        };
        let Some(keyword) = token.keyword() else {
            return LineOutcome::NotKeyword;
        };
        let rest = line[token.range.end.character..].trim();
        match keyword {
            Keyword::Script | Keyword::Sql => {
                if rest
                    .strip_prefix('=')
                    .is_some_and(|expr| !expr.trim().is_empty())
                {
                    return LineOutcome::NotKeyword;
                }
                self.open_body(token, BodyKind::Opaque);
            }
            Keyword::For => self.open_for(token, rest, issues),
            Keyword::If => self.push(token, None),
            Keyword::ElseIf | Keyword::Else => {
                if self.frames.last().and_then(Frame::keyword) != Some(Keyword::If) {
                    issues.push(
                        Diagnostic::for_code(
                            codes::MISPLACED_KEYWORD,
                            format!("{keyword} has no matching if"),
                            token.range,
                        )
                        .with_context(ctx!("keyword" => keyword.as_str())),
                    );
                }
            }
            Keyword::List => self.declare_list(token, rest, issues),
            Keyword::Var => self.declare_var(token, rest, issues),
            Keyword::Csv => self.declare_csv(token, rest, issues),
            Keyword::Import => {
                match DECLARATION_RE.captures(rest) {
                    Some(caps) if !caps[2].trim().is_empty() => {
                        self.declare(&caps[1], &token, issues);
                    }
                    _ => issues.push(malformed(&token, "import <name> = <url>")),
                }
            }
            Keyword::EndVar
            | Keyword::EndCsv
            | Keyword::EndFor
            | Keyword::EndIf
            | Keyword::EndScript
            | Keyword::EndSql
            | Keyword::EndList => self.close(token, issues),
        }
        LineOutcome::Consumed
    }

    /// Report every frame still open at end of document, in opening order.
    pub fn finish(&mut self, issues: &mut Vec<Diagnostic>) {
        self.body = None;
        for frame in self.frames.drain(..) {
            if let Some(d) = unclosed(&frame) {
                issues.push(d);
            }
        }
    }

    fn push(&mut self, token: TextRange, loop_variable: Option<String>) {
        tracing::trace!(keyword = %token.text, line = token.range.start.line, "block opened");
        self.frames.push(Frame {
            token,
            loop_variable,
        });
    }

    fn open_body(&mut self, token: TextRange, kind: BodyKind) {
        if let Some(closer) = token.keyword().and_then(Keyword::closer) {
            self.body = Some(Body { kind, closer });
            self.push(token, None);
        }
    }

    fn open_for(&mut self, token: TextRange, rest: &str, issues: &mut Vec<Diagnostic>) {
        let Some(caps) = FOR_RE.captures(rest) else {
            issues.push(malformed(&token, "for <item> in <collection>"));
            self.push(token, None);
            return;
        };
        let collection = caps[2].trim();
        if IDENTIFIER_RE.is_match(collection) && !self.is_declared(collection) {
            issues.push(
                Diagnostic::for_code(
                    codes::UNKNOWN_VARIABLE,
                    format!("{collection} is unknown."),
                    token.range,
                )
                .with_context(ctx!("variable" => collection)),
            );
        }
        self.push(token, Some(caps[1].to_string()));
    }

    fn declare_list(&mut self, token: TextRange, rest: &str, issues: &mut Vec<Diagnostic>) {
        let Some(caps) = DECLARATION_RE.captures(rest) else {
            issues.push(malformed(&token, "list <name> = <values>"));
            return;
        };
        self.declare(&caps[1], &token, issues);
        let value = caps[2].trim();
        if value.is_empty() || value.ends_with(',') {
            self.open_body(token, BodyKind::Opaque);
        }
    }

    fn declare_var(&mut self, token: TextRange, rest: &str, issues: &mut Vec<Diagnostic>) {
        let Some(caps) = DECLARATION_RE.captures(rest) else {
            issues.push(malformed(&token, "var <name> = <value>"));
            return;
        };
        self.declare(&caps[1], &token, issues);
        let value = caps[2].trim();
        if value.is_empty() || bracket_depth(value) > 0 {
            self.open_body(token, BodyKind::Opaque);
        }
    }

    fn declare_csv(&mut self, mut token: TextRange, rest: &str, issues: &mut Vec<Diagnostic>) {
        if let Some(caps) = CSV_FROM_RE.captures(rest) {
            self.declare(&caps[1], &token, issues);
            token.can_be_unclosed = true;
            self.push(token, None);
            return;
        }
        let Some(caps) = DECLARATION_RE.captures(rest) else {
            issues.push(malformed(&token, "csv <name> = <header> or csv <name> from <url>"));
            return;
        };
        self.declare(&caps[1], &token, issues);
        let header = caps[2].trim();
        let columns = (!header.is_empty()).then(|| count_columns(header));
        self.open_body(token, BodyKind::Csv { columns });
    }

    fn declare(&mut self, name: &str, token: &TextRange, issues: &mut Vec<Diagnostic>) {
        if !self.names.insert(name.to_string()) {
            issues.push(
                Diagnostic::for_code(
                    codes::DUPLICATE_VARIABLE,
                    format!("{name} is already defined"),
                    token.range,
                )
                .with_context(ctx!("variable" => name)),
            );
        }
    }

    /// Pop back to the nearest opener of `token`.
    fn close(&mut self, token: TextRange, issues: &mut Vec<Diagnostic>) {
        let Some(opener) = token.keyword().and_then(Keyword::opener) else {
            return;
        };
        let Some(idx) = self
            .frames
            .iter()
            .rposition(|f| f.keyword() == Some(opener))
        else {
            issues.push(
                Diagnostic::for_code(
                    codes::UNMATCHED_KEYWORD,
                    format!("{} has no matching {opener}", token.text),
                    token.range,
                )
                .with_context(ctx!("keyword" => token.text.as_str(), "expected" => opener.as_str())),
            );
            return;
        };
        for frame in self.frames.drain(idx + 1..) {
            if let Some(d) = unclosed(&frame) {
                issues.push(d);
            }
        }
        self.frames.truncate(idx);
        tracing::trace!(keyword = %token.text, line = token.range.start.line, "block closed");
    }
}

fn unclosed(frame: &Frame) -> Option<Diagnostic> {
    if frame.token.can_be_unclosed {
        return None;
    }
    let closer = frame.keyword()?.closer()?;
    Some(
        Diagnostic::for_code(
            codes::UNMATCHED_KEYWORD,
            format!("{} has no matching {closer}", frame.token.text),
            frame.token.range,
        )
        .with_context(ctx!("keyword" => frame.token.text.as_str(), "expected" => closer.as_str())),
    )
}

fn malformed(token: &TextRange, expected: &str) -> Diagnostic {
    Diagnostic::for_code(
        codes::MALFORMED_KEYWORD,
        format!("{} is malformed. Expected: {expected}", token.text),
        token.range,
    )
    .with_context(ctx!("keyword" => token.text.as_str(), "expected" => expected))
}

fn check_csv_row(
    columns: &mut Option<usize>,
    line: &str,
    line_number: usize,
    issues: &mut Vec<Diagnostic>,
) {
    let row = line.trim();
    if row.is_empty() {
        return;
    }
    let found = count_columns(row);
    let Some(expected) = *columns else {
        *columns = Some(found);
        return;
    };
    if found != expected {
        let start = line.len() - line.trim_start().len();
        let end = start + row.len();
        issues.push(
            Diagnostic::for_code(
                codes::CSV_COLUMN_COUNT,
                format!("Expected {expected} columns, but found {found}."),
                Range::on_line(line_number, start, end),
            )
            .with_context(ctx!("expected" => expected.to_string(), "found" => found.to_string())),
        );
    }
}

/// Comma-separated fields, ignoring commas inside double quotes.
fn count_columns(row: &str) -> usize {
    let mut quoted = false;
    let mut count = 1;
    for c in row.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => count += 1,
            _ => {}
        }
    }
    count
}

/// Opening minus closing brackets, outside of quotes.
fn bracket_depth(value: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for c in value.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '{' | '(') => depth += 1,
            (None, ']' | '}' | ')') => depth -= 1,
            _ => {}
        }
    }
    depth
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> (Vec<Diagnostic>, Vec<LineOutcome>) {
        let mut tracker = KeywordTracker::new();
        let mut issues = Vec::new();
        let outcomes = text
            .lines()
            .enumerate()
            .map(|(n, line)| tracker.process_line(line, n, &mut issues))
            .collect();
        tracker.finish(&mut issues);
        (issues, outcomes)
    }

    fn messages(text: &str) -> Vec<String> {
        run(text).0.into_iter().map(|d| d.message).collect()
    }

    #[test]
    fn unclosed_for_is_reported_once_at_the_keyword() {
        let (issues, _) = run("list servers = 'srv1','srv2'\nfor server in servers\n   do something");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "for has no matching endfor");
        assert_eq!(issues[0].range, Range::on_line(1, 0, 3));
    }

    #[test]
    fn balanced_blocks_are_silent() {
        let text = "list servers = a, b\nfor s in servers\n  if s == 'a'\n  elseif s == 'b'\n  else\n  endif\nendfor";
        assert!(messages(text).is_empty());
    }

    #[test]
    fn closer_without_opener() {
        assert_eq!(messages("endif"), ["endif has no matching if"]);
    }

    #[test]
    fn intervening_frames_are_reported_when_closing() {
        let text = "list xs = 1, 2\nfor x in xs\nif x\nendfor";
        assert_eq!(messages(text), ["if has no matching endif"]);
    }

    #[test]
    fn unclosed_frames_reported_in_opening_order() {
        let text = "list xs = 1\nfor x in xs\nif x";
        assert_eq!(
            messages(text),
            ["for has no matching endfor", "if has no matching endif"]
        );
    }

    #[test]
    fn unknown_collection() {
        let (issues, _) = run("for x in nowhere\nendfor");
        assert_eq!(issues.len(), 1);
        assert_eq!(&*issues[0].id, codes::UNKNOWN_VARIABLE);
    }

    #[test]
    fn non_identifier_collections_are_not_checked() {
        assert!(messages("for x in ['a', 'b']\nendfor").is_empty());
        assert!(messages("for x in range(1, 3)\nendfor").is_empty());
    }

    #[test]
    fn loop_variable_is_visible_to_nested_loops() {
        let text = "var groups = [['a']]\nfor g in groups\nfor item in g\nendfor\nendfor";
        assert!(messages(text).is_empty());
    }

    #[test]
    fn malformed_for() {
        let (issues, _) = run("for x\nendfor");
        assert_eq!(issues.len(), 1);
        assert_eq!(&*issues[0].id, codes::MALFORMED_KEYWORD);
    }

    #[test]
    fn else_without_if() {
        let (issues, _) = run("else");
        assert_eq!(issues[0].message, "else has no matching if");
        assert_eq!(&*issues[0].id, codes::MISPLACED_KEYWORD);
    }

    #[test]
    fn duplicate_variable() {
        let (issues, _) = run("list a = 1\nvar a = 2");
        assert_eq!(issues.len(), 1);
        assert_eq!(&*issues[0].id, codes::DUPLICATE_VARIABLE);
    }

    #[test]
    fn multi_line_list_consumes_body() {
        let (issues, outcomes) = run("list xs = a,\n  b,\n  c\nendlist\nmetric = x");
        assert!(issues.is_empty());
        assert_eq!(outcomes[1], LineOutcome::Consumed);
        assert_eq!(outcomes[4], LineOutcome::NotKeyword);
    }

    #[test]
    fn multi_line_var_until_endvar() {
        assert!(messages("var v = {\n 'a': 1\n}\nendvar").is_empty());
        assert_eq!(messages("var v = [\n 1"), ["var has no matching endvar"]);
        assert!(messages("var v = [1, 2]").is_empty());
    }

    #[test]
    fn csv_rows_must_match_header() {
        let (issues, _) = run("csv rows = name, value\n a, 1\n b\n c, 3\nendcsv");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Expected 2 columns, but found 1.");
        assert_eq!(issues[0].range, Range::on_line(2, 1, 2));
    }

    #[test]
    fn csv_header_on_next_line() {
        let (issues, _) = run("csv rows =\n name, value\n \"a, b\", 1\n x, 2, 3\nendcsv");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Expected 2 columns, but found 3.");
    }

    #[test]
    fn csv_from_url_may_stay_unclosed() {
        assert!(messages("csv rows from https://example.org/data.csv\nfor r in rows\nendfor").is_empty());
    }

    #[test]
    fn script_body_is_opaque() {
        let (issues, outcomes) = run("script\n  [widget]\n  for x in y\nendscript");
        assert!(issues.is_empty());
        assert!(outcomes.iter().all(|o| *o == LineOutcome::Consumed));
    }

    #[test]
    fn inline_script_is_a_setting() {
        let (issues, outcomes) = run("script = widget.reload()");
        assert!(issues.is_empty());
        assert_eq!(outcomes[0], LineOutcome::NotKeyword);
    }

    #[test]
    fn import_declares_a_name() {
        assert!(messages("import fred = fred.js\nfor x in fred\nendfor").is_empty());
        let (issues, _) = run("import fred");
        assert_eq!(&*issues[0].id, codes::MALFORMED_KEYWORD);
    }

    #[test]
    fn bracket_depth_ignores_quotes() {
        assert_eq!(bracket_depth("['a]', {"), 2);
        assert_eq!(bracket_depth("f(1)"), 0);
    }
}
