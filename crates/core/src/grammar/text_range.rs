use crate::grammar::diag::Range;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

// Longer keywords precede their prefixes (`elseif` before `else`).
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[ \t]*(import|endvar|var|endcsv|csv|endfor|for|elseif|else|endif|if|endscript|script|endsql|sql|endlist|list)(?:[ \t]|=|$)",
    )
    .expect("keyword regex is valid")
});

/// Block keyword recognized at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyword {
    /// `import <name> = <url>`
    Import,
    /// `var <name> = <value>`
    Var,
    /// Closes a multi-line `var`.
    EndVar,
    /// `csv <name> = <header>` or `csv <name> from <url>`
    Csv,
    /// Closes `csv`.
    EndCsv,
    /// `for <item> in <collection>`
    For,
    /// Closes `for`.
    EndFor,
    /// `if <condition>`
    If,
    /// `elseif <condition>`
    ElseIf,
    /// `else`
    Else,
    /// Closes `if`.
    EndIf,
    /// Opens an inline script body.
    Script,
    /// Closes `script`.
    EndScript,
    /// Opens an inline SQL body.
    Sql,
    /// Closes `sql`.
    EndSql,
    /// `list <name> = a, b`
    List,
    /// Closes a multi-line `list`.
    EndList,
}

impl Keyword {
    /// Parse a keyword, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let kw = match name.to_ascii_lowercase().as_str() {
            "import" => Keyword::Import,
            "var" => Keyword::Var,
            "endvar" => Keyword::EndVar,
            "csv" => Keyword::Csv,
            "endcsv" => Keyword::EndCsv,
            "for" => Keyword::For,
            "endfor" => Keyword::EndFor,
            "if" => Keyword::If,
            "elseif" => Keyword::ElseIf,
            "else" => Keyword::Else,
            "endif" => Keyword::EndIf,
            "script" => Keyword::Script,
            "endscript" => Keyword::EndScript,
            "sql" => Keyword::Sql,
            "endsql" => Keyword::EndSql,
            "list" => Keyword::List,
            "endlist" => Keyword::EndList,
            _ => return None,
        };
        Some(kw)
    }

    /// Lower-case spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Import => "import",
            Keyword::Var => "var",
            Keyword::EndVar => "endvar",
            Keyword::Csv => "csv",
            Keyword::EndCsv => "endcsv",
            Keyword::For => "for",
            Keyword::EndFor => "endfor",
            Keyword::If => "if",
            Keyword::ElseIf => "elseif",
            Keyword::Else => "else",
            Keyword::EndIf => "endif",
            Keyword::Script => "script",
            Keyword::EndScript => "endscript",
            Keyword::Sql => "sql",
            Keyword::EndSql => "endsql",
            Keyword::List => "list",
            Keyword::EndList => "endlist",
        }
    }

    /// Keyword closing a block opened by `self`.
    pub fn closer(self) -> Option<Keyword> {
        match self {
            Keyword::Var => Some(Keyword::EndVar),
            Keyword::Csv => Some(Keyword::EndCsv),
            Keyword::For => Some(Keyword::EndFor),
            Keyword::If => Some(Keyword::EndIf),
            Keyword::Script => Some(Keyword::EndScript),
            Keyword::Sql => Some(Keyword::EndSql),
            Keyword::List => Some(Keyword::EndList),
            _ => None,
        }
    }

    /// Keyword opening the block `self` closes.
    pub fn opener(self) -> Option<Keyword> {
        match self {
            Keyword::EndVar => Some(Keyword::Var),
            Keyword::EndCsv => Some(Keyword::Csv),
            Keyword::EndFor => Some(Keyword::For),
            Keyword::EndIf => Some(Keyword::If),
            Keyword::EndScript => Some(Keyword::Script),
            Keyword::EndSql => Some(Keyword::Sql),
            Keyword::EndList => Some(Keyword::List),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned token: a keyword, section name or setting name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    /// Token text, lower-cased for keywords and sections.
    pub text: String,
    /// Location of the token.
    pub range: Range,
    /// Whether the construct may legally stay unclosed.
    pub can_be_unclosed: bool,
    /// Evaluation order hint for embedded expressions; not used by validation.
    pub priority: u32,
}

impl TextRange {
    /// Create a token that must be closed if it opens a block.
    pub fn new(text: impl Into<String>, range: Range) -> Self {
        Self {
            text: text.into(),
            range,
            can_be_unclosed: false,
            priority: 0,
        }
    }

    /// The keyword this token spells, if any.
    pub fn keyword(&self) -> Option<Keyword> {
        Keyword::from_name(&self.text)
    }
}

/// Recognize a leading block keyword on one line.
///
/// `line` must already have comments blanked. The returned token covers the
/// keyword itself, and carries `can_be_unclosed` as given.
pub fn scan_keyword(line: &str, line_number: usize, can_be_unclosed: bool) -> Option<TextRange> {
    let m = KEYWORD_RE.captures(line)?.get(1)?;
    Some(TextRange {
        text: m.as_str().to_ascii_lowercase(),
        range: Range::on_line(line_number, m.start(), m.end()),
        can_be_unclosed,
        priority: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_indented_keyword_with_its_columns() {
        let tr = scan_keyword("   for server in servers", 4, false).unwrap();
        assert_eq!(tr.text, "for");
        assert_eq!(tr.range, Range::on_line(4, 3, 6));
        assert_eq!(tr.keyword(), Some(Keyword::For));
    }

    #[test]
    fn is_case_insensitive() {
        let tr = scan_keyword("EndFor", 0, false).unwrap();
        assert_eq!(tr.keyword(), Some(Keyword::EndFor));
    }

    #[test]
    fn prefers_longest_keyword() {
        assert_eq!(scan_keyword("elseif x > 1", 0, false).unwrap().text, "elseif");
        assert_eq!(scan_keyword("else", 0, false).unwrap().text, "else");
        assert_eq!(scan_keyword("endscript", 0, false).unwrap().text, "endscript");
    }

    #[test]
    fn ignores_settings_that_start_with_a_keyword() {
        for line in ["format = x", "variable = 1", "iffy = 2", "listing = 3", "csv-file = x", "end-time = now"] {
            assert!(scan_keyword(line, 0, false).is_none(), "{line}");
        }
    }

    #[test]
    fn keyword_directly_followed_by_equals() {
        let tr = scan_keyword("script= widget.reload()", 0, false).unwrap();
        assert_eq!(tr.keyword(), Some(Keyword::Script));
    }

    #[test]
    fn carries_unclosed_flag() {
        let tr = scan_keyword("csv rows from https://x/y.csv", 2, true).unwrap();
        assert!(tr.can_be_unclosed);
    }

    #[test]
    fn openers_and_closers_pair_up() {
        for kw in [Keyword::Var, Keyword::Csv, Keyword::For, Keyword::If, Keyword::Script, Keyword::Sql, Keyword::List] {
            let closer = kw.closer().unwrap();
            assert_eq!(closer.opener(), Some(kw));
            assert_eq!(closer.as_str(), format!("end{kw}"));
        }
        assert_eq!(Keyword::Import.closer(), None);
        assert_eq!(Keyword::Else.opener(), None);
    }
}
