//! Agent output framing: `<<<name>>>` / `<<<name:sep(N)>>>` headers
//! followed by one record per line.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One section's lines, each split into fields.
pub type StringTable = Vec<Vec<String>>;

/// A section being written by the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    /// Field separator announced in the header; `None` means whitespace.
    pub separator: Option<char>,
    lines: Vec<String>,
}

impl Section {
    pub fn new(name: impl Into<String>, separator: Option<char>) -> Self {
        Section {
            name: name.into(),
            separator,
            lines: Vec::new(),
        }
    }

    /// A section whose lines are joined with `separator`.
    pub fn with_separator(name: impl Into<String>, separator: char) -> Self {
        Self::new(name, Some(separator))
    }

    /// A JSON-lines section. NUL never occurs in serialized JSON, so each
    /// line arrives as one field.
    pub fn json_lines(name: impl Into<String>) -> Self {
        Self::new(name, Some('\0'))
    }

    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn append_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sep = self.separator.unwrap_or(' ').to_string();
        let line = fields
            .into_iter()
            .map(|f| f.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(&sep);
        self.lines.push(line);
    }

    pub fn append_json<T: Serialize>(&mut self, value: &T) -> serde_json::Result<()> {
        self.lines.push(serde_json::to_string(value)?);
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn header(&self) -> String {
        match self.separator {
            Some(c) => format!("<<<{}:sep({})>>>", self.name, c as u32),
            None => format!("<<<{}>>>", self.name),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Split agent output into string tables by section name. Repeated sections
/// are concatenated; lines before the first header or after a `<<<>>>`
/// terminator are ignored.
pub fn parse_agent_output(output: &str) -> BTreeMap<String, StringTable> {
    let mut tables: BTreeMap<String, StringTable> = BTreeMap::new();
    let mut current: Option<(String, Option<char>)> = None;

    for line in output.lines() {
        if let Some((name, sep)) = parse_header(line) {
            // `<<<>>>` closes the current section.
            if name.is_empty() {
                current = None;
                continue;
            }
            tables.entry(name.clone()).or_default();
            current = Some((name, sep));
            continue;
        }

        let Some((name, sep)) = &current else {
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<String> = match sep {
            Some(c) => line.split(*c).map(str::to_string).collect(),
            None => line.split_whitespace().map(str::to_string).collect(),
        };
        if let Some(table) = tables.get_mut(name) {
            table.push(fields);
        }
    }

    tables
}

fn parse_header(line: &str) -> Option<(String, Option<char>)> {
    let inner = line.trim().strip_prefix("<<<")?.strip_suffix(">>>")?;
    let mut parts = inner.split(':');
    let name = parts.next()?.trim();

    let mut sep = None;
    for opt in parts {
        if let Some(code) = opt.strip_prefix("sep(").and_then(|o| o.strip_suffix(')')) {
            sep = code.parse::<u32>().ok().and_then(char::from_u32);
        }
    }
    Some((name.to_string(), sep))
}
