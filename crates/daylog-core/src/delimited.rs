// ABOUTME: Delimiter-separated row codec used by partition files and terminal echo.
// ABOUTME: Renders with minimal or unconditional quoting and parses rows with embedded line breaks.

use serde::{Deserialize, Serialize};

/// Quoting discipline for rendered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Quote a field only when it contains the delimiter, the quote char, or a line break.
    Minimal,
    /// Quote every field.
    Always,
}

/// Delimiter and quote character pair shared by the writer and the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFormat {
    pub delimiter: char,
    pub quote: char,
}

impl Default for RowFormat {
    fn default() -> Self {
        Self {
            delimiter: '|',
            quote: '"',
        }
    }
}

impl RowFormat {
    pub fn new(delimiter: char, quote: char) -> Self {
        Self { delimiter, quote }
    }

    fn needs_quotes(&self, field: &str) -> bool {
        field
            .chars()
            .any(|c| c == self.delimiter || c == self.quote || c == '\n' || c == '\r')
    }

    fn push_field(&self, out: &mut String, field: &str, quoting: Quoting) {
        let quoted = match quoting {
            Quoting::Always => true,
            Quoting::Minimal => self.needs_quotes(field),
        };
        if !quoted {
            out.push_str(field);
            return;
        }

        out.push(self.quote);
        for c in field.chars() {
            if c == self.quote {
                out.push(self.quote);
            }
            out.push(c);
        }
        out.push(self.quote);
    }

    /// Render one row without a trailing line terminator.
    pub fn render<S: AsRef<str>>(&self, fields: &[S], quoting: Quoting) -> String {
        let mut out = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(self.delimiter);
            }
            self.push_field(&mut out, field.as_ref(), quoting);
        }
        out
    }

    /// Render one row followed by `\n`, ready to append to a partition file.
    pub fn render_line<S: AsRef<str>>(&self, fields: &[S], quoting: Quoting) -> String {
        let mut line = self.render(fields, quoting);
        line.push('\n');
        line
    }

    /// Split text into records. Quoted fields may span lines; doubled quote
    /// characters inside a quoted field decode to one. Blank lines are skipped.
    pub fn parse(&self, text: &str) -> Vec<Vec<String>> {
        let mut records = Vec::new();
        let mut record: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut touched = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == self.quote {
                    if chars.peek() == Some(&self.quote) {
                        chars.next();
                        field.push(c);
                    } else {
                        in_quotes = false;
                    }
                } else {
                    field.push(c);
                }
                continue;
            }

            if c == self.quote && field.is_empty() {
                in_quotes = true;
                touched = true;
            } else if c == self.delimiter {
                record.push(std::mem::take(&mut field));
                touched = true;
            } else if c == '\n' || c == '\r' {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if touched || !field.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                touched = false;
            } else {
                field.push(c);
            }
        }

        if touched || !field.is_empty() {
            record.push(field);
            records.push(record);
        }

        records
    }
}
