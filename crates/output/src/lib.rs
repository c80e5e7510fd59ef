use std::io::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}

impl OutputFormat {
    /// Pick the format for one invocation: `--json`, then `--plain`, then
    /// `--output`, then the configured value, then table.
    pub fn resolve(json: bool, plain: bool, flag: Option<OutputFormat>, configured: &str) -> Self {
        if json {
            OutputFormat::Json
        } else if plain {
            OutputFormat::Plain
        } else if let Some(format) = flag {
            format
        } else {
            OutputFormat::from_str(configured, true).unwrap_or_default()
        }
    }
}

/// Stateless renderer; every method writes a complete document.
pub struct OutputRenderer {
    format: OutputFormat,
}

impl OutputRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn render<T: Serialize>(&self, value: &T) -> Result<()> {
        self.render_to(&mut io::stdout().lock(), value)
    }

    pub fn render_to<W: Write, T: Serialize>(&self, out: &mut W, value: &T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;

        match self.format {
            OutputFormat::Table => {
                if !Self::render_table(out, &json_value)? {
                    writeln!(out, "{}", serde_json::to_string_pretty(&json_value)?)?;
                }
            }
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(&json_value)?)?;
            }
            OutputFormat::Plain => Self::render_plain(out, &json_value)?,
        }

        Ok(())
    }

    /// Like [`render`](Self::render), but an empty list prints `[]` in JSON
    /// mode and `empty_message` on stderr otherwise.
    pub fn render_list<T: Serialize>(&self, rows: &[T], empty_message: &str) -> Result<()> {
        if rows.is_empty() && self.format != OutputFormat::Json {
            eprintln!("{empty_message}");
            return Ok(());
        }
        self.render(&rows)
    }

    /// Result of a mutation: a confirmation line in table mode, the record
    /// itself otherwise.
    pub fn render_outcome<T: Serialize>(&self, message: &str, value: &T) -> Result<()> {
        self.render_outcome_to(&mut io::stdout().lock(), message, value)
    }

    pub fn render_outcome_to<W: Write, T: Serialize>(
        &self,
        out: &mut W,
        message: &str,
        value: &T,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Table => {
                writeln!(out, "{} {}", "✓".green().bold(), message)?;
                Ok(())
            }
            _ => self.render_to(out, value),
        }
    }

    fn render_table<W: Write>(out: &mut W, value: &Value) -> Result<bool> {
        let (headers, rows) = match value {
            Value::Object(obj) => (
                vec!["Field".to_string(), "Value".to_string()],
                obj.iter()
                    .map(|(key, val)| vec![key.clone(), Self::value_to_string(val)])
                    .collect(),
            ),
            other => match Self::coerce_rows(other) {
                Some(data) => data,
                None => return Ok(false),
            },
        };

        let mut builder = Builder::default();
        builder.push_record(headers);
        for row in rows {
            builder.push_record(row);
        }

        let table = builder.build().with(Style::rounded()).to_string();
        writeln!(out, "{}", table)?;
        Ok(true)
    }

    fn render_plain<W: Write>(out: &mut W, value: &Value) -> Result<()> {
        match value {
            Value::Array(rows) => {
                for row in rows {
                    writeln!(out, "{}", Self::plain_line(row))?;
                }
            }
            Value::Null => {}
            other => writeln!(out, "{}", Self::plain_line(other))?,
        }
        Ok(())
    }

    fn plain_line(value: &Value) -> String {
        match value {
            Value::Object(obj) => obj
                .values()
                .map(Self::value_to_string)
                .collect::<Vec<_>>()
                .join("\t"),
            other => Self::value_to_string(other),
        }
    }

    /// Columns follow first-seen field order across all rows.
    fn coerce_rows(value: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
        let rows = match value {
            Value::Array(rows) if !rows.is_empty() => rows,
            _ => return None,
        };

        let mut headers: Vec<String> = Vec::new();
        for row in rows {
            if let Value::Object(obj) = row {
                for key in obj.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
        }

        if headers.is_empty() {
            return None;
        }

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Vec::with_capacity(headers.len());
            if let Value::Object(obj) = row {
                for header in &headers {
                    let cell = obj
                        .get(header)
                        .map(Self::value_to_string)
                        .unwrap_or_default();
                    record.push(cell);
                }
            }
            data.push(record);
        }

        Some((headers, data))
    }

    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}
