//! Building a writer from an imported book file.
//!
//! Accepted formats:
//!   .json        {"synopsis": {"human_message": ..., "ai_message": ...}, "chapter1": {...}}
//!   .csv / .tsv  header row with `section`, `human_message`, `ai_message` columns
//!
//! Uploads coming from a browser arrive as `data:<mime>;base64,<payload>`.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bookjibe_types::{
    book::{BookData, SectionPair},
    session::PromptTemplate,
    BookError, Result,
};

use crate::writer::{Writer, WriterSettings};

/// New writer whose transcript holds every section of `book`, in order, as
/// a labelled human/assistant pair. Labels are not checked for order or gaps.
pub fn create_writer_from_book_data(
    book: &BookData,
    template: PromptTemplate,
    settings: WriterSettings,
) -> Writer {
    let mut writer = Writer::with_template(template, settings);
    for section in &book.sections {
        writer.push_section(section.label.clone(), section.pair.clone());
    }
    log::info!("Writer created from {} imported sections", book.len());
    writer
}

/// Parse raw file contents, choosing the format from the file extension.
pub fn parse_book_file(contents: &str, filename: &str) -> Result<BookData> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            serde_json::from_str(contents).map_err(|e| BookError::ImportParse(e.to_string()))
        }
        Some("csv") => parse_table(&split_csv(contents)?),
        Some("tsv") => parse_table(&split_tsv(contents)),
        _ => Err(BookError::ImportParse(format!(
            "unsupported file type: {}",
            filename
        ))),
    }
}

/// Parse an upload that may be a base64 data URL.
pub fn parse_upload(contents: &str, filename: &str) -> Result<BookData> {
    match contents.strip_prefix("data:") {
        Some(rest) => {
            let (_, payload) = rest
                .split_once(";base64,")
                .ok_or_else(|| BookError::ImportParse("data URL is not base64 encoded".to_string()))?;
            let bytes = STANDARD
                .decode(payload.trim())
                .map_err(|e| BookError::ImportParse(e.to_string()))?;
            let text = String::from_utf8(bytes).map_err(|e| BookError::ImportParse(e.to_string()))?;
            parse_book_file(&text, filename)
        }
        None => parse_book_file(contents, filename),
    }
}

const SECTION_COLUMN: &str = "section";
const HUMAN_COLUMNS: &[&str] = &["human_message", "human"];
const AI_COLUMNS: &[&str] = &["ai_message", "ai"];

fn parse_table(rows: &[Vec<String>]) -> Result<BookData> {
    let (header, body) = rows
        .split_first()
        .ok_or_else(|| BookError::ImportParse("empty table".to_string()))?;

    let column = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
            .ok_or_else(|| BookError::ImportParse(format!("missing column {}", names[0])))
    };
    let section_col = column(&[SECTION_COLUMN])?;
    let human_col = column(HUMAN_COLUMNS)?;
    let ai_col = column(AI_COLUMNS)?;

    let mut book = BookData::new();
    for (line, row) in body.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |idx: usize| {
            row.get(idx).cloned().ok_or_else(|| {
                BookError::ImportParse(format!("row {} has {} columns", line + 2, row.len()))
            })
        };
        let section = cell(section_col)?;
        book.push(section.trim(), SectionPair::new(cell(human_col)?, cell(ai_col)?));
    }
    Ok(book)
}

fn split_tsv(contents: &str) -> Vec<Vec<String>> {
    contents
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Comma separated rows with double-quoted fields; quoted fields may hold
/// commas, newlines and `""` escapes.
fn split_csv(contents: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(BookError::ImportParse("unterminated quoted field".to_string()));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
