//! Entity extraction stage.
//!
//! The model answers with two labeled Markdown sections: `Entities` and
//! `New Facts`. Entities may come as attribute lists or as a table; both
//! shapes are parsed into an [`EntitySet`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use newsdesk_bedrock::{GenerationRequest, TextGenerator};
use newsdesk_shared::{
    Entity, EntitySet, EntityType, ModelProfile, NewsdeskError, RawInput, Result,
};

use crate::prompts;
use crate::stage_failure;

/// Extractor output: the parsed entities plus the raw two-section text the
/// query builder consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub entities: EntitySet,
    pub text: String,
}

pub struct EntityExtractor {
    generator: Arc<dyn TextGenerator>,
    profile: ModelProfile,
}

impl EntityExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, profile: ModelProfile) -> Self {
        Self { generator, profile }
    }

    #[instrument(skip_all, fields(chars = input.as_str().len()))]
    pub async fn extract(&self, input: &RawInput) -> Result<Extraction> {
        let generation = self
            .generator
            .generate(GenerationRequest {
                profile: &self.profile,
                system_prompt: prompts::EXTRACTION_PROMPT,
                input: input.as_str(),
            })
            .await
            .map_err(|e| stage_failure(e, NewsdeskError::Extraction))?;

        let text = generation.text.trim().to_string();
        if text.is_empty() {
            return Err(NewsdeskError::Extraction(
                "model returned an empty answer".into(),
            ));
        }

        let entities = parse_entities(&text)?;
        info!(
            entities = entities.len(),
            people = entities.count_of(EntityType::Person),
            organizations = entities.count_of(EntityType::Organization),
            products = entities.count_of(EntityType::Product),
            "entities extracted"
        );

        Ok(Extraction { entities, text })
    }
}

// ---------------------------------------------------------------------------
// Section headings
// ---------------------------------------------------------------------------

/// Normalized title of a heading-like line (`## Entities`, `**Entities:**`,
/// `Entities`), lowercased.
fn heading_title(line: &str) -> String {
    let bare = line.trim().trim_start_matches('#');
    let bare = bare.trim().trim_matches(|c: char| c == '*' || c == '_').trim();
    let bare = bare.trim_end_matches(':');
    bare.trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .to_ascii_lowercase()
}

fn find_heading(lines: &[&str], title: &str, from: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| heading_title(line) == title)
        .map(|(idx, _)| idx)
}

/// True when the text carries an `Entities` heading.
pub fn has_entity_section(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    find_heading(&lines, "entities", 0).is_some()
}

/// Lines between the `Entities` and `New Facts` headings.
fn entity_section<'a, 'b>(lines: &'b [&'a str]) -> Result<&'b [&'a str]> {
    let start = find_heading(lines, "entities", 0)
        .ok_or_else(|| NewsdeskError::Extraction("answer has no Entities section".into()))?;
    let end = find_heading(lines, "new facts", start + 1)
        .ok_or_else(|| NewsdeskError::Extraction("answer has no New Facts section".into()))?;
    Ok(&lines[start + 1..end])
}

// ---------------------------------------------------------------------------
// Entity records
// ---------------------------------------------------------------------------

const FIELDS: [&str; 5] = ["entity_id", "text", "type", "subtype", "confidence"];

fn normalize_key(raw: &str) -> Option<&'static str> {
    let key = raw
        .trim()
        .trim_matches(|c: char| c == '*' || c == '`' || c == '_' || c.is_whitespace())
        .to_ascii_lowercase()
        .replace([' ', '-'], "_");
    match key.as_str() {
        "id" | "entity_id" => Some("entity_id"),
        other => FIELDS.iter().copied().find(|f| *f == other),
    }
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '`' || c.is_whitespace())
        .to_string()
}

/// Strip list markers (`-`, `*`, `+`, `1.`) from the start of a line.
fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("+ "))
        .or_else(|| line.strip_prefix("* "))
    {
        return rest.trim_start();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return rest.trim_start();
        }
    }
    line
}

type Record = HashMap<&'static str, String>;

fn parse_attribute_lists(section: &[&str]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = Record::new();

    for line in section {
        let item = strip_bullet(line);
        let Some((key, value)) = item.split_once(':') else {
            continue;
        };
        let Some(field) = normalize_key(key) else {
            continue;
        };
        if !current.is_empty() && (field == "entity_id" || current.contains_key(field)) {
            records.push(std::mem::take(&mut current));
        }
        current.insert(field, clean_value(value));
    }

    if !current.is_empty() {
        records.push(current);
    }
    records
}

fn table_cells(line: &str) -> Vec<String> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(clean_value)
        .collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

fn parse_table(section: &[&str]) -> Vec<Record> {
    let mut rows = section
        .iter()
        .filter(|line| line.trim_start().starts_with('|'))
        .map(|line| table_cells(line));

    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let columns: Vec<Option<&'static str>> = header.iter().map(|h| normalize_key(h)).collect();

    rows.filter(|cells| !is_separator_row(cells))
        .map(|cells| {
            columns
                .iter()
                .zip(cells)
                .filter_map(|(column, cell)| column.map(|field| (field, cell)))
                .filter(|(_, cell)| !cell.is_empty())
                .collect::<Record>()
        })
        .filter(|record| !record.is_empty())
        .collect()
}

fn to_entity(index: usize, mut record: Record) -> Result<Entity> {
    let position = index + 1;

    let text = record
        .remove("text")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| NewsdeskError::Extraction(format!("entity {position} has no text")))?;

    let raw_type = record.remove("type").unwrap_or_default();
    let entity_type: EntityType = raw_type.parse().map_err(|_| {
        NewsdeskError::Extraction(format!("entity '{text}' has unknown type '{raw_type}'"))
    })?;

    let raw_confidence = record.remove("confidence").unwrap_or_default();
    let confidence: f32 = raw_confidence.parse().map_err(|_| {
        NewsdeskError::Extraction(format!(
            "entity '{text}' has unreadable confidence '{raw_confidence}'"
        ))
    })?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(NewsdeskError::Extraction(format!(
            "entity '{text}' has confidence {confidence} outside [0, 1]"
        )));
    }

    let id = record
        .remove("entity_id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("E{position}"));

    Ok(Entity {
        id,
        text,
        entity_type,
        subtype: record.remove("subtype").unwrap_or_default(),
        confidence,
    })
}

/// Parse the `Entities` section of an extractor answer.
pub fn parse_entities(text: &str) -> Result<EntitySet> {
    let lines: Vec<&str> = text.lines().collect();
    let section = entity_section(&lines)?;

    let is_table = section
        .iter()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.trim_start().starts_with('|'));

    let records = if is_table {
        parse_table(section)
    } else {
        parse_attribute_lists(section)
    };
    debug!(records = records.len(), table = is_table, "entity records found");

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| to_entity(index, record))
        .collect::<Result<Vec<_>>>()
        .map(EntitySet)
}
