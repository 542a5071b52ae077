//! Prompt construction: instruction classification, system prompt, data digests
use crate::core::record::{FieldKind, GridSchema, Record, format_number};
use std::fmt::Write as _;
use strum::Display;

/// What a free-text instruction is asking for. Classification is
/// keyword-presence over fixed English/Norwegian tables, not semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InstructionKind {
    GridOperation,
    SummaryOrAnalysis,
    DataQuery,
    GeneralQuestion,
}

/// Marker prefix a data-lookup instruction carries
pub const DATA_QUERY_MARKER: &str = "gridlookup:";

const SUMMARY_KEYWORDS: &[&str] = &[
    "summary",
    "sammendrag",
    "overview",
    "oversikt",
    "statistics",
    "statistikk",
    "analyze",
    "analyser",
    "analysis",
    "analyse",
    "breakdown",
    "distribution",
    "fordeling",
    "overall",
    "totalt",
    "info",
    "information",
    "insight",
    "innsikt",
];

const GRID_OPERATION_KEYWORDS: &[&str] = &[
    "highlight", "marker", "filter", "filtrer", "sort", "sorter", "group", "grupper", "show",
    "vis",
];

/// Classify an instruction. Case-insensitive, pure.
pub fn classify(instruction: &str) -> InstructionKind {
    let lower = instruction.to_lowercase();
    if lower.contains(DATA_QUERY_MARKER) {
        return InstructionKind::DataQuery;
    }
    if SUMMARY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return InstructionKind::SummaryOrAnalysis;
    }
    if GRID_OPERATION_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return InstructionKind::GridOperation;
    }
    InstructionKind::GeneralQuestion
}

/// The exact text pair sent to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Builds the request payload for one instruction turn. The record set
/// always flows in as a parameter; the builder holds only the schema.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    schema: GridSchema,
}

const NO_DATA_ANALYSIS_NOTE: &str = "Note: No grid data available for analysis.";
const NO_DATA_QUERY_NOTE: &str = "Note: No grid data available for query.";

/// Top-N cutoff for per-field value breakdowns in the digest
const DIGEST_TOP_N: usize = 5;

impl PromptBuilder {
    pub fn new(schema: GridSchema) -> Self {
        Self { schema }
    }

    /// Build the system/user prompt pair for one instruction.
    pub fn build(&self, instruction: &str, records: &[Record]) -> ChatPrompt {
        let user = match classify(instruction) {
            InstructionKind::SummaryOrAnalysis => self.summary_prompt(instruction, records),
            InstructionKind::DataQuery => self.data_query_prompt(instruction, records),
            InstructionKind::GridOperation | InstructionKind::GeneralQuestion => {
                instruction.to_string()
            }
        };
        ChatPrompt {
            system: self.system_prompt(),
            user,
        }
    }

    /// The fixed system prompt: scope rules, output contract, field schema,
    /// the JSON grammar per operation kind, and worked examples in both
    /// supported languages. The JSON-only contract is advisory; the reply
    /// interpreter enforces nothing less than a full fallback.
    pub fn system_prompt(&self) -> String {
        let field_list = self
            .schema
            .fields
            .iter()
            .map(|f| format!("{} ({})", f.name, f.kind))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You are an AI assistant EXCLUSIVELY for a data grid of reporting templates. You MUST ONLY respond to questions and requests related to the grid data, filtering, highlighting, sorting, grouping, and analysis of the reporting templates.

STRICT RULES:
- ONLY answer questions about the grid data and reporting templates
- REFUSE to answer any questions unrelated to the grid (general knowledge, etc.)
- If asked about non-grid topics, respond with: "I can only help with questions about the reporting templates grid. Please ask about the data, filtering, highlighting, or analysis of the templates."

RESPONSE FORMATS:
- For GRID OPERATIONS (highlight, filter, sort, group, clear): return JSON only, nothing around it
- For QUESTIONS about the templates: return natural language text
- For SUMMARY/ANALYSIS of template data: return natural language with statistics

Fields available: {field_list}

GRID OPERATIONS (return JSON):
- "highlight locked templates" -> {{"messages": ["Highlighted locked templates"], "highlight": [{{"logic": "and", "filters": [{{"field": "isLocked", "operator": "eq", "value": true}}], "cells": {{}}}}]}}
- "marker låste maler" -> {{"messages": ["Markerte låste maler"], "highlight": [{{"logic": "and", "filters": [{{"field": "isLocked", "operator": "eq", "value": true}}], "cells": {{}}}}]}}
- "show templates by Loknath Mishra" -> {{"messages": ["Filtered templates by Loknath Mishra"], "filter": {{"logic": "and", "filters": [{{"field": "ownerName", "operator": "eq", "value": "Loknath Mishra"}}]}}}}
- "vis bare låste maler" -> {{"messages": ["Filtrerte låste maler"], "filter": {{"logic": "and", "filters": [{{"field": "isLocked", "operator": "eq", "value": true}}]}}}}
- "sort by template name" -> {{"messages": ["Sorted by template name"], "sort": [{{"field": "templateName", "dir": "asc"}}]}}
- "sorter etter malnavn" -> {{"messages": ["Sortert etter malnavn"], "sort": [{{"field": "templateName", "dir": "asc"}}]}}
- "group templates by owner" -> {{"messages": ["Grouped templates by owner"], "group": [{{"field": "ownerName", "dir": "asc"}}]}}
- "grupper maler etter eier" -> {{"messages": ["Grupperte maler etter eier"], "group": [{{"field": "ownerName", "dir": "asc"}}]}}
- "clear everything" -> {{"messages": ["Cleared all grid operations"], "filter": null, "highlight": [], "sort": [], "group": []}}

QUESTIONS ABOUT TEMPLATES (return natural text):
- "Who owns the most templates?"
- "What is template 1198?"
- "Analyze template distribution by owner"

Available operators: eq, neq, gt, gte, lt, lte, contains, startswith, endswith"#
        )
    }

    fn summary_prompt(&self, instruction: &str, records: &[Record]) -> String {
        if records.is_empty() {
            return format!("{instruction}\n\n{NO_DATA_ANALYSIS_NOTE}");
        }
        format!(
            "{instruction}\n\n\
             Analyze the following reporting template data and provide comprehensive insights:\n\n\
             {}\n\n\
             Respond in natural language with clear, actionable insights.",
            self.digest(records)
        )
    }

    fn data_query_prompt(&self, instruction: &str, records: &[Record]) -> String {
        if records.is_empty() {
            return format!("{instruction}\n\n{NO_DATA_QUERY_NOTE}");
        }
        let serialized =
            serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
        format!(
            "{instruction}\n\n\
             Answer the question using the following reporting template data:\n\
             GRID DATA ({} templates):\n\
             {serialized}\n\
             Respond in natural language with clear and accurate information.",
            records.len()
        )
    }

    /// A deterministic statistical digest of the record set: per-field value
    /// breakdowns with percentages (top five, ties broken by first
    /// appearance), boolean splits, and numeric min/max/sum/mean. Same
    /// records in, same bytes out.
    pub fn digest(&self, records: &[Record]) -> String {
        let total = records.len();
        let mut out = String::new();
        let _ = writeln!(out, "GRID DATA DIGEST ({total} records):");

        for field in &self.schema.fields {
            match field.kind {
                FieldKind::Text | FieldKind::Date => {
                    let counts = value_counts(records, &field.name);
                    if counts.is_empty() {
                        continue;
                    }
                    let shown = counts
                        .iter()
                        .take(DIGEST_TOP_N)
                        .map(|(value, count)| {
                            format!("{value} ({count}, {})", percent(*count, total))
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    let suffix = if counts.len() > DIGEST_TOP_N {
                        format!(" and {} more values", counts.len() - DIGEST_TOP_N)
                    } else {
                        String::new()
                    };
                    let _ = writeln!(out, "- {}: {shown}{suffix}", field.name);
                }
                FieldKind::Boolean => {
                    let mut yes = 0usize;
                    let mut no = 0usize;
                    for record in records {
                        match record.get(&field.name).and_then(|v| v.as_bool()) {
                            Some(true) => yes += 1,
                            Some(false) => no += 1,
                            None => {}
                        }
                    }
                    if yes + no == 0 {
                        continue;
                    }
                    let _ = writeln!(
                        out,
                        "- {}: true {yes} ({}), false {no} ({})",
                        field.name,
                        percent(yes, total),
                        percent(no, total)
                    );
                }
                FieldKind::Number => {
                    let values: Vec<f64> = records
                        .iter()
                        .filter_map(|r| r.get(&field.name).and_then(|v| v.as_number()))
                        .collect();
                    if values.is_empty() {
                        continue;
                    }
                    let sum: f64 = values.iter().sum();
                    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let mean = sum / values.len() as f64;
                    let _ = writeln!(
                        out,
                        "- {}: count {}, min {}, max {}, sum {}, mean {:.2}",
                        field.name,
                        values.len(),
                        format_number(min),
                        format_number(max),
                        format_number(sum),
                        mean
                    );
                }
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// Count distinct values of one field, preserving first-encounter order so
/// a later stable sort by count breaks ties deterministically.
fn value_counts(records: &[Record], field: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for record in records {
        let Some(text) = record.get(field).and_then(|v| v.as_text()) else {
            continue;
        };
        match counts.iter_mut().find(|(value, _)| *value == text) {
            Some((_, count)) => *count += 1,
            None => counts.push((text, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}
