//! Shared extraction of candidate records from validated uploads.
//!
//! Structural validation already ran in `deckstash_core::upload`; this
//! module applies per-row semantics. Row-level problems never abort the
//! import: each one becomes an error message on the summary and the row
//! is skipped, so a partially-invalid batch still previews cleanly.

use deckstash_core::import::{parse_price_cents, CandidateRecord, ImportOptions, ImportSummary};
use deckstash_core::upload::{candidate_from_json, ParsedUpload, UploadKind};

/// Extract candidate records from an upload, up to the options' row
/// limit, accumulating per-row problems into `summary`.
pub fn candidates_from_upload(
    upload: &ParsedUpload,
    options: &ImportOptions,
    summary: &mut ImportSummary,
) -> Vec<CandidateRecord> {
    match upload.kind() {
        UploadKind::Csv => candidates_from_csv(upload, options, summary),
        UploadKind::Json => candidates_from_json(upload, options, summary),
    }
}

// ── Delimited text ───────────────────────────────────────────────────

fn candidates_from_csv(
    upload: &ParsedUpload,
    options: &ImportOptions,
    summary: &mut ImportSummary,
) -> Vec<CandidateRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(upload.reader());

    // Lower-cased header name -> column index.
    let columns: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        Err(e) => {
            summary.error("header", e.to_string());
            return Vec::new();
        }
    };
    let column = |name: &str| columns.iter().position(|c| c == name);

    let name_col = column("name");
    let set_col = column("set");
    let number_col = column("number");
    let rarity_col = column("rarity");
    let set_name_col = column("set_name");
    let image_col = column("image_url");
    let price_col = column("price");
    let type_col = column("type");
    let text_col = column("text");
    let id_col = column("id");

    let mut records = Vec::new();
    for (i, row) in reader.records().take(options.effective_limit()).enumerate() {
        let row_number = i + 1;
        let context = format!("row {row_number}");

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                summary.error(&context, e.to_string());
                continue;
            }
        };
        let cell = |col: Option<usize>| -> Option<String> {
            col.and_then(|c| row.get(c))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let (Some(name), Some(set_code), Some(collector_number)) =
            (cell(name_col), cell(set_col), cell(number_col))
        else {
            summary.error(&context, "missing required field 'name', 'set', or 'number'");
            continue;
        };

        let price_cents = match cell(price_col) {
            Some(raw) => match parse_price_cents(&raw) {
                Ok(cents) => Some(cents),
                Err(msg) => {
                    summary.error(&context, msg);
                    continue;
                }
            },
            None => None,
        };

        records.push(CandidateRecord {
            external_id: cell(id_col),
            name,
            set_code,
            set_name: cell(set_name_col),
            collector_number,
            rarity: cell(rarity_col),
            image_url: cell(image_col),
            price_cents,
            card_type: cell(type_col),
            rules_text: cell(text_col),
        });
    }

    records
}

// ── Array-of-objects JSON ────────────────────────────────────────────

fn candidates_from_json(
    upload: &ParsedUpload,
    options: &ImportOptions,
    summary: &mut ImportSummary,
) -> Vec<CandidateRecord> {
    let root: serde_json::Value = match serde_json::from_reader(upload.reader()) {
        Ok(root) => root,
        Err(e) => {
            summary.error("file", format!("invalid JSON: {e}"));
            return Vec::new();
        }
    };
    let Some(elements) = root.as_array() else {
        summary.error("file", "the root JSON value must be an array");
        return Vec::new();
    };

    let mut records = Vec::new();
    for (i, element) in elements.iter().take(options.effective_limit()).enumerate() {
        let context = format!("element {}", i + 1);

        let Some(object) = element.as_object() else {
            summary.error(&context, "not an object");
            continue;
        };
        let Some(mut candidate) = candidate_from_json(object) else {
            summary.error(&context, "missing required field 'name', 'set', or 'number'");
            continue;
        };

        if let Some(raw) = object.get("price").and_then(|v| v.as_str()) {
            match parse_price_cents(raw) {
                Ok(cents) => candidate.price_cents = Some(cents),
                Err(msg) => {
                    summary.error(&context, msg);
                    continue;
                }
            }
        }

        records.push(candidate);
    }

    records
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use deckstash_core::upload::validate_upload;

    fn options(limit: Option<usize>) -> ImportOptions {
        ImportOptions {
            dry_run: true,
            upsert: true,
            limit,
            acting_user_id: None,
            set_code: None,
        }
    }

    fn upload(filename: &str, data: &[u8]) -> ParsedUpload {
        validate_upload(filename, data.to_vec(), 500).unwrap()
    }

    #[test]
    fn csv_rows_map_to_candidates() {
        let upload = upload(
            "cards.csv",
            b"name,set,number,rarity,price\nElsa,TFC,4,Rare,1.99\nMaui,TFC,12,Common,",
        );
        let mut summary = ImportSummary::new("lorcana", true);
        let records = candidates_from_upload(&upload, &options(None), &mut summary);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Elsa");
        assert_eq!(records[0].price_cents, Some(199));
        assert_eq!(records[1].price_cents, None);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn csv_blank_required_field_is_a_row_error_not_a_failure() {
        let upload = upload("cards.csv", b"name,set,number\nElsa,TFC,4\n,TFC,5\nMaui,TFC,6");
        let mut summary = ImportSummary::new("lorcana", true);
        let records = candidates_from_upload(&upload, &options(None), &mut summary);

        assert_eq!(records.len(), 2);
        assert_eq!(summary.errors, 1);
        assert!(summary.messages[0].starts_with("Error [row 2]"));
    }

    #[test]
    fn csv_bad_price_skips_the_row() {
        let upload = upload("cards.csv", b"name,set,number,price\nElsa,TFC,4,cheap");
        let mut summary = ImportSummary::new("lorcana", true);
        let records = candidates_from_upload(&upload, &options(None), &mut summary);

        assert!(records.is_empty());
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn csv_respects_row_limit() {
        let upload = upload("cards.csv", b"name,set,number\nA,TFC,1\nB,TFC,2\nC,TFC,3");
        let mut summary = ImportSummary::new("lorcana", true);
        let records = candidates_from_upload(&upload, &options(Some(2)), &mut summary);

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn json_elements_map_to_candidates() {
        let upload = upload(
            "cards.json",
            br#"[{"name":"Elsa","set":"TFC","number":"4","rarity":"Rare","price":"2.50"}]"#,
        );
        let mut summary = ImportSummary::new("lorcana", true);
        let records = candidates_from_upload(&upload, &options(None), &mut summary);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].set_code, "TFC");
        assert_eq!(records[0].price_cents, Some(250));
    }

    #[test]
    fn json_alternate_field_names_map() {
        let upload = upload(
            "cards.json",
            br#"[{"name":"Elsa","set_code":"TFC","collector_number":"4"}]"#,
        );
        let mut summary = ImportSummary::new("lorcana", true);
        let records = candidates_from_upload(&upload, &options(None), &mut summary);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].collector_number, "4");
    }
}
