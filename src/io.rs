//! FASTA ingestion and CSV export, mirroring this codebase's own `io`
//! module: a thin layer over `bio::io::fasta` for reading, and `csv` for
//! writing a flat tabular view of results next to the JSON one.

use std::io::Write;
use std::path::Path;

use bio::io::fasta;

use crate::codec::Rna;
use crate::error::SirnaResult;
use crate::orchestrator::OffTargetRecord;
use crate::transcript::{Transcript, TranscriptStore};

/// Pull a `gene=` or `symbol=` token out of a FASTA description line, falling
/// back to the record id itself when neither is present.
fn extract_gene_symbol(id: &str, description: Option<&str>) -> String {
    if let Some(desc) = description {
        for token in desc.split_whitespace() {
            for prefix in ["gene=", "symbol=", "gene_symbol="] {
                if let Some(rest) = token.strip_prefix(prefix) {
                    if !rest.is_empty() {
                        return rest.to_owned();
                    }
                }
            }
        }
    }
    id.to_owned()
}

fn extract_gene_id(description: Option<&str>) -> Option<String> {
    description.and_then(|desc| {
        desc.split_whitespace().find_map(|token| {
            token
                .strip_prefix("gene_id=")
                .map(|rest| rest.to_owned())
                .filter(|s| !s.is_empty())
        })
    })
}

/// Read every record from a FASTA file into a [`TranscriptStore`].
///
/// Records whose sequence fails RNA normalization (an unexpected character
/// outside `{A,C,G,U,T}`) are logged and skipped rather than aborting the
/// whole build, matching the io module's "findings" leniency for malformed
/// lines.
pub fn load_transcripts_fasta(path: &Path) -> SirnaResult<TranscriptStore> {
    let reader = fasta::Reader::from_file(path).map_err(crate::error::SirnaError::from)?;
    let mut store = TranscriptStore::new();

    for result in reader.records() {
        let record = result?;
        let id = record.id().to_owned();
        let sequence = match Rna::normalize(std::str::from_utf8(record.seq()).unwrap_or("")) {
            Ok(seq) => seq,
            Err(e) => {
                log::warn!("skipping transcript {id}: {e}");
                continue;
            }
        };

        let gene_symbol = extract_gene_symbol(&id, record.desc());
        let gene_id = extract_gene_id(record.desc());
        store.put(Transcript::new(id, gene_symbol, gene_id, sequence, None, None));
    }

    Ok(store)
}

/// Write off-target records to CSV, one row per record, with the numeric
/// formatting the result surface documents: ΔG to 2 decimals, risk score to
/// 3, percentages (`au_content`) to 2.
pub fn write_csv(path: &Path, records: &[OffTargetRecord]) -> SirnaResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = csv::Writer::from_writer(std::io::BufWriter::new(file));

    writer.write_record([
        "transcript_id",
        "gene_symbol",
        "position",
        "delta_g",
        "risk_score",
        "seed_matches",
        "mismatches",
        "wobbles",
        "au_content",
        "structure_accessibility",
    ])?;

    for record in records {
        writer.write_record(&[
            record.transcript_id.clone(),
            record.gene_symbol.clone(),
            record.position.to_string(),
            format!("{:.2}", record.delta_g),
            format!("{:.3}", record.risk_score),
            record.seed_matches.to_string(),
            record.mismatches.to_string(),
            record.wobbles.to_string(),
            format!("{:.2}", record.au_content),
            format!("{:.2}", record.structure_accessibility),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write any of the engine's serde-derived result types as pretty JSON, the
/// canonical wire format (§6): the engine's serde types are the schema, with
/// no translation layer.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> SirnaResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let body = serde_json::to_string_pretty(value).map_err(|e| {
        crate::error::SirnaError::IndexCorrupt(format!("failed to serialize result: {e}"))
    })?;
    writer.write_all(body.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write a batch of per-guide results to CSV, one row per off-target with a
/// leading `sirna_name` column identifying which guide it came from.
pub fn write_csv_batch(path: &Path, results: &[crate::orchestrator::AnalysisResult]) -> SirnaResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = csv::Writer::from_writer(std::io::BufWriter::new(file));

    writer.write_record([
        "sirna_name",
        "transcript_id",
        "gene_symbol",
        "position",
        "delta_g",
        "risk_score",
        "seed_matches",
        "mismatches",
        "wobbles",
        "au_content",
        "structure_accessibility",
    ])?;

    for result in results {
        for record in &result.offtargets {
            writer.write_record(&[
                result.sirna_name.clone(),
                record.transcript_id.clone(),
                record.gene_symbol.clone(),
                record.position.to_string(),
                format!("{:.2}", record.delta_g),
                format!("{:.3}", record.risk_score),
                record.seed_matches.to_string(),
                record.mismatches.to_string(),
                record.wobbles.to_string(),
                format!("{:.2}", record.au_content),
                format!("{:.2}", record.structure_accessibility),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

impl From<csv::Error> for crate::error::SirnaError {
    fn from(e: csv::Error) -> Self {
        crate::error::SirnaError::IndexCorrupt(format!("csv error: {e}"))
    }
}
