//! End-to-end integration test: build an index from a small FASTA, then run
//! a guide batch through the full analysis pipeline and check the result
//! shape.

use sirna_offtarget::builder::build_and_write_index;
use sirna_offtarget::orchestrator::{
    analyze_batch, AnalysisParameters, AnalysisRequest, CancellationToken, SirnaInput,
};

#[test]
fn build_then_predict_finds_the_planted_off_target() {
    let dir = tempfile::tempdir().unwrap();
    let fasta_path = dir.path().join("transcripts.fa");
    std::fs::write(
        &fasta_path,
        ">NM_planted gene=PLNT\n\
         AAAAAAAAAAGCUACGUAAAAAAAAAAAAAAAAAAAAAAAAAAAA\n\
         >NM_unrelated gene=OTHER\n\
         CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC\n",
    )
    .unwrap();

    let index_dir = dir.path().join("index");
    build_and_write_index(&fasta_path, &index_dir, 1, |_| {}).unwrap();

    let (store, index) = sirna_offtarget::builder::load_index(&index_dir).unwrap();
    assert_eq!(store.transcript_count(), 2);
    assert!(index.is_ready());

    let request = AnalysisRequest {
        sirnas: vec![SirnaInput {
            name: "guide-1".to_owned(),
            sequence: "UUUACGUAGCAAAAAAAAAA".to_owned(),
        }],
        parameters: AnalysisParameters {
            energy_threshold: 0.0,
            ..AnalysisParameters::default()
        },
        parallelism: None,
        max_candidates: 50_000,
    };
    let token = CancellationToken::new();
    let results = analyze_batch(&request, &index, &store, &token, |_| {}).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result
        .offtargets
        .iter()
        .any(|hit| hit.transcript_id == "NM_planted"));
    assert!(result
        .offtargets
        .iter()
        .all(|hit| hit.transcript_id != "NM_unrelated"));
    assert_eq!(
        result.total_offtargets,
        result.high_risk_count + result.moderate_risk_count + result.low_risk_count
    );
}

#[test]
fn csv_and_json_exports_round_trip_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let fasta_path = dir.path().join("transcripts.fa");
    std::fs::write(
        &fasta_path,
        ">NM_planted gene=PLNT\nAAAAAAAAAAGCUACGUAAAAAAAAAAAAAAAAAAAAAAAAAAAA\n",
    )
    .unwrap();

    let index_dir = dir.path().join("index");
    build_and_write_index(&fasta_path, &index_dir, 1, |_| {}).unwrap();
    let (store, index) = sirna_offtarget::builder::load_index(&index_dir).unwrap();

    let request = AnalysisRequest {
        sirnas: vec![SirnaInput {
            name: "guide-1".to_owned(),
            sequence: "UUUACGUAGCAAAAAAAAAA".to_owned(),
        }],
        parameters: AnalysisParameters {
            energy_threshold: 0.0,
            ..AnalysisParameters::default()
        },
        parallelism: None,
        max_candidates: 50_000,
    };
    let token = CancellationToken::new();
    let results = analyze_batch(&request, &index, &store, &token, |_| {}).unwrap();

    let csv_path = dir.path().join("out.csv");
    let json_path = dir.path().join("out.json");
    sirna_offtarget::io::write_csv_batch(&csv_path, &results).unwrap();
    sirna_offtarget::io::write_json(&json_path, &results).unwrap();

    assert!(csv_path.exists());
    let json_contents = std::fs::read_to_string(&json_path).unwrap();
    assert!(json_contents.contains("\"offtargets\""));
}

#[test]
fn batch_size_bounds_are_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let fasta_path = dir.path().join("transcripts.fa");
    std::fs::write(&fasta_path, ">T1\nACGUACGUACGUACGUACGU\n").unwrap();

    let index_dir = dir.path().join("index");
    build_and_write_index(&fasta_path, &index_dir, 1, |_| {}).unwrap();
    let (store, index) = sirna_offtarget::builder::load_index(&index_dir).unwrap();

    let request = AnalysisRequest {
        sirnas: vec![],
        parameters: AnalysisParameters::default(),
        parallelism: None,
        max_candidates: 50_000,
    };
    let token = CancellationToken::new();
    assert!(analyze_batch(&request, &index, &store, &token, |_| {}).is_err());
}
