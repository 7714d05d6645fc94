//! Interrupted run: stop before the next chunk, keep what was fetched.
//!
//! Lives in its own test binary because the shutdown flag is process-wide.

mod common;

use acc_extract_core::{ProgressContext, install_signal_handlers, is_shutdown_requested};
use acc_extract_docs::run_with_transport;
use tempfile::TempDir;

use common::{ScriptedApi, config, data_rows, no_sleep};

#[test]
fn signal_after_first_chunk_writes_partial_output() {
    install_signal_handlers().unwrap();

    let dir = TempDir::new().unwrap();
    // SIGINT arrives while the first chunk's version details are fetched
    let api = ScriptedApi::with_override(|req, urns| {
        if req.url.ends_with("versions:batch-get") && urns.first().is_some_and(|u| u == "A") {
            signal_hook::low_level::raise(signal_hook::consts::SIGINT).unwrap();
        }
        None
    });
    let cfg = config(&dir, 2);

    let summary =
        run_with_transport(&cfg, Box::new(api.clone()), no_sleep, &ProgressContext::hidden())
            .unwrap();

    assert!(is_shutdown_requested());
    assert!(summary.interrupted);
    assert_eq!(summary.fetch.chunks, 1);
    assert_eq!(summary.fetch.chunks_failed, 0);
    assert_eq!(summary.output.documents, 2);
    // the second chunk (C) was never requested
    assert_eq!(api.count("/commands"), 1);
    assert_eq!(api.count("versions:batch-get"), 1);

    let docs = data_rows(&cfg.output_dir.join("documents_documents.csv"));
    assert_eq!(docs.len(), 2);
    assert!(docs[0].starts_with("A,P1,"));
    assert!(docs[1].starts_with("B,P1,"));
    assert_eq!(
        data_rows(&cfg.output_dir.join("documents_custom_attributes.csv")).len(),
        2
    );
    assert!(!cfg.output_dir.join("documents_documents.csv.tmp").exists());
}
