use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::config::DocsetConfig;
use crate::entry::{IndexEntry, guide_entry, sample_entry};
use crate::extract::{gallery_anchors, tutorial_anchors};
use crate::index::write_entries;
use crate::runtime::ResolvedPaths;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    pub db_path: String,
    pub samples: usize,
    pub guides: usize,
    pub inserted_rows: usize,
    pub skipped_rows: usize,
}

/// One-shot index generation: read the two index documents, normalize
/// every entry, and insert the lot in a single transaction. Any failure
/// anywhere aborts the run; the transaction rollback means no partial
/// index is left behind.
pub fn generate(paths: &ResolvedPaths, config: &DocsetConfig) -> Result<GenerateReport> {
    if let Some(script) = config.docset.helper_script.as_deref() {
        run_helper_script(script, &paths.docset_root)?;
    }

    let gallery_html = fs::read_to_string(&paths.gallery_index_path).with_context(|| {
        format!(
            "failed to read gallery index {}",
            paths.gallery_index_path.display()
        )
    })?;
    let gallery = gallery_anchors(&gallery_html).with_context(|| {
        format!(
            "unexpected structure in {}",
            paths.gallery_index_path.display()
        )
    })?;

    let mut entries: Vec<IndexEntry> = Vec::with_capacity(gallery.len());
    for anchor in &gallery {
        entries.push(sample_entry(&paths.documents_dir, anchor)?);
    }
    let samples = entries.len();

    let tutorial_html = fs::read_to_string(&paths.tutorial_path).with_context(|| {
        format!(
            "failed to read tutorial page {}",
            paths.tutorial_path.display()
        )
    })?;
    let tutorial = tutorial_anchors(&tutorial_html)
        .with_context(|| format!("unexpected structure in {}", paths.tutorial_path.display()))?;
    for anchor in &tutorial {
        entries.push(guide_entry(anchor));
    }
    let guides = entries.len() - samples;

    let report = write_entries(&paths.db_path, &entries)?;

    Ok(GenerateReport {
        db_path: paths.db_path.to_string_lossy().replace('\\', "/"),
        samples,
        guides,
        inserted_rows: report.inserted_rows,
        skipped_rows: report.skipped_rows,
    })
}

/// Run the preparatory helper script that renders the documentation tree
/// and the database shell. The script runs from the directory containing
/// the docset bundle; its output is forwarded as-is.
pub fn run_helper_script(script: &Path, docset_root: &Path) -> Result<()> {
    let workdir = docset_root.parent().unwrap_or(docset_root);
    let program = if script.is_absolute() {
        script.to_path_buf()
    } else {
        workdir.join(script)
    };

    let output = Command::new(&program)
        .current_dir(workdir)
        .output()
        .with_context(|| format!("failed to execute {}", program.display()))?;
    if !output.stdout.is_empty() {
        print!("{}", String::from_utf8_lossy(&output.stdout));
    }
    if !output.stderr.is_empty() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
    }
    if !output.status.success() {
        bail!(
            "helper script {} exited with status {}",
            program.display(),
            output.status.code().unwrap_or(1),
        );
    }
    Ok(())
}
