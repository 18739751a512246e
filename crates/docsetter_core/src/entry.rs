use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::extract::{GalleryAnchor, TutorialAnchor, first_heading};

/// Literal values stored in the searchIndex `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Sample,
    Guide,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "Sample",
            Self::Guide => "Guide",
        }
    }
}

/// One search-index row: human-readable title, entry kind, and the page
/// path relative to the Documents root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub kind: EntryKind,
    pub path: String,
}

/// Normalize a gallery anchor into a Sample entry. This is the one step
/// with a side effect: the referenced detail page is read to get its
/// heading text.
pub fn sample_entry(documents_dir: &Path, anchor: &GalleryAnchor) -> Result<IndexEntry> {
    let path = sample_path(&anchor.href);
    let heading = page_heading(documents_dir, &path)?;
    Ok(IndexEntry {
        name: format!("{} - {}", anchor.category, heading),
        kind: EntryKind::Sample,
        path,
    })
}

/// Normalize a tutorial anchor into a Guide entry. Tutorial hrefs are
/// already root-relative and their display text is already the title.
pub fn guide_entry(anchor: &TutorialAnchor) -> IndexEntry {
    IndexEntry {
        name: anchor.title.clone(),
        kind: EntryKind::Guide,
        path: anchor.href.clone(),
    }
}

/// Gallery hrefs are relative links of the form `./<page>.html`; the parent
/// marker is stripped and the remainder rooted under examples/.
pub fn sample_path(href: &str) -> String {
    let stripped = href.strip_prefix("./").unwrap_or(href);
    format!("examples/{stripped}")
}

/// Strip the page-template artifacts from a heading: the right single
/// quotation mark becomes an ASCII apostrophe and the pilcrow permalink
/// marker is dropped.
pub fn clean_heading(text: &str) -> String {
    text.replace('\u{2019}', "'").replace('\u{b6}', "")
}

fn page_heading(documents_dir: &Path, relative_path: &str) -> Result<String> {
    let page_path = documents_dir.join(relative_path);
    let html = fs::read_to_string(&page_path)
        .with_context(|| format!("failed to read detail page {}", page_path.display()))?;
    let heading = first_heading(&html)
        .with_context(|| format!("unexpected structure in {}", page_path.display()))?;
    Ok(clean_heading(&heading))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{EntryKind, clean_heading, guide_entry, sample_entry, sample_path};
    use crate::extract::{GalleryAnchor, TutorialAnchor};

    #[test]
    fn clean_heading_normalizes_template_artifacts() {
        assert_eq!(
            clean_heading("Plotting model\u{2019}s residuals\u{b6}"),
            "Plotting model's residuals",
        );
        assert_eq!(clean_heading("Scatter Plot"), "Scatter Plot");
    }

    #[test]
    fn sample_path_strips_parent_marker() {
        assert_eq!(sample_path("./scatter.html"), "examples/scatter.html");
        assert_eq!(sample_path("scatter.html"), "examples/scatter.html");
    }

    #[test]
    fn sample_entry_composes_category_and_cleaned_heading() {
        let temp = tempdir().expect("tempdir");
        let documents = temp.path().join("Documents");
        fs::create_dir_all(documents.join("examples")).expect("create examples");
        fs::write(
            documents.join("examples").join("scatter.html"),
            "<html><body><h1>Scatter Plot\u{b6}</h1></body></html>",
        )
        .expect("write detail page");

        let anchor = GalleryAnchor {
            href: "./scatter.html".to_string(),
            category: "Categorical".to_string(),
        };
        let entry = sample_entry(&documents, &anchor).expect("normalize");
        assert_eq!(entry.name, "Categorical - Scatter Plot");
        assert_eq!(entry.kind, EntryKind::Sample);
        assert_eq!(entry.path, "examples/scatter.html");
    }

    #[test]
    fn sample_entry_fails_when_detail_page_is_missing() {
        let temp = tempdir().expect("tempdir");
        let anchor = GalleryAnchor {
            href: "./gone.html".to_string(),
            category: "Categorical".to_string(),
        };
        let err = sample_entry(temp.path(), &anchor).expect_err("must fail");
        assert!(err.to_string().contains("failed to read detail page"));
    }

    #[test]
    fn sample_entry_fails_when_detail_page_has_no_heading() {
        let temp = tempdir().expect("tempdir");
        let documents = temp.path().join("Documents");
        fs::create_dir_all(documents.join("examples")).expect("create examples");
        fs::write(
            documents.join("examples").join("bare.html"),
            "<html><body><p>no heading</p></body></html>",
        )
        .expect("write detail page");

        let anchor = GalleryAnchor {
            href: "./bare.html".to_string(),
            category: "Categorical".to_string(),
        };
        let err = sample_entry(&documents, &anchor).expect_err("must fail");
        assert!(err.to_string().contains("unexpected structure"));
    }

    #[test]
    fn guide_entry_uses_anchor_text_and_href_verbatim() {
        let anchor = TutorialAnchor {
            href: "tutorial/aesthetics.html".to_string(),
            title: "Controlling figure aesthetics".to_string(),
        };
        let entry = guide_entry(&anchor);
        assert_eq!(entry.name, "Controlling figure aesthetics");
        assert_eq!(entry.kind, EntryKind::Guide);
        assert_eq!(entry.path, "tutorial/aesthetics.html");
    }
}
