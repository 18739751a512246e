use anyhow::{Result, anyhow, bail};
use scraper::{ElementRef, Html, Selector};

const GALLERY_CONTAINER: &str = "div#example-gallery";
const TUTORIAL_CONTAINER: &str = "div.row";
const ANCHOR: &str = "a";
const GALLERY_CATEGORY: &str = "span > p";
const TUTORIAL_ANCHOR: &str = "a.reference.internal";

/// One example-gallery link: target page plus the subject-area hint taken
/// from the nested span > p element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryAnchor {
    pub href: String,
    pub category: String,
}

/// One tutorial link: target page plus the anchor's own display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialAnchor {
    pub href: String,
    pub title: String,
}

/// Collect example-gallery anchors in document order. The first anchor in
/// the container is the gallery overview link, not an example, and is
/// always dropped.
pub fn gallery_anchors(html: &str) -> Result<Vec<GalleryAnchor>> {
    let document = Html::parse_document(html);
    let container = select_one(&document, GALLERY_CONTAINER)
        .ok_or_else(|| anyhow!("`{GALLERY_CONTAINER}` not found in gallery index page"))?;

    let anchor_selector = selector(ANCHOR)?;
    let category_selector = selector(GALLERY_CATEGORY)?;

    let mut anchors = Vec::new();
    for anchor in container.select(&anchor_selector).skip(1) {
        let href = match anchor.value().attr("href") {
            Some(href) => href.to_string(),
            None => bail!("gallery anchor without an href attribute"),
        };
        let category = match anchor.select(&category_selector).next() {
            Some(element) => element_text(element),
            None => bail!("gallery anchor `{href}` is missing its `{GALLERY_CATEGORY}` category"),
        };
        anchors.push(GalleryAnchor { href, category });
    }
    Ok(anchors)
}

/// Collect tutorial anchors in document order. Only anchors carrying the
/// `reference internal` class pair are entries; everything else in the row
/// is page chrome.
pub fn tutorial_anchors(html: &str) -> Result<Vec<TutorialAnchor>> {
    let document = Html::parse_document(html);
    let container = select_one(&document, TUTORIAL_CONTAINER)
        .ok_or_else(|| anyhow!("`{TUTORIAL_CONTAINER}` not found in tutorial page"))?;

    let anchor_selector = selector(TUTORIAL_ANCHOR)?;

    let mut anchors = Vec::new();
    for anchor in container.select(&anchor_selector) {
        let href = match anchor.value().attr("href") {
            Some(href) => href.to_string(),
            None => bail!("tutorial anchor without an href attribute"),
        };
        anchors.push(TutorialAnchor {
            href,
            title: element_text(anchor),
        });
    }
    Ok(anchors)
}

/// Extract the text of the first top-level heading in a detail page.
pub fn first_heading(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let heading = select_one(&document, "h1")
        .ok_or_else(|| anyhow!("no `h1` heading found in detail page"))?;
    Ok(element_text(heading))
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("invalid selector `{css}`: {err}"))
}

fn select_one<'a>(document: &'a Html, css: &'static str) -> Option<ElementRef<'a>> {
    let parsed = Selector::parse(css).ok()?;
    document.select(&parsed).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
