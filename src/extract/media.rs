use scraper::Html;

use super::strategy::{non_empty, select_all, FallbackChain, Probe, Strategy};

static TITLE: FallbackChain<String> = FallbackChain {
    field: "title",
    strategies: &[
        Strategy::new(Probe::Text("h1.head"), non_empty),
        Strategy::new(Probe::Text("div.size20.bold.mb-8"), non_empty),
        Strategy::new(Probe::Text(".auto-content_title"), non_empty),
        Strategy::new(Probe::Text(".heading"), non_empty),
    ],
};

static IMAGE: FallbackChain<String> = FallbackChain {
    field: "image_url",
    strategies: &[
        Strategy::new(Probe::Attr(".photo-620x465 img", "src"), non_empty),
        Strategy::new(Probe::Attr("img.outline.mhide", "src"), non_empty),
        Strategy::new(Probe::Attr("img.carousel-img", "src"), non_empty),
    ],
};

const GALLERY: &str = ".thumbnails img, .photo-620x465 img, .carousel-img";

pub fn title(document: &Html) -> String {
    TITLE.resolve_or(document, String::new())
}

pub fn image_url(document: &Html) -> String {
    IMAGE.resolve_or(document, String::new())
}

/// Thumbnails plus gallery images; an element matched by several parts of
/// the selector is counted once.
pub fn image_count(document: &Html) -> u32 {
    u32::try_from(select_all(document, GALLERY).len()).unwrap_or(u32::MAX)
}
