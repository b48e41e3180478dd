use std::collections::{HashSet, VecDeque};

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::adblock::is_advertising_url;
use crate::models::{PreviewResult, VideoDescriptor};

// ── Constants ────────────────────────────────────────────────────────────────

/// Inline `<img>` tags smaller than this on either side are skipped.
pub const MIN_IMAGE_SIZE: f64 = 50.0;
const VIDEO_MIME_PREFIX: &str = "video/";

// ── Lazy static selectors ────────────────────────────────────────────────────

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| selector("title"));
static OG_TITLE_SEL: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:title']"));

static DESCRIPTION_SEL: Lazy<Selector> = Lazy::new(|| selector("meta[name=description]"));
static DESCRIPTION_CAPITALIZED_SEL: Lazy<Selector> =
    Lazy::new(|| selector("meta[name=Description]"));
static OG_DESCRIPTION_SEL: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:description']"));

static MEDIUM_SEL: Lazy<Selector> = Lazy::new(|| selector("meta[name=medium]"));
static OG_TYPE_SEL: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:type']"));

static OG_IMAGE_SEL: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:image']"));
static IMAGE_SRC_SEL: Lazy<Selector> = Lazy::new(|| selector("link[rel=image_src]"));
static IMG_SEL: Lazy<Selector> = Lazy::new(|| selector("img"));

static OG_VIDEO_SEL: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:video']"));
static OG_VIDEO_TYPE_SEL: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:video:type']"));
static OG_VIDEO_SECURE_URL_SEL: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:video:secure_url']"));
static OG_VIDEO_WIDTH_SEL: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:video:width']"));
static OG_VIDEO_HEIGHT_SEL: Lazy<Selector> =
    Lazy::new(|| selector("meta[property='og:video:height']"));

// ── Fallback rules ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Pick {
    /// Concatenated text of every matching node.
    Text,
    /// Attribute of the first matching node.
    Attr(&'static str),
}

struct Rule {
    selector: &'static Lazy<Selector>,
    pick: Pick,
    /// Whether a picked value ends the chain.
    keep: fn(&str) -> bool,
}

fn any(_: &str) -> bool {
    true
}

fn non_empty(value: &str) -> bool {
    !value.is_empty()
}

static TITLE_RULES: [Rule; 2] = [
    Rule { selector: &TITLE_SEL, pick: Pick::Text, keep: non_empty },
    Rule { selector: &OG_TITLE_SEL, pick: Pick::Attr("content"), keep: any },
];

// `name=Description` is matched case-sensitively, so it is its own rule.
static DESCRIPTION_RULES: [Rule; 3] = [
    Rule { selector: &DESCRIPTION_SEL, pick: Pick::Attr("content"), keep: any },
    Rule { selector: &DESCRIPTION_CAPITALIZED_SEL, pick: Pick::Attr("content"), keep: any },
    Rule { selector: &OG_DESCRIPTION_SEL, pick: Pick::Attr("content"), keep: any },
];

fn apply_rule(document: &Html, rule: &Rule) -> Option<String> {
    match rule.pick {
        Pick::Text => {
            let mut matched = false;
            let mut text = String::new();
            for el in document.select(rule.selector) {
                matched = true;
                text.extend(el.text());
            }
            matched.then_some(text)
        }
        Pick::Attr(name) => document
            .select(rule.selector)
            .next()
            .and_then(|el| el.value().attr(name))
            .map(|s| s.to_string()),
    }
}

/// Runs `rules` in order and returns the first value its rule keeps.
fn first_match(document: &Html, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|rule| {
        apply_rule(document, rule).filter(|value| (rule.keep)(value))
    })
}

// ── Main extraction pipeline ─────────────────────────────────────────────────

/// Builds the preview record for a fully received HTML page.
///
/// Never fails: malformed markup just leaves fields absent.
pub fn extract_preview(html: &str, page_url: &str) -> PreviewResult {
    let document = Html::parse_document(html);
    let base = match Url::parse(page_url.trim()) {
        Ok(base) => Some(base),
        Err(e) => {
            warn!(url = page_url, error = %e, "page URL is not absolute, dropping relative links");
            None
        }
    };
    let base = base.as_ref();

    let images = images(&document, base);
    let videos = videos(&document, base);
    debug!(
        url = page_url,
        images = images.len(),
        videos = videos.as_ref().map(Vec::len),
        "extracted page metadata"
    );

    PreviewResult::page(
        page_url,
        title(&document),
        description(&document),
        media_type(&document),
        images,
        videos,
    )
}

// ── Title / description / media type ─────────────────────────────────────────

/// `<title>` text as written, falling back to `og:title` only when it is empty.
pub fn title(document: &Html) -> Option<String> {
    first_match(document, &TITLE_RULES)
}

/// First present description meta tag. A present but empty `content` still wins.
pub fn description(document: &Html) -> Option<String> {
    first_match(document, &DESCRIPTION_RULES)
}

/// `meta[name=medium]` when the tag exists (with `image` read as `photo`),
/// otherwise `og:type`. `None` leaves the record-level default in place.
pub fn media_type(document: &Html) -> Option<String> {
    if let Some(node) = document.select(&MEDIUM_SEL).next() {
        return node.value().attr("content").map(|content| {
            if content == "image" {
                "photo".to_string()
            } else {
                content.to_string()
            }
        });
    }
    first_content(document, &OG_TYPE_SEL)
}

// ── Images ───────────────────────────────────────────────────────────────────

/// OpenGraph images, else `link[rel=image_src]`, else filtered inline `<img>` tags.
pub fn images(document: &Html, base: Option<&Url>) -> Vec<String> {
    let declared: Vec<String> = document
        .select(&OG_IMAGE_SEL)
        .filter_map(|el| el.value().attr("content"))
        .filter_map(|src| resolve_url(base, src))
        .collect();
    if !declared.is_empty() {
        return declared;
    }

    let linked = document
        .select(&IMAGE_SRC_SEL)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(|href| resolve_url(base, href));
    if let Some(linked) = linked {
        return vec![linked];
    }

    inline_images(document, base)
}

fn inline_images(document: &Html, base: Option<&Url>) -> Vec<String> {
    let (images, _seen) = document.select(&IMG_SEL).fold(
        (Vec::new(), HashSet::new()),
        |(mut images, mut seen), el| {
            let attrs = el.value();
            let src = match attrs.attr("src").filter(|s| !s.is_empty()) {
                Some(src) => src,
                None => return (images, seen),
            };
            // Dedup on the raw value: later repeats are dropped whatever their size.
            if !seen.insert(src) {
                return (images, seen);
            }

            let large_enough = [attrs.attr("width"), attrs.attr("height")]
                .into_iter()
                .all(|side| declared_size(side).is_some_and(|v| v >= MIN_IMAGE_SIZE));
            if !large_enough {
                return (images, seen);
            }

            if let Some(resolved) = resolve_url(base, src) {
                if is_advertising_url(&resolved) {
                    debug!(src = %resolved, "skipping advertising image");
                } else {
                    images.push(resolved);
                }
            }
            (images, seen)
        },
    );
    images
}

/// Markup-declared dimension. Missing means "assume large enough"; anything
/// that is not a plain finite decimal number fails the size check.
///
/// Only decimal notation is understood: hex (`0x64`) is rejected, and so are
/// `inf` and `NaN`.
fn declared_size(value: Option<&str>) -> Option<f64> {
    match value {
        None | Some("") => Some(MIN_IMAGE_SIZE),
        Some(v) => v.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

// ── Videos ───────────────────────────────────────────────────────────────────

/// OpenGraph videos, or `None` when the page declares no `og:video` at all.
///
/// Type and secure URL pair with each `og:video` by position. Width and height
/// come from the first declaration and apply to every entry. Entries with a
/// `video/*` type go to the front, so several of them end up in reverse
/// document order; everything else is appended in document order.
pub fn videos(document: &Html, base: Option<&Url>) -> Option<Vec<VideoDescriptor>> {
    let nodes: Vec<_> = document.select(&OG_VIDEO_SEL).collect();
    if nodes.is_empty() {
        return None;
    }

    let types = contents(document, &OG_VIDEO_TYPE_SEL);
    let secure_urls = contents(document, &OG_VIDEO_SECURE_URL_SEL);
    let width = first_content(document, &OG_VIDEO_WIDTH_SEL);
    let height = first_content(document, &OG_VIDEO_HEIGHT_SEL);

    let videos = nodes
        .iter()
        .enumerate()
        .fold(VecDeque::new(), |mut videos, (index, node)| {
            let url = match node.value().attr("content").and_then(|c| resolve_url(base, c)) {
                Some(url) => url,
                None => return videos,
            };
            let video = VideoDescriptor {
                url,
                secure_url: paired(&secure_urls, index).and_then(|s| resolve_url(base, s)),
                mime_type: paired(&types, index).map(|t| t.to_string()),
                width: width.clone(),
                height: height.clone(),
            };
            let is_video = video
                .mime_type
                .as_deref()
                .is_some_and(|t| t.starts_with(VIDEO_MIME_PREFIX));
            if is_video {
                videos.push_front(video);
            } else {
                videos.push_back(video);
            }
            videos
        });

    Some(videos.into())
}

/// Index into a sibling node list; out of range reads as absent.
fn paired<'a>(list: &[Option<&'a str>], index: usize) -> Option<&'a str> {
    list.get(index).copied().flatten()
}

// ── DOM utility helpers ──────────────────────────────────────────────────────

fn contents<'a>(document: &'a Html, sel: &Selector) -> Vec<Option<&'a str>> {
    document
        .select(sel)
        .map(|el| el.value().attr("content"))
        .collect()
}

fn first_content(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Resolves `value` against the page URL. Anything that does not end up as an
/// absolute URL is dropped.
pub fn resolve_url(base: Option<&Url>, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(value),
        None => Url::parse(value),
    };
    resolved.ok().map(|u| u.to_string())
}
