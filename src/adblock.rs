use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

// ── Known ad-serving hosts ───────────────────────────────────────────────────

/// Matched against the host and every parent domain of it.
const AD_DOMAINS: &[&str] = &[
    "doubleclick.net",
    "googleadservices.com",
    "googlesyndication.com",
    "adservice.google.com",
    "adnxs.com",
    "advertising.com",
    "adform.net",
    "adroll.com",
    "adsrvr.org",
    "amazon-adsystem.com",
    "criteo.com",
    "criteo.net",
    "outbrain.com",
    "taboola.com",
    "pubmatic.com",
    "rubiconproject.com",
    "openx.net",
    "casalemedia.com",
    "moatads.com",
    "scorecardresearch.com",
    "quantserve.com",
    "zedo.com",
    "serving-sys.com",
    "media.net",
    "yieldmo.com",
];

static AD_HOST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(ads?|adserver|adimg|banners?|pagead\d*)\.").unwrap());

static AD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/(ads?|adserver|adframe|advert(isement)?s?|banners?|sponsor(ed)?|pagead\d*)(/|\.|_|\?|$)")
        .unwrap()
});

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns true when `url` points at a known advertising resource.
///
/// Empty or unparseable input is never an ad.
pub fn is_advertising_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    if !host.is_empty() && (is_ad_domain(&host) || AD_HOST_RE.is_match(&host)) {
        return true;
    }
    AD_PATH_RE.is_match(parsed.path())
}

fn is_ad_domain(host: &str) -> bool {
    AD_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .map(|prefix| prefix.ends_with('.'))
                .unwrap_or(false)
    })
}
