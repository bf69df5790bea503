//! # Page Domain
//!
//! Saved pages often lose their URL. A page's domain is taken from its
//! `<base href>` (which may be commented out inside `<head>`), or else
//! guessed as the most linked domain. Grouping pages by domain keeps pages
//! of one site inside one cross-validation fold.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use url::{Host, Url};

use super::dom::{Dom, NodeKind};
use crate::error::Result;

/// Sites linked from nearly every page, never taken as the page's domain.
pub const DEFAULT_DOMAIN_BLACKLIST: &[&str] = &[
    "google.com",
    "twitter.com",
    "facebook.com",
    "youtube.com",
    "fonts.com",
    "googleapis.com",
    "fonts.net",
    "addthis.com",
    "flickr.com",
    "paypal.com",
    "pinterest.com",
    "linkedin.com",
];

/// Second-level labels under which registrations happen one level deeper
/// (`example.co.uk`).
const SECOND_LEVEL_LABELS: &[&str] = &["ac", "co", "com", "edu", "gov", "net", "org"];

/// Registered domain of an absolute URL: the last two host labels, or the
/// last three under a country code second level such as `co.uk`.
///
/// Returns `None` for relative URLs and URLs without a host. IP hosts are
/// returned unchanged.
///
/// ```
/// use webstruct_core::html::registered_domain;
///
/// assert_eq!(registered_domain("http://www.example.com/about").as_deref(), Some("example.com"));
/// assert_eq!(registered_domain("https://shop.example.co.uk").as_deref(), Some("example.co.uk"));
/// assert_eq!(registered_domain("/contact"), None);
/// ```
pub fn registered_domain(href: &str) -> Option<String> {
    let url = Url::parse(href.trim()).ok()?;
    let domain = match url.host()? {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        Host::Ipv4(ip) => return Some(ip.to_string()),
        Host::Ipv6(ip) => return Some(ip.to_string()),
    };

    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    let keep = match labels.as_slice() {
        [.., second, tld] if tld.len() == 2 && SECOND_LEVEL_LABELS.contains(second) => 3,
        _ => 2,
    };
    let start = labels.len().saturating_sub(keep);
    let registered = labels[start..].join(".");
    (!registered.is_empty()).then_some(registered)
}

/// Finds the domain a saved page came from.
#[derive(Debug, Clone)]
pub struct DomainGuesser {
    blacklist: HashSet<String>,
    commented_base: Regex,
}

impl DomainGuesser {
    /// Create a guesser with [`DEFAULT_DOMAIN_BLACKLIST`].
    pub fn new() -> Result<Self> {
        Ok(Self {
            blacklist: DEFAULT_DOMAIN_BLACKLIST
                .iter()
                .map(|d| d.to_string())
                .collect(),
            commented_base: Regex::new(r#"base\s+href="(.*)""#)?,
        })
    }

    /// Replace the blacklist.
    pub fn with_blacklist<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Domain of the page: from its base href when there is one, guessed
    /// from links otherwise.
    pub fn tree_domain(&self, dom: &Dom) -> Option<String> {
        match self.base_href(dom) {
            Some(href) => registered_domain(&href),
            None => self.guess_domain(dom),
        }
    }

    /// The `href` of the first `<base>` element, or of a `<base>` tag
    /// commented out directly inside `<head>`.
    pub fn base_href(&self, dom: &Dom) -> Option<String> {
        let root = dom.root();
        let base = dom
            .descendants(root)
            .filter(|&id| dom.tag_name(id) == Some("base"))
            .find_map(|id| dom.attr(id, "href"));
        if let Some(href) = base {
            return Some(href.to_string());
        }

        dom.descendants(root)
            .filter(|&id| dom.tag_name(id) == Some("head"))
            .flat_map(|head| dom.children(head).iter().copied())
            .find_map(|id| match &dom.node(id).kind {
                NodeKind::Comment(content) => self
                    .commented_base
                    .captures(content)
                    .map(|caps| caps[1].to_string()),
                NodeKind::Element { .. } => None,
            })
    }

    /// Most linked registered domain outside the blacklist. Ties go to the
    /// alphabetically first domain.
    pub fn guess_domain(&self, dom: &Dom) -> Option<String> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for id in dom.descendants(dom.root()) {
            let Some(domain) = dom.attr(id, "href").and_then(registered_domain) else {
                continue;
            };
            if !self.blacklist.contains(&domain) {
                *counts.entry(domain).or_default() += 1;
            }
        }
        // max_by_key keeps the last maximum; iterate in reverse for the first
        counts
            .into_iter()
            .rev()
            .max_by_key(|&(_, n)| n)
            .map(|(domain, _)| domain)
    }
}
