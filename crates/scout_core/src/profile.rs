//! Site coupling: page patterns, endpoints and UI selectors.
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::item::ID_PREFIX;
use crate::ItemId;

pub const DEFAULT_PRODUCT_PAGE_PATTERN: &str = r"/pop-now/set/\d+";
pub const DEFAULT_TERMINAL_PAGE_MARKER: &str = "/pop-now/box/";
pub const DEFAULT_EXTRACT_PATH: &str = "/shop/v1/box/box_set/extract";
pub const DEFAULT_CHOOSE_PATH: &str = "/shop/v1/box/box_set/choose";
pub const DEFAULT_EXHAUSTION_MARKER: &str = "All boxes have been reserved";
pub const DEFAULT_STORAGE_PREFIX: &str = "popmart_set_records_";
const PRODUCT_PAGE_FALLBACK_PATH: &str = "/us/pop-now/set/";
const PRODUCT_PAGE_FALLBACK_URL: &str = "https://www.popmart.com/us/pop-now/set/";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid product page pattern `{pattern}`: {source}")]
    ProductPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// UI affordances the engine interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// A selectable component image inside the big container.
    Component,
    /// The carousel's forward arrow.
    NextArrow,
    /// "ADD TO BAG" on the terminal page.
    ConfirmSelection,
    /// Follow-up confirmation shown after the selection was confirmed.
    SecondaryConfirm,
    /// Site logo; returns to the catalog root.
    CatalogRoot,
}

/// Structural element criteria understood by a `UiProbe`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Criteria {
    pub class_prefix: Option<String>,
    pub tag: Option<String>,
    pub text_contains: Option<String>,
    /// Attribute name and substring its value must contain.
    pub attr_contains: Option<(String, String)>,
    /// The element must be a descendant of an element matching this.
    pub within: Option<Box<Criteria>>,
    /// Only a currently visible match satisfies the criteria.
    pub visible: bool,
}

impl Criteria {
    pub fn class_prefix(prefix: &str) -> Self {
        Self {
            class_prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text_contains = Some(text.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, needle: &str) -> Self {
        self.attr_contains = Some((name.to_string(), needle.to_string()));
        self
    }

    pub fn within(mut self, container: Criteria) -> Self {
        self.within = Some(Box::new(container));
        self
    }

    pub fn visible(mut self) -> Self {
        self.visible = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub component: Criteria,
    pub next_arrow: Criteria,
    pub confirm_selection: Criteria,
    pub secondary_confirm: Criteria,
    pub catalog_root: Criteria,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            component: Criteria::tag("img")
                .with_attr("src", "box_pic")
                .within(Criteria::class_prefix("index_bigBoxContainer")),
            next_arrow: Criteria::class_prefix("index_nextImg")
                .with_tag("img")
                .visible(),
            confirm_selection: Criteria::tag("button").with_text("ADD TO BAG"),
            secondary_confirm: Criteria::class_prefix("index_seeConfirmBtn").visible(),
            catalog_root: Criteria::class_prefix("header_logo").visible(),
        }
    }
}

impl Selectors {
    pub fn criteria(&self, affordance: Affordance) -> &Criteria {
        match affordance {
            Affordance::Component => &self.component,
            Affordance::NextArrow => &self.next_arrow,
            Affordance::ConfirmSelection => &self.confirm_selection,
            Affordance::SecondaryConfirm => &self.secondary_confirm,
            Affordance::CatalogRoot => &self.catalog_root,
        }
    }
}

/// Everything that ties the engine to one storefront.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    product_page: Regex,
    pub terminal_page_marker: String,
    pub intercept_method: String,
    pub extract_path: String,
    pub choose_path: String,
    pub exhaustion_marker: String,
    pub storage_prefix: String,
    pub selectors: Selectors,
}

impl PartialEq for SiteProfile {
    fn eq(&self, other: &Self) -> bool {
        self.product_page.as_str() == other.product_page.as_str()
            && self.terminal_page_marker == other.terminal_page_marker
            && self.intercept_method == other.intercept_method
            && self.extract_path == other.extract_path
            && self.choose_path == other.choose_path
            && self.exhaustion_marker == other.exhaustion_marker
            && self.storage_prefix == other.storage_prefix
            && self.selectors == other.selectors
    }
}

impl Eq for SiteProfile {}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            product_page: Regex::new(DEFAULT_PRODUCT_PAGE_PATTERN)
                .expect("default product page pattern compiles"),
            terminal_page_marker: DEFAULT_TERMINAL_PAGE_MARKER.to_string(),
            intercept_method: "POST".to_string(),
            extract_path: DEFAULT_EXTRACT_PATH.to_string(),
            choose_path: DEFAULT_CHOOSE_PATH.to_string(),
            exhaustion_marker: DEFAULT_EXHAUSTION_MARKER.to_string(),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            selectors: Selectors::default(),
        }
    }
}

static SHARED_DEFAULT: LazyLock<Arc<SiteProfile>> =
    LazyLock::new(|| Arc::new(SiteProfile::default()));

impl SiteProfile {
    /// The default profile, compiled once per process.
    pub(crate) fn shared_default() -> Arc<SiteProfile> {
        Arc::clone(&SHARED_DEFAULT)
    }

    /// Default profile with a custom product page pattern.
    pub fn with_product_pattern(pattern: &str) -> Result<Self, ProfileError> {
        let product_page = Regex::new(pattern).map_err(|source| ProfileError::ProductPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            product_page,
            ..Self::default()
        })
    }

    pub fn is_product_page(&self, url: &str) -> bool {
        self.product_page.is_match(url)
    }

    pub fn is_terminal_page(&self, url: &str) -> bool {
        url.contains(&self.terminal_page_marker)
    }

    /// Store key scoped to the page's origin and path. Query and fragment
    /// are ignored; unparsable locations fall back to the raw string.
    pub fn storage_key(&self, location: &str) -> String {
        match Url::parse(location) {
            Ok(url) => format!(
                "{}{}{}",
                self.storage_prefix,
                url.origin().ascii_serialization(),
                url.path()
            ),
            Err(_) => format!("{}{}", self.storage_prefix, location),
        }
    }

    /// Product URL for `id`, derived from the current location. A trailing
    /// `-<item id>` suffix is replaced rather than stacked.
    pub fn candidate_url(&self, current_url: &str, id: &ItemId) -> String {
        let mut base = current_url;
        if let Some(dash) = current_url.rfind('-') {
            let tail = &current_url[dash + 1..];
            if tail.starts_with(ID_PREFIX) && tail.len() >= 14 {
                base = &current_url[..dash];
            }
        }
        format!("{base}-{id}")
    }

    /// Link back to a product page: the current URL when already on one,
    /// otherwise the catalog's generic set listing on the same host.
    pub fn product_page_link(&self, current_url: &str) -> String {
        if self.is_product_page(current_url) {
            return current_url.to_string();
        }
        match Url::parse(current_url) {
            Ok(url) if url.host_str().is_some_and(|h| h.contains("popmart.com")) => format!(
                "{}{}",
                url.origin().ascii_serialization(),
                PRODUCT_PAGE_FALLBACK_PATH
            ),
            _ => PRODUCT_PAGE_FALLBACK_URL.to_string(),
        }
    }
}
