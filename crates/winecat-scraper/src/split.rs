//! Splitting a page body into per-item fragments.
//!
//! Listing markup differs item to item, so this does not parse HTML. It finds
//! the listing region by a container id or anchor token, then cuts the region
//! on a marker string that precedes every item's data. Text before the first
//! marker is page chrome and is discarded.

/// One item's unparsed markup. Line breaks are already removed so field
/// patterns never stop at a newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment(String);

impl RawFragment {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(text.replace(['\r', '\n'], ""))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where the listing starts within a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingRegion {
    /// The whole body.
    Body,
    /// From the element carrying this `id` attribute to the end of the body.
    ElementId(String),
    /// From the first occurrence of this token to the end of the body.
    AfterToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemBlockSplitter {
    region: ListingRegion,
    delimiter: String,
    keep_delimiter: bool,
}

impl ItemBlockSplitter {
    /// Splits on `delimiter`, dropping the delimiter itself.
    #[must_use]
    pub fn new(region: ListingRegion, delimiter: impl Into<String>) -> Self {
        Self {
            region,
            delimiter: delimiter.into(),
            keep_delimiter: false,
        }
    }

    /// Keeps the delimiter at the front of each fragment, for sites whose
    /// marker is also the left context of a field.
    #[must_use]
    pub fn keeping_delimiter(mut self) -> Self {
        self.keep_delimiter = true;
        self
    }

    /// Cuts `body` into fragments in document order.
    ///
    /// Returns an empty vector when the listing region is absent or contains
    /// no delimiter; that is how an exhausted page looks.
    #[must_use]
    pub fn split(&self, body: &str) -> Vec<RawFragment> {
        let Some(region) = self.locate_region(body) else {
            return Vec::new();
        };
        if self.delimiter.is_empty() {
            return Vec::new();
        }

        region
            .split(self.delimiter.as_str())
            .skip(1)
            .filter(|piece| !piece.trim().is_empty())
            .map(|piece| {
                if self.keep_delimiter {
                    RawFragment::new(&format!("{}{piece}", self.delimiter))
                } else {
                    RawFragment::new(piece)
                }
            })
            .collect()
    }

    fn locate_region<'a>(&self, body: &'a str) -> Option<&'a str> {
        match &self.region {
            ListingRegion::Body => Some(body),
            ListingRegion::AfterToken(token) => body.find(token.as_str()).map(|i| &body[i..]),
            ListingRegion::ElementId(id) => {
                let double = format!("id=\"{id}\"");
                let single = format!("id='{id}'");
                body.find(&double)
                    .or_else(|| body.find(&single))
                    .map(|i| &body[i..])
            }
        }
    }
}
