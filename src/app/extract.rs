//! Catalog page scraping
//!
//! Item pages carry schema.org microdata (`itemprop` attributes) for every
//! metadata field; the landing page lists the most recently added item in a
//! fixed-width table cell. Parsing is kept synchronous and separate from the
//! fetch so that no parsed document is held across an await point.

use scraper::{ElementRef, Html, Selector};

use crate::app::client::CatalogClient;
use crate::app::models::{ItemMetadata, ItemRecord};
use crate::app::path::{is_usable_segment, sanitize_segment};
use crate::constants::{catalog, selectors};
use crate::errors::{BoundDiscoveryError, ExtractError, ExtractResult};

/// Fetches item pages and turns them into records
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    client: CatalogClient,
    artifact_host_pattern: String,
}

impl MetadataExtractor {
    pub fn new(client: CatalogClient, artifact_host_pattern: impl Into<String>) -> Self {
        Self {
            client,
            artifact_host_pattern: artifact_host_pattern.into(),
        }
    }

    /// Fetch and parse the page of item `id`
    ///
    /// # Errors
    ///
    /// Returns `ExtractError` if the page cannot be fetched or any required
    /// field is missing. No partially populated record is ever returned.
    pub async fn extract(&self, id: u32) -> ExtractResult<ItemRecord> {
        let url = self
            .client
            .item_url(id)
            .map_err(|source| ExtractError::Fetch { id, source })?;

        let html = self
            .client
            .get_page(&url)
            .await
            .map_err(|source| ExtractError::Fetch { id, source })?;

        parse_item_page(id, url.as_str(), &html, &self.artifact_host_pattern)
    }

    /// Fetch the landing page and read the highest item id
    ///
    /// # Errors
    ///
    /// Returns `BoundDiscoveryError` if the page cannot be fetched or does not
    /// carry the latest-item anchor
    pub async fn discover_max_id(&self) -> Result<u32, BoundDiscoveryError> {
        let html = self.client.get_page(self.client.base_url()).await?;
        parse_latest_id(&html)
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|_| css.to_string())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Read the latest item id from the landing page
///
/// The anchor's href has the form `/book/{id}/`.
pub fn parse_latest_id(html: &str) -> Result<u32, BoundDiscoveryError> {
    let document = Html::parse_document(html);
    let anchor_selector = selector(selectors::LATEST_ITEM_SELECTOR)
        .map_err(|selector| BoundDiscoveryError::AnchorNotFound { selector })?;

    let href = document
        .select(&anchor_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .ok_or_else(|| BoundDiscoveryError::AnchorNotFound {
            selector: selectors::LATEST_ITEM_SELECTOR.to_string(),
        })?;

    id_from_item_href(href).ok_or_else(|| BoundDiscoveryError::InvalidId {
        href: href.to_string(),
    })
}

/// Extract the numeric id from `/book/{id}/` (relative or absolute)
pub fn id_from_item_href(href: &str) -> Option<u32> {
    let mut segments = href.trim().split('/').filter(|s| !s.is_empty());
    segments
        .by_ref()
        .find(|segment| *segment == catalog::ITEM_PATH)?;
    segments.next()?.parse().ok()
}

/// Parse an item page into a record
///
/// # Errors
///
/// Returns `ExtractError::MissingField` for the first absent field,
/// `NoDownloadLink` when no link points at the artifact host, and
/// `InvalidField` when a path-forming field is unusable after sanitizing.
pub fn parse_item_page(
    id: u32,
    source_url: &str,
    html: &str,
    artifact_host_pattern: &str,
) -> ExtractResult<ItemRecord> {
    let document = Html::parse_document(html);

    let field = |name: &'static str, css: &str| -> ExtractResult<String> {
        let compiled =
            selector(css).map_err(|selector| ExtractError::InvalidSelector { selector })?;
        document
            .select(&compiled)
            .next()
            .map(element_text)
            .ok_or(ExtractError::MissingField { id, field: name })
    };

    let title = sanitize_segment(&field("title", selectors::TITLE)?);
    let description = field("description", selectors::DESCRIPTION)?;
    let publisher = sanitize_segment(&field("publisher", selectors::PUBLISHER)?);
    let author = field("author", selectors::AUTHOR)?;
    let isbn = field("isbn", selectors::ISBN)?;
    let date_published = field("date_published", selectors::DATE_PUBLISHED)?;
    let page_count = field("page_count", selectors::PAGE_COUNT)?;
    let language = field("language", selectors::LANGUAGE)?;
    let format = field("format", selectors::FORMAT)?.to_lowercase();

    let download_url = find_download_link(&document, artifact_host_pattern)?
        .ok_or(ExtractError::NoDownloadLink { id })?;

    for (name, value) in [("title", &title), ("publisher", &publisher)] {
        if !is_usable_segment(value) {
            return Err(ExtractError::InvalidField {
                id,
                field: name,
                value: value.clone(),
            });
        }
    }
    let format = sanitize_segment(&format);
    if format.is_empty() {
        return Err(ExtractError::InvalidField {
            id,
            field: "format",
            value: format,
        });
    }

    Ok(ItemRecord::new(
        id,
        source_url,
        ItemMetadata {
            title,
            description,
            publisher,
            author,
            isbn,
            date_published,
            page_count,
            language,
            format,
            download_url,
        },
    ))
}

/// First link whose href contains `pattern`
fn find_download_link(document: &Html, pattern: &str) -> ExtractResult<Option<String>> {
    let links = selector(selectors::LINK_SELECTOR)
        .map_err(|selector| ExtractError::InvalidSelector { selector })?;

    Ok(document
        .select(&links)
        .filter_map(|element| element.value().attr("href"))
        .find(|href| href.contains(pattern))
        .map(|href| href.trim().to_string()))
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::constants::ARTIFACT_HOST_PATTERN;

    const SOURCE: &str = "http://it-ebooks.info/book/12/";

    #[test]
    fn test_parse_item_page_full_record() {
        let html = item_page("Learning Rust", "http://filepi.com/i/AbCdEf");
        let record = parse_item_page(12, SOURCE, &html, ARTIFACT_HOST_PATTERN).unwrap();

        assert_eq!(record.id, 12);
        assert_eq!(record.source_url, SOURCE);
        assert_eq!(record.title, "Learning Rust");
        assert_eq!(record.publisher, "O'Reilly Media");
        assert_eq!(record.author, "Jane Doe");
        assert_eq!(record.isbn, "978-1-4493-1234-5");
        assert_eq!(record.date_published, "2013");
        assert_eq!(record.page_count, "320");
        assert_eq!(record.language, "English");
        assert_eq!(record.format, "pdf");
        assert_eq!(record.download_url, "http://filepi.com/i/AbCdEf");
        assert_eq!(record.file_name, "Learning Rust.pdf");
        assert_eq!(
            record.save_path,
            "O'Reilly Media/Learning Rust/Learning Rust.pdf"
        );
        assert!(!record.downloaded);
    }

    #[test]
    fn test_title_is_sanitized() {
        let html = item_page("TCP/IP Sockets", "http://filepi.com/i/x");
        let record = parse_item_page(1, SOURCE, &html, ARTIFACT_HOST_PATTERN).unwrap();
        assert_eq!(record.title, "TCPIP Sockets");
        assert_eq!(record.file_name, "TCPIP Sockets.pdf");
    }

    #[test]
    fn test_missing_field_is_hard_failure() {
        let html = item_page("Book", "http://filepi.com/i/x")
            .replace(r#"itemprop="isbn""#, r#"class="isbn""#);

        match parse_item_page(4, SOURCE, &html, ARTIFACT_HOST_PATTERN) {
            Err(ExtractError::MissingField { id, field }) => {
                assert_eq!(id, 4);
                assert_eq!(field, "isbn");
            }
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_off_catalog_page_fails_on_first_field() {
        let result = parse_item_page(99, SOURCE, &missing_page(), ARTIFACT_HOST_PATTERN);
        assert!(matches!(
            result,
            Err(ExtractError::MissingField { id: 99, field: "title" })
        ));
    }

    #[test]
    fn test_no_download_link() {
        let html = item_page("Book", "http://mirror.example.com/file");
        let result = parse_item_page(8, SOURCE, &html, ARTIFACT_HOST_PATTERN);
        assert!(matches!(result, Err(ExtractError::NoDownloadLink { id: 8 })));
    }

    #[test]
    fn test_custom_artifact_host() {
        let html = item_page("Book", "http://127.0.0.1:9000/files/abc");
        let record = parse_item_page(8, SOURCE, &html, "127.0.0.1:9000/files").unwrap();
        assert_eq!(record.download_url, "http://127.0.0.1:9000/files/abc");
    }

    #[test]
    fn test_unusable_title_rejected() {
        let html = item_page("//", "http://filepi.com/i/x");
        let result = parse_item_page(2, SOURCE, &html, ARTIFACT_HOST_PATTERN);
        assert!(matches!(
            result,
            Err(ExtractError::InvalidField { id: 2, field: "title", .. })
        ));
    }

    #[test]
    fn test_parse_latest_id() {
        assert_eq!(parse_latest_id(&landing_page(6123)).unwrap(), 6123);
    }

    #[test]
    fn test_parse_latest_id_missing_anchor() {
        let result = parse_latest_id("<html><body><p>maintenance</p></body></html>");
        assert!(matches!(
            result,
            Err(BoundDiscoveryError::AnchorNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_latest_id_bad_href() {
        let html = r#"<table><tr><td width="120"><a href="/about/">x</a></td></tr></table>"#;
        assert!(matches!(
            parse_latest_id(html),
            Err(BoundDiscoveryError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_id_from_item_href() {
        assert_eq!(id_from_item_href("/book/42/"), Some(42));
        assert_eq!(id_from_item_href(" /book/42 "), Some(42));
        assert_eq!(id_from_item_href("http://it-ebooks.info/book/7/"), Some(7));
        assert_eq!(id_from_item_href("/book/"), None);
        assert_eq!(id_from_item_href("/book/abc/"), None);
    }
}
