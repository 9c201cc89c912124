//! Exhibit discovery and classification from filing index pages.

use gci_core::ExhibitDoc;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// "EX-99.1", "EX 99.1", "Exhibit 99.1".
static EX_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:EX[-.\s]?|EXHIBIT\s+)([0-9]{1,3}\.[0-9]{1,2})\b").unwrap()
});

/// Bare "99.1" style numbers.
static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{1,3}\.[0-9]{1,2})\b").unwrap());

/// Extracts an exhibit number from a declared type, row text, or file
/// name, accepting the prefixed variants first and a bare number last.
fn classify(text: &str) -> Option<String> {
    if let Some(caps) = EX_PREFIXED.captures(text) {
        return Some(caps[1].to_string());
    }
    BARE_NUMBER.captures(text).map(|caps| caps[1].to_string())
}

fn file_name_of(href: &str) -> Option<String> {
    let tail = href.rsplit('/').next()?;
    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

fn content_type_for(file_name: Option<&str>) -> Option<String> {
    let name = file_name?.to_lowercase();
    if name.ends_with(".htm") || name.ends_with(".html") {
        Some("text/html".to_string())
    } else if name.ends_with(".pdf") {
        Some("application/pdf".to_string())
    } else if name.ends_with(".txt") {
        Some("text/plain".to_string())
    } else {
        None
    }
}

/// Resolves an index page href against the filing's archive directory.
fn resolve_href(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if href.starts_with('/') {
        let host = base_url
            .find("://")
            .and_then(|i| base_url[i + 3..].find('/').map(|j| &base_url[..i + 3 + j]))
            .unwrap_or(base_url);
        return format!("{host}{href}");
    }
    format!("{}/{}", base_url.trim_end_matches('/'), href)
}

/// Enumerates and classifies a filing's attached documents from its
/// index page.
///
/// Each anchor-bearing table row is classified by matching exhibit
/// number patterns against the declared type cell, the row text, or the
/// file name. Results are deduplicated by (exhibit number, URL) in
/// discovery order, which is not guaranteed ascending by exhibit number.
/// When nothing classifies as an exhibit, a single fallback entry for
/// the filing's primary document is synthesized.
#[must_use]
pub fn discover_exhibits(html: &str, base_url: &str, primary_doc: &str) -> Vec<ExhibitDoc> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("tr").expect("static selector");
    let cell_sel = Selector::parse("td, th").expect("static selector");
    let anchor_sel = Selector::parse("a[href]").expect("static selector");

    let mut out = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for row in doc.select(&row_sel) {
        let Some(anchor) = row.select(&anchor_sel).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        let row_text = cells.join(" ");
        let file_name = file_name_of(href);

        // The type column usually carries the prefixed form; fall back to
        // the whole row, then to the file name.
        let exhibit_no = cells
            .iter()
            .find_map(|c| EX_PREFIXED.captures(c).map(|caps| caps[1].to_string()))
            .or_else(|| classify(&row_text))
            .or_else(|| file_name.as_deref().and_then(classify));
        let Some(exhibit_no) = exhibit_no else {
            continue;
        };

        let url = resolve_href(base_url, href);
        if seen.insert((exhibit_no.clone(), url.clone())) {
            out.push(ExhibitDoc {
                exhibit_no: Some(exhibit_no),
                content_type: content_type_for(file_name.as_deref()),
                file_name,
                url,
            });
        }
    }

    if out.is_empty() {
        debug!(primary_doc, "no exhibits classified, synthesizing primary document entry");
        let url = resolve_href(base_url, primary_doc);
        out.push(ExhibitDoc {
            exhibit_no: None,
            content_type: content_type_for(Some(primary_doc)),
            file_name: file_name_of(primary_doc),
            url,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = r#"
        <html><body><table class="tableFile">
            <tr><th>Seq</th><th>Description</th><th>Document</th><th>Type</th></tr>
            <tr>
                <td>1</td><td>Press Release</td>
                <td><a href="acme-ex991.htm">acme-ex991.htm</a></td>
                <td>EX-99.1</td>
            </tr>
            <tr>
                <td>2</td><td>Investor Presentation 99.2</td>
                <td><a href="/Archives/edgar/data/1/000100/acme-deck.pdf">acme-deck.pdf</a></td>
                <td>GRAPHIC</td>
            </tr>
            <tr>
                <td>3</td><td>Cover</td>
                <td><a href="acme-8k.htm">acme-8k.htm</a></td>
                <td>8-K</td>
            </tr>
            <tr>
                <td>4</td><td>Press Release</td>
                <td><a href="acme-ex991.htm">acme-ex991.htm</a></td>
                <td>Exhibit 99.1</td>
            </tr>
        </table></body></html>"#;

    const BASE: &str = "https://www.sec.gov/Archives/edgar/data/1/000100";

    #[test]
    fn test_discovers_and_classifies() {
        let exhibits = discover_exhibits(INDEX_HTML, BASE, "acme-8k.htm");
        // Row 1 (EX-99.1), row 2 (bare 99.2 in description), row 4 dedupes
        // against row 1. Row 3's "8-K" type offers no exhibit number, but
        // the bare matcher reads "8" + context; it must not: "8-K" has no
        // dotted number and the row text "3 Cover acme-8k.htm 8-K" none.
        assert_eq!(exhibits.len(), 2);
        assert_eq!(exhibits[0].exhibit_no.as_deref(), Some("99.1"));
        assert_eq!(exhibits[0].url, format!("{BASE}/acme-ex991.htm"));
        assert_eq!(exhibits[0].content_type.as_deref(), Some("text/html"));
        assert_eq!(exhibits[1].exhibit_no.as_deref(), Some("99.2"));
        assert_eq!(
            exhibits[1].url,
            "https://www.sec.gov/Archives/edgar/data/1/000100/acme-deck.pdf"
        );
        assert_eq!(exhibits[1].content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_fallback_primary_document() {
        let html = "<html><body><p>No documents table</p></body></html>";
        let exhibits = discover_exhibits(html, BASE, "main.htm");
        assert_eq!(exhibits.len(), 1);
        assert_eq!(exhibits[0].exhibit_no, None);
        assert_eq!(exhibits[0].url, format!("{BASE}/main.htm"));
        assert_eq!(exhibits[0].file_name.as_deref(), Some("main.htm"));
    }

    #[test]
    fn test_resolve_href_variants() {
        assert_eq!(
            resolve_href(BASE, "https://example.com/x.htm"),
            "https://example.com/x.htm"
        );
        assert_eq!(
            resolve_href(BASE, "/Archives/a.htm"),
            "https://www.sec.gov/Archives/a.htm"
        );
        assert_eq!(resolve_href(BASE, "a.htm"), format!("{BASE}/a.htm"));
    }

    #[test]
    fn test_classify_variants() {
        assert_eq!(classify("EX-99.1").as_deref(), Some("99.1"));
        assert_eq!(classify("Exhibit 99.3").as_deref(), Some("99.3"));
        assert_eq!(classify("99.1").as_deref(), Some("99.1"));
        assert_eq!(classify("8-K"), None);
    }
}
