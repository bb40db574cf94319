/*!
 * Listing page scraping.
 *
 * A listing page is a table whose first row is a header and whose data rows
 * have exactly five cells. The first cell holds an anchor to the entry page
 * with two labels inside it (language, then release name); the third cell is
 * marked when the entry is hearing impaired. Anything else (ads, spacer rows)
 * is skipped.
 */

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::model::{Quality, SubtitleRecord};

/// Cells a data row must have
const LISTING_CELL_COUNT: usize = 5;

/// Class marking a positively rated entry on its language label
const POSITIVE_MARKER: &str = "positive-icon";

/// Class marking a hearing-impaired entry on the third cell
const HEARING_IMPAIRED_MARKER: &str = "a41";

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table tr").unwrap());
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static LABEL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a span").unwrap());
static DOWNLOAD_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.download a").unwrap());

/// Parse every listing row of a page, in document order
pub fn parse_listing(html: &str) -> Vec<SubtitleRecord> {
    let document = Html::parse_document(html);

    document
        .select(&ROW_SELECTOR)
        .skip(1)
        .filter_map(parse_row)
        .collect()
}

fn parse_row(row: ElementRef<'_>) -> Option<SubtitleRecord> {
    let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
    if cells.len() != LISTING_CELL_COUNT {
        return None;
    }

    let title_cell = cells[0];
    let url = title_cell
        .select(&ANCHOR_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    let mut labels = title_cell.select(&LABEL_SELECTOR);
    let language_label = labels.next();
    let name_label = labels.next();

    let quality = match language_label {
        Some(label) if has_class(label, POSITIVE_MARKER) => Quality::Positive,
        _ => Quality::Neutral,
    };

    Some(SubtitleRecord {
        url,
        name: name_label.map(trimmed_text).unwrap_or_default(),
        language: language_label.map(trimmed_text).unwrap_or_default(),
        quality,
        hearing_impaired: has_class(cells[2], HEARING_IMPAIRED_MARKER),
    })
}

/// Extract the download link of an entry page, if present
pub fn parse_download_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(&DOWNLOAD_LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}
