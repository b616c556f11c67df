use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::MarketError;

lazy_static! {
    static ref CONSTITUENTS_TABLE: Selector = Selector::parse("table#constituents").unwrap();
    static ref WIKITABLE: Selector = Selector::parse("table.wikitable").unwrap();
    static ref ROW: Selector = Selector::parse("tr").unwrap();
    static ref HEADER_CELL: Selector = Selector::parse("th").unwrap();
    static ref DATA_CELL: Selector = Selector::parse("td").unwrap();
}

/// Pull the `Symbol` column out of the first constituents table on a listing page.
pub fn parse_constituents(html: &str) -> Result<Vec<String>, MarketError> {
    let document = Html::parse_document(html);

    let table = document
        .select(&CONSTITUENTS_TABLE)
        .next()
        .or_else(|| document.select(&WIKITABLE).next())
        .ok_or(MarketError::MissingConstituents)?;

    let mut column = 0;
    let mut symbols = vec![];
    for row in table.select(&ROW) {
        if row.select(&DATA_CELL).next().is_none() {
            if let Some(i) = row.select(&HEADER_CELL).position(|th| cell_text(th) == "Symbol") {
                column = i;
            }
            continue;
        }

        if let Some(cell) = row.select(&DATA_CELL).nth(column) {
            let symbol = cell_text(cell);
            if !symbol.is_empty() {
                symbols.push(symbol);
            }
        }
    }

    if symbols.is_empty() {
        return Err(MarketError::MissingConstituents);
    }

    Ok(symbols)
}

/// Class shares are listed as `BRK.B` but quoted as `BRK-B`.
pub fn to_provider_symbol(symbol: &str) -> String {
    symbol.replace('.', "-")
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_owned()
}
