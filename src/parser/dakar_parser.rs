// dakar-auto.com listing-card parsing
use crate::model::{ParserError, RawListing};
use crate::utils::{element_text, non_empty};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One parsed results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Whether any listing container matched, even if no card in it was usable.
    pub has_containers: bool,
    pub listings: Vec<RawListing>,
}

pub trait Parser {
    fn parse_page(&self, html: &str) -> Result<ParsedPage, ParserError>;

    fn parse(&self, html: &str) -> Result<Vec<RawListing>, ParserError> {
        Ok(self.parse_page(html)?.listings)
    }
}

/// Title pieces split from "Brand Model Words Year".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleParts {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
}

/// brand = first token, year = last token (2+ tokens), model = everything between (3+ tokens).
pub fn split_title(title: &str) -> TitleParts {
    let parts: Vec<&str> = title.split_whitespace().collect();
    TitleParts {
        brand: parts.first().map(|s| s.to_string()),
        year: if parts.len() > 1 { parts.last().map(|s| s.to_string()) } else { None },
        model: if parts.len() > 2 { Some(parts[1..parts.len() - 1].join(" ")) } else { None },
    }
}

/// "Par Auto Plus" -> "Auto Plus". Only a leading standalone "Par" is removed.
fn strip_author_prefix(text: &str) -> String {
    let text = text.trim();
    match text.strip_prefix("Par") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim().to_string(),
        _ => text.to_string(),
    }
}

pub struct DakarAutoParser {
    item: Selector,
    title: Selector,
    title_link: Selector,
    attribute: Selector,
    price: Selector,
    author: Selector,
    author_link: Selector,
    address: Selector,
}

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|_| ParserError::HtmlParseError(css.to_string()))
}

impl DakarAutoParser {
    pub fn new() -> Result<Self, ParserError> {
        Ok(Self {
            item: selector("div.listings-cards__list-item")?,
            title: selector("h2.listing-card__header__title")?,
            title_link: selector("a")?,
            attribute: selector("li.listing-card__attribute")?,
            price: selector("h3.listing-card__header__price")?,
            author: selector("p.time-author")?,
            author_link: selector("a")?,
            address: selector("div.entry-zone-address")?,
        })
    }

    fn parse_card(&self, card: ElementRef) -> Result<RawListing, ParserError> {
        let title_node = card
            .select(&self.title)
            .next()
            .ok_or_else(|| ParserError::MissingField("title".into()))?;
        let title = match title_node.select(&self.title_link).next() {
            Some(link) => element_text(&link),
            None => element_text(&title_node),
        };
        let TitleParts { brand, model, year } = split_title(&title);

        let attributes: Vec<String> = card.select(&self.attribute).map(|li| element_text(&li)).collect();
        let reference = attributes
            .first()
            .and_then(|a| a.split_whitespace().last())
            .map(str::to_string);
        let km = attributes.get(1).map(|a| a.replace("km", "").trim().to_string());
        let gearbox = attributes.get(2).cloned();
        let fuel = attributes.get(3).cloned();

        let price = card.select(&self.price).next().map(|p| {
            element_text(&p)
                .replace("FCFA", "")
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
        });

        let owner = card
            .select(&self.author)
            .next()
            .and_then(|p| p.select(&self.author_link).next())
            .map(|a| strip_author_prefix(&element_text(&a)));

        let address = card
            .select(&self.address)
            .next()
            .map(|d| element_text(&d).split_whitespace().collect::<Vec<_>>().join(" "));

        Ok(RawListing {
            brand: brand.and_then(non_empty),
            model: model.and_then(non_empty),
            year: year.and_then(non_empty),
            reference: reference.and_then(non_empty),
            km: km.and_then(non_empty),
            fuel: fuel.and_then(non_empty),
            gearbox: gearbox.and_then(non_empty),
            price: price.and_then(non_empty),
            owner: owner.and_then(non_empty),
            address: address.and_then(non_empty),
        })
    }
}

impl Parser for DakarAutoParser {
    fn parse_page(&self, html: &str) -> Result<ParsedPage, ParserError> {
        let document = Html::parse_document(html);
        let mut page = ParsedPage::default();

        for card in document.select(&self.item) {
            page.has_containers = true;
            match self.parse_card(card) {
                Ok(listing) => page.listings.push(listing),
                Err(e) => debug!("Skipping card: {}", e),
            }
        }

        Ok(page)
    }
}
