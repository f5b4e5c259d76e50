use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// A fetched page. Immutable once parsed.
pub struct Document {
    html: Html,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::unexpected(format!("invalid selector {:?}: {:?}", css, e)))
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Document {
            html: Html::parse_document(html),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First match, or an expected error when nothing matches
    pub fn first(&self, css: &str) -> Result<ElementRef<'_>> {
        self.first_opt(css)?
            .ok_or_else(|| Error::expected(format!("no element matches {:?}", css)))
    }

    pub fn first_opt(&self, css: &str) -> Result<Option<ElementRef<'_>>> {
        Ok(self.html.select(&selector(css)?).next())
    }

    pub fn all(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        Ok(self.html.select(&selector(css)?).collect())
    }

    /// Text of the first match
    pub fn text(&self, css: &str) -> Result<String> {
        Ok(text_of(self.first(css)?, None))
    }

    /// The element directly following the heading whose text is `heading`
    /// (case-insensitive), e.g. the table under `<h3>Stages</h3>`
    pub fn after_heading(&self, heading: &str) -> Result<Option<ElementRef<'_>>> {
        let heading = heading.to_lowercase();
        for h in self.all("h2, h3, h4")? {
            if text_of(h, None).to_lowercase() == heading {
                return Ok(next_element(h));
            }
        }
        Ok(None)
    }
}

/// Matches of `css` inside `node`
pub fn scoped<'a>(node: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    Ok(node.select(&selector(css)?).collect())
}

pub fn scoped_first<'a>(node: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>> {
    Ok(node.select(&selector(css)?).next())
}

/// Text content of `node`.
///
/// Without a separator the text nodes are concatenated and the result is
/// trimmed. With one, every non-blank text node is trimmed and joined by it.
pub fn text_of(node: ElementRef, separator: Option<&str>) -> String {
    match separator {
        None => node
            .text()
            .collect::<String>()
            .replace('\u{a0}', " ")
            .trim()
            .to_string(),
        Some(sep) => node
            .text()
            .map(|t| t.replace('\u{a0}', " ").trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(sep),
    }
}

pub fn attr<'a>(node: ElementRef<'a>, name: &str) -> Option<&'a str> {
    node.value().attr(name)
}

pub fn has_class(node: ElementRef, class: &str) -> bool {
    node.value().classes().any(|c| c == class)
}

pub fn child_elements<'a>(node: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    node.children().filter_map(ElementRef::wrap)
}

pub fn next_element<'a>(node: ElementRef<'a>) -> Option<ElementRef<'a>> {
    node.next_siblings().find_map(ElementRef::wrap)
}
