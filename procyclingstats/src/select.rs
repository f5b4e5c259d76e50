use scraper::ElementRef;

use crate::document::{attr, scoped, text_of, Document};
use crate::error::{Error, Result};
use crate::value::{Row, RowList, Value};

/// Parses a `<select>` menu into `{text, value}` rows, in document order
pub fn parse_select(select: ElementRef) -> Result<RowList> {
    let mut res = Vec::new();
    for option in scoped(select, "option")? {
        let text = text_of(option, None);
        // a missing value attribute means the text is submitted
        let value = attr(option, "value").map(str::to_string).unwrap_or_else(|| text.clone());

        let mut row = Row::new();
        row.insert("text", Value::Text(text));
        row.insert("value", Value::Text(value));
        res.push(row);
    }
    Ok(res)
}

/// Parses the first select menu matching `css`
pub fn parse_select_menu(document: &Document, css: &str) -> Result<RowList> {
    let select = document
        .first_opt(css)?
        .ok_or_else(|| Error::expected(format!("select menu {:?} not found", css)))?;
    parse_select(select)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select() {
        let doc = Document::parse(
            r#"<form><select name="date">
                <option value="2022-12-31">31 Dec 2022</option>
                <option value="2021-12-31" selected>31 Dec 2021</option>
                <option>Latest</option>
            </select></form>"#,
        );
        let rows = parse_select_menu(&doc, "select[name=date]").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("text"), Some(&Value::text("31 Dec 2022")));
        assert_eq!(rows[1].get("value"), Some(&Value::text("2021-12-31")));
        assert_eq!(rows[2].get("value"), Some(&Value::text("Latest")));

        assert!(matches!(
            parse_select_menu(&doc, "select[name=nation]"),
            Err(Error::Expected(_))
        ));
    }
}
