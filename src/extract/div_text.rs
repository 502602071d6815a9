//! Legacy `getDivText` reader.

use crate::dom::Document;
use crate::protocol::DivText;

const TARGET_SELECTOR: &str = "#aditya";
const FOUND_MESSAGE: &str = "working brother";
const ERROR_MESSAGE: &str = "error occurred";
const NOT_FOUND_TEXT: &str = r#"No div with id "aditya" found"#;

/// Reads the rendered text of the `#aditya` element.
///
/// Errors are folded into the reply, as the legacy protocol expects.
#[must_use]
pub fn read_div_text(document: &Document) -> DivText {
    match document.select_first(TARGET_SELECTOR) {
        Ok(found) => DivText {
            message: FOUND_MESSAGE.to_string(),
            text_of_div: found
                .map(|id| document.inner_text(id))
                .unwrap_or_else(|| NOT_FOUND_TEXT.to_string()),
        },
        Err(e) => DivText {
            message: ERROR_MESSAGE.to_string(),
            text_of_div: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn doc(body: Element) -> Document {
        Document::new("https://example.com/", Element::new("html").child(body))
            .expect("valid document")
    }

    #[test]
    fn test_found() {
        let doc = doc(Element::new("body").child(
            Element::new("div")
                .id("aditya")
                .children([Element::new("p").text("line one"), Element::new("p").text("two")]),
        ));

        let reply = read_div_text(&doc);
        assert_eq!(reply.message, "working brother");
        assert_eq!(reply.text_of_div, "line one\ntwo");
    }

    #[test]
    fn test_not_found() {
        let reply = read_div_text(&doc(Element::new("body")));
        assert_eq!(reply.message, "working brother");
        assert_eq!(reply.text_of_div, "No div with id \"aditya\" found");
    }
}
