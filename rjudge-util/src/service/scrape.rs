use scraper::{ElementRef, Selector};

use crate::regex;

pub trait Scrape {
    fn elem(&self) -> ElementRef;

    fn find_first(&self, selector: &Selector) -> Option<ElementRef> {
        self.elem().select(selector).next()
    }

    fn inner_text(&self) -> String {
        self.elem().text().fold(String::new(), |mut ret, s| {
            ret.push_str(s);
            ret
        })
    }
}

impl Scrape for ElementRef<'_> {
    fn elem(&self) -> ElementRef {
        *self
    }
}

/// Parses the first decimal number found in `text`.
pub fn parse_first_number(text: &str) -> Option<f64> {
    regex!(r"\d+(\.\d+)?")
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;
    use crate::select;

    #[test]
    fn test_inner_text() {
        let html = Html::parse_fragment("<div class=\"title\">A. <b>Watermelon</b></div>");
        let root = html.root_element();
        let title = root.find_first(select!(".title")).unwrap();
        assert_eq!(title.inner_text(), "A. Watermelon");
    }

    #[test]
    fn test_parse_first_number() {
        assert_eq!(parse_first_number("time limit per test2 seconds"), Some(2.0));
        assert_eq!(parse_first_number("time limit per test0.5 seconds"), Some(0.5));
        assert_eq!(parse_first_number("memory limit per test256 megabytes"), Some(256.0));
        assert_eq!(parse_first_number("unlimited"), None);
    }
}
