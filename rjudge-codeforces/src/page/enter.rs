use rjudge_util::service::scrape::Scrape;
use scraper::{ElementRef, Html};

use crate::page::{HasCsrfToken, HasFormErrors};

/// Login page, also returned when a login attempt is refused.
pub struct EnterPage {
    content: Html,
}

impl EnterPage {
    pub const PATH: &'static str = "enter";

    pub fn new(body: &str) -> Self {
        Self {
            content: Html::parse_document(body),
        }
    }

    /// Builds the login form from `token` and the account credentials.
    pub fn login_form<'a>(
        token: &'a str,
        handle: &'a str,
        password: &'a str,
    ) -> [(&'static str, &'a str); 5] {
        [
            ("csrf_token", token),
            ("action", "enter"),
            ("handleOrEmail", handle),
            ("password", password),
            ("remember", "on"),
        ]
    }
}

impl Scrape for EnterPage {
    fn elem(&self) -> ElementRef {
        self.content.root_element()
    }
}

impl HasCsrfToken for EnterPage {}

impl HasFormErrors for EnterPage {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_login_error() {
        let page = EnterPage::new(include_str!("../../tests/fixtures/enter_failed.html"));
        assert_eq!(
            page.extract_form_errors().as_deref(),
            Some("Invalid handle/email or password")
        );
        assert!(page.extract_csrf_token().is_some());
    }

    #[test]
    fn test_no_error_on_fresh_page() {
        let page = EnterPage::new(include_str!("../../tests/fixtures/enter.html"));
        assert_eq!(page.extract_form_errors(), None);
    }
}
