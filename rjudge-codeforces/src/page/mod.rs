use rjudge_util::select;
use rjudge_util::service::scrape::Scrape;
use scraper::{ElementRef, Html};

mod enter;
mod my;
mod problem;
mod submit;

pub use enter::EnterPage;
pub use my::MyPage;
pub use problem::ProblemPage;
pub use submit::SubmitPage;

/// Cookie that is only set for a logged in session.
pub const IDENTITY_COOKIE: &str = "X-User-Sha1";

/// Extracts the csrf token every codeforces page carries in its head.
pub fn extract_csrf_token(body: &str) -> Option<String> {
    if !body.contains("X-Csrf-Token") {
        return None;
    }
    AnyPage(Html::parse_document(body)).extract_csrf_token()
}

pub trait HasCsrfToken: Scrape {
    fn extract_csrf_token(&self) -> Option<String> {
        self.find_first(select!("meta[name=\"X-Csrf-Token\"]"))?
            .value()
            .attr("content")
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned)
    }
}

pub trait HasFormErrors: Scrape {
    /// Collects the inline error messages shown next to form fields.
    fn extract_form_errors(&self) -> Option<String> {
        let errors = self
            .elem()
            .select(select!("span.error"))
            .map(|elem| elem.inner_text().trim().to_owned())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>();
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        }
    }
}

struct AnyPage(Html);

impl Scrape for AnyPage {
    fn elem(&self) -> ElementRef {
        self.0.root_element()
    }
}

impl HasCsrfToken for AnyPage {}
