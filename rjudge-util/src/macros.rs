#[macro_export]
macro_rules! regex {
    ($expr:expr) => {{
        static REGEX: ::once_cell::sync::Lazy<::regex::Regex> =
            ::once_cell::sync::Lazy::new(|| ::regex::Regex::new($expr).unwrap());
        &REGEX
    }};
    ($expr:expr,) => {
        regex!($expr)
    };
}

#[macro_export]
macro_rules! select {
    ($selectors:literal) => {{
        static SELECTOR: ::once_cell::sync::Lazy<::scraper::selector::Selector> =
            ::once_cell::sync::Lazy::new(|| {
                ::scraper::selector::Selector::parse($selectors).unwrap()
            });
        &SELECTOR
    }};
    ($selectors:literal,) => {
        select!($selectors)
    };
}

#[macro_export]
macro_rules! assert_matches {
    ($e:expr => $pat:pat) => {
        assert!(match $e {
            $pat => true,
            _ => false,
        })
    };
    ($e:expr => $pat:pat, $($arg:tt)*) => {
        assert!(match $e {
            $pat => true,
            _ => false,
        }, $($arg)*)
    };
}
