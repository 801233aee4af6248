mod credential;
mod problem;
mod sample;
mod submission;
mod verdict;

pub use credential::*;
pub use problem::*;
pub use sample::*;
pub use submission::*;
pub use verdict::*;

pub type LangId = String;

pub type LangIdRef<'a> = &'a str;
