pub mod book;
pub mod numbering;
pub mod state;
pub mod strings;
pub mod submission;
pub mod surface;
pub mod webdriver;
