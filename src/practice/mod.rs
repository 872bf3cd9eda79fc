//! Reading-practice content and history.

pub mod article;
pub mod history;

pub use article::{article_of_the_day, Article, ARTICLES};
pub use history::{HistoryManager, PracticeEntry};
