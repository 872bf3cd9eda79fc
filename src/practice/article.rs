//! Reading-practice articles.
//!
//! A small built-in library of short articles, until the backend serves
//! them. Selection rotates daily so repeat practice sees fresh text.

use chrono::Datelike;

/// A short article to be read aloud.
pub struct Article {
    pub title: &'static str,
    pub content: &'static str,
}

impl Article {
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

pub const ARTICLES: &[Article] = &[
    Article {
        title: "The Future of Technology",
        content: "Artificial Intelligence is transforming our world in unprecedented ways. \
            From virtual assistants to self-driving cars, AI is becoming an integral part of \
            our daily lives. Machine learning algorithms are helping doctors diagnose diseases \
            more accurately, while natural language processing is revolutionizing how we \
            interact with computers. As we move forward, the ethical implications of AI \
            development become increasingly important. We must ensure that these powerful \
            technologies are developed and used responsibly, with consideration for their \
            impact on society and individuals.",
    },
    Article {
        title: "The Power of Habit",
        content: "Consistency is the key to mastering any skill. Whether it is learning a new \
            language, coding, or fitness, small daily efforts build lasting progress. Instead \
            of waiting for motivation, create a routine that keeps you moving forward. Over \
            time, these habits compound, leading to significant improvement. Even on tough \
            days, showing up matters more than perfection.",
    },
    Article {
        title: "A Walk in the City",
        content: "Cities reveal themselves to those who walk them. Every street corner holds a \
            story, from the aroma of a morning bakery to the hum of an evening market. Walking \
            slows the world down enough to notice details that a passing car never shows. \
            Urban planners increasingly design neighborhoods around pedestrians, because \
            walkable streets build healthier and more connected communities.",
    },
];

/// Picks today's article, rotating through the library by date.
pub fn article_of_the_day() -> &'static Article {
    let days = chrono::Local::now().date_naive().num_days_from_ce() as usize;
    &ARTICLES[days % ARTICLES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_counts_are_positive() {
        for article in ARTICLES {
            assert!(article.word_count() > 30, "{} too short", article.title);
        }
    }

    #[test]
    fn article_of_the_day_is_stable_within_a_day() {
        assert_eq!(article_of_the_day().title, article_of_the_day().title);
    }
}
