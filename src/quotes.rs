use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub text: &'static str,
    pub source: &'static str,
}

pub const QUOTES: [Quote; 5] = [
    Quote {
        text: "Whoever fasts in Ramadan with faith and seeking reward will have his past sins forgiven.",
        source: "Sahih Bukhari",
    },
    Quote {
        text: "Ramadan is the month of the Quran.",
        source: "Quran 2:185",
    },
    Quote {
        text: "The best among you are those who learn the Quran and teach it.",
        source: "Sahih Bukhari",
    },
    Quote {
        text: "Fasting is a shield.",
        source: "Sahih Muslim",
    },
    Quote {
        text: "There is a gate in Paradise called Ar-Rayyan, for those who fast.",
        source: "Sahih Bukhari",
    },
];

/// Same quote all day, next one tomorrow.
pub fn quote_for(date: NaiveDate) -> Quote {
    let index = date.num_days_from_ce().rem_euclid(QUOTES.len() as i32) as usize;
    QUOTES[index]
}
