//! Closed category taxonomy and the built-in keyword table.
//!
//! Declaration order matters: it is the tie-break when more than one category
//! has a matching keyword. Adding a category is additive; removing one breaks
//! stored data, so bump [`TAXONOMY_VERSION`] on any change.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TAXONOMY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Housing,
    Transportation,
    Food,
    Utilities,
    Insurance,
    Healthcare,
    #[serde(rename = "Debt Payments")]
    DebtPayments,
    Savings,
    #[serde(rename = "Personal Spending")]
    PersonalSpending,
    Entertainment,
    Education,
    #[serde(rename = "Gifts & Donations")]
    GiftsAndDonations,
    Travel,
    Business,
    Other,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Housing,
        Category::Transportation,
        Category::Food,
        Category::Utilities,
        Category::Insurance,
        Category::Healthcare,
        Category::DebtPayments,
        Category::Savings,
        Category::PersonalSpending,
        Category::Entertainment,
        Category::Education,
        Category::GiftsAndDonations,
        Category::Travel,
        Category::Business,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Housing => "Housing",
            Category::Transportation => "Transportation",
            Category::Food => "Food",
            Category::Utilities => "Utilities",
            Category::Insurance => "Insurance",
            Category::Healthcare => "Healthcare",
            Category::DebtPayments => "Debt Payments",
            Category::Savings => "Savings",
            Category::PersonalSpending => "Personal Spending",
            Category::Entertainment => "Entertainment",
            Category::Education => "Education",
            Category::GiftsAndDonations => "Gifts & Donations",
            Category::Travel => "Travel",
            Category::Business => "Business",
            Category::Other => "Other",
        }
    }

    fn builtin_keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Housing => &[
                "rent", "mortgage", "landlord", "hoa", "property management", "apartment",
                "lease", "property tax",
            ],
            Category::Transportation => &[
                "uber trip", "lyft", "shell", "chevron", "exxon", "fuel", "gas station",
                "parking", "toll", "transit", "metro", "car wash", "auto repair", "dmv",
            ],
            Category::Food => &[
                "grocery", "groceries", "supermarket", "whole foods", "trader joe", "safeway",
                "kroger", "restaurant", "cafe", "coffee", "starbucks", "mcdonald", "chipotle",
                "doordash", "grubhub", "uber eats", "pizza", "bakery", "deli", "burger",
                "sushi", "diner",
            ],
            Category::Utilities => &[
                "electric", "electricity", "energy", "water", "sewer", "natural gas", "comcast",
                "xfinity", "verizon", "at t", "t mobile", "internet", "broadband", "utility",
                "utilities",
            ],
            Category::Insurance => &[
                "insurance", "geico", "state farm", "progressive", "allstate",
            ],
            Category::Healthcare => &[
                "pharmacy", "cvs", "walgreens", "hospital", "clinic", "medical", "dental",
                "dentist", "doctor", "health", "optometrist", "urgent care",
            ],
            Category::DebtPayments => &[
                "loan", "student loan", "credit card payment", "card payment", "navient",
                "sallie mae", "finance charge", "interest charge", "payment thank you",
            ],
            Category::Savings => &[
                "savings", "vanguard", "fidelity", "marcus", "brokerage", "401k", "ira",
                "investment",
            ],
            Category::PersonalSpending => &[
                "amazon", "target", "walmart", "clothing", "apparel", "salon", "barber", "gym",
                "fitness", "sephora", "nike", "best buy", "costco",
            ],
            Category::Entertainment => &[
                "netflix", "spotify", "hulu", "disney", "hbo", "youtube", "cinema", "movie",
                "theater", "concert", "ticketmaster", "steam", "playstation", "xbox",
                "nintendo",
            ],
            Category::Education => &[
                "tuition", "university", "college", "school", "coursera", "udemy", "textbook",
                "student",
            ],
            Category::GiftsAndDonations => &[
                "donation", "charity", "gofundme", "red cross", "church", "tithe", "gift",
            ],
            Category::Travel => &[
                "airline", "airlines", "delta air", "united air", "southwest", "hotel",
                "marriott", "hilton", "airbnb", "expedia", "booking com", "amtrak",
                "rental car", "hertz", "avis",
            ],
            Category::Business => &[
                "office depot", "staples", "quickbooks", "adobe", "slack", "zoom", "aws",
                "github", "google workspace", "wework", "fedex", "ups", "usps",
            ],
            Category::Other => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    /// Accepts the display name ("Debt Payments") or its snake_case form ("debt_payments").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(wanted)
                    || snake_case(c.as_str()) == wanted.to_ascii_lowercase()
            })
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown category: {}", wanted)))
    }
}

fn snake_case(name: &str) -> String {
    name.to_ascii_lowercase()
        .replace(" & ", "_and_")
        .replace(' ', "_")
}

/// Keywords at least this long also match inside run-together words.
const SUBSTRING_MIN_LEN: usize = 6;

/// Keyword table in taxonomy order. Keywords are matched against normalized
/// descriptions on whole-word boundaries first; if nothing matches, keywords of
/// [`SUBSTRING_MIN_LEN`] or more characters may match anywhere, so
/// "sq bluebottlecoffee" still finds "coffee" while "current" never finds "rent".
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(Category, Vec<String>)>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            entries: Category::ALL
                .into_iter()
                .map(|c| {
                    (
                        c,
                        c.builtin_keywords().iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl KeywordTable {
    pub fn extend(&mut self, category: Category, keywords: &[String]) {
        if let Some((_, list)) = self.entries.iter_mut().find(|(c, _)| *c == category) {
            for k in keywords {
                let k = crate::ledger::normalizer::normalize_description(k);
                if !k.is_empty() && !list.contains(&k) {
                    list.push(k);
                }
            }
        }
    }

    /// First category (in declaration order) with a keyword present in `normalized`.
    pub fn lookup(&self, normalized: &str) -> Option<(Category, &str)> {
        let padded = format!(" {} ", normalized);
        self.find(|k| padded.contains(&format!(" {} ", k)))
            .or_else(|| self.find(|k| k.len() >= SUBSTRING_MIN_LEN && normalized.contains(k)))
    }

    fn find(&self, matches: impl Fn(&str) -> bool) -> Option<(Category, &str)> {
        for (category, keywords) in &self.entries {
            for k in keywords {
                if matches(k.as_str()) {
                    return Some((*category, k.as_str()));
                }
            }
        }
        None
    }

    pub fn keywords_for(&self, category: Category) -> &[String] {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, k)| k.as_slice())
            .unwrap_or(&[])
    }
}
