//! Book listings and the drafts used to create and edit them
use super::error::{LedgerError, Result};
use super::types::{BookId, TimeStamp, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(
    minicbor::Encode, minicbor::Decode, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Condition {
    #[n(0)]
    #[serde(rename = "Like New")]
    LikeNew,
    #[n(1)]
    #[serde(rename = "Very Good")]
    VeryGood,
    #[n(2)]
    Good,
    #[n(3)]
    Acceptable,
}

const MISSING_FIELDS: &str = "title, author, condition and price are required";

#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[n(0)]
    pub id: BookId,
    #[n(1)]
    pub owner: UserId,
    #[n(2)]
    pub title: String,
    #[n(3)]
    pub author: String,
    #[n(4)]
    pub genre: Option<String>,
    #[n(5)]
    pub description: Option<String>,
    #[n(6)]
    pub condition: Condition,
    #[n(7)]
    pub price: u64, // minor currency units
    #[n(8)]
    pub available: bool,
    #[n(9)]
    pub image_url: Option<String>,
    #[n(10)]
    pub created_at: TimeStamp<Utc>,
    #[n(11)]
    pub updated_at: TimeStamp<Utc>,
}

// Also used as the JSON body of a new listing
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    title: Option<String>,
    author: Option<String>,
    genre: Option<String>,
    description: Option<String>,
    condition: Option<Condition>,
    price: Option<u64>,
    available: Option<bool>,
    image_url: Option<String>,
}

/// Partial update of a listing. Absent fields are left untouched.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub condition: Option<Condition>,
    pub price: Option<u64>,
    pub available: Option<bool>,
    pub image_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl BookDraft {
    /// Construct an empty draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_owned());
        self
    }
    pub fn set_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_owned());
        self
    }
    pub fn set_genre(mut self, genre: &str) -> Self {
        self.genre = Some(genre.to_owned());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
    pub fn set_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
    pub fn set_price(mut self, price: u64) -> Self {
        self.price = Some(price);
        self
    }
    pub fn set_available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }
    pub fn set_image_url(mut self, url: &str) -> Self {
        self.image_url = Some(url.to_owned());
        self
    }

    /// Checks the required fields and produces the listing owned by `owner`.
    pub fn validate_and_finalise(self, id: BookId, owner: UserId) -> Result<Book> {
        let missing = || LedgerError::validation(MISSING_FIELDS);
        let title = non_blank(self.title).ok_or_else(missing)?;
        let author = non_blank(self.author).ok_or_else(missing)?;
        let condition = self.condition.ok_or_else(missing)?;
        let price = self.price.ok_or_else(missing)?;

        let now = TimeStamp::new();
        Ok(Book {
            id,
            owner,
            title,
            author,
            genre: non_blank(self.genre),
            description: non_blank(self.description),
            condition,
            price,
            available: self.available.unwrap_or(true),
            image_url: non_blank(self.image_url),
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

impl Book {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner == *user
    }

    /// Applies the fields present in `patch`. Ownership is never part of a patch.
    pub fn apply(&mut self, patch: BookPatch) -> Result<()> {
        if let Some(title) = patch.title {
            self.title = non_blank(Some(title))
                .ok_or_else(|| LedgerError::validation("title cannot be empty"))?;
        }
        if let Some(author) = patch.author {
            self.author = non_blank(Some(author))
                .ok_or_else(|| LedgerError::validation("author cannot be empty"))?;
        }
        if patch.genre.is_some() {
            self.genre = non_blank(patch.genre);
        }
        if patch.description.is_some() {
            self.description = non_blank(patch.description);
        }
        if let Some(condition) = patch.condition {
            self.condition = condition;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if patch.image_url.is_some() {
            self.image_url = non_blank(patch.image_url);
        }
        self.updated_at = TimeStamp::new();
        Ok(())
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term) || self.author.to_lowercase().contains(&term)
    }
}
