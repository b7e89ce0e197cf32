//! Read-side views of requests with their references resolved for display
use super::book::{Book, Condition};
use super::catalog::CatalogStore;
use super::error::Result;
use super::request::{Request, RequestStatus};
use super::types::{RequestId, TimeStamp, UserId};
use super::users::{UserDirectory, UserProfile};
use chrono::Utc;
use serde::Serialize;

/// A reference that is either resolved to its summary or, when the target is gone,
/// left as the bare id.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Populated<T> {
    Resolved(T),
    Dangling(String),
}

impl<T> Populated<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Populated::Resolved(value) => Some(value),
            Populated::Dangling(_) => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: u64,
    pub condition: Condition,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_pic: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: RequestId,
    pub book: Populated<BookSummary>,
    pub seller: Populated<UserSummary>,
    pub requester: Populated<UserSummary>,
    pub message: String,
    pub contact_details: Option<String>,
    pub status: RequestStatus,
    pub version: u64,
    pub created_at: TimeStamp<Utc>,
    pub updated_at: TimeStamp<Utc>,
}

impl From<Book> for BookSummary {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title,
            author: book.author,
            price: book.price,
            condition: book.condition,
        }
    }
}

impl From<UserProfile> for UserSummary {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name,
            email: profile.email,
            profile_pic: profile.profile_pic,
        }
    }
}

fn user_summary(users: &dyn UserDirectory, id: &UserId) -> Result<Populated<UserSummary>> {
    Ok(match users.find_profile(id)? {
        Some(profile) => Populated::Resolved(profile.into()),
        None => Populated::Dangling(id.to_string()),
    })
}

impl RequestView {
    pub fn resolve(
        request: Request,
        catalog: &dyn CatalogStore,
        users: &dyn UserDirectory,
    ) -> Result<Self> {
        let book = match catalog.find_book_by_id(&request.book)? {
            Some(book) => Populated::Resolved(book.into()),
            None => Populated::Dangling(request.book.to_string()),
        };

        Ok(Self {
            book,
            seller: user_summary(users, &request.seller)?,
            requester: user_summary(users, &request.requester)?,
            id: request.id,
            message: request.message,
            contact_details: request.contact_details,
            status: request.status,
            version: request.version,
            created_at: request.created_at,
            updated_at: request.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_reference_serialises_as_id() {
        let populated: Populated<BookSummary> = Populated::Dangling("book_gone".into());
        assert_eq!(serde_json::to_value(&populated).unwrap(), "book_gone");
        assert!(populated.resolved().is_none());
    }

    #[test]
    fn resolved_reference_serialises_as_object() {
        let populated = Populated::Resolved(UserSummary {
            id: "alice".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            profile_pic: None,
        });
        let json = serde_json::to_value(&populated).unwrap();
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["profilePic"], serde_json::Value::Null);
    }
}
