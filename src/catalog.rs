//! Book catalog backed by sled
use super::book::{Book, BookDraft, BookPatch};
use super::codec::{decode_record, encode_record};
use super::error::{LedgerError, Result, StorageError, abort};
use super::gateway::Caller;
use super::types::{BookId, UserId};
use super::utils::{index_key, index_prefix};
use serde::Deserialize;
use sled::Transactional;
use sled::transaction::ConflictableTransactionError;
use std::sync::Arc;

/// Read side of the catalog as seen by the request ledger and the wishlist.
pub trait CatalogStore: Send + Sync {
    fn find_book_by_id(&self, id: &BookId) -> Result<Option<Book>>;
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct BookFilter {
    pub search: Option<String>,
    pub available: Option<bool>,
}

pub struct Catalog {
    instance: Arc<sled::Db>,
    books: sled::Tree,
    by_owner: sled::Tree,
}

impl Catalog {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self> {
        let books = instance.open_tree("books")?;
        let by_owner = instance.open_tree("books_by_owner")?;
        Ok(Self {
            instance,
            books,
            by_owner,
        })
    }

    /// List a new book owned by the caller
    pub fn add_book(&self, draft: BookDraft, caller: &Caller) -> Result<Book> {
        let book = draft.validate_and_finalise(BookId::generate()?, caller.user_id().clone())?;
        let encoded = encode_record(&book)?;
        let seq = self.instance.generate_id()?;
        let owner_key = index_key(book.owner.as_str(), seq);

        (&self.books, &self.by_owner)
            .transaction(|(books, by_owner)| {
                books.insert(book.id.as_str().as_bytes(), encoded.clone())?;
                by_owner.insert(owner_key.clone(), book.id.as_str().as_bytes())?;
                Ok::<_, ConflictableTransactionError<LedgerError>>(())
            })
            .map_err(LedgerError::from)?;

        tracing::info!(book_id = %book.id, owner = %book.owner, "book listed");
        Ok(book)
    }

    pub fn get_book(&self, id: &BookId) -> Result<Book> {
        self.find_book_by_id(id)?
            .ok_or_else(|| LedgerError::not_found("book not found"))
    }

    /// Every listing, newest first
    pub fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut books = Vec::new();
        for entry in self.books.iter() {
            let (_, value) = entry?;
            let book: Book = decode_record(&value)?;

            if let Some(available) = filter.available {
                if book.available != available {
                    continue;
                }
            }
            if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
                if !book.matches_search(term.trim()) {
                    continue;
                }
            }
            books.push(book);
        }

        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    /// Listings of one user, newest first
    pub fn list_owned_by(&self, owner: &UserId) -> Result<Vec<Book>> {
        let mut books = Vec::new();
        for entry in self.by_owner.scan_prefix(index_prefix(owner.as_str())).rev() {
            let (_, book_id) = entry?;
            let value = self.books.get(&book_id)?.ok_or_else(|| {
                StorageError::DanglingIndex(String::from_utf8_lossy(&book_id).into_owned())
            })?;
            books.push(decode_record(&value)?);
        }
        Ok(books)
    }

    /// Only the owner may edit a listing
    pub fn update_book(&self, id: &BookId, patch: BookPatch, caller: &Caller) -> Result<Book> {
        let book = self
            .books
            .transaction(|books| {
                let value = books
                    .get(id.as_str().as_bytes())?
                    .ok_or_else(|| abort(LedgerError::not_found("book not found")))?;
                let mut book: Book = decode_record(&value).map_err(abort)?;

                if !book.is_owned_by(caller.user_id()) {
                    return Err(abort(LedgerError::forbidden(
                        "user not authorized to update this book",
                    )));
                }
                book.apply(patch.clone()).map_err(abort)?;

                books.insert(id.as_str().as_bytes(), encode_record(&book).map_err(abort)?)?;
                Ok(book)
            })
            .map_err(LedgerError::from)?;

        tracing::info!(book_id = %book.id, available = book.available, "book updated");
        Ok(book)
    }

    /// Removes the listing. Requests that reference it are kept.
    pub fn delete_book(&self, id: &BookId, caller: &Caller) -> Result<()> {
        let book = self.get_book(id)?;
        if !book.is_owned_by(caller.user_id()) {
            tracing::warn!(book_id = %id, caller = %caller.user_id(), "refused book deletion");
            return Err(LedgerError::forbidden(
                "user not authorized to delete this book",
            ));
        }

        let mut owner_keys = Vec::new();
        for entry in self.by_owner.scan_prefix(index_prefix(book.owner.as_str())) {
            let (key, value) = entry?;
            if value.as_ref() == id.as_str().as_bytes() {
                owner_keys.push(key);
            }
        }

        (&self.books, &self.by_owner)
            .transaction(|(books, by_owner)| {
                books.remove(id.as_str().as_bytes())?;
                for key in &owner_keys {
                    by_owner.remove(key.clone())?;
                }
                Ok::<_, ConflictableTransactionError<LedgerError>>(())
            })
            .map_err(LedgerError::from)?;

        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }
}

impl CatalogStore for Catalog {
    fn find_book_by_id(&self, id: &BookId) -> Result<Option<Book>> {
        match self.books.get(id.as_str().as_bytes())? {
            Some(value) => Ok(Some(decode_record(&value)?)),
            None => Ok(None),
        }
    }
}
