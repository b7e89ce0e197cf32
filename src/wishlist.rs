//! Per-user wishlists of books
use super::book::Book;
use super::catalog::CatalogStore;
use super::codec::{decode_record, encode_record};
use super::error::{LedgerError, Result, abort};
use super::gateway::Caller;
use super::types::{BookId, TimeStamp};
use super::utils::{index_key, index_prefix};
use chrono::Utc;
use sled::Transactional;
use sled::transaction::ConflictableTransactionError;
use std::sync::Arc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
struct WishlistEntry {
    #[n(0)]
    book: BookId,
    #[n(1)]
    seq: u64, // position in the ordered index
    #[n(2)]
    added_at: TimeStamp<Utc>,
}

pub struct Wishlist {
    instance: Arc<sled::Db>,
    // len(user) user seq -> book id
    ordered: sled::Tree,
    // len(user) user book id -> entry
    members: sled::Tree,
    catalog: Arc<dyn CatalogStore>,
}

fn member_key(caller: &Caller, book: &BookId) -> Vec<u8> {
    let mut key = index_prefix(caller.user_id().as_str());
    key.extend_from_slice(book.as_str().as_bytes());
    key
}

impl Wishlist {
    pub fn new(instance: Arc<sled::Db>, catalog: Arc<dyn CatalogStore>) -> Result<Self> {
        Ok(Self {
            ordered: instance.open_tree("wishlists")?,
            members: instance.open_tree("wishlist_members")?,
            instance,
            catalog,
        })
    }

    /// Adding a book that is already on the list is a no-op.
    pub fn add(&self, caller: &Caller, book_id: &BookId) -> Result<Book> {
        let book = self
            .catalog
            .find_book_by_id(book_id)?
            .ok_or_else(|| LedgerError::not_found("book not found"))?;
        if book.is_owned_by(caller.user_id()) {
            return Err(LedgerError::invalid_operation(
                "cannot add own book to wishlist",
            ));
        }

        let entry = WishlistEntry {
            book: book_id.clone(),
            seq: self.instance.generate_id()?,
            added_at: TimeStamp::new(),
        };
        let encoded = encode_record(&entry)?;
        let member = member_key(caller, book_id);
        let position = index_key(caller.user_id().as_str(), entry.seq);

        (&self.ordered, &self.members)
            .transaction(|(ordered, members)| {
                if members.get(member.as_slice())?.is_some() {
                    return Ok(());
                }
                ordered.insert(position.clone(), book_id.as_str().as_bytes())?;
                members.insert(member.clone(), encoded.clone())?;
                Ok::<_, ConflictableTransactionError<LedgerError>>(())
            })
            .map_err(LedgerError::from)?;

        tracing::debug!(user_id = %caller.user_id(), book_id = %book_id, "wishlist add");
        Ok(book)
    }

    pub fn remove(&self, caller: &Caller, book_id: &BookId) -> Result<()> {
        let member = member_key(caller, book_id);

        (&self.ordered, &self.members)
            .transaction(|(ordered, members)| {
                let value = members.get(member.as_slice())?.ok_or_else(|| {
                    abort(LedgerError::not_found("book is not on the wishlist"))
                })?;
                let entry: WishlistEntry = decode_record(&value).map_err(abort)?;

                ordered.remove(index_key(caller.user_id().as_str(), entry.seq))?;
                members.remove(member.clone())?;
                Ok::<_, ConflictableTransactionError<LedgerError>>(())
            })
            .map_err(LedgerError::from)?;

        tracing::debug!(user_id = %caller.user_id(), book_id = %book_id, "wishlist remove");
        Ok(())
    }

    /// Most recently added first. Books deleted since are skipped.
    pub fn list(&self, caller: &Caller) -> Result<Vec<Book>> {
        let mut books = Vec::new();
        for entry in self
            .ordered
            .scan_prefix(index_prefix(caller.user_id().as_str()))
            .rev()
        {
            let (_, book_id) = entry?;
            let book_id = BookId::from(String::from_utf8_lossy(&book_id).into_owned());
            if let Some(book) = self.catalog.find_book_by_id(&book_id)? {
                books.push(book);
            }
        }
        Ok(books)
    }
}
