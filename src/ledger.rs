//! Service layer API for swap request negotiation.
//!
//! Requests live in the `requests` tree. Two index trees list them per seller and
//! per requester, keyed so that a reversed prefix scan is newest first. The
//! `active_requests` tree holds one entry per (book, requester) pair whose request
//! is pending or accepted; it is written in the same transaction as the request
//! itself, which makes the one-active-request-per-pair rule hold under concurrent
//! callers.
use super::catalog::CatalogStore;
use super::codec::{decode_record, encode_record};
use super::error::{ErrorKind, LedgerError, Result, StorageError, abort};
use super::gateway::Caller;
use super::request::{Request, Transition};
use super::types::{BookId, RequestId, UserId};
use super::users::UserDirectory;
use super::utils::{index_key, index_prefix, pair_digest};
use super::view::RequestView;
use serde::Deserialize;
use sled::Transactional;
use sled::transaction::ConflictableTransactionError;
use std::sync::Arc;

/// Input of [`RequestLedger::create_request`], also the JSON body of `POST /api/requests`.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub book_id: Option<String>,
    pub message: Option<String>,
    pub contact_details: Option<String>,
}

impl NewRequest {
    pub fn new(book_id: &BookId, message: &str) -> Self {
        Self {
            book_id: Some(book_id.to_string()),
            message: Some(message.to_owned()),
            contact_details: None,
        }
    }
    pub fn with_contact_details(mut self, contact_details: &str) -> Self {
        self.contact_details = Some(contact_details.to_owned());
        self
    }
}

pub struct RequestLedger {
    instance: Arc<sled::Db>,
    requests: sled::Tree,
    by_seller: sled::Tree,
    by_requester: sled::Tree,
    active: sled::Tree,
    catalog: Arc<dyn CatalogStore>,
    users: Arc<dyn UserDirectory>,
}

impl RequestLedger {
    pub fn new(
        instance: Arc<sled::Db>,
        catalog: Arc<dyn CatalogStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Result<Self> {
        Ok(Self {
            requests: instance.open_tree("requests")?,
            by_seller: instance.open_tree("requests_by_seller")?,
            by_requester: instance.open_tree("requests_by_requester")?,
            active: instance.open_tree("active_requests")?,
            instance,
            catalog,
            users,
        })
    }

    /// Open a swap request for someone else's book
    pub fn create_request(&self, input: NewRequest, caller: &Caller) -> Result<Request> {
        let result = self.try_create(input, caller);
        match &result {
            Ok(request) => tracing::info!(
                request_id = %request.id,
                book_id = %request.book,
                requester = %request.requester,
                "request created"
            ),
            Err(e) => log_refusal("create request", caller, e),
        }
        result
    }

    fn try_create(&self, input: NewRequest, caller: &Caller) -> Result<Request> {
        let book_id = input.book_id.filter(|b| !b.trim().is_empty());
        let message = input.message.filter(|m| !m.trim().is_empty());
        let (Some(book_id), Some(message)) = (book_id, message) else {
            return Err(LedgerError::validation("book id and message are required"));
        };

        let book = self
            .catalog
            .find_book_by_id(&BookId::from(book_id))?
            .ok_or_else(|| LedgerError::not_found("book not found"))?;

        if book.is_owned_by(caller.user_id()) {
            return Err(LedgerError::invalid_operation("cannot request own book"));
        }

        let request = Request::open(
            RequestId::generate()?,
            &book,
            caller.user_id().clone(),
            message,
            input.contact_details,
        );
        let encoded = encode_record(&request)?;
        let pair = pair_digest(request.book.as_str(), request.requester.as_str());
        let seq = self.instance.generate_id()?;
        let seller_key = index_key(request.seller.as_str(), seq);
        let requester_key = index_key(request.requester.as_str(), seq);
        let id = request.id.as_str().as_bytes();

        (&self.requests, &self.by_seller, &self.by_requester, &self.active)
            .transaction(|(requests, by_seller, by_requester, active)| {
                if active.get(pair.as_bytes())?.is_some() {
                    return Err(abort(LedgerError::conflict(
                        "active request already exists",
                    )));
                }
                requests.insert(id, encoded.clone())?;
                by_seller.insert(seller_key.clone(), id)?;
                by_requester.insert(requester_key.clone(), id)?;
                active.insert(pair.as_bytes(), id)?;
                Ok(())
            })
            .map_err(LedgerError::from)?;

        Ok(request)
    }

    /// Requests against the caller's listings, newest first
    pub fn list_incoming(&self, caller: &Caller) -> Result<Vec<Request>> {
        self.scan_index(&self.by_seller, caller.user_id())
    }

    /// Requests the caller has made, newest first
    pub fn list_outgoing(&self, caller: &Caller) -> Result<Vec<Request>> {
        self.scan_index(&self.by_requester, caller.user_id())
    }

    /// Accept, decline or cancel a pending request.
    ///
    /// The status value is checked first, then that the request exists, then that the
    /// caller is the party allowed to make this move, then that the request is still
    /// pending.
    pub fn update_status(
        &self,
        request_id: &RequestId,
        new_status: &str,
        caller: &Caller,
    ) -> Result<Request> {
        let result = self.try_update(request_id, new_status, caller);
        match &result {
            Ok(request) => tracing::info!(
                request_id = %request.id,
                status = request.status.as_str(),
                version = request.version,
                "request status changed"
            ),
            Err(e) => log_refusal("update request status", caller, e),
        }
        result
    }

    fn try_update(
        &self,
        request_id: &RequestId,
        new_status: &str,
        caller: &Caller,
    ) -> Result<Request> {
        let transition = Transition::parse(new_status)?;
        let id = request_id.as_str().as_bytes();

        let request = (&self.requests, &self.active)
            .transaction(|(requests, active)| {
                let value = requests
                    .get(id)?
                    .ok_or_else(|| abort(LedgerError::not_found("request not found")))?;
                let mut request: Request = decode_record(&value).map_err(abort)?;

                request
                    .transition(transition, caller.user_id())
                    .map_err(abort)?;

                requests.insert(id, encode_record(&request).map_err(abort)?)?;
                if !request.is_active() {
                    let pair = pair_digest(request.book.as_str(), request.requester.as_str());
                    active.remove(pair.as_bytes())?;
                }
                Ok::<_, ConflictableTransactionError<LedgerError>>(request)
            })
            .map_err(LedgerError::from)?;

        Ok(request)
    }

    /// Resolve book and participants for display
    pub fn resolve(&self, request: Request) -> Result<RequestView> {
        RequestView::resolve(request, self.catalog.as_ref(), self.users.as_ref())
    }

    pub fn resolve_all(&self, requests: Vec<Request>) -> Result<Vec<RequestView>> {
        requests.into_iter().map(|r| self.resolve(r)).collect()
    }

    fn scan_index(&self, index: &sled::Tree, user: &UserId) -> Result<Vec<Request>> {
        let mut requests = Vec::new();
        for entry in index.scan_prefix(index_prefix(user.as_str())).rev() {
            let (_, request_id) = entry?;
            let value = self.requests.get(&request_id)?.ok_or_else(|| {
                StorageError::DanglingIndex(String::from_utf8_lossy(&request_id).into_owned())
            })?;
            requests.push(decode_record(&value)?);
        }
        Ok(requests)
    }
}

fn log_refusal(operation: &str, caller: &Caller, err: &LedgerError) {
    if err.kind() == ErrorKind::Internal {
        tracing::error!(caller = %caller.user_id(), "{operation} failed: {err}");
    } else {
        tracing::warn!(
            caller = %caller.user_id(),
            kind = err.kind().as_str(),
            "{operation} refused: {err}"
        );
    }
}
