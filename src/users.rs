//! Public user profiles.
//!
//! Accounts and credentials live with the identity provider. This directory only
//! keeps the display data shown next to listings and requests.
use super::codec::{decode_record, encode_record};
use super::error::{LedgerError, Result};
use super::gateway::Caller;
use super::types::{TimeStamp, UserId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(minicbor::Encode, minicbor::Decode, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[n(0)]
    pub id: UserId,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub email: String, // stored lower-cased
    #[n(3)]
    pub bio: Option<String>,
    #[n(4)]
    pub profile_pic: Option<String>,
    #[n(5)]
    pub updated_at: TimeStamp<Utc>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

/// Lookup used to resolve request participants for display.
pub trait UserDirectory: Send + Sync {
    fn find_profile(&self, id: &UserId) -> Result<Option<UserProfile>>;
}

pub struct Profiles {
    users: sled::Tree,
}

impl Profiles {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self> {
        Ok(Self {
            users: instance.open_tree("users")?,
        })
    }

    /// Create or replace the caller's own profile
    pub fn upsert_profile(&self, caller: &Caller, update: ProfileUpdate) -> Result<UserProfile> {
        let name = update
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| LedgerError::validation("name and email are required"))?;
        let email = update
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| LedgerError::validation("name and email are required"))?;
        if !email.contains('@') {
            return Err(LedgerError::validation("email address is not valid"));
        }

        let profile = UserProfile {
            id: caller.user_id().clone(),
            name,
            email,
            bio: update.bio.filter(|b| !b.trim().is_empty()),
            profile_pic: update.profile_pic.filter(|p| !p.trim().is_empty()),
            updated_at: TimeStamp::new(),
        };
        self.users
            .insert(profile.id.as_str().as_bytes(), encode_record(&profile)?)?;

        tracing::info!(user_id = %profile.id, "profile saved");
        Ok(profile)
    }

    pub fn get_profile(&self, id: &UserId) -> Result<UserProfile> {
        self.find_profile(id)?
            .ok_or_else(|| LedgerError::not_found("user not found"))
    }
}

impl UserDirectory for Profiles {
    fn find_profile(&self, id: &UserId) -> Result<Option<UserProfile>> {
        match self.users.get(id.as_str().as_bytes())? {
            Some(value) => Ok(Some(decode_record(&value)?)),
            None => Ok(None),
        }
    }
}
