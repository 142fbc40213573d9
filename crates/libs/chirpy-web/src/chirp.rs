//! Posting, listing and deleting chirps.

use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use chirpy_models::{
    chirp::{Chirp, ChirpCreate},
    store::ChirpStore,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ctx::Ctx, prelude::*};

pub const MAX_CHIRP_LENGTH: usize = 140;

const CENSORED: &str = "****";

static PROFANITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:kerfuffle|sharbert|fornax)\b").expect("profanity pattern compiles")
});

#[derive(Debug, Clone, Deserialize)]
pub struct ChirpPost {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChirpApi {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl From<Chirp> for ChirpApi {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

/// Query string of `GET /api/chirps`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChirpQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Parses a user supplied id.
pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::InvalidId(raw.to_string()))
}

/// Replaces every profane word with `****`.
///
/// Matching is case-insensitive and on word boundaries: `Kerfuffle!` is
/// censored, `kerfuffles` is not.
///
/// # Examples
///
/// ```rust
/// use chirpy_web::chirp::censor;
///
/// assert_eq!(censor("what a kerfuffle!"), "what a ****!");
/// ```
pub fn censor(body: &str) -> String {
    PROFANITY_REGEX.replace_all(body, CENSORED).into_owned()
}

#[derive(Clone)]
pub struct ChirpService {
    chirps: Arc<dyn ChirpStore>,
}

impl ChirpService {
    pub fn new(chirps: Arc<dyn ChirpStore>) -> Self {
        Self { chirps }
    }

    /// Posts `body` as the caller, after length check and censoring.
    pub fn create(&self, ctx: &Ctx, body: &str) -> Result<Chirp> {
        let length = body.chars().count();
        if length > MAX_CHIRP_LENGTH {
            return Err(Error::ChirpTooLong(length));
        }

        let chirp = self
            .chirps
            .create_chirp(ChirpCreate::new(ctx.user_id, censor(body)))?;
        info!("User {} posted chirp {}", ctx.user_id, chirp.id);
        Ok(chirp)
    }

    pub fn list(&self, query: &ChirpQuery) -> Result<Vec<Chirp>> {
        let author = query.author_id.as_deref().map(parse_id).transpose()?;
        let order = query
            .sort
            .as_deref()
            .map(SortOrder::from_str)
            .transpose()?
            .unwrap_or_default();

        let mut chirps = self.chirps.list_chirps(author.as_ref())?;
        if order == SortOrder::Desc {
            chirps.reverse();
        }
        Ok(chirps)
    }

    pub fn get(&self, id: &Uuid) -> Result<Chirp> {
        self.chirps.chirp_by_id(id).map_err(not_found)
    }

    /// Deletes a chirp. Only its author may do so.
    pub fn delete(&self, ctx: &Ctx, id: &Uuid) -> Result<()> {
        let chirp = self.get(id)?;
        if chirp.user_id != ctx.user_id {
            warn!("User {} tried to delete chirp {} of another user", ctx.user_id, id);
            return Err(Error::ApiForbidden);
        }

        self.chirps.delete_chirp(id).map_err(not_found)?;
        info!("User {} deleted chirp {}", ctx.user_id, id);
        Ok(())
    }
}

fn not_found(err: chirpy_models::error::Error) -> Error {
    if err.is_not_found() {
        Error::ChirpNotFound
    } else {
        Error::Models(err)
    }
}

#[cfg(test)]
mod tests {
    use chirpy_models::{memory::MemoryStore, store::UserStore, user::UserCreate};

    use super::*;

    fn service() -> (ChirpService, Ctx, Ctx) {
        let store = MemoryStore::new();
        let alice = store
            .create_user(UserCreate::new("alice@b.com", "hash"))
            .unwrap();
        let bob = store.create_user(UserCreate::new("bob@b.com", "hash")).unwrap();
        (
            ChirpService::new(Arc::new(store)),
            Ctx::new(alice.id),
            Ctx::new(bob.id),
        )
    }

    #[test]
    fn censors_whole_words_case_insensitively() {
        assert_eq!(
            censor("This is a kerfuffle opinion I need to share with the world"),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(censor("Sharbert and FORNAX"), "**** and ****");
        assert_eq!(censor("what a kerfuffle!"), "what a ****!");
        assert_eq!(censor("(Sharbert), fornax."), "(****), ****.");
        assert_eq!(censor("kerfuffles and fornaxes"), "kerfuffles and fornaxes");
        assert_eq!(censor("no bad words"), "no bad words");
    }

    #[test]
    fn length_limit_counts_characters() {
        let (service, alice, _) = service();
        assert!(service.create(&alice, &"a".repeat(MAX_CHIRP_LENGTH)).is_ok());
        assert!(matches!(
            service.create(&alice, &"a".repeat(MAX_CHIRP_LENGTH + 1)),
            Err(Error::ChirpTooLong(141))
        ));
        assert!(service.create(&alice, &"é".repeat(MAX_CHIRP_LENGTH)).is_ok());
    }

    #[test]
    fn created_chirp_is_censored() {
        let (service, alice, _) = service();
        let chirp = service.create(&alice, "what a Fornax").unwrap();
        assert_eq!(chirp.body, "what a ****");
        assert_eq!(chirp.user_id, alice.user_id);
    }

    #[test]
    fn list_sorts_and_filters() {
        let (service, alice, bob) = service();
        service.create(&alice, "first").unwrap();
        service.create(&bob, "second").unwrap();
        service.create(&alice, "third").unwrap();

        let bodies = |query: ChirpQuery| -> Vec<String> {
            service
                .list(&query)
                .unwrap()
                .into_iter()
                .map(|c| c.body)
                .collect()
        };

        assert_eq!(bodies(ChirpQuery::default()), ["first", "second", "third"]);
        assert_eq!(
            bodies(ChirpQuery {
                sort: Some(String::from("desc")),
                ..Default::default()
            }),
            ["third", "second", "first"]
        );
        assert_eq!(
            bodies(ChirpQuery {
                author_id: Some(alice.user_id.to_string()),
                sort: Some(String::from("asc")),
            }),
            ["first", "third"]
        );
    }

    #[test]
    fn list_rejects_bad_query() {
        let (service, _, _) = service();
        assert!(matches!(
            service.list(&ChirpQuery {
                sort: Some(String::from("sideways")),
                ..Default::default()
            }),
            Err(Error::InvalidSortOrder(_))
        ));
        assert!(matches!(
            service.list(&ChirpQuery {
                author_id: Some(String::from("not-a-uuid")),
                ..Default::default()
            }),
            Err(Error::InvalidId(_))
        ));
    }

    #[test]
    fn only_author_may_delete() {
        let (service, alice, bob) = service();
        let chirp = service.create(&alice, "mine").unwrap();

        assert!(matches!(
            service.delete(&bob, &chirp.id),
            Err(Error::ApiForbidden)
        ));
        service.delete(&alice, &chirp.id).unwrap();
        assert!(matches!(service.get(&chirp.id), Err(Error::ChirpNotFound)));
        assert!(matches!(
            service.delete(&alice, &chirp.id),
            Err(Error::ChirpNotFound)
        ));
    }
}
