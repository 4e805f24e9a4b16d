//! Post use-case service.
//!
//! # Responsibility
//! - Create posts/events for the audience chosen by targeting.
//! - Run edit sessions that may only grow an already-sent audience.
//!
//! # Invariants
//! - New posts never persist with an empty audience.
//! - Saving an edit never removes a recipient that is currently persisted.
//! - Cancelling an edit performs no writes.

use crate::model::household::HouseholdId;
use crate::model::post::{Post, PostDraft, PostId};
use crate::repo::blob_store::{RepoError, RepoResult};
use crate::repo::post_repo::PostRepository;
use crate::targeting::lock::RecipientLock;
use log::info;
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for post use-cases.
#[derive(Debug)]
pub enum PostServiceError {
    /// Targeting produced no recipients.
    EmptyAudience,
    PostNotFound(PostId),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for PostServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAudience => write!(f, "post audience must not be empty"),
            Self::PostNotFound(id) => write!(f, "post not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent post state: {details}"),
        }
    }
}

impl Error for PostServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PostServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Edit session over one sent post.
///
/// Dropping the session (or `PostService::cancel_edit`) discards additions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEditSession {
    post_id: PostId,
    lock: RecipientLock,
}

impl PostEditSession {
    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn toggle_recipient(&mut self, recipient: &str) -> bool {
        self.lock.toggle_recipient(recipient)
    }

    pub fn lock(&self) -> &RecipientLock {
        &self.lock
    }

    pub fn effective_recipients(&self) -> Vec<String> {
        self.lock.effective_recipients()
    }
}

pub struct PostService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> PostService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a post addressed to the effective selection.
    pub fn create_post(
        &self,
        draft: PostDraft,
        audience: &BTreeSet<HouseholdId>,
    ) -> Result<Post, PostServiceError> {
        if audience.is_empty() {
            return Err(PostServiceError::EmptyAudience);
        }
        let post = Post::from_draft(draft, audience.iter().cloned().collect());
        let post_id = self.repo.create_post(&post)?;
        info!(
            "event=post_create module=service status=ok post_id={} recipients={}",
            post_id,
            post.recipients.len()
        );

        self.repo
            .get_post(post_id)?
            .ok_or(PostServiceError::InconsistentState(
                "created post not found in read-back",
            ))
    }

    pub fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        self.repo.get_post(id)
    }

    /// Starts editing; the current recipients become the locked set.
    pub fn begin_edit(&self, id: PostId) -> Result<PostEditSession, PostServiceError> {
        let post = self
            .repo
            .get_post(id)?
            .ok_or(PostServiceError::PostNotFound(id))?;
        Ok(PostEditSession {
            post_id: id,
            lock: RecipientLock::for_edit(post.recipients.as_slice()),
        })
    }

    /// Commits an edit session.
    ///
    /// Effective recipients are merged into the currently persisted list so
    /// concurrent additions made elsewhere survive.
    pub fn save_edit(&self, session: PostEditSession) -> Result<Post, PostServiceError> {
        let mut post = self
            .repo
            .get_post(session.post_id)?
            .ok_or(PostServiceError::PostNotFound(session.post_id))?;

        let before = post.recipients.len();
        let mut present: HashSet<String> = post.recipients.iter().cloned().collect();
        for recipient in session.lock.effective_recipients() {
            if present.insert(recipient.clone()) {
                post.recipients.push(recipient);
            }
        }
        let added = post.recipients.len() - before;

        if added > 0 {
            self.repo.update_post(&post)?;
        }
        info!(
            "event=post_edit_save module=service status=ok post_id={} added={}",
            post.id, added
        );
        Ok(post)
    }

    /// Discards an edit session without writing.
    pub fn cancel_edit(&self, session: PostEditSession) {
        if !session.lock.mutable_recipients().is_empty() {
            info!(
                "event=post_edit_cancel module=service status=discarded post_id={} discarded={}",
                session.post_id,
                session.lock.mutable_recipients().len()
            );
        }
    }
}
