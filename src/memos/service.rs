//! Memo service — memo operations composed from the pipeline stages
//!
//! Listing is open to everyone and shows every user's memos; only mutations
//! are ownership-scoped. Ownership is checked inside the collection's writer
//! transaction, so the record that was checked is the record that is changed.

use crate::auth::token::TokenService;
use crate::error::Result;
use crate::memos::types::{Memo, MemoDraft};
use crate::pipeline::{self, Rejection, RequestContext, Verdict};
use crate::store::{Collection, Write};
use std::sync::Arc;

/// Memo domain operations
pub struct MemoService {
    memos: Collection<Memo>,
    tokens: Arc<TokenService>,
}

impl MemoService {
    pub fn new(memos: Collection<Memo>, tokens: Arc<TokenService>) -> Self {
        Self { memos, tokens }
    }

    /// All memos in stored order, optionally filtered by `search`.
    ///
    /// An empty or absent query returns the full list.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Memo>> {
        let memos = self.memos.load_all().await?;
        Ok(match search.filter(|q| !q.is_empty()) {
            Some(query) => memos.into_iter().filter(|m| m.matches(query)).collect(),
            None => memos,
        })
    }

    /// Look up a memo without any ownership check
    pub async fn get(&self, id: &str) -> Result<Option<Memo>> {
        self.memos.find(id).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.memos.len().await
    }

    /// Create a memo owned by the authenticated caller
    pub async fn create(&self, ctx: &RequestContext, draft: MemoDraft) -> Result<Verdict<Memo>> {
        let who = match pipeline::authenticate(ctx, &self.tokens) {
            Ok(who) => who,
            Err(rejection) => return Ok(Err(rejection)),
        };

        let memo = self.memos.create(Memo::new(draft, who.user_id)).await?;
        tracing::info!(memo_id = %memo.id, user_id = %memo.owner_id, "Created memo");
        Ok(Ok(memo))
    }

    /// Fetch a memo for editing; only its owner may see the edit form
    pub async fn edit_form(&self, ctx: &RequestContext, id: &str) -> Result<Verdict<Memo>> {
        let who = match pipeline::authenticate(ctx, &self.tokens) {
            Ok(who) => who,
            Err(rejection) => return Ok(Err(rejection)),
        };

        let memos = self.memos.load_all().await?;
        Ok(pipeline::authorize(&memos, id, &who).map(|index| memos[index].clone()))
    }

    /// Replace title and content of a memo owned by the caller
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        id: &str,
        draft: MemoDraft,
    ) -> Result<Verdict<Memo>> {
        let who = match pipeline::authenticate(ctx, &self.tokens) {
            Ok(who) => who,
            Err(rejection) => return Ok(Err(rejection)),
        };

        let verdict = self
            .memos
            .transact(|memos| match pipeline::authorize(memos, id, &who) {
                Ok(index) => {
                    let memo = &mut memos[index];
                    memo.title = draft.title;
                    memo.content = draft.content;
                    Ok(Write::Commit(Ok(memo.clone())))
                }
                Err(rejection) => Ok(Write::Discard(Err(rejection))),
            })
            .await?;

        self.log_verdict("edit", id, &who.user_id, &verdict);
        Ok(verdict)
    }

    /// Delete a memo owned by the caller, returning the removed memo
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<Verdict<Memo>> {
        let who = match pipeline::authenticate(ctx, &self.tokens) {
            Ok(who) => who,
            Err(rejection) => return Ok(Err(rejection)),
        };

        let verdict = self
            .memos
            .transact(|memos| match pipeline::authorize(memos, id, &who) {
                Ok(index) => Ok(Write::Commit(Ok(memos.remove(index)))),
                Err(rejection) => Ok(Write::Discard(Err(rejection))),
            })
            .await?;

        self.log_verdict("delete", id, &who.user_id, &verdict);
        Ok(verdict)
    }

    fn log_verdict(
        &self,
        action: &str,
        id: &str,
        user_id: &crate::auth::types::UserId,
        verdict: &Verdict<Memo>,
    ) {
        match verdict {
            Ok(_) => tracing::info!(memo_id = id, user_id = %user_id, "Memo {} applied", action),
            Err(Rejection::OwnerMismatch) => tracing::warn!(
                memo_id = id,
                user_id = %user_id,
                "Memo {} refused: caller is not the owner",
                action
            ),
            Err(rejection) => {
                tracing::debug!(memo_id = id, user_id = %user_id, "Memo {} rejected: {}", action, rejection)
            }
        }
    }
}
