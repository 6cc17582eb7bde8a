use quill_store::Batch;
use quill_types::post::{FIELD_BODY, FIELD_LAST_UPDATED, FIELD_TITLE};
use quill_types::{PostId, PostRecord};

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::keys;

impl Database {
    /// Store a new post and return its id.
    ///
    /// The id comes from an atomic `INCR` of the counter; the post hash and
    /// both set memberships are then written in one batch.
    pub async fn create_post(&self, author: &str, title: &str, body: &str) -> DbResult<PostId> {
        let raw_id = self.store.increment(keys::LAST_POST_ID).await?;
        let id = PostId::try_from(raw_id).map_err(|e| DbError::corrupt(keys::LAST_POST_ID, e))?;
        let last_updated = self.store.server_time().await?;

        let post = PostRecord {
            id,
            title: title.to_string(),
            body: body.to_string(),
            author: author.to_string(),
            last_updated,
        };
        let member = id.to_string();
        let batch = Batch::new()
            .hash_set(keys::post(id), post.to_fields())
            .set_add(keys::POSTS, member.as_str())
            .set_add(keys::user_posts(author), member);
        self.store.execute_atomic(batch).await?;

        tracing::info!(post_id = %id, author, "post created");
        Ok(id)
    }

    /// Load a post.
    pub async fn get_post(&self, id: PostId) -> DbResult<PostRecord> {
        let key = keys::post(id);
        let fields = self.store.hash_get_all(&key).await?;
        if fields.is_empty() {
            return Err(DbError::PostNotFound(id));
        }
        PostRecord::from_fields(id, &fields).map_err(|e| DbError::corrupt(key, e))
    }

    /// Overwrite the title and body of an existing post.
    ///
    /// The author and set memberships are left untouched; `last_updated` is
    /// refreshed from the store clock. The existence check and the write are
    /// separate round-trips, see the crate docs.
    pub async fn update_post(&self, id: PostId, title: &str, body: &str) -> DbResult<()> {
        if !self.store.set_is_member(keys::POSTS, &id.to_string()).await? {
            return Err(DbError::PostNotFound(id));
        }
        let last_updated = self.store.server_time().await?;
        let fields = vec![
            (FIELD_TITLE.to_string(), title.to_string()),
            (FIELD_BODY.to_string(), body.to_string()),
            (FIELD_LAST_UPDATED.to_string(), last_updated.to_string()),
        ];
        self.store.hash_set_fields(&keys::post(id), &fields).await?;
        tracing::info!(post_id = %id, "post updated");
        Ok(())
    }

    /// Remove a post from its author's set, the global set, and the store.
    pub async fn remove_post(&self, author: &str, id: PostId) -> DbResult<()> {
        let member = id.to_string();
        let batch = Batch::new()
            .set_remove(keys::user_posts(author), member.as_str())
            .set_remove(keys::POSTS, member)
            .delete(keys::post(id));
        self.store.execute_atomic(batch).await?;
        tracing::info!(post_id = %id, author, "post removed");
        Ok(())
    }

    /// Ids of the posts written by `username`, ascending.
    pub async fn get_user_posts(&self, username: &str) -> DbResult<Vec<PostId>> {
        let key = keys::user_posts(username);
        let members = self.store.set_members(&key).await?;
        parse_ids(&key, members)
    }

    /// Ids of every post, ascending.
    pub async fn get_all_posts(&self) -> DbResult<Vec<PostId>> {
        let members = self.store.set_members(keys::POSTS).await?;
        parse_ids(keys::POSTS, members)
    }

    /// A uniformly chosen post, or `None` when there are no posts.
    pub async fn random_post(&self) -> DbResult<Option<PostRecord>> {
        let Some(member) = self.store.set_random_member(keys::POSTS).await? else {
            return Ok(None);
        };
        let id = member
            .parse::<PostId>()
            .map_err(|e| DbError::corrupt(keys::POSTS, e))?;
        self.get_post(id).await.map(Some)
    }
}

fn parse_ids(key: &str, members: Vec<String>) -> DbResult<Vec<PostId>> {
    let mut ids = members
        .iter()
        .map(|m| m.parse::<PostId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::corrupt(key, e))?;
    ids.sort();
    Ok(ids)
}
