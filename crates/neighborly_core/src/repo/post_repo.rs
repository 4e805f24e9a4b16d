//! Post repository contract and blob-backed implementation.
//!
//! # Invariants
//! - Write paths call `Post::validate()` before persistence.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Each post lives in its own `post:{uuid}` blob.

use crate::model::post::{Post, PostId};
use crate::repo::blob_store::{BlobStore, RepoError, RepoResult};

const POST_BLOB_PREFIX: &str = "post:";

/// Repository interface for post persistence.
pub trait PostRepository {
    fn create_post(&self, post: &Post) -> RepoResult<PostId>;
    fn update_post(&self, post: &Post) -> RepoResult<()>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    fn list_post_ids(&self) -> RepoResult<Vec<PostId>>;
}

pub struct BlobPostRepository<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> BlobPostRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn write(&self, post: &Post) -> RepoResult<()> {
        post.validate()?;
        let body = serde_json::to_string(post)
            .map_err(|err| RepoError::InvalidData(format!("failed to encode post: {err}")))?;
        self.store.save_blob(&post_blob_name(post.id), &body)
    }
}

impl<S: BlobStore> PostRepository for BlobPostRepository<S> {
    fn create_post(&self, post: &Post) -> RepoResult<PostId> {
        self.write(post)?;
        Ok(post.id)
    }

    fn update_post(&self, post: &Post) -> RepoResult<()> {
        let name = post_blob_name(post.id);
        if self.store.load_blob(&name)?.is_none() {
            return Err(RepoError::NotFound(name));
        }
        self.write(post)
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let name = post_blob_name(id);
        let Some(body) = self.store.load_blob(&name)? else {
            return Ok(None);
        };
        let post: Post = serde_json::from_str(&body)
            .map_err(|err| RepoError::InvalidData(format!("invalid post blob `{name}`: {err}")))?;
        if post.id != id {
            return Err(RepoError::InvalidData(format!(
                "post blob `{name}` holds id {}",
                post.id
            )));
        }
        post.validate()?;
        Ok(Some(post))
    }

    fn list_post_ids(&self) -> RepoResult<Vec<PostId>> {
        self.store
            .list_blob_names(POST_BLOB_PREFIX)?
            .into_iter()
            .map(|name| {
                let raw = &name[POST_BLOB_PREFIX.len()..];
                PostId::parse_str(raw).map_err(|_| {
                    RepoError::InvalidData(format!("invalid post id in blob name `{name}`"))
                })
            })
            .collect()
    }
}

fn post_blob_name(id: PostId) -> String {
    format!("{POST_BLOB_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::{BlobPostRepository, PostRepository};
    use crate::db::open_db_in_memory;
    use crate::model::post::{Post, PostDraft};
    use crate::repo::blob_store::{BlobStore, RepoError, SqliteBlobStore};

    #[test]
    fn create_then_get_round_trips_recipients() {
        let conn = open_db_in_memory().expect("open db");
        let repo = BlobPostRepository::new(SqliteBlobStore::new(&conn));
        let post = Post::from_draft(
            PostDraft::post("Lost cat", "gray tabby"),
            vec!["h1".to_string(), "h2".to_string()],
        );

        repo.create_post(&post).expect("create");
        let loaded = repo.get_post(post.id).expect("get").expect("present");
        assert_eq!(loaded, post);
        assert_eq!(repo.list_post_ids().expect("list"), vec![post.id]);
    }

    #[test]
    fn update_requires_existing_post() {
        let conn = open_db_in_memory().expect("open db");
        let repo = BlobPostRepository::new(SqliteBlobStore::new(&conn));
        let post = Post::from_draft(PostDraft::post("Hello", ""), Vec::new());
        let err = repo.update_post(&post).expect_err("missing post");
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[test]
    fn invalid_posts_are_rejected_on_write() {
        let conn = open_db_in_memory().expect("open db");
        let repo = BlobPostRepository::new(SqliteBlobStore::new(&conn));
        let post = Post::from_draft(PostDraft::post("   ", ""), Vec::new());
        let err = repo.create_post(&post).expect_err("blank title");
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[test]
    fn corrupted_blob_is_invalid_data() {
        let conn = open_db_in_memory().expect("open db");
        let store = SqliteBlobStore::new(&conn);
        let post = Post::from_draft(PostDraft::post("Hi", ""), Vec::new());
        store
            .save_blob(&format!("post:{}", post.id), "[]")
            .expect("seed");

        let repo = BlobPostRepository::new(&store);
        let err = repo.get_post(post.id).expect_err("corrupted");
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
