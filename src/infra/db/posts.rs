use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::PageRequest,
    application::repos::{
        CreatePostParams, GroupPatch, PostFeedFilter, PostsRepo, PostsWriteRepo, RepoError,
        UpdatePostParams,
    },
    domain::entities::PostRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

/// Joined projection shared by every post query. The author is mandatory;
/// the group side of the join may be absent.
const POST_SELECT: &str = "SELECT p.id, p.author_id, u.username AS author_username, p.text, \
     p.group_id, g.title AS group_title, g.slug AS group_slug, p.image, p.created_at \
     FROM posts p \
     INNER JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    author_username: String,
    text: String,
    group_id: Option<Uuid>,
    group_title: Option<String>,
    group_slug: Option<String>,
    image: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            author_username: row.author_username,
            text: row.text,
            group_id: row.group_id,
            group_title: row.group_title,
            group_slug: row.group_slug,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        filter: &PostFeedFilter,
        page: PageRequest,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(POST_SELECT);
        qb.push(" WHERE TRUE");
        Self::apply_feed_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.seq DESC LIMIT ");
        qb.push_bind(i64::from(page.limit()));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, filter: &PostFeedFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE TRUE");
        Self::apply_feed_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (author_id, group_id, text, image)
                VALUES ($1, $2, $3, $4)
                RETURNING id, author_id, group_id, text, image, created_at
            )
            SELECT i.id, i.author_id, u.username AS author_username, i.text,
                   i.group_id, g.title AS group_title, g.slug AS group_slug,
                   i.image, i.created_at
            FROM inserted i
            INNER JOIN users u ON u.id = i.author_id
            LEFT JOIN groups g ON g.id = i.group_id
            "#,
        )
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(&params.text)
        .bind(&params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let (clear_group, new_group) = match params.group {
            GroupPatch::Keep => (false, None),
            GroupPatch::Clear => (true, None),
            GroupPatch::Set(group_id) => (false, Some(group_id)),
        };

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            WITH updated AS (
                UPDATE posts
                SET text = COALESCE($2, text),
                    image = COALESCE($3, image),
                    group_id = CASE
                        WHEN $4 THEN NULL
                        WHEN $5::uuid IS NOT NULL THEN $5::uuid
                        ELSE group_id
                    END
                WHERE id = $1
                RETURNING id, author_id, group_id, text, image, created_at
            )
            SELECT upd.id, upd.author_id, u.username AS author_username, upd.text,
                   upd.group_id, g.title AS group_title, g.slug AS group_slug,
                   upd.image, upd.created_at
            FROM updated upd
            INNER JOIN users u ON u.id = upd.author_id
            LEFT JOIN groups g ON g.id = upd.group_id
            "#,
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(&params.image)
        .bind(clear_group)
        .bind(new_group)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
