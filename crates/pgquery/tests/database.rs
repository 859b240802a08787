//! End-to-end checks against a live PostgreSQL.
//!
//! Each test opens its own connection and works on a TEMP table, so nothing
//! outlives the session. Tests return early when `DATABASE_URL` is not set.

use pgquery::{
    Database, DatabaseConfig, DbError, DbResult, FromRow, Record, RowExt, Value, record,
};
use std::time::Duration;

async fn connect(test: &str) -> DbResult<Option<Database>> {
    dotenvy::dotenv().ok();
    let config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            return Ok(None);
        }
    };
    let db = Database::connect(config).await?;
    db.query(
        "CREATE TEMP TABLE posts (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft',
            category_id INT,
            views INT NOT NULL DEFAULT 0,
            price NUMERIC(10, 2),
            deleted_at TIMESTAMPTZ
        )",
        &[],
    )
    .await?;
    Ok(Some(db))
}

async fn seed(db: &Database) -> DbResult<Vec<Value>> {
    let mut ids = Vec::new();
    for (title, status, category, views) in [
        ("first", "published", 1, 10),
        ("second", "published", 2, 20),
        ("third", "draft", 1, 30),
        ("fourth", "published", 3, 40),
    ] {
        let id = db
            .insert(
                "posts",
                &record([
                    ("title", Value::from(title)),
                    ("status", Value::from(status)),
                    ("category_id", Value::from(category)),
                    ("views", Value::from(views)),
                ]),
            )
            .await?;
        ids.push(id);
    }
    Ok(ids)
}

struct Post {
    id: i64,
    title: String,
}

impl FromRow for Post {
    fn from_row(row: &tokio_postgres::Row) -> DbResult<Self> {
        Ok(Post {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
        })
    }
}

#[tokio::test]
async fn select_filters_order_and_paging() -> DbResult<()> {
    let Some(db) = connect("select_filters_order_and_paging").await? else {
        return Ok(());
    };
    seed(&db).await?;

    let posts: Vec<Post> = db
        .table("posts")?
        .select(["id", "title"])
        .where_eq("status", "published")
        .order_by("views", "DESC")
        .limit(2)
        .get_as()
        .await?;
    let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["fourth", "second"]);
    assert!(posts.iter().all(|p| p.id > 0));

    let page: Vec<Record> = db
        .table("posts")?
        .order_by_asc("id")
        .limit(2)
        .offset(1)
        .get_as()
        .await?;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["title"], Value::from("second"));

    let in_list = db
        .table("posts")?
        .where_in("category_id", [1, 3])
        .count()
        .await?;
    assert_eq!(in_list, 3);

    let none = db
        .table("posts")?
        .where_in("category_id", Vec::<i64>::new())
        .get()
        .await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn first_and_count_leave_builder_reusable() -> DbResult<()> {
    let Some(db) = connect("first_and_count_leave_builder_reusable").await? else {
        return Ok(());
    };
    seed(&db).await?;

    let mut qb = db.table("posts")?;
    qb.select(["title"]).gt("views", 15).order_by_asc("views");

    let first: Option<String> = qb.first_as().await?;
    assert_eq!(first.as_deref(), Some("second"));
    assert_eq!(qb.count().await?, 3);

    let all: Vec<String> = qb.get_as().await?;
    assert_eq!(all, ["second", "third", "fourth"]);

    let empty = db.table("posts")?.where_eq("status", "archived").count().await?;
    assert_eq!(empty, 0);
    assert!(db.table("posts")?.where_eq("id", -1).first().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn keyed_update_and_delete() -> DbResult<()> {
    let Some(db) = connect("keyed_update_and_delete").await? else {
        return Ok(());
    };
    let ids = seed(&db).await?;

    let updated = db
        .table("posts")?
        .where_eq("id", ids[0].clone())
        .update(record([("status", "archived")]))
        .await?;
    assert_eq!(updated, 1);
    assert_eq!(
        db.get_var("SELECT status FROM posts WHERE id = $1", &[ids[0].clone()])
            .await?,
        Some(Value::from("archived"))
    );

    // Non-equality conditions are refused unless explicitly allowed.
    let mut qb = db.table("posts")?;
    qb.where_eq("status", "published").gt("views", 25);
    assert!(matches!(
        qb.delete().await,
        Err(DbError::UnsupportedCondition(_))
    ));
    assert_eq!(db.table("posts")?.count().await?, 4);

    let deleted = qb.allow_partial_conditions(true).delete().await?;
    assert_eq!(deleted, 2);

    // IS NULL conditions match NULL columns.
    let touched = db
        .update("posts", &record([("views", 0)]), &record([("deleted_at", Value::Null)]))
        .await?;
    assert_eq!(touched, 2);

    assert_eq!(db.table("posts")?.where_in("id", Vec::<i64>::new()).delete().await?, 0);
    Ok(())
}

#[tokio::test]
async fn numeric_and_timestamp_columns_round_trip() -> DbResult<()> {
    let Some(db) = connect("numeric_and_timestamp_columns_round_trip").await? else {
        return Ok(());
    };
    let id = db
        .insert(
            "posts",
            &record([
                ("title", Value::from("priced")),
                ("price", Value::from(150)),
                ("deleted_at", Value::from("2024-05-01 14:30:00+02:00")),
            ]),
        )
        .await?;
    db.insert("posts", &record([("title", Value::from("cheap")), ("price", Value::from(9.5))]))
        .await?;

    assert_eq!(db.table("posts")?.where_op("price", ">", 100).count().await?, 1);
    assert_eq!(
        db.table("posts")?
            .where_op("deleted_at", "<", "2024-06-01T00:00:00Z")
            .count()
            .await?,
        1
    );

    let row: Record = db
        .table("posts")?
        .where_eq("id", id)
        .first_as()
        .await?
        .expect("inserted row");
    assert_eq!(row["price"], Value::Float(150.0));
    assert_eq!(row["deleted_at"], Value::from("2024-05-01T12:30:00+00:00"));

    assert!(
        db.insert("posts", &record([("title", "bad"), ("deleted_at", "someday")]))
            .await
            .is_err()
    );
    Ok(())
}

#[tokio::test]
async fn inserts_into_keyless_tables() -> DbResult<()> {
    let Some(db) = connect("inserts_into_keyless_tables").await? else {
        return Ok(());
    };
    db.query(
        "CREATE TEMP TABLE post_tags (post_id BIGINT NOT NULL, tag_id BIGINT NOT NULL)",
        &[],
    )
    .await?;

    let link = record([("post_id", 1), ("tag_id", 7)]);
    assert_eq!(db.table("post_tags")?.no_returning().insert(link).await?, Value::Null);
    assert_eq!(db.table("post_tags")?.where_eq("tag_id", 7).count().await?, 1);

    let title = db
        .insert_returning("posts", &record([("title", "slugged")]), "title")
        .await?;
    assert_eq!(title, Value::from("slugged"));
    Ok(())
}

#[tokio::test]
async fn transactions_commit_and_roll_back() -> DbResult<()> {
    let Some(db) = connect("transactions_commit_and_roll_back").await? else {
        return Ok(());
    };

    let committed: DbResult<Value> = pgquery::transaction!(db, {
        db.insert("posts", &record([("title", "kept")])).await
    });
    committed?;
    assert!(!db.in_transaction());

    let rolled_back: DbResult<()> = pgquery::transaction!(db, {
        db.insert("posts", &record([("title", "discarded")])).await?;
        Err(DbError::validation("abort"))
    });
    assert!(matches!(rolled_back, Err(DbError::Validation(_))));
    assert!(!db.in_transaction());

    let titles: Vec<String> = db.table("posts")?.select(["title"]).get_as().await?;
    assert_eq!(titles, ["kept"]);

    db.begin_transaction().await?;
    assert!(matches!(
        db.begin_transaction().await,
        Err(DbError::Transaction(_))
    ));
    db.rollback().await?;
    assert!(matches!(db.commit().await, Err(DbError::Transaction(_))));
    Ok(())
}

#[tokio::test]
async fn driver_errors_are_classified() -> DbResult<()> {
    let Some(db) = connect("driver_errors_are_classified").await? else {
        return Ok(());
    };

    let id = db.insert("posts", &record([("title", "a")])).await?;
    let err = db
        .insert("posts", &record([("id", id), ("title", Value::from("b"))]))
        .await
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {err:?}");

    let err = db.insert("posts", &record([("title", Value::Null)])).await.unwrap_err();
    assert!(matches!(err, DbError::Query(_)), "got {err:?}");

    assert!(db.table("posts; DROP TABLE posts").is_err());
    assert!(db.insert("po-sts", &Record::new()).await.unwrap_err().is_invalid_identifier());
    Ok(())
}

#[tokio::test]
async fn statement_timeout_cancels() -> DbResult<()> {
    dotenvy::dotenv().ok();
    let Ok(config) = DatabaseConfig::from_env() else {
        eprintln!("DATABASE_URL is not set; skipping statement_timeout_cancels");
        return Ok(());
    };
    let db = Database::connect(config.query_timeout(Duration::from_millis(100))).await?;

    let err = db.query("SELECT pg_sleep(5)", &[]).await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
    Ok(())
}
