//! One-shot database seeder. Creates (or promotes) the admin account from
//! SEED_ADMIN_* env vars and, when the posts table is empty, fills it with a
//! few sample posts so a fresh instance is not blank.
//!
//! Usage: `cargo run --bin seed`

use anyhow::Context;
use inkpost::auth::password::hash_password;
use inkpost::config::AppConfig;
use inkpost::posts::derive::{derive_excerpt, slugify};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

struct SamplePost {
    title: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    cover_image: &'static str,
    content: &'static str,
}

const SAMPLE_POSTS: &[SamplePost] = &[
    SamplePost {
        title: "Why Rust Is a Great Fit for Web Backends",
        category: "Technology",
        tags: &["rust", "axum", "backend"],
        cover_image: "https://images.unsplash.com/photo-1555066931-4365d14bab8c?w=800",
        content: "<p>Rust pairs a strong type system with predictable performance, \
which makes it a natural choice for API servers.</p>\
<h2>The ecosystem</h2>\
<p>Between <strong>axum</strong> for routing, <strong>sqlx</strong> for the database \
layer and <strong>tokio</strong> underneath, the building blocks are mature and \
compose well. Compile-time checks catch whole classes of bugs before they ship.</p>\
<p>Start with a small CRUD service and grow from there.</p>",
    },
    SamplePost {
        title: "A Morning in Varanasi",
        category: "Travel",
        tags: &["india", "travel", "culture"],
        cover_image: "https://images.unsplash.com/photo-1561361058-c24cecae35ca?w=800",
        content: "<p>Wake before sunrise and walk to the ghats. As the first light \
touches the river you will see boats glide quietly through the mist while temple \
bells ring in the distance.</p>\
<p>The smaller ghats offer a more intimate view of the city's daily life than the \
famous ones. Get lost in the lanes afterwards; the best breakfast is always three \
turns past where the map gives up.</p>",
    },
    SamplePost {
        title: "Five Pantry Staples That Upgrade Any Meal",
        category: "Food",
        tags: &["cooking", "kitchen"],
        cover_image: "https://images.unsplash.com/photo-1466637574441-749b8f19452f?w=800",
        content: "<p>Good cooking is mostly good shopping. A jar of decent olives, \
real parmesan, anchovies, dried mushrooms and a bottle of sherry vinegar will \
rescue more weeknight dinners than any gadget.</p>\
<p>None of these spoil quickly, and each one carries enough flavour to turn plain \
pasta or rice into something worth sitting down for.</p>",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seed=info,inkpost=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations").run(&db).await?;

    let admin_email = std::env::var("SEED_ADMIN_EMAIL")
        .unwrap_or_else(|_| "admin@example.com".into())
        .trim()
        .to_lowercase();
    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD is required")?;
    let admin_name = std::env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Admin".into());

    let hash = hash_password(&admin_password)?;
    let (admin_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, password_hash, role)
        VALUES ($1, $2, $3, 'admin')
        ON CONFLICT (email) DO UPDATE SET role = 'admin'
        RETURNING id
        "#,
    )
    .bind(&admin_name)
    .bind(&admin_email)
    .bind(&hash)
    .fetch_one(&db)
    .await?;
    tracing::info!(%admin_id, email = %admin_email, "admin account ready");

    let (post_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(&db)
        .await?;
    if post_count > 0 {
        tracing::info!(post_count, "posts already present, skipping samples");
        return Ok(());
    }

    for sample in SAMPLE_POSTS {
        let tags: Vec<String> = sample.tags.iter().map(|t| t.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO posts (title, slug, content, excerpt, cover_image, category,
                               tags, author_id, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)
            "#,
        )
        .bind(sample.title)
        .bind(slugify(sample.title))
        .bind(sample.content)
        .bind(derive_excerpt(sample.content))
        .bind(sample.cover_image)
        .bind(sample.category)
        .bind(&tags)
        .bind(admin_id)
        .execute(&db)
        .await?;
        tracing::info!(title = sample.title, "sample post inserted");
    }

    Ok(())
}
