use kinship::{
    op, select, shape_row, Conditions, EntityDescriptor, JoinArg, JoinKind, JoinOptions,
    QueryComposer, Result, SchemaCatalog,
};
use serde_json::json;

fn catalog() -> Result<SchemaCatalog> {
    let mut catalog = SchemaCatalog::new();
    catalog
        .register(
            EntityDescriptor::builder("users")
                .columns(["id", "name"])
                .column_as("email_address", "email")
                .has_many("posts", "user_id")
                .build(),
        )?
        .register(
            EntityDescriptor::builder("posts")
                .columns(["id", "user_id", "title", "state"])
                .belongs_to_as("users", "user_id", "author")
                .has_many("comments", "post_id")
                .build(),
        )?
        .register(
            EntityDescriptor::builder("comments")
                .columns(["id", "post_id", "body"])
                .build(),
        )?;
    Ok(catalog)
}

fn main() -> Result<()> {
    println!("=== kinship - blog queries ===\n");
    let catalog = catalog()?;

    // Root entity plus a has-many join
    let users_with_posts = select(&catalog, "users")?.left_join("posts", [vec!["title"]])?;
    println!("1. Users with their post titles:");
    println!("   SQL: {}\n", users_with_posts.to_sql()?);

    // Alias, column filter and ON conditions
    let published = select(&catalog, "users")?.left_join(
        "posts",
        [
            JoinArg::from("published"),
            JoinArg::from(json!({"exclude": ["state"]})),
            JoinArg::from(json!({"state": "published"})),
        ],
    )?;
    println!("2. Published posts only:");
    println!("   SQL: {}", published.to_sql()?);
    println!("   Parameters: {:?}\n", published.parameters());

    // Nested joins produce dotted output names
    let threads = select(&catalog, "users")?.join_with(
        JoinKind::Left,
        "posts",
        JoinOptions::new()
            .columns(["title"])
            .nested(|posts| posts.left_join("comments", [vec!["body"]])),
    );
    println!("3. Users, posts and comments:");
    println!("   SQL: {}\n", threads?.to_sql()?);

    // Named options with an OR group in the ON clause
    let visible = select(&catalog, "users")?.join_with(
        JoinKind::Inner,
        "posts",
        JoinOptions::new()
            .alias("visible")
            .columns(["id", "title"])
            .conditions(Conditions::new().any_of("state", "published").any_of("state", "draft")),
    )?;
    println!("4. Users with visible posts:");
    println!("   SQL: {}", visible.to_sql()?);
    println!("   Parameters: {:?}\n", visible.parameters());

    // Cursor pagination over a derived table
    let page = QueryComposer::select(&catalog, "posts")?
        .paginate()
        .from_subquery(|posts| Ok(posts.where_column("id", op::GT, 40).limit(10)))?
        .left_join("users", ["author"])?
        .build();
    println!("5. A page of posts with their authors:");
    println!("   SQL: {}", page.to_sql()?);
    println!(
        "   Fetches {:?} rows to return at most 10\n",
        page.window().effective_limit()
    );

    // Rows come back flat and are nested on the way out
    let row = json!({"id": 41, "title": "hello", "author.id": 3, "author.name": "jill"});
    if let Some(row) = row.as_object() {
        println!("6. Shaped row:");
        println!("   {}", shape_row(row));
    }

    Ok(())
}
