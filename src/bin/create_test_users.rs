//! Utility to create the default test accounts

const TEST_USERS: [&str; 2] = ["admin", "testuser"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = fitmacro::config::database_path();
    println!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = fitmacro::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        fitmacro::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    database.with_conn(|conn| {
        for username in TEST_USERS {
            let (user, created) = fitmacro::models::User::get_or_create(conn, username)?;
            if created {
                println!("Created user '{}' (id {})", user.username, user.id);
            } else {
                println!("User '{}' already exists (id {})", user.username, user.id);
            }
        }
        Ok(())
    })?;

    Ok(())
}
