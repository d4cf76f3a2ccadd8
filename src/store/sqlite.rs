//! SQLite storage
//! Mission: Persist users, roles, posts and comments with rusqlite

use crate::auth::models::{Account, Credential, Role, RoleSet};
use crate::auth::password::PasswordHasher;
use crate::store::{
    Comment, CommentRepository, CredentialStore, Post, PostRepository, StoreError, StoreResult,
    User, UserRepository,
};
use anyhow::Context;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{info, warn};

pub const ADMIN_USERNAME: &str = "admin";

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_roles (
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, role_id)
    );

    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        owner TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner);

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        owner TEXT NOT NULL,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
    CREATE INDEX IF NOT EXISTS idx_comments_owner ON comments(owner);
";

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(anyhow::Error::new(e).context("SQLite operation failed"))
    }
}

/// Single-connection SQLite store. Every repository trait is implemented here.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and initialize the schema
    pub fn open(db_path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;
        Self::init(conn)
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize schema")?;

        for role in Role::ALL {
            conn.execute(
                "INSERT OR IGNORE INTO roles (name) VALUES (?1)",
                params![role.as_str()],
            )
            .context("Failed to insert role")?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the bootstrap admin account if it does not exist yet
    pub fn seed_admin(&self, hasher: &dyn PasswordHasher, password: &str) -> anyhow::Result<bool> {
        if self.find_by_username(ADMIN_USERNAME)?.is_some() {
            return Ok(false);
        }

        let hash = hasher.hash(password)?;
        self.create_user(ADMIN_USERNAME, &hash, &RoleSet::from([Role::Admin]))?;

        info!("🔐 Bootstrap admin account created (username: {})", ADMIN_USERNAME);
        warn!("⚠️  Rotate the bootstrap admin password before exposing this service");
        Ok(true)
    }

    fn load_roles(conn: &Connection, user_id: i64) -> rusqlite::Result<RoleSet> {
        let mut stmt = conn.prepare(
            "SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = ?1",
        )?;
        let names = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(RoleSet::from_names(names))
    }

    fn find_user(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        roles: RoleSet::new(),
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        match user {
            Some(mut user) => {
                user.roles = Self::load_roles(conn, user.id)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    fn user_id(conn: &Connection, username: &str) -> StoreResult<i64> {
        conn.query_row(
            "SELECT id FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("user {}", username)))
    }
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        content: row.get(1)?,
        owner: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        content: row.get(1)?,
        owner: row.get(2)?,
        post_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

impl CredentialStore for SqliteStore {
    fn find_credential_by_identifier(&self, identifier: &str) -> anyhow::Result<Option<Account>> {
        let conn = self.conn.lock();
        let user = Self::find_user(&conn, identifier).context("Failed to load credential")?;

        Ok(user.map(|u| Account {
            id: u.id,
            credential: Credential {
                identifier: u.username,
                secret_hash: u.password_hash,
            },
            roles: u.roles,
        }))
    }
}

impl UserRepository for SqliteStore {
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        roles: &RoleSet,
    ) -> StoreResult<User> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let created_at = Utc::now().to_rfc3339();

        match tx.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, created_at],
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(StoreError::Conflict(format!("user {}", username)));
            }
            Err(e) => return Err(e.into()),
        }
        let id = tx.last_insert_rowid();

        for role in roles.iter() {
            tx.execute(
                "INSERT OR IGNORE INTO user_roles (user_id, role_id)
                 SELECT ?1, id FROM roles WHERE name = ?2",
                params![id, role.as_str()],
            )?;
        }
        tx.commit()?;

        info!("✅ Created user: {} ({:?})", username, roles.names());

        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            roles: roles.clone(),
            created_at,
        })
    }

    fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        Ok(Self::find_user(&conn, username)?)
    }

    fn update_password(&self, username: &str, password_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE username = ?2",
            params![password_hash, username],
        )?;

        if updated == 0 {
            return Err(StoreError::NotFound(format!("user {}", username)));
        }
        info!("🔑 Password replaced for {}", username);
        Ok(())
    }

    fn add_role(&self, username: &str, role: Role) -> StoreResult<()> {
        let conn = self.conn.lock();
        let user_id = Self::user_id(&conn, username)?;
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id)
             SELECT ?1, id FROM roles WHERE name = ?2",
            params![user_id, role.as_str()],
        )?;
        info!("Role {} granted to {}", role, username);
        Ok(())
    }

    fn remove_role(&self, username: &str, role: Role) -> StoreResult<()> {
        let conn = self.conn.lock();
        let user_id = Self::user_id(&conn, username)?;
        conn.execute(
            "DELETE FROM user_roles
             WHERE user_id = ?1 AND role_id = (SELECT id FROM roles WHERE name = ?2)",
            params![user_id, role.as_str()],
        )?;
        info!("Role {} revoked from {}", role, username);
        Ok(())
    }
}

impl PostRepository for SqliteStore {
    fn create_post(&self, owner: &str, content: &str) -> StoreResult<Post> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO posts (content, owner, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![content, owner, now],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            content: content.to_string(),
            owner: owner.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    fn find_post(&self, id: i64) -> StoreResult<Option<Post>> {
        let conn = self.conn.lock();
        let post = conn
            .query_row(
                "SELECT id, content, owner, created_at, updated_at FROM posts WHERE id = ?1",
                params![id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    fn list_posts_by_owner(&self, owner: &str) -> StoreResult<Vec<Post>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, owner, created_at, updated_at FROM posts
             WHERE owner = ?1 ORDER BY id",
        )?;
        let posts = stmt
            .query_map(params![owner], post_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }

    fn delete_post(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("post {}", id)));
        }
        Ok(())
    }
}

impl CommentRepository for SqliteStore {
    fn create_comment(&self, post_id: i64, owner: &str, content: &str) -> StoreResult<Comment> {
        let conn = self.conn.lock();
        let now = Utc::now().to_rfc3339();

        match conn.execute(
            "INSERT INTO comments (content, owner, post_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![content, owner, post_id, now],
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(StoreError::NotFound(format!("post {}", post_id)));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Comment {
            id: conn.last_insert_rowid(),
            content: content.to_string(),
            owner: owner.to_string(),
            post_id,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    fn find_comment(&self, id: i64) -> StoreResult<Option<Comment>> {
        let conn = self.conn.lock();
        let comment = conn
            .query_row(
                "SELECT id, content, owner, post_id, created_at, updated_at
                 FROM comments WHERE id = ?1",
                params![id],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    fn list_comments_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, owner, post_id, created_at, updated_at
             FROM comments WHERE post_id = ?1 ORDER BY id",
        )?;
        let comments = stmt
            .query_map(params![post_id], comment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    fn list_comments_by_owner(&self, owner: &str) -> StoreResult<Vec<Comment>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, owner, post_id, created_at, updated_at
             FROM comments WHERE owner = ?1 ORDER BY id",
        )?;
        let comments = stmt
            .query_map(params![owner], comment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    fn delete_comment(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("comment {}", id)));
        }
        Ok(())
    }
}
