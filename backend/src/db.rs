use crate::schema::*;
use anyhow::{anyhow, Result};
use common::req::UserInfo;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Insertable)]
#[diesel(table_name=users)]
pub struct NewUser {
    pub email: String, // normalized, unique
    pub user_name: Option<String>,
    pub password_hash: String, // argon2 PHC string
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: i64, // s
}

#[derive(Debug, Clone, Queryable)]
#[allow(unused)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub user_name: Option<String>,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: i64,
}

impl User {
    pub fn info(&self) -> UserInfo {
        UserInfo {
            user_name: self.user_name.clone(),
            school_email: self.email.clone(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name=sessions)]
pub struct NewSession {
    pub token_hash: String,
    pub user_id: i32,
    pub created_at: i64, // s
    pub expires_at: i64, // s
}

#[derive(Debug, Clone, Queryable)]
#[allow(unused)]
pub struct Session {
    pub token_hash: String,
    pub user_id: i32,
    pub created_at: i64,
    pub expires_at: i64,
}

pub struct Db {
    conn: SqliteConnection,
}

impl Db {
    /// Opens the database and brings its schema up to date. `:memory:` gives a
    /// private in-memory database.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("running migrations failed: {e}"))?;

        Ok(Self { conn })
    }

    pub fn user_by_email(&mut self, normalized_email: &str) -> Result<Option<User>> {
        let user = users::table
            .filter(users::email.eq(normalized_email))
            .first::<User>(&mut self.conn)
            .optional()?;

        Ok(user)
    }

    /// Inserts a new account. `None` when the email is already taken.
    pub fn insert_user(&mut self, user: &NewUser) -> Result<Option<User>> {
        match diesel::insert_into(users::table)
            .values(user)
            .execute(&mut self.conn)
        {
            Ok(_) => {}
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        }

        self.user_by_email(&user.email)
    }

    pub fn insert_session(&mut self, session: &NewSession) -> Result<()> {
        diesel::insert_into(sessions::table)
            .values(session)
            .execute(&mut self.conn)?;

        Ok(())
    }

    /// Resolves a live session and its owner. An expired session is deleted
    /// and reported as absent.
    pub fn session_user(&mut self, token_hash: &str, now: i64) -> Result<Option<(Session, User)>> {
        let found = sessions::table
            .inner_join(users::table)
            .filter(sessions::token_hash.eq(token_hash))
            .first::<(Session, User)>(&mut self.conn)
            .optional()?;

        match found {
            Some((session, _)) if session.expires_at <= now => {
                self.delete_session(token_hash)?;
                Ok(None)
            }
            found => Ok(found),
        }
    }

    pub fn delete_session(&mut self, token_hash: &str) -> Result<usize> {
        let n = diesel::delete(sessions::table.filter(sessions::token_hash.eq(token_hash)))
            .execute(&mut self.conn)?;

        Ok(n)
    }

    pub fn purge_expired_sessions(&mut self, now: i64) -> Result<usize> {
        let n = diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
            .execute(&mut self.conn)?;

        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            user_name: Some("Asha".to_owned()),
            password_hash: "$argon2id$stub".to_owned(),
            phone_number: None,
            address: None,
            lat: Some(12.97),
            lon: None,
            created_at: 1_700_000_000,
        }
    }

    fn session(token_hash: &str, user_id: i32, expires_at: i64) -> NewSession {
        NewSession {
            token_hash: token_hash.to_owned(),
            user_id,
            created_at: 1_700_000_000,
            expires_at,
        }
    }

    #[test]
    fn insert_and_find_user() {
        let mut db = Db::connect(":memory:").unwrap();
        let user = db.insert_user(&new_user("a@b.com")).unwrap().unwrap();

        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.lat, Some(12.97));
        assert!(db.user_by_email("a@b.com").unwrap().is_some());
        assert!(db.user_by_email("c@d.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected_by_the_index() {
        let mut db = Db::connect(":memory:").unwrap();
        assert!(db.insert_user(&new_user("a@b.com")).unwrap().is_some());
        assert!(db.insert_user(&new_user("a@b.com")).unwrap().is_none());
    }

    #[test]
    fn sessions_expire() {
        let mut db = Db::connect(":memory:").unwrap();
        let user = db.insert_user(&new_user("a@b.com")).unwrap().unwrap();
        db.insert_session(&session("live", user.id, 2_000)).unwrap();
        db.insert_session(&session("stale", user.id, 1_000)).unwrap();

        let (s, u) = db.session_user("live", 1_500).unwrap().unwrap();
        assert_eq!(s.user_id, u.id);
        assert!(db.session_user("stale", 1_500).unwrap().is_none());
        // the stale row is gone
        assert_eq!(db.delete_session("stale").unwrap(), 0);

        assert_eq!(db.purge_expired_sessions(2_000).unwrap(), 1);
        assert!(db.session_user("live", 1_500).unwrap().is_none());
    }
}
