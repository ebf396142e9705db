// src/db/userdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::{like_pattern, DBClient};
use crate::models::usermodel::{NewTecnico, Tecnico};

const TECNICO_COLUMNS: &str = r#"
    t.id, t.username, t.email, t.hashed_password, t.nome, t.cognome, t.telefono,
    t.ruolo_id, r.codice AS ruolo_codice, t.attivo, t.created_at, t.updated_at
"#;

#[async_trait]
pub trait TecnicoExt: Send + Sync {
    /// Active technicians only.
    async fn get_tecnico(&self, tecnico_id: i32) -> Result<Option<Tecnico>, Error>;

    async fn get_tecnico_by_username(&self, username: &str) -> Result<Option<Tecnico>, Error>;

    async fn get_tecnici(
        &self,
        search: Option<&str>,
        ruolo_id: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Tecnico>, i64), Error>;

    /// Any technician, deactivated ones included.
    async fn find_tecnico(&self, tecnico_id: i32) -> Result<Option<Tecnico>, Error>;

    /// Whether a technician other than `except_id` holds the username or email.
    async fn tecnico_taken(
        &self,
        username: &str,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<bool, Error>;

    async fn create_tecnico(&self, new: NewTecnico) -> Result<Tecnico, Error>;

    /// Writes the editable fields; `None` when the row is gone.
    async fn save_tecnico(&self, tecnico: &Tecnico) -> Result<Option<Tecnico>, Error>;
}

#[async_trait]
impl TecnicoExt for DBClient {
    async fn get_tecnico(&self, tecnico_id: i32) -> Result<Option<Tecnico>, Error> {
        sqlx::query_as::<_, Tecnico>("SELECT * FROM v_tecnici_attivi WHERE id = $1")
            .bind(tecnico_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_tecnico_by_username(&self, username: &str) -> Result<Option<Tecnico>, Error> {
        sqlx::query_as::<_, Tecnico>("SELECT * FROM v_tecnici_attivi WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_tecnici(
        &self,
        search: Option<&str>,
        ruolo_id: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Tecnico>, i64), Error> {
        let pattern = search.map(like_pattern);

        let tecnici = sqlx::query_as::<_, Tecnico>(
            r#"
            SELECT * FROM v_tecnici_attivi
            WHERE ($1::text IS NULL
                OR nome ILIKE $1 ESCAPE '\'
                OR cognome ILIKE $1 ESCAPE '\'
                OR email ILIKE $1 ESCAPE '\'
                OR username ILIKE $1 ESCAPE '\')
              AND ($2::int IS NULL OR ruolo_id = $2)
            ORDER BY cognome, nome, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(ruolo_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM v_tecnici_attivi
            WHERE ($1::text IS NULL
                OR nome ILIKE $1 ESCAPE '\'
                OR cognome ILIKE $1 ESCAPE '\'
                OR email ILIKE $1 ESCAPE '\'
                OR username ILIKE $1 ESCAPE '\')
              AND ($2::int IS NULL OR ruolo_id = $2)
            "#,
        )
        .bind(&pattern)
        .bind(ruolo_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((tecnici, total))
    }

    async fn find_tecnico(&self, tecnico_id: i32) -> Result<Option<Tecnico>, Error> {
        let sql = format!(
            "SELECT {} FROM tecnici t JOIN ruoli r ON r.id = t.ruolo_id WHERE t.id = $1",
            TECNICO_COLUMNS
        );
        sqlx::query_as::<_, Tecnico>(&sql)
            .bind(tecnico_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn tecnico_taken(
        &self,
        username: &str,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<bool, Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tecnici
                WHERE (username = $1 OR email = $2)
                  AND ($3::int IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_tecnico(&self, new: NewTecnico) -> Result<Tecnico, Error> {
        let sql = format!(
            r#"
            WITH t AS (
                INSERT INTO tecnici (username, email, hashed_password, nome, cognome, telefono, ruolo_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {} FROM t JOIN ruoli r ON r.id = t.ruolo_id
            "#,
            TECNICO_COLUMNS
        );
        sqlx::query_as::<_, Tecnico>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.hashed_password)
            .bind(&new.nome)
            .bind(&new.cognome)
            .bind(&new.telefono)
            .bind(new.ruolo_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn save_tecnico(&self, tecnico: &Tecnico) -> Result<Option<Tecnico>, Error> {
        let sql = format!(
            r#"
            WITH t AS (
                UPDATE tecnici
                SET email = $2, hashed_password = $3, nome = $4, cognome = $5,
                    telefono = $6, ruolo_id = $7, attivo = $8, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {} FROM t JOIN ruoli r ON r.id = t.ruolo_id
            "#,
            TECNICO_COLUMNS
        );
        sqlx::query_as::<_, Tecnico>(&sql)
            .bind(tecnico.id)
            .bind(&tecnico.email)
            .bind(&tecnico.hashed_password)
            .bind(&tecnico.nome)
            .bind(&tecnico.cognome)
            .bind(&tecnico.telefono)
            .bind(tecnico.ruolo_id)
            .bind(tecnico.attivo)
            .fetch_optional(&self.pool)
            .await
    }
}
