// src/db/clientdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::{like_pattern, DBClient};
use crate::models::clientmodel::*;

/// Read-only view of the client cache mirrored from the line-of-business system.
#[async_trait]
pub trait ClientExt: Send + Sync {
    async fn get_clienti(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Cliente>, i64), Error>;

    async fn get_cliente(&self, cliente_id: i32) -> Result<Option<Cliente>, Error>;

    async fn get_contratti(&self, cliente_id: i32) -> Result<Vec<Contratto>, Error>;

    async fn get_contratto(&self, contratto_id: i32) -> Result<Option<Contratto>, Error>;

    async fn get_sedi(&self, cliente_id: i32) -> Result<Vec<Sede>, Error>;

    async fn get_referenti(&self, cliente_id: i32) -> Result<Vec<Referente>, Error>;

    async fn get_referente(&self, referente_id: i32) -> Result<Option<Referente>, Error>;

    async fn get_sla_definizione(&self, sla_id: i32) -> Result<Option<SlaDefinizione>, Error>;

    /// Open tickets are those whose status is not final.
    async fn get_cliente_stats(&self, cliente_id: i32) -> Result<ClienteStats, Error>;
}

#[async_trait]
impl ClientExt for DBClient {
    async fn get_clienti(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Cliente>, i64), Error> {
        let pattern = search.map(like_pattern);

        let clienti = sqlx::query_as::<_, Cliente>(
            r#"
            SELECT * FROM v_clienti_attivi
            WHERE ($1::text IS NULL
                OR ragione_sociale ILIKE $1 ESCAPE '\'
                OR codice_gestionale ILIKE $1 ESCAPE '\'
                OR partita_iva ILIKE $1 ESCAPE '\')
            ORDER BY ragione_sociale
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM v_clienti_attivi
            WHERE ($1::text IS NULL
                OR ragione_sociale ILIKE $1 ESCAPE '\'
                OR codice_gestionale ILIKE $1 ESCAPE '\'
                OR partita_iva ILIKE $1 ESCAPE '\')
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((clienti, total))
    }

    async fn get_cliente(&self, cliente_id: i32) -> Result<Option<Cliente>, Error> {
        sqlx::query_as::<_, Cliente>("SELECT * FROM v_clienti_attivi WHERE id = $1")
            .bind(cliente_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_contratti(&self, cliente_id: i32) -> Result<Vec<Contratto>, Error> {
        sqlx::query_as::<_, Contratto>(
            "SELECT * FROM v_contratti_attivi WHERE cliente_id = $1 ORDER BY data_inizio DESC",
        )
        .bind(cliente_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_contratto(&self, contratto_id: i32) -> Result<Option<Contratto>, Error> {
        sqlx::query_as::<_, Contratto>("SELECT * FROM v_contratti_attivi WHERE id = $1")
            .bind(contratto_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_sedi(&self, cliente_id: i32) -> Result<Vec<Sede>, Error> {
        sqlx::query_as::<_, Sede>(
            "SELECT * FROM v_sedi_attive WHERE cliente_id = $1 ORDER BY nome_sede",
        )
        .bind(cliente_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_referenti(&self, cliente_id: i32) -> Result<Vec<Referente>, Error> {
        sqlx::query_as::<_, Referente>(
            r#"
            SELECT * FROM v_referenti_attivi
            WHERE cliente_id = $1
            ORDER BY contatto_principale DESC, cognome, nome
            "#,
        )
        .bind(cliente_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_referente(&self, referente_id: i32) -> Result<Option<Referente>, Error> {
        sqlx::query_as::<_, Referente>("SELECT * FROM v_referenti_attivi WHERE id = $1")
            .bind(referente_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_sla_definizione(&self, sla_id: i32) -> Result<Option<SlaDefinizione>, Error> {
        sqlx::query_as::<_, SlaDefinizione>(
            "SELECT * FROM sla_definizioni WHERE id = $1 AND attivo",
        )
        .bind(sla_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_cliente_stats(&self, cliente_id: i32) -> Result<ClienteStats, Error> {
        sqlx::query_as::<_, ClienteStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM v_ticket_attivi WHERE cliente_id = $1) AS total_tickets,
                (SELECT COUNT(*)
                   FROM v_ticket_attivi t
                   JOIN stati_ticket s ON s.id = t.stato_id
                  WHERE t.cliente_id = $1 AND NOT s.finale) AS open_tickets,
                (SELECT COUNT(*) FROM v_interventi_attivi WHERE cliente_id = $1) AS total_interventi
            "#,
        )
        .bind(cliente_id)
        .fetch_one(&self.pool)
        .await
    }
}
