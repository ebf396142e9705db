// src/db/interventiondb.rs
use async_trait::async_trait;
use sqlx::{Error, PgConnection};

use super::db::{allocate_number, like_pattern, DBClient};
use crate::models::interventionmodel::*;
use crate::service::numbering::SequenceKind;

#[async_trait]
pub trait InterventionExt: Send + Sync {
    async fn get_interventi(
        &self,
        filter: &InterventoFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Intervento>, i64), Error>;

    async fn get_intervento(&self, intervento_id: i32) -> Result<Option<Intervento>, Error>;

    async fn create_intervento(
        &self,
        intervento: NewIntervento,
        year: i32,
    ) -> Result<Intervento, Error>;

    /// Optimistic write keyed on `updated_at`; `None` when stale.
    async fn save_intervento(&self, intervento: &Intervento) -> Result<Option<Intervento>, Error>;

    async fn get_righe(&self, intervento_id: i32) -> Result<Vec<InterventoRiga>, Error>;

    async fn get_riga(
        &self,
        intervento_id: i32,
        riga_id: i32,
    ) -> Result<Option<InterventoRiga>, Error>;

    /// Numbers the row after every existing one, soft-deleted rows included.
    async fn add_riga(&self, riga: NewRiga) -> Result<InterventoRiga, Error>;

    async fn save_riga(&self, riga: &InterventoRiga) -> Result<Option<InterventoRiga>, Error>;

    async fn get_sessioni(&self, intervento_id: i32) -> Result<Vec<InterventoSessione>, Error>;

    async fn get_sessione(
        &self,
        intervento_id: i32,
        sessione_id: i32,
    ) -> Result<Option<InterventoSessione>, Error>;

    async fn add_sessione(&self, sessione: NewSessione) -> Result<InterventoSessione, Error>;

    async fn save_sessione(
        &self,
        sessione: &InterventoSessione,
    ) -> Result<Option<InterventoSessione>, Error>;
}

pub(crate) async fn insert_intervento(
    conn: &mut PgConnection,
    intervento: &NewIntervento,
    year: i32,
) -> Result<Intervento, Error> {
    let numero = allocate_number(conn, SequenceKind::Intervento, year).await?;

    sqlx::query_as::<_, Intervento>(
        r#"
        INSERT INTO interventi (
            numero, origine_id, cliente_id, ticket_id, richiesta_id, contratto_id,
            tipo_intervento_id, stato_id, tecnico_id, oggetto, descrizione_lavoro,
            note_interne, data_inizio
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(&numero)
    .bind(intervento.origine_id)
    .bind(intervento.cliente_id)
    .bind(intervento.ticket_id)
    .bind(intervento.richiesta_id)
    .bind(intervento.contratto_id)
    .bind(intervento.tipo_intervento_id)
    .bind(intervento.stato_id)
    .bind(intervento.tecnico_id)
    .bind(&intervento.oggetto)
    .bind(&intervento.descrizione_lavoro)
    .bind(&intervento.note_interne)
    .bind(intervento.data_inizio)
    .fetch_one(&mut *conn)
    .await
}

#[async_trait]
impl InterventionExt for DBClient {
    async fn get_interventi(
        &self,
        filter: &InterventoFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Intervento>, i64), Error> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let interventi = sqlx::query_as::<_, Intervento>(
            r#"
            SELECT * FROM v_interventi_attivi
            WHERE ($1::int IS NULL OR stato_id = $1)
              AND ($2::int IS NULL OR tecnico_id = $2)
              AND ($3::int IS NULL OR cliente_id = $3)
              AND ($4::int IS NULL OR ticket_id = $4)
              AND ($5::text IS NULL
                   OR numero ILIKE $5 ESCAPE '\'
                   OR oggetto ILIKE $5 ESCAPE '\'
                   OR descrizione_lavoro ILIKE $5 ESCAPE '\')
            ORDER BY data_inizio DESC NULLS LAST, created_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.stato_id)
        .bind(filter.tecnico_id)
        .bind(filter.cliente_id)
        .bind(filter.ticket_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM v_interventi_attivi
            WHERE ($1::int IS NULL OR stato_id = $1)
              AND ($2::int IS NULL OR tecnico_id = $2)
              AND ($3::int IS NULL OR cliente_id = $3)
              AND ($4::int IS NULL OR ticket_id = $4)
              AND ($5::text IS NULL
                   OR numero ILIKE $5 ESCAPE '\'
                   OR oggetto ILIKE $5 ESCAPE '\'
                   OR descrizione_lavoro ILIKE $5 ESCAPE '\')
            "#,
        )
        .bind(filter.stato_id)
        .bind(filter.tecnico_id)
        .bind(filter.cliente_id)
        .bind(filter.ticket_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((interventi, total))
    }

    async fn get_intervento(&self, intervento_id: i32) -> Result<Option<Intervento>, Error> {
        sqlx::query_as::<_, Intervento>("SELECT * FROM v_interventi_attivi WHERE id = $1")
            .bind(intervento_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_intervento(
        &self,
        intervento: NewIntervento,
        year: i32,
    ) -> Result<Intervento, Error> {
        let mut tx = self.pool.begin().await?;
        let created = insert_intervento(&mut tx, &intervento, year).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn save_intervento(&self, intervento: &Intervento) -> Result<Option<Intervento>, Error> {
        sqlx::query_as::<_, Intervento>(
            r#"
            UPDATE interventi SET
                tipo_intervento_id = $3,
                stato_id = $4,
                oggetto = $5,
                descrizione_lavoro = $6,
                note_interne = $7,
                data_inizio = $8,
                data_fine = $9,
                firma_cliente = $10,
                firma_nome = $11,
                firma_ruolo = $12,
                firma_data = $13,
                attivo = $14,
                updated_at = clock_timestamp()
            WHERE id = $1 AND updated_at = $2
            RETURNING *
            "#,
        )
        .bind(intervento.id)
        .bind(intervento.updated_at)
        .bind(intervento.tipo_intervento_id)
        .bind(intervento.stato_id)
        .bind(&intervento.oggetto)
        .bind(&intervento.descrizione_lavoro)
        .bind(&intervento.note_interne)
        .bind(intervento.data_inizio)
        .bind(intervento.data_fine)
        .bind(&intervento.firma_cliente)
        .bind(&intervento.firma_nome)
        .bind(&intervento.firma_ruolo)
        .bind(intervento.firma_data)
        .bind(intervento.attivo)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_righe(&self, intervento_id: i32) -> Result<Vec<InterventoRiga>, Error> {
        sqlx::query_as::<_, InterventoRiga>(
            "SELECT * FROM v_righe_attive WHERE intervento_id = $1 ORDER BY numero_riga",
        )
        .bind(intervento_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_riga(
        &self,
        intervento_id: i32,
        riga_id: i32,
    ) -> Result<Option<InterventoRiga>, Error> {
        sqlx::query_as::<_, InterventoRiga>(
            "SELECT * FROM v_righe_attive WHERE id = $1 AND intervento_id = $2",
        )
        .bind(riga_id)
        .bind(intervento_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn add_riga(&self, riga: NewRiga) -> Result<InterventoRiga, Error> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent row additions on the same intervention.
        sqlx::query("SELECT id FROM interventi WHERE id = $1 FOR UPDATE")
            .bind(riga.intervento_id)
            .execute(&mut *tx)
            .await?;

        let numero_riga: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(numero_riga), 0) + 1 FROM intervento_righe WHERE intervento_id = $1",
        )
        .bind(riga.intervento_id)
        .fetch_one(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, InterventoRiga>(
            r#"
            INSERT INTO intervento_righe (
                intervento_id, sessione_id, numero_riga, categoria_id, descrizione,
                quantita, unita_misura, prezzo_unitario, sconto_percentuale,
                fatturabile, in_garanzia, incluso_contratto
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(riga.intervento_id)
        .bind(riga.sessione_id)
        .bind(numero_riga)
        .bind(riga.categoria_id)
        .bind(&riga.descrizione)
        .bind(&riga.quantita)
        .bind(&riga.unita_misura)
        .bind(&riga.prezzo_unitario)
        .bind(&riga.sconto_percentuale)
        .bind(riga.fatturabile)
        .bind(riga.in_garanzia)
        .bind(riga.incluso_contratto)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn save_riga(&self, riga: &InterventoRiga) -> Result<Option<InterventoRiga>, Error> {
        sqlx::query_as::<_, InterventoRiga>(
            r#"
            UPDATE intervento_righe SET
                categoria_id = $3,
                descrizione = $4,
                quantita = $5,
                prezzo_unitario = $6,
                sconto_percentuale = $7,
                fatturabile = $8,
                in_garanzia = $9,
                incluso_contratto = $10,
                attivo = $11,
                updated_at = clock_timestamp()
            WHERE id = $1 AND updated_at = $2
            RETURNING *
            "#,
        )
        .bind(riga.id)
        .bind(riga.updated_at)
        .bind(riga.categoria_id)
        .bind(&riga.descrizione)
        .bind(&riga.quantita)
        .bind(&riga.prezzo_unitario)
        .bind(&riga.sconto_percentuale)
        .bind(riga.fatturabile)
        .bind(riga.in_garanzia)
        .bind(riga.incluso_contratto)
        .bind(riga.attivo)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_sessioni(&self, intervento_id: i32) -> Result<Vec<InterventoSessione>, Error> {
        sqlx::query_as::<_, InterventoSessione>(
            "SELECT * FROM v_sessioni_attive WHERE intervento_id = $1 ORDER BY data, ora_inizio",
        )
        .bind(intervento_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_sessione(
        &self,
        intervento_id: i32,
        sessione_id: i32,
    ) -> Result<Option<InterventoSessione>, Error> {
        sqlx::query_as::<_, InterventoSessione>(
            "SELECT * FROM v_sessioni_attive WHERE id = $1 AND intervento_id = $2",
        )
        .bind(sessione_id)
        .bind(intervento_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn add_sessione(&self, sessione: NewSessione) -> Result<InterventoSessione, Error> {
        sqlx::query_as::<_, InterventoSessione>(
            r#"
            INSERT INTO intervento_sessioni (
                intervento_id, tecnico_id, tipo_intervento_id, data, ora_inizio, ora_fine,
                durata_minuti, km_percorsi, tempo_viaggio_minuti,
                latitudine_inizio, longitudine_inizio, latitudine_fine, longitudine_fine, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(sessione.intervento_id)
        .bind(sessione.tecnico_id)
        .bind(sessione.tipo_intervento_id)
        .bind(sessione.data)
        .bind(sessione.ora_inizio)
        .bind(sessione.ora_fine)
        .bind(sessione.durata_minuti)
        .bind(&sessione.km_percorsi)
        .bind(sessione.tempo_viaggio_minuti)
        .bind(sessione.latitudine_inizio)
        .bind(sessione.longitudine_inizio)
        .bind(sessione.latitudine_fine)
        .bind(sessione.longitudine_fine)
        .bind(&sessione.note)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_sessione(
        &self,
        sessione: &InterventoSessione,
    ) -> Result<Option<InterventoSessione>, Error> {
        sqlx::query_as::<_, InterventoSessione>(
            r#"
            UPDATE intervento_sessioni SET
                tipo_intervento_id = $3,
                data = $4,
                ora_inizio = $5,
                ora_fine = $6,
                durata_minuti = $7,
                km_percorsi = $8,
                tempo_viaggio_minuti = $9,
                latitudine_inizio = $10,
                longitudine_inizio = $11,
                latitudine_fine = $12,
                longitudine_fine = $13,
                note = $14,
                attivo = $15,
                updated_at = clock_timestamp()
            WHERE id = $1 AND updated_at = $2
            RETURNING *
            "#,
        )
        .bind(sessione.id)
        .bind(sessione.updated_at)
        .bind(sessione.tipo_intervento_id)
        .bind(sessione.data)
        .bind(sessione.ora_inizio)
        .bind(sessione.ora_fine)
        .bind(sessione.durata_minuti)
        .bind(&sessione.km_percorsi)
        .bind(sessione.tempo_viaggio_minuti)
        .bind(sessione.latitudine_inizio)
        .bind(sessione.longitudine_inizio)
        .bind(sessione.latitudine_fine)
        .bind(sessione.longitudine_fine)
        .bind(&sessione.note)
        .bind(sessione.attivo)
        .fetch_optional(&self.pool)
        .await
    }
}
