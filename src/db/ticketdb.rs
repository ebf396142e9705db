// src/db/ticketdb.rs
use async_trait::async_trait;
use sqlx::{Error, PgConnection};

use super::db::{allocate_number, like_pattern, DBClient};
use super::interventiondb::insert_intervento;
use crate::models::{interventionmodel::*, ticketmodel::*};
use crate::service::numbering::SequenceKind;

#[async_trait]
pub trait TicketExt: Send + Sync {
    async fn get_tickets(
        &self,
        filter: &TicketFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Ticket>, i64), Error>;

    async fn get_ticket(&self, ticket_id: i32) -> Result<Option<Ticket>, Error>;

    /// Allocates the `TK-` number and writes the ticket with its first audit row.
    async fn create_ticket(
        &self,
        ticket: NewTicket,
        year: i32,
        storico: NewStorico,
    ) -> Result<Ticket, Error>;

    /// Writes every mutable column back if `updated_at` still matches.
    /// `None` means another writer got there first.
    async fn save_ticket(
        &self,
        ticket: &Ticket,
        storico: NewStorico,
    ) -> Result<Option<Ticket>, Error>;

    /// Saves the ticket and inserts the spawned intervention in one transaction.
    /// The audit row's `valore_nuovo` is set to the intervention number.
    async fn create_intervention_from_ticket(
        &self,
        ticket: &Ticket,
        intervento: NewIntervento,
        year: i32,
        storico: NewStorico,
    ) -> Result<Option<(Ticket, Intervento)>, Error>;

    async fn create_richiesta_from_ticket(
        &self,
        ticket: &Ticket,
        richiesta: NewRichiesta,
        storico: NewStorico,
    ) -> Result<Option<(Ticket, RichiestaIntervento)>, Error>;

    async fn add_ticket_nota(
        &self,
        ticket_id: i32,
        tecnico_id: i32,
        nota: String,
    ) -> Result<TicketNota, Error>;

    async fn get_ticket_note(&self, ticket_id: i32) -> Result<Vec<TicketNota>, Error>;

    async fn add_ticket_messaggio(
        &self,
        ticket_id: i32,
        tecnico_id: i32,
        messaggio: String,
    ) -> Result<TicketMessaggio, Error>;

    async fn get_ticket_messaggi(&self, ticket_id: i32) -> Result<Vec<TicketMessaggio>, Error>;

    async fn get_ticket_storico(&self, ticket_id: i32) -> Result<Vec<TicketStorico>, Error>;

    async fn get_richieste(
        &self,
        stato: Option<StatoRichiesta>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RichiestaIntervento>, i64), Error>;
}

async fn update_ticket(conn: &mut PgConnection, ticket: &Ticket) -> Result<Option<Ticket>, Error> {
    sqlx::query_as::<_, Ticket>(
        r#"
        UPDATE ticket SET
            oggetto = $3,
            descrizione = $4,
            referente_id = $5,
            referente_nome = $6,
            priorita_id = $7,
            stato_id = $8,
            tecnico_assegnato_id = $9,
            sla_scadenza_risposta = $10,
            sla_scadenza_risoluzione = $11,
            sla_prima_risposta_at = $12,
            sla_paused_at = $13,
            sla_paused_total_minutes = $14,
            data_chiusura = $15,
            tipo_chiusura = $16,
            note_chiusura = $17,
            chiuso_da_id = $18,
            attivo = $19,
            updated_at = clock_timestamp()
        WHERE id = $1 AND updated_at = $2
        RETURNING *
        "#,
    )
    .bind(ticket.id)
    .bind(ticket.updated_at)
    .bind(&ticket.oggetto)
    .bind(&ticket.descrizione)
    .bind(ticket.referente_id)
    .bind(&ticket.referente_nome)
    .bind(ticket.priorita_id)
    .bind(ticket.stato_id)
    .bind(ticket.tecnico_assegnato_id)
    .bind(ticket.sla_scadenza_risposta)
    .bind(ticket.sla_scadenza_risoluzione)
    .bind(ticket.sla_prima_risposta_at)
    .bind(ticket.sla_paused_at)
    .bind(ticket.sla_paused_total_minutes)
    .bind(ticket.data_chiusura)
    .bind(ticket.tipo_chiusura)
    .bind(&ticket.note_chiusura)
    .bind(ticket.chiuso_da_id)
    .bind(ticket.attivo)
    .fetch_optional(&mut *conn)
    .await
}

async fn insert_storico(
    conn: &mut PgConnection,
    ticket_id: i32,
    storico: &NewStorico,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO ticket_storico
            (ticket_id, tecnico_id, azione, campo_modificato, valore_precedente, valore_nuovo, descrizione)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(ticket_id)
    .bind(storico.tecnico_id)
    .bind(storico.azione.to_str())
    .bind(&storico.campo_modificato)
    .bind(&storico.valore_precedente)
    .bind(&storico.valore_nuovo)
    .bind(&storico.descrizione)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl TicketExt for DBClient {
    async fn get_tickets(
        &self,
        filter: &TicketFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Ticket>, i64), Error> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT * FROM v_ticket_attivi
            WHERE ($1::int IS NULL OR stato_id = $1)
              AND ($2::int IS NULL OR priorita_id = $2)
              AND ($3::int IS NULL OR tecnico_assegnato_id = $3)
              AND ($4::int IS NULL OR cliente_id = $4)
              AND ($5::text IS NULL
                   OR numero ILIKE $5 ESCAPE '\'
                   OR oggetto ILIKE $5 ESCAPE '\'
                   OR descrizione ILIKE $5 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.stato_id)
        .bind(filter.priorita_id)
        .bind(filter.tecnico_id)
        .bind(filter.cliente_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM v_ticket_attivi
            WHERE ($1::int IS NULL OR stato_id = $1)
              AND ($2::int IS NULL OR priorita_id = $2)
              AND ($3::int IS NULL OR tecnico_assegnato_id = $3)
              AND ($4::int IS NULL OR cliente_id = $4)
              AND ($5::text IS NULL
                   OR numero ILIKE $5 ESCAPE '\'
                   OR oggetto ILIKE $5 ESCAPE '\'
                   OR descrizione ILIKE $5 ESCAPE '\')
            "#,
        )
        .bind(filter.stato_id)
        .bind(filter.priorita_id)
        .bind(filter.tecnico_id)
        .bind(filter.cliente_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((tickets, total))
    }

    async fn get_ticket(&self, ticket_id: i32) -> Result<Option<Ticket>, Error> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM v_ticket_attivi WHERE id = $1")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_ticket(
        &self,
        ticket: NewTicket,
        year: i32,
        storico: NewStorico,
    ) -> Result<Ticket, Error> {
        let mut tx = self.pool.begin().await?;

        let numero = allocate_number(&mut tx, SequenceKind::Ticket, year).await?;

        let created = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO ticket (
                numero, oggetto, descrizione, cliente_id, referente_id, referente_nome,
                canale_id, priorita_id, stato_id, contratto_id, asset_id,
                sla_scadenza_risposta, sla_scadenza_risoluzione
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&numero)
        .bind(&ticket.oggetto)
        .bind(&ticket.descrizione)
        .bind(ticket.cliente_id)
        .bind(ticket.referente_id)
        .bind(&ticket.referente_nome)
        .bind(ticket.canale_id)
        .bind(ticket.priorita_id)
        .bind(ticket.stato_id)
        .bind(ticket.contratto_id)
        .bind(ticket.asset_id)
        .bind(ticket.sla_scadenza_risposta)
        .bind(ticket.sla_scadenza_risoluzione)
        .fetch_one(&mut *tx)
        .await?;

        insert_storico(&mut tx, created.id, &storico).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn save_ticket(
        &self,
        ticket: &Ticket,
        storico: NewStorico,
    ) -> Result<Option<Ticket>, Error> {
        let mut tx = self.pool.begin().await?;

        let Some(saved) = update_ticket(&mut tx, ticket).await? else {
            return Ok(None);
        };
        insert_storico(&mut tx, saved.id, &storico).await?;

        tx.commit().await?;

        Ok(Some(saved))
    }

    async fn create_intervention_from_ticket(
        &self,
        ticket: &Ticket,
        intervento: NewIntervento,
        year: i32,
        mut storico: NewStorico,
    ) -> Result<Option<(Ticket, Intervento)>, Error> {
        let mut tx = self.pool.begin().await?;

        let Some(saved) = update_ticket(&mut tx, ticket).await? else {
            return Ok(None);
        };

        let created = insert_intervento(&mut tx, &intervento, year).await?;

        storico.valore_nuovo = Some(created.numero.clone());
        insert_storico(&mut tx, saved.id, &storico).await?;

        tx.commit().await?;

        Ok(Some((saved, created)))
    }

    async fn create_richiesta_from_ticket(
        &self,
        ticket: &Ticket,
        richiesta: NewRichiesta,
        storico: NewStorico,
    ) -> Result<Option<(Ticket, RichiestaIntervento)>, Error> {
        let mut tx = self.pool.begin().await?;

        let Some(saved) = update_ticket(&mut tx, ticket).await? else {
            return Ok(None);
        };

        let created = sqlx::query_as::<_, RichiestaIntervento>(
            r#"
            INSERT INTO richieste_intervento (
                ticket_id, cliente_id, contratto_id, descrizione, priorita_id,
                tipo_intervento_id, tecnico_richiesto_id, data_preferita, stato, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(richiesta.ticket_id)
        .bind(richiesta.cliente_id)
        .bind(richiesta.contratto_id)
        .bind(&richiesta.descrizione)
        .bind(richiesta.priorita_id)
        .bind(richiesta.tipo_intervento_id)
        .bind(richiesta.tecnico_richiesto_id)
        .bind(richiesta.data_preferita)
        .bind(StatoRichiesta::Pendente)
        .bind(&richiesta.note)
        .fetch_one(&mut *tx)
        .await?;

        insert_storico(&mut tx, saved.id, &storico).await?;

        tx.commit().await?;

        Ok(Some((saved, created)))
    }

    async fn add_ticket_nota(
        &self,
        ticket_id: i32,
        tecnico_id: i32,
        nota: String,
    ) -> Result<TicketNota, Error> {
        sqlx::query_as::<_, TicketNota>(
            r#"
            INSERT INTO ticket_note (ticket_id, tecnico_id, nota)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(tecnico_id)
        .bind(nota)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_ticket_note(&self, ticket_id: i32) -> Result<Vec<TicketNota>, Error> {
        sqlx::query_as::<_, TicketNota>(
            "SELECT * FROM ticket_note WHERE ticket_id = $1 ORDER BY created_at, id",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_ticket_messaggio(
        &self,
        ticket_id: i32,
        tecnico_id: i32,
        messaggio: String,
    ) -> Result<TicketMessaggio, Error> {
        sqlx::query_as::<_, TicketMessaggio>(
            r#"
            INSERT INTO ticket_messaggi (ticket_id, mittente_tipo, mittente_tecnico_id, messaggio)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(MittenteTipo::Tecnico)
        .bind(tecnico_id)
        .bind(messaggio)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_ticket_messaggi(&self, ticket_id: i32) -> Result<Vec<TicketMessaggio>, Error> {
        sqlx::query_as::<_, TicketMessaggio>(
            "SELECT * FROM ticket_messaggi WHERE ticket_id = $1 ORDER BY created_at, id",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_ticket_storico(&self, ticket_id: i32) -> Result<Vec<TicketStorico>, Error> {
        sqlx::query_as::<_, TicketStorico>(
            "SELECT * FROM ticket_storico WHERE ticket_id = $1 ORDER BY created_at, id",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_richieste(
        &self,
        stato: Option<StatoRichiesta>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RichiestaIntervento>, i64), Error> {
        let richieste = sqlx::query_as::<_, RichiestaIntervento>(
            r#"
            SELECT * FROM v_richieste_attive
            WHERE ($1::stato_richiesta IS NULL OR stato = $1)
            ORDER BY data_richiesta DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(stato)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM v_richieste_attive WHERE ($1::stato_richiesta IS NULL OR stato = $1)",
        )
        .bind(stato)
        .fetch_one(&self.pool)
        .await?;

        Ok((richieste, total))
    }
}
