// src/db/lookupdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::lookupmodel::*;

#[async_trait]
pub trait LookupExt: Send + Sync {
    /// Every row of every reference table, inactive ones included.
    async fn get_lookup_tables(&self) -> Result<LookupTables, Error>;
}

#[async_trait]
impl LookupExt for DBClient {
    async fn get_lookup_tables(&self) -> Result<LookupTables, Error> {
        let priorita = sqlx::query_as::<_, Priorita>(
            "SELECT id, codice, descrizione, livello, colore, ordine, attivo FROM priorita ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let stati_ticket = sqlx::query_as::<_, StatoTicket>(
            "SELECT id, codice, descrizione, colore, finale, ordine, attivo FROM stati_ticket ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let stati_intervento = sqlx::query_as::<_, StatoIntervento>(
            "SELECT id, codice, descrizione, colore, finale, ordine, attivo FROM stati_intervento ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let tipi_intervento = sqlx::query_as::<_, TipoIntervento>(
            "SELECT id, codice, descrizione, colore, richiede_viaggio, ordine, attivo FROM tipi_intervento ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let categorie_attivita = sqlx::query_as::<_, CategoriaAttivita>(
            "SELECT id, codice, descrizione, prezzo_unitario_default, ordine, attivo FROM categorie_attivita ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let origini_intervento = sqlx::query_as::<_, LookupVoce>(
            "SELECT id, codice, descrizione, ordine, attivo FROM origini_intervento ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let canali_richiesta = sqlx::query_as::<_, LookupVoce>(
            "SELECT id, codice, descrizione, ordine, attivo FROM canali_richiesta ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let ruoli = sqlx::query_as::<_, LookupVoce>(
            "SELECT id, codice, descrizione, ordine, attivo FROM ruoli ORDER BY ordine, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(LookupTables {
            priorita,
            stati_ticket,
            stati_intervento,
            tipi_intervento,
            categorie_attivita,
            origini_intervento,
            canali_richiesta,
            ruoli,
        })
    }
}
