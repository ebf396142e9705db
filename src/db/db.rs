// db/db.rs
use sqlx::{PgConnection, Pool, Postgres};

use super::{
    clientdb::ClientExt, interventiondb::InterventionExt, lookupdb::LookupExt,
    ticketdb::TicketExt, userdb::TecnicoExt,
};
use crate::service::numbering::{format_number, SequenceKind};

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool_size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Everything the services need from persistence.
pub trait HelpdeskStore: LookupExt + TecnicoExt + ClientExt + TicketExt + InterventionExt {}

impl<T> HelpdeskStore for T where T: LookupExt + TecnicoExt + ClientExt + TicketExt + InterventionExt {}

/// `%term%` for an `ILIKE ... ESCAPE '\'` match, with the term's own
/// wildcards taken literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Next number for `kind` in `year`, taken from the per-year counter row.
///
/// Must run inside the transaction that inserts the numbered row: the
/// upsert holds the counter's row lock until commit, so concurrent
/// creators serialize here. A year's first allocation seeds the counter
/// from the highest number already stored.
pub(crate) async fn allocate_number(
    conn: &mut PgConnection,
    kind: SequenceKind,
    year: i32,
) -> Result<String, sqlx::Error> {
    let table = match kind {
        SequenceKind::Ticket => "ticket",
        SequenceKind::Intervento => "interventi",
    };

    let sql = format!(
        r#"
        INSERT INTO numeratori (tipo, anno, ultimo)
        VALUES ($1, $2, COALESCE((
            SELECT MAX(CAST(SPLIT_PART(numero, '-', 3) AS INTEGER))
            FROM {}
            WHERE numero LIKE $3
        ), 0) + 1)
        ON CONFLICT (tipo, anno) DO UPDATE SET ultimo = numeratori.ultimo + 1
        RETURNING ultimo
        "#,
        table
    );

    let ultimo: i32 = sqlx::query_scalar(&sql)
        .bind(kind.prefix())
        .bind(year)
        .bind(kind.year_pattern(year))
        .fetch_one(&mut *conn)
        .await?;

    Ok(format_number(kind, year, ultimo))
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("TK_2024"), "%TK\\_2024%");
        assert_eq!(like_pattern(r"C:\dati"), r"%C:\\dati%");
    }
}
