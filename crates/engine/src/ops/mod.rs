use sea_orm::DatabaseConnection;

use crate::{Calendar, ChronoCalendar, EngineError, ResultEngine, UnknownIdPolicy};

mod bills;
mod rides;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// An early `?` inside the block returns from the enclosing function and drops
/// the transaction, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of every bill and ride operation.
///
/// Each create/update/delete runs in its own database transaction; nothing
/// is kept in memory between calls.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    calendar: Box<dyn Calendar>,
    unknown_ids: UnknownIdPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: Option<DatabaseConnection>,
    calendar: Option<Box<dyn Calendar>>,
    unknown_ids: UnknownIdPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = Some(db);
        self
    }

    /// Replace the default [`ChronoCalendar`].
    pub fn calendar(mut self, calendar: impl Calendar + 'static) -> EngineBuilder {
        self.calendar = Some(Box::new(calendar));
        self
    }

    pub fn unknown_ids(mut self, policy: UnknownIdPolicy) -> EngineBuilder {
        self.unknown_ids = policy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let database = self
            .database
            .ok_or_else(|| EngineError::Validation("engine needs a database".to_string()))?;
        Ok(Engine {
            database,
            calendar: self.calendar.unwrap_or_else(|| Box::new(ChronoCalendar)),
            unknown_ids: self.unknown_ids,
        })
    }
}
