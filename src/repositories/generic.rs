//! Generic repository
//!
//! [`Repository`] exposes the same CRUD and query surface for every SeaORM
//! entity. It borrows a data context (a pooled [`sea_orm::DatabaseConnection`]
//! or a caller-owned [`sea_orm::DatabaseTransaction`]) and never closes,
//! commits or rolls back that handle itself.
//!
//! Every mutating operation runs in its own transaction on the borrowed
//! handle (a savepoint when the handle is already a transaction) and commits
//! exactly once before returning. When a statement or the commit fails, the
//! uncommitted transaction is dropped and rolled back, leaving the store as it
//! was. Errors are the store's native [`DbErr`], returned unchanged.

use std::fmt;
use std::marker::PhantomData;

use sea_orm::sea_query::{Expr, IntoCondition, LockType};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DbBackend, DbErr, EntityName,
    EntityTrait, IntoActiveModel, Iterable, PaginatorTrait, QueryFilter, QuerySelect, QueryTrait,
    Related, Select, TransactionTrait,
};
use tracing::{debug, instrument};

use super::options::FindOptions;

/// Bind parameters allowed in one statement by SQLite (3.32+); Postgres and
/// MySQL allow more.
const MAX_BIND_PARAMS: usize = 32_766;

/// Entity-agnostic data access over a borrowed SeaORM connection.
///
/// # Examples
///
/// ```no_run
/// use repokit::models::{author, Author};
/// use repokit::repositories::{FindOptions, Repository};
/// use sea_orm::{ColumnTrait, Database, Set};
///
/// # async fn run() -> Result<(), sea_orm::DbErr> {
/// let db = Database::connect("sqlite::memory:").await?;
/// let authors = Repository::<Author, _>::new(&db);
///
/// let created = authors
///     .add(author::ActiveModel {
///         name: Set("Ursula".to_string()),
///         ..Default::default()
///     })
///     .await?;
///
/// let found = authors
///     .find_one(author::Column::Id.eq(created.id), FindOptions::default())
///     .await?;
/// assert_eq!(found, Some(created));
/// # Ok(())
/// # }
/// ```
pub struct Repository<'a, E, C> {
    db: &'a C,
    _entity: PhantomData<E>,
}

impl<'a, E, C> Repository<'a, E, C> {
    /// Creates a repository over a borrowed data context
    ///
    /// # Arguments
    ///
    /// * `db` - Connection pool or caller-owned transaction
    ///
    /// # Returns
    ///
    /// Returns a repository for entity `E` that never commits or closes `db`
    pub fn new(db: &'a C) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    /// The borrowed data context, for composing further work in the same unit of work.
    pub fn connection(&self) -> &'a C {
        self.db
    }
}

impl<'a, E, C> Repository<'a, E, C>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    C: ConnectionTrait + TransactionTrait,
{
    /// Inserts `entity` and commits, returning the persisted row including any
    /// store-generated identity.
    ///
    /// # Arguments
    ///
    /// * `entity` - Active model with every required column set
    ///
    /// # Errors
    ///
    /// Constraint violations raised by the store surface here unchanged.
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn add(&self, entity: E::ActiveModel) -> Result<E::Model, DbErr> {
        let txn = self.db.begin().await?;
        let model = entity.insert(&txn).await?;
        txn.commit().await?;

        debug!("entity added");
        Ok(model)
    }

    /// Inserts every entity as one batch and commits once.
    ///
    /// Large batches are split into several multi-row inserts so no statement
    /// exceeds the backend's bind-parameter limit. All of them run in the same
    /// transaction, so the batch stays all-or-nothing.
    ///
    /// # Arguments
    ///
    /// * `entities` - Active models to insert, possibly none
    ///
    /// # Returns
    ///
    /// Returns the number of rows inserted; an empty batch commits an empty
    /// transaction and returns 0
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn add_many<I>(&self, entities: I) -> Result<u64, DbErr>
    where
        I: IntoIterator<Item = E::ActiveModel>,
    {
        let entities: Vec<E::ActiveModel> = entities.into_iter().collect();
        let staged = entities.len() as u64;
        let chunk_rows = rows_per_insert::<E>();

        let txn = self.db.begin().await?;
        let mut statements = 0;
        let mut rows = entities.into_iter().peekable();
        while rows.peek().is_some() {
            let chunk: Vec<E::ActiveModel> = rows.by_ref().take(chunk_rows).collect();
            E::insert_many(chunk).exec(&txn).await?;
            statements += 1;
        }
        txn.commit().await?;

        debug!(rows = staged, statements, "entities added");
        Ok(staged)
    }

    /// Removes the row identified by `entity`'s primary key and commits.
    ///
    /// # Arguments
    ///
    /// * `entity` - Model previously read from the store; only its key is used
    ///
    /// Removing a row that is already gone is not an error.
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn delete(&self, entity: E::Model) -> Result<(), DbErr> {
        let active: E::ActiveModel = entity.into_active_model();

        let txn = self.db.begin().await?;
        let result = E::delete(active).exec(&txn).await?;
        txn.commit().await?;

        debug!(rows = result.rows_affected, "entity deleted");
        Ok(())
    }

    /// Resolves `predicate` with a detached read, removes every match and
    /// commits once, returning the number of rows removed.
    ///
    /// The read and the removals share one transaction, so rows matched by
    /// the read are the rows removed.
    ///
    /// # Arguments
    ///
    /// * `predicate` - Condition selecting the rows to remove
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn delete_many<F>(&self, predicate: F) -> Result<u64, DbErr>
    where
        F: IntoCondition,
    {
        let txn = self.db.begin().await?;

        let matches = self
            .query(&FindOptions::default())
            .filter(predicate)
            .all(&txn)
            .await?;

        let mut removed = 0;
        for model in matches {
            let active: E::ActiveModel = model.into_active_model();
            removed += E::delete(active).exec(&txn).await?.rows_affected;
        }
        txn.commit().await?;

        debug!(rows = removed, "entities deleted");
        Ok(removed)
    }

    /// Writes every column of `entity` (not a partial patch) and commits.
    ///
    /// # Arguments
    ///
    /// * `entity` - Detached model carrying the new column values
    ///
    /// # Returns
    ///
    /// Returns the row as written
    ///
    /// # Errors
    ///
    /// Returns the store's `RecordNotUpdated` error when no row carries
    /// `entity`'s primary key.
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn update(&self, entity: E::Model) -> Result<E::Model, DbErr> {
        let active: E::ActiveModel = entity.into_active_model();

        let txn = self.db.begin().await?;
        let model = E::update(active.reset_all()).exec(&txn).await?;
        txn.commit().await?;

        debug!("entity updated");
        Ok(model)
    }

    /// Returns the first row matching `predicate`, or `None`.
    ///
    /// Without an ordering include the row chosen among several matches is
    /// up to the store.
    ///
    /// # Arguments
    ///
    /// * `predicate` - Condition the row must satisfy
    /// * `options` - Tracking mode and includes
    #[instrument(
        skip_all,
        fields(entity = %table_name::<E>(), tracking = ?options.tracking, includes = ?options.include_names())
    )]
    pub async fn find_one<F>(
        &self,
        predicate: F,
        options: FindOptions<E>,
    ) -> Result<Option<E::Model>, DbErr>
    where
        F: IntoCondition,
    {
        self.query(&options).filter(predicate).one(self.db).await
    }

    /// Returns every row matching `predicate`.
    ///
    /// # Arguments
    ///
    /// * `predicate` - Condition the rows must satisfy
    /// * `options` - Tracking mode and includes
    #[instrument(
        skip_all,
        fields(entity = %table_name::<E>(), tracking = ?options.tracking, includes = ?options.include_names())
    )]
    pub async fn find<F>(&self, predicate: F, options: FindOptions<E>) -> Result<Vec<E::Model>, DbErr>
    where
        F: IntoCondition,
    {
        let models = self.query(&options).filter(predicate).all(self.db).await?;

        debug!(rows = models.len(), "entities found");
        Ok(models)
    }

    /// Returns every row of the entity's table.
    #[instrument(
        skip_all,
        fields(entity = %table_name::<E>(), tracking = ?options.tracking, includes = ?options.include_names())
    )]
    pub async fn get_all(&self, options: FindOptions<E>) -> Result<Vec<E::Model>, DbErr> {
        let models = self.query(&options).all(self.db).await?;

        debug!(rows = models.len(), "entities loaded");
        Ok(models)
    }

    /// Returns every row matching `predicate` together with its related `R` rows.
    ///
    /// Related rows are loaded through a left join. A tracked read locks only
    /// rows of `E`'s table.
    #[instrument(
        skip_all,
        fields(entity = %table_name::<E>(), related = %table_name::<R>(), includes = ?options.include_names())
    )]
    pub async fn find_with_related<R, F>(
        &self,
        predicate: F,
        options: FindOptions<E>,
    ) -> Result<Vec<(E::Model, Vec<R::Model>)>, DbErr>
    where
        R: EntityTrait,
        E: Related<R>,
        F: IntoCondition,
    {
        self.query(&options)
            .filter(predicate)
            .find_with_related(R::default())
            .all(self.db)
            .await
    }

    /// Reports whether any row matches `predicate` without loading rows.
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn any<F>(&self, predicate: F) -> Result<bool, DbErr>
    where
        F: IntoCondition,
    {
        let hit = E::find()
            .select_only()
            .expr(Expr::val(1))
            .filter(predicate)
            .limit(1u64)
            .into_tuple::<i32>()
            .one(self.db)
            .await?;

        Ok(hit.is_some())
    }

    /// Counts the rows matching `predicate` without loading them.
    #[instrument(skip_all, fields(entity = %table_name::<E>()))]
    pub async fn count<F>(&self, predicate: F) -> Result<u64, DbErr>
    where
        F: IntoCondition,
    {
        E::find().filter(predicate).count(self.db).await
    }

    fn query(&self, options: &FindOptions<E>) -> Select<E> {
        read_query(options, self.db.get_database_backend())
    }
}

/// Builds the base read for `options`, locking rows of `E`'s table when the
/// read is tracked and the backend has row locks.
///
/// The lock names `E`'s table (`FOR UPDATE OF`), so it also holds when an
/// include or eager load adds an outer join.
fn read_query<E: EntityTrait>(options: &FindOptions<E>, backend: DbBackend) -> Select<E> {
    let mut select = options.shape(E::find());
    if options.locks_rows() && supports_row_locks(backend) {
        QueryTrait::query(&mut select).lock_with_tables(LockType::Update, [E::default()]);
    }
    select
}

fn rows_per_insert<E: EntityTrait>() -> usize {
    let columns = <E::Column as Iterable>::iter().count().max(1);
    (MAX_BIND_PARAMS / columns).max(1)
}

impl<E, C> Clone for Repository<'_, E, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, C> Copy for Repository<'_, E, C> {}

impl<E: EntityTrait, C> fmt::Debug for Repository<'_, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &table_name::<E>())
            .finish_non_exhaustive()
    }
}

fn table_name<E: EntityName>() -> String {
    E::default().table_name().to_string()
}

fn supports_row_locks(backend: DbBackend) -> bool {
    !matches!(backend, DbBackend::Sqlite)
}
