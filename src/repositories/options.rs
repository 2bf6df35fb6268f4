//! Read options shared by the query operations of [`Repository`](super::Repository).

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use sea_orm::{EntityTrait, Select};

/// Whether rows read by a query stay bound to the caller's unit of work.
///
/// SeaORM models are plain values, so every read result is detached from the
/// connection. `Tracked` additionally locks the returned rows of the queried
/// table (`SELECT ... FOR UPDATE OF <table>`) on backends that support row
/// locks. SQLite has none and reads it as `Detached`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tracking {
    #[default]
    Detached,
    Tracked,
}

impl Tracking {
    /// Reports whether reads in this mode lock the rows they return.
    pub fn is_tracked(self) -> bool {
        matches!(self, Tracking::Tracked)
    }
}

impl From<bool> for Tracking {
    fn from(enabled: bool) -> Self {
        if enabled {
            Tracking::Tracked
        } else {
            Tracking::Detached
        }
    }
}

type Shape<E> = dyn Fn(Select<E>) -> Select<E> + Send + Sync;

/// A named directive that shapes the base query before it is filtered and
/// executed, e.g. joining a related table or imposing an order.
///
/// Shapes that make the result non-lockable (`DISTINCT`, grouping,
/// aggregates) must be marked with [`Include::without_row_lock`], otherwise
/// tracked reads fail on Postgres and MySQL.
pub struct Include<E: EntityTrait> {
    name: Cow<'static, str>,
    shape: Arc<Shape<E>>,
    row_lock: bool,
}

impl<E: EntityTrait> Include<E> {
    /// Creates a new include
    ///
    /// # Arguments
    ///
    /// * `name` - Label reported in tracing spans
    /// * `shape` - Transformation applied to the base query
    ///
    /// # Returns
    ///
    /// Returns an include that keeps tracked reads lockable
    pub fn new<F>(name: impl Into<Cow<'static, str>>, shape: F) -> Self
    where
        F: Fn(Select<E>) -> Select<E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            shape: Arc::new(shape),
            row_lock: true,
        }
    }

    /// Marks the shaped query as unable to carry a row lock.
    ///
    /// Tracked reads using this include return rows without locking them.
    pub fn without_row_lock(mut self) -> Self {
        self.row_lock = false;
        self
    }

    /// The label this include was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a tracked read may lock rows through this include.
    pub fn allows_row_lock(&self) -> bool {
        self.row_lock
    }

    pub(crate) fn apply(&self, query: Select<E>) -> Select<E> {
        (self.shape)(query)
    }
}

impl<E: EntityTrait> Clone for Include<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shape: Arc::clone(&self.shape),
            row_lock: self.row_lock,
        }
    }
}

impl<E: EntityTrait> fmt::Debug for Include<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("name", &self.name)
            .field("row_lock", &self.row_lock)
            .finish()
    }
}

/// Options for `find_one`, `find`, `get_all` and `find_with_related`.
///
/// The default reads detached rows through the unmodified base query.
pub struct FindOptions<E: EntityTrait> {
    pub tracking: Tracking,
    pub includes: Vec<Include<E>>,
}

impl<E: EntityTrait> FindOptions<E> {
    /// Creates detached options without includes
    ///
    /// # Returns
    ///
    /// Returns the same value as [`FindOptions::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tracking mode from a plain flag.
    ///
    /// # Arguments
    ///
    /// * `enabled` - `true` selects [`Tracking::Tracked`]
    pub fn tracking(mut self, enabled: bool) -> Self {
        self.tracking = Tracking::from(enabled);
        self
    }

    /// Shorthand for `tracking(true)`.
    pub fn tracked(self) -> Self {
        self.tracking(true)
    }

    /// Appends an include; includes apply in the order they were added.
    ///
    /// # Arguments
    ///
    /// * `include` - Directive to apply after those already added
    pub fn include(mut self, include: Include<E>) -> Self {
        self.includes.push(include);
        self
    }

    /// Names of the configured includes, in application order.
    pub fn include_names(&self) -> Vec<&str> {
        self.includes.iter().map(Include::name).collect()
    }

    /// Whether a read with these options should lock the rows it returns.
    pub(crate) fn locks_rows(&self) -> bool {
        self.tracking.is_tracked() && self.includes.iter().all(Include::allows_row_lock)
    }

    pub(crate) fn shape(&self, query: Select<E>) -> Select<E> {
        self.includes
            .iter()
            .fold(query, |query, include| include.apply(query))
    }
}

impl<E: EntityTrait> Default for FindOptions<E> {
    fn default() -> Self {
        Self {
            tracking: Tracking::default(),
            includes: Vec::new(),
        }
    }
}

impl<E: EntityTrait> Clone for FindOptions<E> {
    fn clone(&self) -> Self {
        Self {
            tracking: self.tracking,
            includes: self.includes.clone(),
        }
    }
}

impl<E: EntityTrait> fmt::Debug for FindOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindOptions")
            .field("tracking", &self.tracking)
            .field("includes", &self.includes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{author, Author};
    use sea_orm::{DbBackend, QuerySelect, QueryTrait};

    #[test]
    fn defaults_are_detached_without_includes() {
        let options = FindOptions::<Author>::default();
        assert_eq!(options.tracking, Tracking::Detached);
        assert!(options.includes.is_empty());
        assert!(!options.tracking.is_tracked());
        assert!(!options.locks_rows());
    }

    #[test]
    fn tracking_flag_maps_to_mode() {
        assert_eq!(Tracking::from(true), Tracking::Tracked);
        assert_eq!(Tracking::from(false), Tracking::Detached);
        assert!(FindOptions::<Author>::new().tracked().tracking.is_tracked());
    }

    #[test]
    fn absent_include_leaves_query_unmodified() {
        let options = FindOptions::<Author>::default();
        let base = Author::find().build(DbBackend::Sqlite).to_string();
        let shaped = options.shape(Author::find()).build(DbBackend::Sqlite).to_string();
        assert_eq!(base, shaped);
    }

    #[test]
    fn includes_apply_in_order() {
        let options = FindOptions::<Author>::new()
            .include(author::having_books())
            .include(author::order_by_name());
        assert_eq!(options.include_names(), vec!["having_books", "order_by_name"]);

        let sql = options
            .shape(Author::find())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("IN (SELECT \"books\".\"author_id\""), "{sql}");
        assert!(sql.ends_with("ORDER BY \"authors\".\"name\" ASC"), "{sql}");
    }

    #[test]
    fn sample_includes_keep_tracked_reads_lockable() {
        let options = FindOptions::<Author>::new()
            .tracked()
            .include(author::having_books())
            .include(author::order_by_name());
        assert!(options.locks_rows());
    }

    #[test]
    fn include_without_row_lock_disables_locking() {
        let distinct =
            Include::<Author>::new("distinct", |query| query.distinct()).without_row_lock();
        assert!(!distinct.allows_row_lock());

        let options = FindOptions::new()
            .tracked()
            .include(author::order_by_name())
            .include(distinct);
        assert!(options.tracking.is_tracked());
        assert!(!options.locks_rows());
    }
}
