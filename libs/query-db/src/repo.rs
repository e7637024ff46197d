use std::marker::PhantomData;

use async_trait::async_trait;
use query_core::{Page, StructuredQuery};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityName,
    EntityTrait, IntoActiveModel, PrimaryKeyTrait,
};
use thiserror::Error;

use crate::compile::{FieldMap, QueryBuildError, StructuredQueryExt};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Query(#[from] QueryBuildError),

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// Persistence capability handed to request handlers.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait Repository: Send + Sync {
    type Model: Send;
    type ActiveModel: Send;
    type Id: Send;

    /// Insert and return the stored row (generated id included).
    async fn insert(&self, model: Self::ActiveModel) -> Result<Self::Model, RepoError>;
    async fn find_one(&self, id: Self::Id) -> Result<Option<Self::Model>, RepoError>;
    /// Rows matching filters, ordering and pagination of `query`.
    ///
    /// `query.relations` is only checked against the declared relation names
    /// (unknown names fail with [`QueryBuildError::UnknownRelation`]); related
    /// rows are not joined or loaded. Callers load them with SeaORM's
    /// `find_related`/`load_many` when needed.
    async fn find(&self, query: &StructuredQuery) -> Result<Vec<Self::Model>, RepoError>;
    async fn update(&self, model: Self::ActiveModel) -> Result<Self::Model, RepoError>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: Self::Id) -> Result<bool, RepoError>;

    async fn find_page(&self, query: &StructuredQuery) -> Result<Page<Self::Model>, RepoError> {
        let items = self.find(query).await?;
        Ok(Page::for_query(items, query))
    }
}

/// [`Repository`] over any SeaORM entity.
pub struct SeaOrmRepository<E: EntityTrait, A> {
    db: DatabaseConnection,
    fields: FieldMap<E>,
    _active: PhantomData<fn() -> A>,
}

impl<E: EntityTrait, A> SeaOrmRepository<E, A> {
    pub fn new(db: DatabaseConnection, fields: FieldMap<E>) -> Self {
        Self {
            db,
            fields,
            _active: PhantomData,
        }
    }

    pub fn fields(&self) -> &FieldMap<E> {
        &self.fields
    }
}

#[async_trait]
impl<E, A> Repository for SeaOrmRepository<E, A>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
    E::Model: IntoActiveModel<A> + Send + Sync,
    A: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync + 'static,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Send + Sync,
{
    type Model = E::Model;
    type ActiveModel = A;
    type Id = <E::PrimaryKey as PrimaryKeyTrait>::ValueType;

    async fn insert(&self, model: A) -> Result<E::Model, RepoError> {
        let stored = model.insert(&self.db).await?;
        tracing::debug!(table = %E::default().table_name(), "inserted row");
        Ok(stored)
    }

    async fn find_one(&self, id: Self::Id) -> Result<Option<E::Model>, RepoError> {
        Ok(E::find_by_id(id).one(&self.db).await?)
    }

    async fn find(&self, query: &StructuredQuery) -> Result<Vec<E::Model>, RepoError> {
        let select = E::find().apply_structured_query(query, &self.fields)?;
        let rows = select.all(&self.db).await?;
        tracing::debug!(
            table = %E::default().table_name(),
            skip = query.skip,
            take = query.take,
            rows = rows.len(),
            "listed rows"
        );
        Ok(rows)
    }

    async fn update(&self, model: A) -> Result<E::Model, RepoError> {
        Ok(model.update(&self.db).await?)
    }

    async fn delete(&self, id: Self::Id) -> Result<bool, RepoError> {
        let res = E::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}
