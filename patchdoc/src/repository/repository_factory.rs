use crate::errors::{ErrorKind, PatchError, PatchResult};
use crate::repository::{CustomRepository, DocumentOperations, Entity, EntityInformation, Namespace};
use crate::repository_config::RepositoryConfig;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Creates [CustomRepository] instances bound to one database and one shared
/// [DocumentOperations].
///
/// Entity information is resolved once per entity type and cached. The
/// factory is cheap to clone and safe to share between threads.
///
/// ```rust,ignore
/// let config = RepositoryConfig::builder().database_name("shop").build()?;
/// let factory = RepositoryFactory::new(config, Arc::new(client_operations))?;
/// let users = factory.repository::<User>()?;
/// ```
pub struct RepositoryFactory<O: DocumentOperations> {
    inner: Arc<RepositoryFactoryInner<O>>,
}

impl<O: DocumentOperations> Clone for RepositoryFactory<O> {
    fn clone(&self) -> Self {
        RepositoryFactory {
            inner: self.inner.clone(),
        }
    }
}

impl<O: DocumentOperations> RepositoryFactory<O> {
    /// Creates a factory, configuring `config` first if it has not been built yet.
    ///
    /// # Errors
    ///
    /// Fails if the configuration has no database name.
    pub fn new(config: RepositoryConfig, operations: Arc<O>) -> PatchResult<Self> {
        if !config.is_configured() {
            config.configure()?;
        }

        let database = config.database_name().ok_or_else(|| {
            log::error!("Repository factory needs a database name");
            PatchError::new("Database name is not configured", ErrorKind::InvalidOperation)
        })?;

        log::info!(
            "[{}] Repository factory initialized for database {}",
            config.plugin_name(),
            database
        );

        Ok(RepositoryFactory {
            inner: Arc::new(RepositoryFactoryInner {
                config,
                database,
                operations,
                entity_information: DashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.inner.config
    }

    pub fn operations(&self) -> &Arc<O> {
        &self.inner.operations
    }

    /// Creates a repository for entity type `T`.
    pub fn repository<T>(&self) -> PatchResult<CustomRepository<T, O>>
    where
        T: Entity + 'static,
    {
        let information = self.entity_information::<T>()?;
        let namespace = Namespace::new(&self.inner.database, information.collection_name())?;
        log::debug!("Creating repository for {}", namespace);
        Ok(CustomRepository::new(
            information,
            namespace,
            self.inner.operations.clone(),
        ))
    }

    /// Returns the cached entity information of `T`, resolving it on first use.
    pub fn entity_information<T>(&self) -> PatchResult<EntityInformation<T>>
    where
        T: Entity + 'static,
    {
        self.inner.entity_information::<T>()
    }

    /// Number of entity types resolved so far.
    pub fn cached_entities(&self) -> usize {
        self.inner.entity_information.len()
    }
}

struct RepositoryFactoryInner<O> {
    config: RepositoryConfig,
    database: String,
    operations: Arc<O>,
    entity_information: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl<O> RepositoryFactoryInner<O> {
    fn entity_information<T>(&self) -> PatchResult<EntityInformation<T>>
    where
        T: Entity + 'static,
    {
        // clone the Arc out so no map guard is held while downcasting
        let cached = self
            .entity_information
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                log::trace!("Resolving entity information for {}", std::any::type_name::<T>());
                let information: Arc<dyn Any + Send + Sync> =
                    Arc::new(EntityInformation::<T>::new());
                information
            })
            .value()
            .clone();

        match cached.downcast_ref::<EntityInformation<T>>() {
            Some(information) => Ok(information.clone()),
            None => {
                log::error!(
                    "Cached entity information has the wrong type for {}",
                    std::any::type_name::<T>()
                );
                Err(PatchError::new(
                    "Entity information cache is corrupted",
                    ErrorKind::InternalError,
                ))
            }
        }
    }
}
