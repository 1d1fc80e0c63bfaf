//! Backend construction from configuration.

use std::sync::Arc;

use tracing::info;

use treeacl_domain::{Acl, DbAcl, IniAcl};
use treeacl_storage::AclDataStore;

use crate::adapters::{StoreNodeReader, StorePermissionStore};
use crate::config::{AclServiceConfig, ConfigLoadError};

/// The `Acl` produced by [`build_acl`] over a given store.
pub type StoreAcl<S> = Acl<StoreNodeReader<S>, StorePermissionStore<S>>;

/// Builds the configured ACL backend.
///
/// The `db` backend reads nodes and permission rows from `store`. The `ini`
/// backend loads `acl.ini_path` once and ignores `store`.
pub fn build_acl<S: AclDataStore>(
    config: &AclServiceConfig,
    store: Arc<S>,
) -> Result<StoreAcl<S>, ConfigLoadError> {
    config.validate()?;

    let acl = match config.acl.backend.as_str() {
        "db" => {
            let resolver = config.resolver_config()?;
            info!(actions = %resolver.actions, max_depth = resolver.max_depth, "using tree ACL");
            Acl::Db(DbAcl::with_config(
                Arc::new(StoreNodeReader::new(Arc::clone(&store))),
                Arc::new(StorePermissionStore::new(store)),
                resolver,
            ))
        }
        "ini" => {
            let path = config.acl.ini_path.as_deref().unwrap_or_default();
            Acl::Ini(IniAcl::load(path.trim())?)
        }
        other => {
            return Err(ConfigLoadError::Invalid {
                message: format!("unsupported acl.backend: {other}"),
            })
        }
    };

    Ok(acl)
}
