pub mod libros;

use biblioteca_db::Database;
use biblioteca_kernel::ModuleRegistry;

/// Register every service module, handing each the shared pool
pub fn register_all(registry: &mut ModuleRegistry, db: &Database) {
    registry.register(libros::create_module(db.clone()));
}
