pub mod files;
pub mod kv;
pub mod seed;
pub mod snapshot;

pub use files::{
    atomic_write, backup_file, ensure_dir, get_data_dir, init_local_data_dir, read_file,
    DATA_DIR_NAME,
};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use seed::{bootstrap, sample_stats};
pub use snapshot::{load_state, save_state, STORE_KEY, STORE_VERSION};
