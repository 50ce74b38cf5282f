use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::HASH_SENTINEL;
use crate::hash::name_hash;

#[derive(Debug, Default)]
struct Maps {
    by_hash: HashMap<u32, String>,
    by_name: HashMap<String, u32>,
}

/// Bidirectional name <-> hash table shared across decode sessions.
///
/// Entries accumulate for the life of the process and are never removed.
/// Lookups take a read lock; `learn` takes the write lock only for novel
/// names, so a background harvesting task feeding candidates in does not
/// stall concurrent decodes.
#[derive(Debug, Default)]
pub struct NameDirectory {
    maps: RwLock<Maps>,
}

impl NameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover the name behind a hash, if it has been learned.
    pub fn resolve(&self, hash: u32) -> Option<String> {
        self.maps.read().by_hash.get(&hash).cloned()
    }

    /// Hash of a name. Pure and total; does not consult or grow the table.
    pub fn hash_of(&self, name: &str) -> u32 {
        name_hash(name)
    }

    /// Record a candidate name. Idempotent; malformed input (empty, or
    /// carrying the unresolved-key sentinel prefix) is a no-op.
    pub fn learn(&self, name: &str) {
        if name.is_empty() || name.starts_with(HASH_SENTINEL) {
            return;
        }
        {
            let maps = self.maps.read();
            if maps.by_name.contains_key(name) {
                return;
            }
        }
        let hash = name_hash(name);
        let mut maps = self.maps.write();
        // Another thread may have learned it between the locks.
        if maps.by_name.contains_key(name) {
            return;
        }
        if maps.by_hash.contains_key(&hash) {
            debug!(hash, new = name, "hash collision, keeping first name");
        } else {
            maps.by_hash.insert(hash, name.to_string());
        }
        maps.by_name.insert(name.to_string(), hash);
    }

    /// Feed a batch of candidates through `learn`.
    pub fn learn_all<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.len();
        for name in names {
            self.learn(name.as_ref());
        }
        debug!(added = self.len() - before, "learned name batch");
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.read().by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.maps.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::NameDirectory;
    use crate::hash::name_hash;

    #[test]
    fn learn_then_resolve() {
        let dir = NameDirectory::new();
        assert_eq!(dir.resolve(name_hash("gold")), None);

        dir.learn("gold");
        assert_eq!(dir.resolve(name_hash("gold")).as_deref(), Some("gold"));
        assert_eq!(dir.hash_of("gold"), name_hash("gold"));
    }

    #[test]
    fn learn_is_idempotent_and_rejects_malformed() {
        let dir = NameDirectory::new();
        dir.learn("heroes");
        dir.learn("heroes");
        dir.learn("");
        dir.learn("###123");
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn learn_all_counts_once_per_name() {
        let dir = NameDirectory::new();
        dir.learn_all(["gold", "heroes", "gold", ""]);
        assert_eq!(dir.len(), 2);
        assert!(dir.contains("heroes"));
    }

    #[test]
    fn concurrent_readers_and_writer() {
        let dir = Arc::new(NameDirectory::new());
        dir.learn("seed");

        let writer = {
            let dir = Arc::clone(&dir);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    dir.learn(&format!("name_{i}"));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let dir = Arc::clone(&dir);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        assert_eq!(dir.resolve(name_hash("seed")).as_deref(), Some("seed"));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(dir.len(), 1001);
    }
}
