use std::sync::Arc;

use dashmap::DashMap;

use crate::modules::client::{Client, ClientId};

/// Connected viewers, shared between the camera thread and connection tasks.
///
/// Entries are inserted fully built and removed in one step, so a reader never
/// observes a half constructed client. Shard locks are held only for the
/// duration of a single operation.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<Client>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, client: Arc<Client>) -> Option<Arc<Client>> {
        self.clients.insert(client.id(), client)
    }

    pub fn remove(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.clients.remove(id).map(|(_, client)| client)
    }

    pub fn get(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.clients.get(id).map(|client| client.value().clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Replaces the contents of `snapshot` with every ready client.
    ///
    /// Sends happen on the snapshot, not under the map's locks, so a track
    /// may safely call back into the registry.
    pub fn collect_ready(&self, snapshot: &mut Vec<Arc<Client>>) {
        snapshot.clear();
        snapshot.extend(
            self.clients
                .iter()
                .filter(|client| client.is_ready())
                .map(|client| client.value().clone()),
        );
    }
}
