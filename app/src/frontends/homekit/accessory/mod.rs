mod window_covering;

use std::sync::Arc;

use crate::frontends::homekit::Accessory;

pub use window_covering::WindowCovering;

pub struct HomekitRegistry<A> {
    accessories: Vec<Arc<A>>,
}

impl<A: Accessory> HomekitRegistry<A> {
    pub fn new(accessories: Vec<A>) -> Self {
        for (index, accessory) in accessories.iter().enumerate() {
            if accessories[..index].iter().any(|a| a.name() == accessory.name()) {
                tracing::warn!("Duplicate accessory name {}, only the first one is reachable", accessory.name());
            }
        }

        Self {
            accessories: accessories.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<A>> {
        self.accessories.iter()
    }

    pub fn find(&self, name: &str) -> Option<Arc<A>> {
        self.accessories.iter().find(|a| a.name() == name).cloned()
    }
}
