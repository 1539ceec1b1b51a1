//! Object registry
//!
//! Maps stable object ids to handles of the currently loaded scene. The
//! renderer attaches every animatable node (and annotation) once per model
//! load, recording its rest pose; keyframe data only ever refers to ids, so a
//! reload just rebuilds the registry.

use crate::keyframe::ObjectId;
use crate::math::Transform;
use crate::offset::RestPoses;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle of an attached object, stable until it is detached
    pub struct ObjectKey;
}

/// An attached object
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectEntry {
    pub id: ObjectId,
    pub rest: Transform,
}

/// Bidirectional `ObjectId <-> ObjectKey` registry with rest poses
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    entries: SlotMap<ObjectKey, ObjectEntry>,
    by_id: FxHashMap<ObjectId, ObjectKey>,
    rest_poses: RestPoses,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an object with its authored rest pose.
    ///
    /// Re-attaching an id replaces the previous entry (and invalidates its key).
    pub fn attach(&mut self, id: ObjectId, rest: Transform) -> ObjectKey {
        if let Some(old) = self.by_id.remove(&id) {
            self.entries.remove(old);
        }
        let key = self.entries.insert(ObjectEntry {
            id: id.clone(),
            rest,
        });
        self.rest_poses.insert(id.clone(), rest);
        self.by_id.insert(id, key);
        key
    }

    /// Detach an object; its key becomes invalid
    pub fn detach(&mut self, key: ObjectKey) -> Option<ObjectEntry> {
        let entry = self.entries.remove(key)?;
        self.by_id.remove(&entry.id);
        self.rest_poses.remove(&entry.id);
        Some(entry)
    }

    /// Detach an object and everything nested under it
    pub fn detach_subtree(&mut self, root: &ObjectId) -> usize {
        let doomed: Vec<ObjectKey> = self
            .entries
            .iter()
            .filter(|(_, e)| &e.id == root || root.is_ancestor_of(&e.id))
            .map(|(k, _)| k)
            .collect();
        for key in &doomed {
            self.detach(*key);
        }
        doomed.len()
    }

    /// Drop every entry (model unloaded)
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_id.clear();
        self.rest_poses.clear();
    }

    pub fn key_of(&self, id: &ObjectId) -> Option<ObjectKey> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, key: ObjectKey) -> Option<&ObjectEntry> {
        self.entries.get(key)
    }

    pub fn id_of(&self, key: ObjectKey) -> Option<&ObjectId> {
        self.entries.get(key).map(|e| &e.id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rest poses of all attached objects
    pub fn rest_poses(&self) -> &RestPoses {
        &self.rest_poses
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &ObjectEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_attach_and_lookup() {
        let mut registry = ObjectRegistry::new();
        let rest = Transform::IDENTITY.with_position(Vec3::new(1.0, 0.0, 0.0));
        let key = registry.attach(ObjectId::new("frame/arm"), rest);

        assert_eq!(registry.key_of(&ObjectId::new("frame/arm")), Some(key));
        assert_eq!(registry.id_of(key), Some(&ObjectId::new("frame/arm")));
        assert_eq!(
            registry.rest_poses().get(&ObjectId::new("frame/arm")),
            Some(&rest)
        );
    }

    #[test]
    fn test_detach_invalidates_key() {
        let mut registry = ObjectRegistry::new();
        let key = registry.attach(ObjectId::new("a"), Transform::IDENTITY);
        assert!(registry.detach(key).is_some());
        assert!(registry.get(key).is_none());
        assert!(registry.detach(key).is_none());
        assert!(registry.rest_poses().is_empty());
    }

    #[test]
    fn test_reattach_replaces_entry() {
        let mut registry = ObjectRegistry::new();
        let first = registry.attach(ObjectId::new("a"), Transform::IDENTITY);
        let second = registry.attach(
            ObjectId::new("a"),
            Transform::IDENTITY.with_position(Vec3::new(0.0, 2.0, 0.0)),
        );
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.rest_poses().get_or_identity(&ObjectId::new("a")).position.y,
            2.0
        );
    }

    #[test]
    fn test_detach_subtree() {
        let mut registry = ObjectRegistry::new();
        registry.attach(ObjectId::new("model"), Transform::IDENTITY);
        registry.attach(ObjectId::new("model/arm"), Transform::IDENTITY);
        registry.attach(ObjectId::new("model/arm/bolt"), Transform::IDENTITY);
        registry.attach(ObjectId::new("annotation:a1"), Transform::IDENTITY);

        assert_eq!(registry.detach_subtree(&ObjectId::new("model")), 3);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&ObjectId::new("annotation:a1")));
    }
}
