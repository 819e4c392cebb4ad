//! Stop-the-world, single-pass, compacting collector (§4.A).
//!
//! Because [`super::arena::Arena`] stores owned `Object` values rather
//! than byte-level records containing their own internal pointers,
//! reachability reduces to "is this slot named by a root" — there is no
//! separate graph walk to follow pointers embedded inside an object,
//! since none exist. Collection is therefore: gather every `ObjectRef`
//! named by a root, keep exactly those slots, and remap each root in
//! place to the kept object's new position.

use super::arena::{Arena, ObjectRef};
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

/// Anything holding `ObjectRef`s that must survive a GC pass and be
/// rewritten if the object they name moves. [`super::Runtime`]
/// implements this over its stack, locals, call stack, directory path,
/// and registered [`super::handle::Gc`] roots.
pub trait RootSource {
    /// Call `visit` once for every live root reference, allowing the
    /// collector to both read and rewrite it in place.
    fn visit_roots_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef));
}

/// Run one collection pass: compact `arena` down to only the objects
/// reachable from `roots`, remapping every root to its post-compaction
/// slot. Returns the number of slots freed.
pub fn collect(arena: &mut Arena, roots: &mut dyn RootSource) -> usize {
    let mut keep: BTreeSet<u32> = BTreeSet::new();
    roots.visit_roots_mut(&mut |r| {
        keep.insert(r.index() as u32);
    });

    let occupied: Vec<u32> = arena.occupied_indices().collect();
    let before = occupied.len();

    let mut mapping: BTreeMap<u32, u32> = BTreeMap::new();
    let mut new_slots = Vec::with_capacity(occupied.len());
    for old_index in occupied {
        if keep.contains(&old_index) {
            let object = arena.take(old_index);
            let new_index = new_slots.len() as u32;
            mapping.insert(old_index, new_index);
            new_slots.push(Some(object));
        }
    }
    let after = new_slots.len();
    arena.replace_all(new_slots);

    roots.visit_roots_mut(&mut |r| {
        if let Some(&new_index) = mapping.get(&(r.index() as u32)) {
            *r = ObjectRef::new(new_index);
        }
    });

    before - after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integer::Integer;
    use crate::object::Object;

    struct FakeRoots(Vec<ObjectRef>);
    impl RootSource for FakeRoots {
        fn visit_roots_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef)) {
            for r in &mut self.0 {
                visit(r);
            }
        }
    }

    #[test]
    fn collect_drops_unrooted_objects_and_remaps_survivors() {
        let mut arena = Arena::new();
        let garbage = arena.make(Object::Integer(Integer::new(false, 1)));
        let kept = arena.make(Object::Integer(Integer::new(false, 2)));
        let _ = garbage;
        let mut roots = FakeRoots(alloc::vec![kept]);

        let freed = collect(&mut arena, &mut roots);
        assert_eq!(freed, 1);
        assert_eq!(arena.live_count(), 1);
        let remapped = roots.0[0];
        match arena.get(remapped).unwrap() {
            Object::Integer(i) => assert_eq!(i.to_i64(), Some(2)),
            _ => panic!("expected integer"),
        }
    }

    #[test]
    fn collect_on_fully_rooted_arena_frees_nothing() {
        let mut arena = Arena::new();
        let a = arena.make(Object::Integer(Integer::new(false, 1)));
        let b = arena.make(Object::Integer(Integer::new(false, 2)));
        let mut roots = FakeRoots(alloc::vec![a, b]);
        let freed = collect(&mut arena, &mut roots);
        assert_eq!(freed, 0);
        assert_eq!(arena.live_count(), 2);
    }
}
