// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena of scene-object nodes with cached bounding regions.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use kurbo::Rect;
use smallvec::SmallVec;
use tableau_region::{COLLAPSE_THRESHOLD, Region};
use tableau_render::Style;
use tableau_transform::Matrix4;

use crate::SceneError;
use crate::dirty::DirtyBits;
use crate::object::{DrawContext, SceneObject, Visibility};
use crate::segment::Segment;

/// Identifier for a node in an [`ObjectTree`].
///
/// A small, copyable handle made of a slot index and a generation counter.
/// Removing a node frees its slot and bumps the slot's generation, so stale
/// ids never alias a node inserted later.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObjectId(u32, u32);

impl ObjectId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.0, self.1)
    }
}

struct Node {
    object: Box<dyn SceneObject>,
    parent: Option<ObjectId>,
    children: SmallVec<[ObjectId; 4]>,
    segments: Vec<Segment>,
    name: Option<String>,
    user_data: Option<u64>,
    style: Option<Arc<Style>>,
    visibility: Visibility,
    /// Cached region, valid when the slot's dirty bit is clear and the mask
    /// matches.
    region: Region,
    region_mask: Visibility,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Tree of scene objects stored in a slot arena.
///
/// Parent and child links are [`ObjectId`]s, and region validity lives in a
/// separate dirty bitset: invalidating a node marks it and every ancestor,
/// since a parent's region is the union of its children's.
pub struct ObjectTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<ObjectId>,
    dirty: DirtyBits,
    default_style: Style,
    len: usize,
}

impl fmt::Debug for ObjectTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTree")
            .field("len", &self.len)
            .field("roots", &self.roots)
            .field("dirty", &self.dirty.any())
            .finish_non_exhaustive()
    }
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            dirty: DirtyBits::default(),
            default_style: Style::default(),
            len: 0,
        }
    }

    fn node(&self, id: ObjectId) -> Option<&Node> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: ObjectId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_mut()
    }

    fn live(&mut self, id: ObjectId) -> Result<&mut Node, SceneError> {
        self.node_mut(id).ok_or(SceneError::UnknownObject(id))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.node(id).is_some()
    }

    /// Top-level nodes in insertion order.
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Inserts `object` under `parent`, or as a new root.
    ///
    /// The node starts with no segments, full visibility and an invalid
    /// region.
    pub fn insert(
        &mut self,
        parent: Option<ObjectId>,
        object: impl SceneObject,
    ) -> Result<ObjectId, SceneError> {
        if let Some(p) = parent
            && !self.contains(p)
        {
            return Err(SceneError::UnknownObject(p));
        }
        let node = Node {
            object: Box::new(object),
            parent,
            children: SmallVec::new(),
            segments: Vec::new(),
            name: None,
            user_data: None,
            style: None,
            visibility: Visibility::all(),
            region: Region::new(),
            region_mask: Visibility::all(),
        };
        let id = if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.node = Some(node);
            ObjectId(idx, slot.generation)
        } else {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "more than u32::MAX slots is not supported"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            ObjectId(idx, 1)
        };
        match parent.and_then(|p| self.node_mut(p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        self.len += 1;
        self.invalidate(id);
        Ok(id)
    }

    /// Removes `id` and its subtree.
    ///
    /// Returns the region the subtree covered, which the caller should treat
    /// as damage.
    pub fn remove(&mut self, id: ObjectId) -> Result<Region, SceneError> {
        let (parent, mask) = {
            let node = self.live(id)?;
            (node.parent, node.region_mask)
        };
        let damage = self.compute_region(id, mask);

        match parent {
            Some(p) => {
                if let Some(pn) = self.node_mut(p) {
                    pn.children.retain(|c| *c != id);
                }
                self.invalidate(p);
            }
            None => self.roots.retain(|r| *r != id),
        }

        let mut stack = alloc::vec![id];
        while let Some(cur) = stack.pop() {
            let slot = &mut self.slots[cur.idx()];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.iter().copied());
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(cur.0);
                self.dirty.clear(cur.idx());
                self.len -= 1;
            }
        }
        Ok(damage)
    }

    /// Parent of `id`, if any.
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.node(id)?.parent
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Segments produced by the node's last draw.
    pub fn segments(&self, id: ObjectId) -> Option<&[Segment]> {
        self.node(id).map(|n| n.segments.as_slice())
    }

    /// Mutable segments; the node's region is invalidated.
    pub fn segments_mut(&mut self, id: ObjectId) -> Option<&mut Vec<Segment>> {
        if !self.contains(id) {
            return None;
        }
        self.invalidate(id);
        self.node_mut(id).map(|n| &mut n.segments)
    }

    /// Name of the node.
    pub fn name(&self, id: ObjectId) -> Option<&str> {
        self.node(id)?.name.as_deref()
    }

    /// Sets or clears the node's name.
    pub fn set_name(&mut self, id: ObjectId, name: Option<String>) -> Result<(), SceneError> {
        self.live(id)?.name = name;
        Ok(())
    }

    /// User tag of the node.
    pub fn user_data(&self, id: ObjectId) -> Option<u64> {
        self.node(id)?.user_data
    }

    /// Sets or clears the node's user tag.
    pub fn set_user_data(&mut self, id: ObjectId, data: Option<u64>) -> Result<(), SceneError> {
        self.live(id)?.user_data = data;
        Ok(())
    }

    /// Visibility flags of the node.
    pub fn visibility(&self, id: ObjectId) -> Option<Visibility> {
        self.node(id).map(|n| n.visibility)
    }

    /// Sets the node's visibility flags and invalidates its region.
    pub fn set_visibility(&mut self, id: ObjectId, flags: Visibility) -> Result<(), SceneError> {
        self.live(id)?.visibility = flags;
        self.invalidate(id);
        Ok(())
    }

    /// Node style, without inheritance.
    pub fn style(&self, id: ObjectId) -> Option<&Arc<Style>> {
        self.node(id)?.style.as_ref()
    }

    /// Sets or clears the node style and invalidates its subtree's regions,
    /// since stroke widths may change.
    pub fn set_style(&mut self, id: ObjectId, style: Option<Arc<Style>>) -> Result<(), SceneError> {
        self.live(id)?.style = style;
        self.invalidate_subtree(id);
        Ok(())
    }

    /// Style used when nothing on the node's path sets one.
    pub fn default_style(&self) -> &Style {
        &self.default_style
    }

    /// Replaces the fallback style.
    pub fn set_default_style(&mut self, style: Style) {
        self.default_style = style;
        let roots = self.roots.clone();
        for r in roots {
            self.invalidate_subtree(r);
        }
    }

    /// Resolves the style for a segment of `id` (or the node itself when
    /// `segment` is `None`): segment, node, ancestors, then the default.
    pub fn effective_style(&self, id: ObjectId, segment: Option<usize>) -> &Style {
        let Some(node) = self.node(id) else {
            return &self.default_style;
        };
        if let Some(s) = segment
            .and_then(|i| node.segments.get(i))
            .and_then(|s| s.style.as_deref())
        {
            return s;
        }
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(s) = n.style.as_deref() {
                return s;
            }
            cur = n.parent.and_then(|p| self.node(p));
        }
        &self.default_style
    }

    /// Downcasts the node's object.
    pub fn object<T: SceneObject>(&self, id: ObjectId) -> Option<&T> {
        let obj: &dyn Any = &*self.node(id)?.object;
        obj.downcast_ref::<T>()
    }

    /// Downcasts the node's object mutably. Call
    /// [`Scene::redraw_object`](crate::Scene::redraw_object) afterwards to
    /// regenerate its segments.
    pub fn object_mut<T: SceneObject>(&mut self, id: ObjectId) -> Option<&mut T> {
        let obj: &mut dyn Any = &mut *self.node_mut(id)?.object;
        obj.downcast_mut::<T>()
    }

    /// Marks the region of `id` and all its ancestors invalid.
    pub fn invalidate(&mut self, id: ObjectId) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = self.node(c) else { break };
            cur = node.parent;
            // Masked subtrees keep their dirty bits while their ancestors are
            // recomputed, so a dirty node does not imply dirty ancestors.
            self.dirty.mark(c.idx());
        }
    }

    fn invalidate_subtree(&mut self, id: ObjectId) {
        self.invalidate(id);
        let mut stack: Vec<ObjectId> = self.children(id).to_vec();
        while let Some(c) = stack.pop() {
            self.dirty.mark(c.idx());
            stack.extend_from_slice(self.children(c));
        }
    }

    /// Returns `true` if the node's cached region is current.
    pub fn is_region_valid(&self, id: ObjectId) -> bool {
        self.contains(id) && !self.dirty.is_dirty(id.idx())
    }

    /// Returns `true` if any node's region is invalid.
    pub fn has_invalid_regions(&self) -> bool {
        self.dirty.any()
    }

    /// The region cached by the last computation, possibly stale.
    pub fn cached_region(&self, id: ObjectId) -> Option<&Region> {
        self.node(id).map(|n| &n.region)
    }

    /// Computes the device region of `id` for `mask`, bottom-up.
    ///
    /// Subtrees whose cached region is valid for the same mask are not
    /// revisited. A node whose visibility does not intersect `mask`
    /// contributes nothing, and neither does its subtree.
    pub fn compute_region(&mut self, id: ObjectId, mask: Visibility) -> Region {
        let Some(node) = self.node(id) else {
            return Region::new();
        };
        if !self.dirty.is_dirty(id.idx()) && node.region_mask == mask {
            return node.region.clone();
        }

        let mut region = Region::new();
        let kinds = node.visibility & mask;
        let children = if kinds.is_empty() {
            SmallVec::new()
        } else {
            for (i, seg) in node.segments.iter().enumerate() {
                if kinds.contains(Visibility::DATA) && seg.has_geometry() {
                    let outset = self.effective_style(id, Some(i)).stroke_outset();
                    if let Some(b) = seg.bounds(outset) {
                        region.union_rect(b);
                    }
                }
                if kinds.contains(Visibility::ANNOTATION) {
                    for r in seg.texts.iter().filter_map(|t| t.rect) {
                        region.union_rect(r.expand());
                    }
                }
                if kinds.contains(Visibility::SYMBOLS) {
                    for r in seg.symbols.iter().filter_map(|s| s.rect) {
                        region.union_rect(r.expand());
                    }
                }
                if kinds.contains(Visibility::WIDGETS) {
                    for r in seg.components.iter().filter_map(|c| c.rect) {
                        region.union_rect(r.expand());
                    }
                }
            }
            node.children.clone()
        };
        for c in children {
            let child = self.compute_region(c, mask);
            region.union(&child);
        }
        if region.rectangle_count() > COLLAPSE_THRESHOLD {
            region.collapse();
        }

        if let Some(node) = self.node_mut(id) {
            node.region = region.clone();
            node.region_mask = mask;
        }
        self.dirty.clear(id.idx());
        region
    }

    /// Depth-first, first-match search by name. `None` finds the first
    /// unnamed node.
    pub fn find_by_name(&self, name: Option<&str>) -> Option<ObjectId> {
        self.find(|n| n.name.as_deref() == name)
    }

    /// Depth-first, first-match search by user tag. `None` finds the first
    /// untagged node.
    pub fn find_by_user_data(&self, data: Option<u64>) -> Option<ObjectId> {
        self.find(|n| n.user_data == data)
    }

    fn find(&self, mut pred: impl FnMut(&Node) -> bool) -> Option<ObjectId> {
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if pred(node) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// All live nodes in depth-first pre-order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.visible_ids(Visibility::all())
    }

    /// Nodes in depth-first pre-order whose visibility intersects `mask`;
    /// subtrees of skipped nodes are skipped too.
    pub fn visible_ids(&self, mask: Visibility) -> Vec<ObjectId> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            if !node.visibility.intersects(mask) {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Runs the node's [`SceneObject::draw`] and invalidates its region.
    pub(crate) fn draw(&mut self, id: ObjectId, transform: &Matrix4, viewport: Rect) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let Node {
            object, segments, ..
        } = node;
        let mut cx = DrawContext::new(id, transform, viewport, segments);
        object.draw(&mut cx);
        self.invalidate(id);
        true
    }

    /// Segments and visibility for layout and painting, without
    /// invalidation.
    pub(crate) fn parts_mut(&mut self, id: ObjectId) -> Option<(Visibility, &mut Vec<Segment>)> {
        self.node_mut(id).map(|n| (n.visibility, &mut n.segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use kurbo::Point;

    fn noop(_: &mut DrawContext<'_>) {}

    fn square(tree: &mut ObjectTree, id: ObjectId, x: f64, y: f64) {
        let seg = Segment::polygon(vec![
            Point::new(x, y),
            Point::new(x + 10.0, y),
            Point::new(x + 10.0, y + 10.0),
            Point::new(x, y + 10.0),
        ]);
        tree.segments_mut(id).unwrap().push(seg);
    }

    #[test]
    fn stale_ids_do_not_alias() {
        let mut tree = ObjectTree::new();
        let a = tree.insert(None, noop).unwrap();
        tree.remove(a).unwrap();
        let b = tree.insert(None, noop).unwrap();
        assert_eq!(a.idx(), b.idx());
        assert_ne!(a, b);
        assert!(!tree.contains(a));
        assert!(tree.contains(b));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut tree = ObjectTree::new();
        let a = tree.insert(None, noop).unwrap();
        tree.remove(a).unwrap();
        assert_eq!(tree.insert(Some(a), noop), Err(SceneError::UnknownObject(a)));
    }

    #[test]
    fn parent_region_is_union_of_children() {
        let mut tree = ObjectTree::new();
        let root = tree.insert(None, noop).unwrap();
        let a = tree.insert(Some(root), noop).unwrap();
        let b = tree.insert(Some(root), noop).unwrap();
        square(&mut tree, a, 0.0, 0.0);
        square(&mut tree, b, 20.0, 0.0);

        let region = tree.compute_region(root, Visibility::all());
        assert_eq!(region.extent(), Some(Rect::new(-1.0, -1.0, 31.0, 11.0)));
        assert!(tree.is_region_valid(root));
        assert!(!tree.has_invalid_regions());

        // Invalidation walks up to the root.
        square(&mut tree, b, 40.0, 0.0);
        assert!(!tree.is_region_valid(b));
        assert!(!tree.is_region_valid(root));
        assert!(tree.is_region_valid(a));
        let region = tree.compute_region(root, Visibility::all());
        assert_eq!(region.extent(), Some(Rect::new(-1.0, -1.0, 51.0, 11.0)));
    }

    #[test]
    fn masked_nodes_and_subtrees_are_skipped() {
        let mut tree = ObjectTree::new();
        let root = tree.insert(None, noop).unwrap();
        let child = tree.insert(Some(root), noop).unwrap();
        square(&mut tree, child, 0.0, 0.0);
        tree.set_visibility(root, Visibility::WIDGETS).unwrap();
        assert!(tree.compute_region(root, Visibility::DATA).is_empty());
        assert_eq!(tree.visible_ids(Visibility::DATA), vec![]);
        assert_eq!(tree.visible_ids(Visibility::WIDGETS), vec![root, child]);
    }

    #[test]
    fn remove_returns_covered_region() {
        let mut tree = ObjectTree::new();
        let root = tree.insert(None, noop).unwrap();
        let child = tree.insert(Some(root), noop).unwrap();
        square(&mut tree, child, 5.0, 5.0);
        let damage = tree.remove(root).unwrap();
        assert_eq!(damage.extent(), Some(Rect::new(4.0, 4.0, 16.0, 16.0)));
        assert!(tree.is_empty());
        assert!(!tree.contains(child));
    }

    #[test]
    fn find_is_depth_first_first_match() {
        let mut tree = ObjectTree::new();
        let a = tree.insert(None, noop).unwrap();
        let a1 = tree.insert(Some(a), noop).unwrap();
        let b = tree.insert(None, noop).unwrap();
        tree.set_name(a1, Some("x".into())).unwrap();
        tree.set_name(b, Some("x".into())).unwrap();
        tree.set_name(a, Some("root".into())).unwrap();
        tree.set_user_data(b, Some(7)).unwrap();

        assert_eq!(tree.find_by_name(Some("x")), Some(a1));
        assert_eq!(tree.find_by_name(Some("nope")), None);
        assert_eq!(tree.find_by_name(None), None);
        assert_eq!(tree.find_by_user_data(Some(7)), Some(b));
        // Untagged search matches the first node without user data.
        assert_eq!(tree.find_by_user_data(None), Some(a));
        assert_eq!(tree.ids(), vec![a, a1, b]);
    }

    #[test]
    fn style_resolution_walks_ancestors() {
        let mut tree = ObjectTree::new();
        let root = tree.insert(None, noop).unwrap();
        let child = tree.insert(Some(root), noop).unwrap();
        assert_eq!(tree.effective_style(child, None).line_width, 1.0);

        let wide = Arc::new(Style::default().with_line_width(6.0));
        tree.set_style(root, Some(wide)).unwrap();
        assert_eq!(tree.effective_style(child, None).line_width, 6.0);

        let thin = Arc::new(Style::default().with_line_width(0.5));
        tree.segments_mut(child)
            .unwrap()
            .push(Segment::default().with_style(thin));
        assert_eq!(tree.effective_style(child, Some(0)).line_width, 0.5);
        assert_eq!(tree.effective_style(child, Some(9)).line_width, 6.0);
    }

    #[test]
    fn objects_downcast_to_their_type() {
        struct Marker(u32);
        impl SceneObject for Marker {
            fn draw(&mut self, _: &mut DrawContext<'_>) {}
        }
        let mut tree = ObjectTree::new();
        let id = tree.insert(None, Marker(3)).unwrap();
        assert_eq!(tree.object::<Marker>(id).map(|m| m.0), Some(3));
        tree.object_mut::<Marker>(id).unwrap().0 = 4;
        assert_eq!(tree.object::<Marker>(id).map(|m| m.0), Some(4));
    }
}
