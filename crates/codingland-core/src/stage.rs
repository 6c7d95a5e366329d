//! Stage - the scene tree stored as an arena of nodes.
//!
//! Every stage object is a `hecs` entity carrying a [`Node`] plus a
//! [`Transform`] and [`Attributes`]. Parent/child relations are stored as
//! entity handles, so there are no ownership cycles: the child list of a node
//! decides what is reachable from the root, and the parent handle is for
//! lookups only.
//!
//! Lifecycle: `Unattached -> Attached -> Disposed`. Disposal detaches the
//! node from its parent and clears its child list, but does not dispose the
//! children themselves; they become unattached roots. Use
//! [`Stage::dispose_tree`] for recursive teardown.

use codingland_logic::constants::FADE_OUT_MS;
use codingland_logic::Vector;
use hecs::{DynamicBundle, Entity, World};
use std::time::Duration;

use crate::components::*;
use crate::error::StageError;

/// Node arena holding every stage object.
pub struct Stage {
    /// ECS world containing all nodes
    pub world: World,
    next_id: u64,
}

impl Stage {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            next_id: 1,
        }
    }

    /// Create an unattached, invisible node.
    pub fn spawn(&mut self, kind: NodeKind) -> Entity {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.world
            .spawn((Node::new(id, kind), Transform::default(), Attributes::default()))
    }

    /// Create a node with extra components. Components in `bundle` replace
    /// the defaults (e.g. a `Transform` or `Attributes`).
    pub fn spawn_with(&mut self, kind: NodeKind, bundle: impl DynamicBundle) -> Entity {
        let entity = self.spawn(kind);
        // The entity was spawned above, so the insert cannot miss.
        let _ = self.world.insert(entity, bundle);
        entity
    }

    /// Like [`spawn_with`](Self::spawn_with), but the node starts visible.
    pub fn spawn_visible(&mut self, kind: NodeKind, bundle: impl DynamicBundle) -> Entity {
        let entity = self.spawn_with(kind, bundle);
        if let Some(id) = self.object_id(entity) {
            let _ = self.world.insert_one(entity, Presentation::new(id.element_id()));
        }
        entity
    }

    /// Number of nodes in the arena, including disposed ones not yet reaped.
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.len() == 0
    }

    // ── Lookups ────────────────────────────────────────────────────────

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<&Node>(entity).is_ok()
    }

    /// Exists and is not disposed.
    pub fn is_alive(&self, entity: Entity) -> bool {
        matches!(
            self.state(entity),
            Some(Lifecycle::Attached) | Some(Lifecycle::Unattached)
        )
    }

    pub fn kind(&self, entity: Entity) -> Option<NodeKind> {
        self.world.get::<&Node>(entity).ok().map(|n| n.kind)
    }

    pub fn object_id(&self, entity: Entity) -> Option<ObjectId> {
        self.world.get::<&Node>(entity).ok().map(|n| n.id)
    }

    pub fn state(&self, entity: Entity) -> Option<Lifecycle> {
        self.world.get::<&Node>(entity).ok().map(|n| n.state)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Node>(entity).ok().and_then(|n| n.parent)
    }

    pub fn depth(&self, entity: Entity) -> Option<u32> {
        self.world.get::<&Node>(entity).ok().map(|n| n.depth)
    }

    /// Occupied child slots in slot order.
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&Node>(entity)
            .map(|n| n.child_entities().collect())
            .unwrap_or_default()
    }

    /// The child in slot `index`, if the slot is occupied.
    pub fn child_at(&self, entity: Entity, index: usize) -> Option<Entity> {
        self.world
            .get::<&Node>(entity)
            .ok()
            .and_then(|n| n.children.get(index).copied().flatten())
    }

    /// Length of the child list, holes included.
    pub fn slot_count(&self, entity: Entity) -> usize {
        self.world
            .get::<&Node>(entity)
            .map(|n| n.children.len())
            .unwrap_or(0)
    }

    /// Find a node by its object id (linear scan).
    pub fn find(&self, id: ObjectId) -> Option<Entity> {
        self.world
            .query::<&Node>()
            .iter()
            .find(|(_, n)| n.id == id)
            .map(|(e, _)| e)
    }

    pub fn position(&self, entity: Entity) -> Option<Vector> {
        self.world.get::<&Transform>(entity).ok().map(|t| t.position)
    }

    pub fn set_position(&mut self, entity: Entity, position: Vector) -> Result<(), StageError> {
        let mut transform = self
            .world
            .get::<&mut Transform>(entity)
            .map_err(|_| StageError::MissingNode(entity))?;
        transform.position = position;
        Ok(())
    }

    pub fn direction(&self, entity: Entity) -> Option<Vector> {
        self.world.get::<&Transform>(entity).ok().map(|t| t.direction)
    }

    pub fn set_direction(&mut self, entity: Entity, direction: Vector) -> Result<(), StageError> {
        let mut transform = self
            .world
            .get::<&mut Transform>(entity)
            .map_err(|_| StageError::MissingNode(entity))?;
        transform.direction = direction;
        Ok(())
    }

    /// Own position, or the nearest ancestor's when unset (chunk occupants).
    pub fn world_position(&self, entity: Entity) -> Option<Vector> {
        let mut current = Some(entity);
        while let Some(e) = current {
            match self.position(e) {
                Some(p) if !p.is_empty() => return Some(p),
                _ => current = self.parent(e),
            }
        }
        None
    }

    pub fn attributes(&self, entity: Entity) -> Option<Attributes> {
        self.world.get::<&Attributes>(entity).ok().map(|a| (*a).clone())
    }

    pub fn update_attributes<R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut Attributes) -> R,
    ) -> Result<R, StageError> {
        let mut attrs = self
            .world
            .get::<&mut Attributes>(entity)
            .map_err(|_| StageError::MissingNode(entity))?;
        Ok(f(&mut attrs))
    }

    pub fn health(&self, entity: Entity) -> Option<Health> {
        self.world.get::<&Health>(entity).ok().map(|h| *h)
    }

    /// Pre-order walk of the subtree under `root`, children in slot order.
    pub fn walk(&self, root: Entity) -> Vec<Entity> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if !self.contains(entity) {
                continue;
            }
            order.push(entity);
            stack.extend(self.children(entity).into_iter().rev());
        }
        order
    }

    // ── Visibility ─────────────────────────────────────────────────────

    /// Visible means "has a presentation handle".
    pub fn is_visible(&self, entity: Entity) -> bool {
        self.world.get::<&Presentation>(entity).is_ok()
    }

    /// Create or release the presentation handle. Idempotent.
    pub fn set_visible(&mut self, entity: Entity, visible: bool) -> Result<(), StageError> {
        let node_id = self.object_id(entity).ok_or(StageError::MissingNode(entity))?;
        let current = self.is_visible(entity);
        if visible && !current {
            let _ = self
                .world
                .insert_one(entity, Presentation::new(node_id.element_id()));
            if self.state(entity) == Some(Lifecycle::Attached) {
                self.mount(entity);
            }
        } else if !visible && current {
            let _ = self.world.remove_one::<Presentation>(entity);
        }
        Ok(())
    }

    /// Mount hook: attach the presentation handle under the parent's element.
    pub fn mount(&mut self, entity: Entity) {
        let under = self.parent(entity).and_then(|p| {
            self.world
                .get::<&Presentation>(p)
                .ok()
                .map(|pr| pr.element_id.clone())
        });
        if let Ok(mut presentation) = self.world.get::<&mut Presentation>(entity) {
            presentation.mounted = true;
            presentation.mounted_under = under;
        }
    }

    fn unmount(&mut self, entity: Entity) {
        if let Ok(mut presentation) = self.world.get::<&mut Presentation>(entity) {
            presentation.mounted = false;
            presentation.mounted_under = None;
        }
    }

    // ── Tree mutation ──────────────────────────────────────────────────

    /// Install `entity` as a root of the stage (attached, depth 0).
    pub fn attach_root(&mut self, entity: Entity) -> Result<(), StageError> {
        self.ensure_live(entity)?;
        self.detach(entity)?;
        self.with_node_mut(entity, |n| n.state = Lifecycle::Attached)?;
        self.set_subtree_depth(entity, 0);
        self.mount(entity);
        Ok(())
    }

    /// Append `child` to `parent`'s child list, detaching it from any
    /// previous parent.
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), StageError> {
        self.ensure_live(parent)?;
        self.ensure_live(child)?;
        if self.is_ancestor(child, parent) {
            return Err(StageError::Cycle { parent, child });
        }
        self.detach(child)?;
        self.with_node_mut(parent, |n| n.children.push(Some(child)))?;
        self.attach(parent, child)
    }

    /// Put `child` in slot `index` of `parent`, disposing the previous
    /// occupant of that slot. Returns the disposed occupant. Other slots of
    /// `parent` keep their occupants, even when `child` was already one of
    /// its children.
    pub fn set_child(
        &mut self,
        parent: Entity,
        index: usize,
        child: Entity,
    ) -> Result<Option<Entity>, StageError> {
        self.ensure_live(parent)?;
        self.ensure_live(child)?;
        if self.child_at(parent, index) == Some(child) {
            return Ok(None);
        }
        if self.is_ancestor(child, parent) {
            return Err(StageError::Cycle { parent, child });
        }

        let previous = self.child_at(parent, index);
        if let Some(old) = previous {
            // Empty the slot first so disposal does not shift its neighbors.
            self.with_node_mut(parent, |n| n.children[index] = None)?;
            self.with_node_mut(old, |n| n.parent = None)?;
            self.dispose(old)?;
        }

        if self.parent(child) == Some(parent) {
            // Moving between slots of one parent leaves a hole, never a shift.
            self.with_node_mut(parent, |n| {
                for slot in n.children.iter_mut().filter(|c| **c == Some(child)) {
                    *slot = None;
                }
            })?;
            self.with_node_mut(child, |n| n.parent = None)?;
        } else {
            self.detach(child)?;
        }

        self.with_node_mut(parent, |n| {
            if n.children.len() <= index {
                n.children.resize(index + 1, None);
            }
            n.children[index] = Some(child);
            while n.children.last() == Some(&None) {
                n.children.pop();
            }
        })?;
        self.attach(parent, child)?;
        Ok(previous)
    }

    /// Dispose a node: sever the parent link, clear the child list and start
    /// the presentation fade. Children are detached, not disposed; they are
    /// returned so the caller can re-home or dispose them.
    pub fn dispose(&mut self, entity: Entity) -> Result<Vec<Entity>, StageError> {
        match self.state(entity) {
            None => return Err(StageError::MissingNode(entity)),
            Some(Lifecycle::Disposed) => return Ok(Vec::new()),
            Some(_) => {}
        }

        let (children, parent, id, kind) = self.with_node_mut(entity, |n| {
            n.state = Lifecycle::Disposed;
            (std::mem::take(&mut n.children), n.parent.take(), n.id, n.kind)
        })?;

        if let Some(p) = parent {
            self.unlink(p, entity);
        }

        let orphans: Vec<Entity> = children.into_iter().flatten().collect();
        for &orphan in &orphans {
            if let Ok(mut node) = self.world.get::<&mut Node>(orphan) {
                node.parent = None;
                if node.state == Lifecycle::Attached {
                    node.state = Lifecycle::Unattached;
                }
            }
            self.set_subtree_depth(orphan, 0);
            self.unmount(orphan);
        }

        if let Ok(mut presentation) = self.world.get::<&mut Presentation>(entity) {
            presentation.opacity = 0.0;
            presentation.push_effect(EffectKind::FadeOut, Duration::from_millis(FADE_OUT_MS));
        }

        log::debug!(
            "Disposed {} ({}), {} child(ren) detached",
            id,
            kind.tag(),
            orphans.len()
        );
        Ok(orphans)
    }

    /// Dispose `root` and every node below it.
    pub fn dispose_tree(&mut self, root: Entity) -> Result<usize, StageError> {
        let nodes = self.walk(root);
        for &entity in nodes.iter().rev() {
            self.dispose(entity)?;
        }
        Ok(nodes.len())
    }

    /// Age presentation effects and release handles of disposed nodes whose
    /// fade has finished.
    pub fn age_presentations(&mut self, elapsed: Duration) {
        for (_, presentation) in self.world.query_mut::<&mut Presentation>() {
            presentation.age(elapsed);
        }

        let released: Vec<Entity> = self
            .world
            .query::<(&Node, &Presentation)>()
            .iter()
            .filter(|(_, (node, p))| node.is_disposed() && !p.is_fading())
            .map(|(e, _)| e)
            .collect();
        for entity in released {
            let _ = self.world.remove_one::<Presentation>(entity);
        }
    }

    /// Despawn disposed nodes that no longer hold a presentation handle.
    pub fn reap(&mut self) -> usize {
        let dead: Vec<Entity> = self
            .world
            .query::<&Node>()
            .iter()
            .filter(|(_, n)| n.is_disposed())
            .map(|(e, _)| e)
            .collect();

        let mut reaped = 0;
        for entity in dead {
            if self.is_visible(entity) {
                continue;
            }
            if self.world.despawn(entity).is_ok() {
                reaped += 1;
            }
        }
        reaped
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn with_node_mut<R>(
        &mut self,
        entity: Entity,
        f: impl FnOnce(&mut Node) -> R,
    ) -> Result<R, StageError> {
        let mut node = self
            .world
            .get::<&mut Node>(entity)
            .map_err(|_| StageError::MissingNode(entity))?;
        Ok(f(&mut node))
    }

    fn ensure_live(&self, entity: Entity) -> Result<(), StageError> {
        match self.state(entity) {
            None => Err(StageError::MissingNode(entity)),
            Some(Lifecycle::Disposed) => Err(StageError::Disposed(entity)),
            Some(_) => Ok(()),
        }
    }

    /// True if `ancestor` is `entity` or above it.
    fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.parent(e);
        }
        false
    }

    /// Remove `child` from its current parent's list, if any.
    fn detach(&mut self, child: Entity) -> Result<(), StageError> {
        if let Some(parent) = self.parent(child) {
            self.unlink(parent, child);
        }
        self.with_node_mut(child, |n| n.parent = None)
    }

    /// Drop `child` from `parent`'s child list by identity. Chunks keep the
    /// emptied slot so other occupants stay in place; other parents compact.
    fn unlink(&mut self, parent: Entity, child: Entity) {
        if let Ok(mut node) = self.world.get::<&mut Node>(parent) {
            if node.kind.is_chunk() {
                for slot in node.children.iter_mut().filter(|c| **c == Some(child)) {
                    *slot = None;
                }
                while node.children.last() == Some(&None) {
                    node.children.pop();
                }
            } else {
                node.children.retain(|c| *c != Some(child));
            }
        }
    }

    fn attach(&mut self, parent: Entity, child: Entity) -> Result<(), StageError> {
        let depth = self.depth(parent).unwrap_or(0) + 1;
        self.with_node_mut(child, |n| {
            n.parent = Some(parent);
            n.state = Lifecycle::Attached;
        })?;
        self.set_subtree_depth(child, depth);
        self.mount(child);
        Ok(())
    }

    fn set_subtree_depth(&mut self, root: Entity, depth: u32) {
        let mut stack = vec![(root, depth)];
        while let Some((entity, d)) = stack.pop() {
            let children: Vec<Entity> = match self.world.get::<&mut Node>(entity) {
                Ok(mut node) => {
                    node.depth = d;
                    node.child_entities().collect()
                }
                Err(_) => continue,
            };
            stack.extend(children.into_iter().map(|c| (c, d + 1)));
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}
