//! Entity metadata resolution.
//!
//! Turns declarations into [`EntityDescriptor`]s and walks reference
//! declarations depth-first into a [`ReferenceGraph`]. Descriptors are cached
//! per entity type for the life of the process; the cache is the only shared
//! state and the only place that synchronizes.

use std::any::TypeId;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::debug;

use crate::error::{MappingError, MappingResult};

use super::declaration::{Entity, EntityDeclaration, EntityType};
use super::descriptor::{EntityDescriptor, ReferenceDescriptor, ReferenceGraph, Table};

static DESCRIPTORS: LazyLock<DashMap<TypeId, Arc<EntityDescriptor>>> = LazyLock::new(DashMap::new);

/// Resolve the table mapping of `T`.
pub fn resolve<T: Entity>() -> MappingResult<Arc<EntityDescriptor>> {
    resolve_type(EntityType::of::<T>())
}

/// Resolve the full reference graph rooted at `T`.
///
/// `T` must be declared as a join-tree root. Fails with
/// [`MappingError::CyclicReference`] when an entity is reachable from itself.
pub fn resolve_graph<T: Entity>() -> MappingResult<ReferenceGraph> {
    resolve_graph_of(EntityType::of::<T>())
}

pub fn resolve_type(entity: EntityType) -> MappingResult<Arc<EntityDescriptor>> {
    if let Some(cached) = DESCRIPTORS.get(&entity.id()) {
        return Ok(Arc::clone(cached.value()));
    }

    let descriptor = Arc::new(build_descriptor(entity, &entity.declaration())?);

    // A concurrent resolver may have landed first; both results are identical.
    let entry = DESCRIPTORS.entry(entity.id()).or_insert(descriptor);
    Ok(Arc::clone(entry.value()))
}

pub fn resolve_graph_of(entity: EntityType) -> MappingResult<ReferenceGraph> {
    let declaration = entity.declaration();
    if !declaration.is_join_root() {
        return Err(MappingError::MissingJoinRoot(entity.name().to_string()));
    }

    let root = resolve_type(entity)?;
    let mut walker = GraphWalker {
        path: vec![entity],
        references: Vec::new(),
    };
    walker.walk(&declaration, root.table(), 0)?;

    debug!(
        entity = entity.name(),
        references = walker.references.len(),
        "resolved reference graph"
    );

    Ok(ReferenceGraph::new(root, walker.references))
}

fn build_descriptor(
    entity: EntityType,
    declaration: &EntityDeclaration,
) -> MappingResult<EntityDescriptor> {
    let (Some(name), Some(alias)) = (declaration.table_name(), declaration.alias()) else {
        return Err(MappingError::MissingTable(entity.name().to_string()));
    };

    Ok(EntityDescriptor::new(
        entity.name(),
        Table::new(name, alias),
        declaration.fields().to_vec(),
    ))
}

/// Depth-first walk keeping the entities on the current path.
struct GraphWalker {
    path: Vec<EntityType>,
    references: Vec<ReferenceDescriptor>,
}

impl GraphWalker {
    fn walk(
        &mut self,
        declaration: &EntityDeclaration,
        source: &Table,
        depth: usize,
    ) -> MappingResult<()> {
        for reference in declaration.references() {
            let target_type = reference.target;
            if let Some(start) = self.path.iter().position(|t| *t == target_type) {
                let mut cycle: Vec<String> = self.path[start..]
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect();
                cycle.push(target_type.name().to_string());
                return Err(MappingError::CyclicReference(cycle));
            }

            let target = resolve_type(target_type)?;
            self.references.push(ReferenceDescriptor {
                source: source.clone(),
                field: reference.field.clone(),
                foreign_key: reference.foreign_key.clone(),
                target: Arc::clone(&target),
                target_column: reference.target_column.clone(),
                depth,
            });

            self.path.push(target_type);
            self.walk(&target_type.declaration(), target.table(), depth + 1)?;
            self.path.pop();
        }

        Ok(())
    }
}
