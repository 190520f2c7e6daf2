//! Effect - A side effect to perform, represented as a value

use crate::permission::PermissionDelta;
use crate::resource::{Resource, ResourceId, State};

/// A single operation on a resource
///
/// Effects describe what will happen; nothing is executed until an
/// [`Interpreter`](crate::interpreter::Interpreter) runs them.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read the current state of a resource
    Read(ResourceId),
    /// Create a new resource
    Create(Resource),
    /// Update an existing resource in place
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
        /// Grants and revokes, when the permissions changed
        permissions: Option<PermissionDelta>,
    },
    /// Delete and re-create a resource whose immutable attributes changed
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete a resource recorded in state
    Delete(State),
}

impl Effect {
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(id) => id,
            Effect::Create(resource) => &resource.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } => id,
            Effect::Delete(state) => &state.id,
        }
    }

    /// Whether this Effect changes infrastructure
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    /// Short verb for display
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Read(_) => "read",
            Effect::Create(_) => "create",
            Effect::Update { .. } => "update",
            Effect::Replace { .. } => "replace",
            Effect::Delete(_) => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_not_mutating() {
        let id = ResourceId::new("quicksight.data_set", "sales");
        assert!(!Effect::Read(id.clone()).is_mutating());
        assert!(Effect::Delete(State::not_found(id)).is_mutating());
    }

    #[test]
    fn resource_id_of_each_effect() {
        let resource = Resource::new("quicksight.template", "report");
        let effect = Effect::Create(resource.clone());
        assert_eq!(effect.resource_id(), &resource.id);
        assert_eq!(effect.kind(), "create");
    }
}
