//! The action surface every endpoint x app x model exposes.

use std::fmt;

/// All actions the dispatch lifecycle understands. The routing layer maps
/// these onto concrete verbs/paths; `CloudFunc` and `Batch` additionally carry
/// a client-supplied function name in the request namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Retrieve,
    RetrieveEnhance,
    RetrieveMine,
    List,
    ListEnhance,
    ListMine,
    Create,
    Update,
    PartialUpdate,
    PatchEnhance,
    Destroy,
    CloudFunc,
    Batch,
}

impl Action {
    pub const ALL: [Action; 13] = [
        Action::Retrieve,
        Action::RetrieveEnhance,
        Action::RetrieveMine,
        Action::List,
        Action::ListEnhance,
        Action::ListMine,
        Action::Create,
        Action::Update,
        Action::PartialUpdate,
        Action::PatchEnhance,
        Action::Destroy,
        Action::CloudFunc,
        Action::Batch,
    ];

    /// Wire/override name of the action. Named-function actions are further
    /// aliased as `<name>_<func>` when looked up on an override surface.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Retrieve => "retrieve",
            Action::RetrieveEnhance => "retrieve_enhance",
            Action::RetrieveMine => "retrieve_mine",
            Action::List => "list",
            Action::ListEnhance => "list_enhance",
            Action::ListMine => "list_mine",
            Action::Create => "create",
            Action::Update => "update",
            Action::PartialUpdate => "partial_update",
            Action::PatchEnhance => "patch_enhance",
            Action::Destroy => "destroy",
            Action::CloudFunc => "cloudfunc",
            Action::Batch => "batch",
        }
    }

    /// Actions identified by a caller-supplied function name.
    pub fn is_named_function(&self) -> bool {
        matches!(self, Action::CloudFunc | Action::Batch)
    }

    /// The create/update family eligible for user-field auto-fill.
    pub fn is_fill_target(&self) -> bool {
        matches!(
            self,
            Action::Create | Action::Update | Action::PartialUpdate | Action::PatchEnhance
        )
    }

    /// Update-family actions validated in partial mode.
    pub fn is_partial(&self) -> bool {
        matches!(self, Action::PartialUpdate | Action::PatchEnhance)
    }

    /// The "mine" variants scoped to the calling user.
    pub fn is_mine(&self) -> bool {
        matches!(self, Action::RetrieveMine | Action::ListMine)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
