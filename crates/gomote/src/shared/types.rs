use gomote_core::{Group, InstanceId};

/// What to do with the group when some creations fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupCommitPolicy {
    /// Persist whatever instances were created, even if a sibling failed.
    #[default]
    SavePartial,
    /// Persist only when every requested instance was created and set up.
    AllOrNothing,
}

/// Request to create `count` instances of one builder type
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub builder_type: String,
    pub count: usize,
    pub setup: bool,
    pub show_status: bool,
    pub commit_policy: GroupCommitPolicy,
}

impl CreateOptions {
    pub fn new(builder_type: impl Into<String>) -> Self {
        Self {
            builder_type: builder_type.into(),
            count: 1,
            setup: false,
            show_status: true,
            commit_policy: GroupCommitPolicy::default(),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_setup(mut self, setup: bool) -> Self {
        self.setup = setup;
        self
    }

    pub fn with_status(mut self, show_status: bool) -> Self {
        self.show_status = show_status;
        self
    }

    pub fn with_commit_policy(mut self, commit_policy: GroupCommitPolicy) -> Self {
        self.commit_policy = commit_policy;
        self
    }

    /// Live push/run output only makes sense when a single instance is being set up.
    pub fn detailed_progress(&self) -> bool {
        self.count == 1
    }
}

/// Result of a fully successful create
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// Created instances in completion order
    pub instances: Vec<InstanceId>,
    pub group: Option<Group>,
}
