#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressPhase {
    Parsing,
    Scoping,
    Imports,
    Hierarchy,
    Invoke,
    Finalizing,
}

impl ProgressPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressPhase::Parsing => "Parsing files",
            ProgressPhase::Scoping => "Building scopes",
            ProgressPhase::Imports => "Resolving imports",
            ProgressPhase::Hierarchy => "Resolving class hierarchy",
            ProgressPhase::Invoke => "Integrating call graph",
            ProgressPhase::Finalizing => "Deduplicating edges",
        }
    }

    /// Phases after parsing, in execution order
    pub fn linking() -> &'static [ProgressPhase] {
        &[
            ProgressPhase::Scoping,
            ProgressPhase::Imports,
            ProgressPhase::Hierarchy,
            ProgressPhase::Invoke,
            ProgressPhase::Finalizing,
        ]
    }
}

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Started {
        phase: ProgressPhase,
        total: usize,
    },
    Progress {
        phase: ProgressPhase,
        current: usize,
        file: Option<String>,
    },
    Finished {
        phase: ProgressPhase,
    },
    Error(String),
}
