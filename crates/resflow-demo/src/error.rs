use resflow_core::error::SimError;

/// Errors that can occur while loading or running a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario text is not valid RON for [`crate::scenario::ScenarioData`].
    #[error("scenario parse error: {detail}")]
    Parse { detail: String },

    /// A system names a resource the scenario does not declare.
    #[error("system '{system}' references unknown resource '{resource}'")]
    UnresolvedRef { system: String, resource: String },

    /// The engine rejected the scenario or failed while running it.
    #[error(transparent)]
    Sim(#[from] SimError),
}
