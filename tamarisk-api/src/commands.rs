/// Mode switches understood by the invasive species agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentCommand {
    LearnCostParameters,
    LearnModel,
    Plan,
    Evaluate,
    FollowHeuristics,
}

impl AgentCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LearnCostParameters => "learn cost parameters",
            Self::LearnModel => "learn model",
            Self::Plan => "plan",
            Self::Evaluate => "evaluate",
            Self::FollowHeuristics => "follow heuristics",
        }
    }
}
