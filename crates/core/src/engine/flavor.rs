//! Declarative per-flavor tables.
//!
//! Both pipeline flavors run through the same stage machine and reducer.
//! What differs is captured here: which stages exist, how they are ordered,
//! and which substatuses a running task may report.

use pp_protocol::session_models::Flavor;
use pp_protocol::state_models::{QuestionPhase, ResearchPhase, Stage, Substatus};

/// Stage order and substatus vocabulary of one flavor.
///
/// Stages sharing a rank are alternatives at the same point of the
/// pipeline (question generation plans from a typed knowledge point or
/// from an uploaded paper). Terminal stages are not listed: they are
/// reachable from every non-terminal stage.
#[derive(Debug)]
pub struct FlavorDescriptor {
    pub flavor: Flavor,
    pub stages: &'static [(Stage, u8)],
    pub substatuses: &'static [Substatus],
}

static RESEARCH: FlavorDescriptor = FlavorDescriptor {
    flavor: Flavor::Research,
    stages: &[
        (Stage::Idle, 0),
        (Stage::Planning, 1),
        (Stage::Researching, 2),
        (Stage::Reporting, 3),
    ],
    substatuses: &[
        Substatus::Research(ResearchPhase::Iterating),
        Substatus::Research(ResearchPhase::ToolCalling),
        Substatus::Research(ResearchPhase::Writing),
    ],
};

static QUESTION_GENERATION: FlavorDescriptor = FlavorDescriptor {
    flavor: Flavor::QuestionGeneration,
    stages: &[
        (Stage::Idle, 0),
        (Stage::Planning, 1),
        (Stage::Uploading, 1),
        (Stage::Parsing, 2),
        (Stage::Extracting, 3),
        (Stage::Generating, 4),
        (Stage::Validating, 5),
    ],
    substatuses: &[
        Substatus::Question(QuestionPhase::Analyzing),
        Substatus::Question(QuestionPhase::Generating),
        Substatus::Question(QuestionPhase::Validating),
    ],
};

/// Look up the table for a flavor.
pub fn descriptor(flavor: Flavor) -> &'static FlavorDescriptor {
    match flavor {
        Flavor::Research => &RESEARCH,
        Flavor::QuestionGeneration => &QUESTION_GENERATION,
    }
}

impl FlavorDescriptor {
    /// Position of a non-terminal stage in this flavor's order.
    ///
    /// `None` for terminal stages and for stages the flavor does not have.
    pub fn rank(&self, stage: Stage) -> Option<u8> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, rank)| *rank)
    }

    /// Whether the flavor knows this stage at all.
    pub fn has_stage(&self, stage: Stage) -> bool {
        stage.is_terminal() || self.rank(stage).is_some()
    }

    /// Whether a running task of this flavor may report `substatus`.
    pub fn accepts(&self, substatus: Substatus) -> bool {
        self.substatuses.contains(&substatus)
    }
}
