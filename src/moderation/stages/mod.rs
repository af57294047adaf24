//! Pipeline stages, in the order they run.

mod admins;
mod antiflood;
mod caching;
mod commands;
mod illegal;
mod membership;
mod triggers;

pub use admins::AdminsStage;
pub use antiflood::AntiFloodStage;
pub use caching::CachingStage;
pub use commands::{Command, CommandsStage};
pub use illegal::IllegalTriggersStage;
pub use membership::MembershipStage;
pub use triggers::TriggersStage;

use super::Services;
use super::pipeline::Pipeline;

/// Build the moderation pipeline.
pub fn build_pipeline(services: &Services) -> Pipeline {
    Pipeline::new()
        .stage(CachingStage::new(services.clone()))
        .stage(MembershipStage::new(services.clone()))
        .stage(AdminsStage::new(services.clone()))
        .stage(AntiFloodStage::new(services.clone()))
        .stage(TriggersStage::new(services.clone()))
        .stage(IllegalTriggersStage::new(services.clone()))
        .stage(CommandsStage::new(services.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::moderation::testing::harness;

    #[test]
    fn test_stage_order() {
        let h = harness(Settings::default());
        let pipeline = build_pipeline(&h.services);
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "caching",
                "membership",
                "admins",
                "antiflood",
                "triggers",
                "illegal_triggers",
                "commands"
            ]
        );
    }
}
