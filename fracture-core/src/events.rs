//! Events emitted by the machine executor.

use crate::hooks::HookEvent;
use crate::outcome::{HostOutcome, HostStatus, RunSummary};
use fracture_types::TestPlanId;
use std::fmt;

/// Payload-free kind of a [`MachineEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MachineEventKind {
    /// Attack started; targets have been selected.
    Start,
    /// A target could not be reached.
    TargetUnreachable,
    /// A target was reached but a step failed.
    TargetFailed,
    /// Every step succeeded on a target.
    TargetPassed,
    /// Attack finished, whatever the outcome.
    End,
}

impl MachineEventKind {
    /// Every kind, in lifecycle order.
    pub const ALL: [MachineEventKind; 5] = [
        MachineEventKind::Start,
        MachineEventKind::TargetUnreachable,
        MachineEventKind::TargetFailed,
        MachineEventKind::TargetPassed,
        MachineEventKind::End,
    ];

    /// Hook name, e.g. `on_target_failed`.
    pub fn name(&self) -> &'static str {
        match self {
            MachineEventKind::Start => "on_start",
            MachineEventKind::TargetUnreachable => "on_target_unreachable",
            MachineEventKind::TargetFailed => "on_target_failed",
            MachineEventKind::TargetPassed => "on_target_passed",
            MachineEventKind::End => "on_end",
        }
    }

    /// Look up a kind by hook name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The per-target kind reported for a host status.
    pub fn for_status(status: HostStatus) -> Self {
        match status {
            HostStatus::Passed => MachineEventKind::TargetPassed,
            HostStatus::Failed => MachineEventKind::TargetFailed,
            HostStatus::Unreachable => MachineEventKind::TargetUnreachable,
        }
    }
}

impl fmt::Display for MachineEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event emitted during a machine attack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    /// The run is starting against these targets.
    Start {
        /// Plan being executed.
        plan_id: TestPlanId,
        /// Selected targets.
        targets: Vec<String>,
    },
    /// A target could not be reached.
    TargetUnreachable(HostOutcome),
    /// A target was reached but a step failed.
    TargetFailed(HostOutcome),
    /// Every step succeeded on a target.
    TargetPassed(HostOutcome),
    /// The run is over.
    End(RunSummary),
}

impl MachineEvent {
    /// Wrap a host outcome in the event matching its status.
    pub fn for_outcome(outcome: HostOutcome) -> Self {
        match outcome.status {
            HostStatus::Passed => MachineEvent::TargetPassed(outcome),
            HostStatus::Failed => MachineEvent::TargetFailed(outcome),
            HostStatus::Unreachable => MachineEvent::TargetUnreachable(outcome),
        }
    }

    /// The host outcome carried by a per-target event.
    pub fn host_outcome(&self) -> Option<&HostOutcome> {
        match self {
            MachineEvent::TargetUnreachable(o)
            | MachineEvent::TargetFailed(o)
            | MachineEvent::TargetPassed(o) => Some(o),
            MachineEvent::Start { .. } | MachineEvent::End(_) => None,
        }
    }
}

impl HookEvent for MachineEvent {
    type Kind = MachineEventKind;

    fn kind(&self) -> MachineEventKind {
        match self {
            MachineEvent::Start { .. } => MachineEventKind::Start,
            MachineEvent::TargetUnreachable(_) => MachineEventKind::TargetUnreachable,
            MachineEvent::TargetFailed(_) => MachineEventKind::TargetFailed,
            MachineEvent::TargetPassed(_) => MachineEventKind::TargetPassed,
            MachineEvent::End(_) => MachineEventKind::End,
        }
    }

    fn kind_from_name(name: &str) -> Option<MachineEventKind> {
        MachineEventKind::from_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookError, HookRegistry};

    #[test]
    fn names_round_trip() {
        for kind in MachineEventKind::ALL {
            assert_eq!(MachineEventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MachineEventKind::from_name("on_target_exploded"), None);
    }

    #[test]
    fn outcome_maps_to_matching_event() {
        let event = MachineEvent::for_outcome(HostOutcome::unreachable("h1", "timeout"));
        assert_eq!(event.kind(), MachineEventKind::TargetUnreachable);
        assert_eq!(event.host_outcome().map(|o| o.host.as_str()), Some("h1"));

        let event = MachineEvent::for_outcome(HostOutcome::passed("h2", vec![]));
        assert_eq!(event.kind(), MachineEventKind::for_status(HostStatus::Passed));
    }

    #[test]
    fn registry_limited_to_subset() {
        let hooks: HookRegistry<MachineEvent> =
            HookRegistry::new(&[MachineEventKind::Start, MachineEventKind::End]);

        assert!(hooks.register_named("on_start", |_| Ok(())).is_ok());
        assert_eq!(
            hooks.register_named("on_target_failed", |_| Ok(())).unwrap_err(),
            HookError::UnsupportedEvent("on_target_failed".into())
        );
        assert_eq!(
            hooks.register_named("on_reboot", |_| Ok(())).unwrap_err(),
            HookError::UnknownEvent("on_reboot".into())
        );
    }
}
