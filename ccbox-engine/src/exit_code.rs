//! Exit-code interpretation for `runAttached`/`containerWait` results
//! (§4.F contract): codes are forwarded verbatim, but a handful carry a
//! human-readable story and one (130) is explicitly not a failure.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited normally; 0 means success, nonzero is the payload's own
    /// failure signal.
    Exited(i32),
    /// 137: killed, either OOM or an external `docker stop`/`kill`.
    KilledOomOrExternal,
    /// 139: segmentation fault.
    SegmentationFault,
    /// 143: terminated by a signal (typically SIGTERM).
    TerminatedBySignal,
    /// 130: user-initiated interrupt (Ctrl+C). Not treated as a failure.
    UserInterrupt,
}

impl ExitOutcome {
    /// Whether this outcome should be reported to the user as a failure.
    /// Only the user-interrupt case is exempted.
    pub fn is_failure(self) -> bool {
        !matches!(self, ExitOutcome::UserInterrupt | ExitOutcome::Exited(0))
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitOutcome::Exited(_) => "exited",
            ExitOutcome::KilledOomOrExternal => "killed (OOM or external stop)",
            ExitOutcome::SegmentationFault => "segmentation fault",
            ExitOutcome::TerminatedBySignal => "terminated by signal",
            ExitOutcome::UserInterrupt => "user-initiated interrupt",
        }
    }
}

pub fn interpret_exit_code(code: i32) -> ExitOutcome {
    match code {
        137 => ExitOutcome::KilledOomOrExternal,
        139 => ExitOutcome::SegmentationFault,
        143 => ExitOutcome::TerminatedBySignal,
        130 => ExitOutcome::UserInterrupt,
        other => ExitOutcome::Exited(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_signal_codes() {
        assert_eq!(interpret_exit_code(137), ExitOutcome::KilledOomOrExternal);
        assert_eq!(interpret_exit_code(139), ExitOutcome::SegmentationFault);
        assert_eq!(interpret_exit_code(143), ExitOutcome::TerminatedBySignal);
    }

    #[test]
    fn user_interrupt_is_not_a_failure() {
        let outcome = interpret_exit_code(130);
        assert_eq!(outcome, ExitOutcome::UserInterrupt);
        assert!(!outcome.is_failure());
    }

    #[test]
    fn clean_exit_is_not_a_failure_but_nonzero_is() {
        assert!(!interpret_exit_code(0).is_failure());
        assert!(interpret_exit_code(1).is_failure());
    }

    #[test]
    fn unrecognised_code_passes_through_verbatim() {
        assert_eq!(interpret_exit_code(42), ExitOutcome::Exited(42));
    }
}
