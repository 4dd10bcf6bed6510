use std::fmt;

use tracing::{debug, warn};

use crate::effects::FlowEffects;
use crate::reason::ReasonCapture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Confirm,
    Reason,
    Finished,
}

impl ModalPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reason => "reason",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for ModalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unenroll modal session: confirm, then pick or skip a reason, then finish.
///
/// The phase is never stored. Reason actions are only reachable through
/// [`UnenrollFlow::reason_mut`], which refuses access until the user has
/// confirmed, so a session cannot finish without passing through
/// [`ModalPhase::Reason`].
pub struct UnenrollFlow<E: FlowEffects> {
    confirmed: bool,
    reason: ReasonCapture,
    effects: E,
}

impl<E: FlowEffects> UnenrollFlow<E> {
    pub fn new(effects: E) -> Self {
        Self {
            confirmed: false,
            reason: ReasonCapture::new(),
            effects,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn confirm(&mut self) {
        if !self.confirmed {
            debug!(target: "unenroll::flow", "unenroll confirmed");
        }
        self.confirmed = true;
    }

    pub fn reason(&self) -> &ReasonCapture {
        &self.reason
    }

    pub fn reason_mut(&mut self) -> Option<&mut ReasonCapture> {
        if !self.confirmed {
            debug!(target: "unenroll::flow", "reason access refused before confirmation");
            return None;
        }
        Some(&mut self.reason)
    }

    pub fn modal_phase(&self) -> ModalPhase {
        if !self.confirmed {
            ModalPhase::Confirm
        } else if !self.reason.is_submitted() {
            ModalPhase::Reason
        } else {
            ModalPhase::Finished
        }
    }

    pub fn close(&mut self) {
        debug!(target: "unenroll::flow", phase = %self.modal_phase(), "closing unenroll modal");
        self.effects.close_modal();
        self.reset();
    }

    pub fn close_and_refresh(&mut self) {
        debug!(
            target: "unenroll::flow",
            phase = %self.modal_phase(),
            "closing unenroll modal and refreshing enrollments"
        );
        if let Err(error) = self.effects.refresh_enrollment_list() {
            warn!(target: "unenroll::flow", "enrollment refresh failed: {error:#}");
        }
        self.effects.close_modal();
        self.reset();
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut E {
        &mut self.effects
    }

    fn reset(&mut self) {
        self.confirmed = false;
        self.reason.clear();
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{ModalPhase, UnenrollFlow};
    use crate::reason::ReasonKey;
    use crate::test_support::{EffectCall, RecordingEffects};

    fn flow() -> UnenrollFlow<RecordingEffects> {
        UnenrollFlow::new(RecordingEffects::default())
    }

    #[test]
    fn fresh_session_starts_in_confirm_phase() {
        let flow = flow();
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);
        assert!(!flow.is_confirmed());
        assert!(flow.reason().value().is_none());
    }

    #[test]
    fn confirm_is_idempotent() {
        let mut flow = flow();
        flow.confirm();
        let phase = flow.modal_phase();

        flow.confirm();

        assert!(flow.is_confirmed());
        assert_eq!(flow.modal_phase(), phase);
        assert_eq!(flow.modal_phase(), ModalPhase::Reason);
    }

    #[test]
    fn phases_run_confirm_reason_finished_then_reset() {
        let mut flow = flow();
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);

        flow.confirm();
        assert_eq!(flow.modal_phase(), ModalPhase::Reason);

        let reason = flow.reason_mut().expect("reason after confirm");
        reason.select_option(ReasonKey::from("found-another-course"));
        reason.submit();
        assert_eq!(flow.modal_phase(), ModalPhase::Finished);
        assert_eq!(flow.reason().value(), Some("found-another-course"));

        flow.close();
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);
        assert!(flow.reason().value().is_none());
        assert_eq!(flow.effects().calls(), vec![EffectCall::CloseModal]);
    }

    #[test]
    fn skip_finishes_reason_phase() {
        let mut flow = flow();
        flow.confirm();
        flow.reason_mut().expect("reason").skip();

        assert_eq!(flow.modal_phase(), ModalPhase::Finished);
        assert!(flow.reason().value().is_none());
    }

    #[test]
    fn selecting_without_submit_stays_in_reason_phase() {
        let mut flow = flow();
        flow.confirm();
        let reason = flow.reason_mut().expect("reason");
        reason.select_option(ReasonKey::custom());
        reason.set_custom_option("moving");
        reason.submit();
        reason.clear();

        assert_eq!(flow.modal_phase(), ModalPhase::Reason);
    }

    #[test]
    fn reason_actions_are_refused_before_confirmation() {
        let mut flow = flow();
        assert!(flow.reason_mut().is_none());
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);

        flow.confirm();
        assert_eq!(flow.modal_phase(), ModalPhase::Reason);
        assert!(!flow.reason().is_submitted());
    }

    #[test]
    fn close_and_refresh_refreshes_before_closing_and_resets_after() {
        let mut flow = flow();
        flow.confirm();
        flow.reason_mut().expect("reason").skip();

        flow.close_and_refresh();

        assert_eq!(
            flow.effects().calls(),
            vec![EffectCall::RefreshEnrollmentList, EffectCall::CloseModal]
        );
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);
        assert!(!flow.reason().is_skipped());
    }

    #[test]
    fn close_and_refresh_resets_even_when_refresh_fails() {
        let mut flow = UnenrollFlow::new(RecordingEffects::failing_refresh(anyhow!(
            "network down"
        )));
        flow.confirm();
        let reason = flow.reason_mut().expect("reason");
        reason.select_option(ReasonKey::from("time"));
        reason.submit();

        flow.close_and_refresh();

        assert_eq!(
            flow.effects().calls(),
            vec![EffectCall::RefreshEnrollmentList, EffectCall::CloseModal]
        );
        assert!(!flow.is_confirmed());
        assert!(flow.reason().value().is_none());
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);
    }

    #[test]
    fn close_from_confirm_phase_only_closes_modal() {
        let mut flow = flow();
        flow.close();

        assert_eq!(flow.effects().calls(), vec![EffectCall::CloseModal]);
        assert_eq!(flow.modal_phase(), ModalPhase::Confirm);
    }

    #[test]
    fn session_can_run_again_after_close() {
        let mut flow = flow();
        flow.confirm();
        flow.reason_mut().expect("reason").skip();
        flow.close();

        flow.confirm();
        assert_eq!(flow.modal_phase(), ModalPhase::Reason);
        assert!(!flow.reason().is_skipped());
    }
}
