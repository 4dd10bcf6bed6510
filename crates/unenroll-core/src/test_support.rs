use std::collections::VecDeque;

use crate::effects::FlowEffects;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCall {
    CloseModal,
    RefreshEnrollmentList,
}

#[derive(Default)]
pub struct RecordingEffects {
    refresh_results: VecDeque<anyhow::Result<()>>,
    calls: Vec<EffectCall>,
}

impl RecordingEffects {
    pub fn failing_refresh(error: anyhow::Error) -> Self {
        Self {
            refresh_results: VecDeque::from([Err(error)]),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> Vec<EffectCall> {
        self.calls.clone()
    }
}

impl FlowEffects for RecordingEffects {
    fn close_modal(&mut self) {
        self.calls.push(EffectCall::CloseModal);
    }

    fn refresh_enrollment_list(&mut self) -> anyhow::Result<()> {
        self.calls.push(EffectCall::RefreshEnrollmentList);
        self.refresh_results.pop_front().unwrap_or(Ok(()))
    }
}
