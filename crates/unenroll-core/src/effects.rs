use anyhow::Result;

/// Collaborator calls made by [`crate::flow::UnenrollFlow`] while closing.
pub trait FlowEffects {
    fn close_modal(&mut self);
    fn refresh_enrollment_list(&mut self) -> Result<()>;
}

pub struct CallbackEffects<CloseModal, Refresh>
where
    CloseModal: FnMut(),
    Refresh: FnMut() -> Result<()>,
{
    close_modal: CloseModal,
    refresh: Refresh,
}

impl<CloseModal, Refresh> CallbackEffects<CloseModal, Refresh>
where
    CloseModal: FnMut(),
    Refresh: FnMut() -> Result<()>,
{
    pub fn new(close_modal: CloseModal, refresh: Refresh) -> Self {
        Self {
            close_modal,
            refresh,
        }
    }
}

impl<CloseModal, Refresh> FlowEffects for CallbackEffects<CloseModal, Refresh>
where
    CloseModal: FnMut(),
    Refresh: FnMut() -> Result<()>,
{
    fn close_modal(&mut self) {
        (self.close_modal)();
    }

    fn refresh_enrollment_list(&mut self) -> Result<()> {
        (self.refresh)()
    }
}
