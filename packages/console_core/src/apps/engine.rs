use statig::blocking::IntoStateMachineExt as _;

use super::machine::{DispatchContext, NavCommand, NavStatus, Navigator};
use super::AppId;

#[derive(Clone, Copy, Debug)]
pub struct NavApplyResult {
    pub before: AppId,
    pub after: AppId,
    pub status: NavStatus,
}

impl NavApplyResult {
    pub fn changed(self) -> bool {
        matches!(self.status, NavStatus::Applied) && self.before != self.after
    }
}

pub struct NavigatorEngine {
    machine: statig::blocking::StateMachine<Navigator>,
}

impl Default for NavigatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigatorEngine {
    pub fn new() -> Self {
        Self {
            machine: Navigator::new().state_machine(),
        }
    }

    pub fn current(&self) -> AppId {
        self.machine.inner().current
    }

    pub fn apply(&mut self, command: NavCommand) -> NavApplyResult {
        let before = self.current();
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&command, &mut context);
        let after = self.current();
        NavApplyResult {
            before,
            after,
            status: context.status,
        }
    }
}
