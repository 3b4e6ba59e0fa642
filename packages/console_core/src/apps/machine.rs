use statig::prelude::*;

use super::AppId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavCommand {
    Open(AppId),
    GoHome,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavStatus {
    Applied,
    Unchanged,
    InvalidTransition,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct Navigator {
    pub(super) current: AppId,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    pub(super) status: NavStatus,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            status: NavStatus::Unchanged,
        }
    }
}

impl Navigator {
    pub(super) fn new() -> Self {
        Self {
            current: AppId::Home,
        }
    }
}

/// Home and everything in front of it. Any foreground screen goes home on a
/// long press; the launcher and games menu only open their own children.
#[state_machine(initial = "State::home()")]
impl Navigator {
    #[state]
    fn home(&mut self, context: &mut DispatchContext, event: &NavCommand) -> Outcome<State> {
        match event {
            NavCommand::Open(AppId::Launcher) => {
                self.current = AppId::Launcher;
                context.status = NavStatus::Applied;
                Transition(State::launcher())
            }
            NavCommand::GoHome => {
                context.status = NavStatus::Unchanged;
                Handled
            }
            NavCommand::Open(_) => {
                context.status = NavStatus::InvalidTransition;
                Handled
            }
        }
    }

    #[state(superstate = "foreground")]
    fn launcher(&mut self, context: &mut DispatchContext, event: &NavCommand) -> Outcome<State> {
        match event {
            NavCommand::Open(app) if app.is_launchable() => {
                self.current = *app;
                context.status = NavStatus::Applied;
                Transition(State::running())
            }
            _ => Super,
        }
    }

    #[state(superstate = "foreground")]
    fn running(&mut self, context: &mut DispatchContext, event: &NavCommand) -> Outcome<State> {
        match event {
            NavCommand::Open(game) if self.current == AppId::GamesMenu && game.is_game() => {
                self.current = *game;
                context.status = NavStatus::Applied;
                Transition(State::running())
            }
            _ => Super,
        }
    }

    #[superstate]
    fn foreground(&mut self, context: &mut DispatchContext, event: &NavCommand) -> Outcome<State> {
        match event {
            NavCommand::GoHome => {
                self.current = AppId::Home;
                context.status = NavStatus::Applied;
                Transition(State::home())
            }
            NavCommand::Open(_) => {
                context.status = NavStatus::InvalidTransition;
                Handled
            }
        }
    }
}
