use super::*;

#[test]
fn home_only_opens_launcher() {
    let mut engine = NavigatorEngine::new();
    let result = engine.apply(NavCommand::Open(AppId::Compass));
    assert!(matches!(result.status, NavStatus::InvalidTransition));
    assert_eq!(engine.current(), AppId::Home);

    let result = engine.apply(NavCommand::Open(AppId::Launcher));
    assert!(result.changed());
    assert_eq!(result.after, AppId::Launcher);
}

#[test]
fn launcher_opens_each_icon_app() {
    for app in [
        AppId::Calculator,
        AppId::Compass,
        AppId::Accelerometer,
        AppId::Clock,
        AppId::GamesMenu,
        AppId::Settings,
    ] {
        let mut engine = NavigatorEngine::new();
        let _ = engine.apply(NavCommand::Open(AppId::Launcher));
        let result = engine.apply(NavCommand::Open(app));
        assert!(result.changed(), "{:?}", app);
        assert_eq!(engine.current(), app);
    }
}

#[test]
fn launcher_cannot_open_games_directly() {
    let mut engine = NavigatorEngine::new();
    let _ = engine.apply(NavCommand::Open(AppId::Launcher));
    let result = engine.apply(NavCommand::Open(AppId::Pong));
    assert!(matches!(result.status, NavStatus::InvalidTransition));
    assert_eq!(engine.current(), AppId::Launcher);
}

#[test]
fn games_menu_is_a_sub_launcher() {
    let mut engine = NavigatorEngine::new();
    let _ = engine.apply(NavCommand::Open(AppId::Launcher));
    let _ = engine.apply(NavCommand::Open(AppId::GamesMenu));
    let result = engine.apply(NavCommand::Open(AppId::SpaceShooter));
    assert!(result.changed());
    assert_eq!(result.before, AppId::GamesMenu);
    assert_eq!(result.after, AppId::SpaceShooter);

    // A running game does not open siblings.
    let result = engine.apply(NavCommand::Open(AppId::Pong));
    assert!(matches!(result.status, NavStatus::InvalidTransition));
}

#[test]
fn long_press_goes_home_from_anywhere() {
    let mut engine = NavigatorEngine::new();
    let _ = engine.apply(NavCommand::Open(AppId::Launcher));
    let _ = engine.apply(NavCommand::Open(AppId::GamesMenu));
    let _ = engine.apply(NavCommand::Open(AppId::TicTacToe));

    let result = engine.apply(NavCommand::GoHome);
    assert!(result.changed());
    assert_eq!(engine.current(), AppId::Home);

    let again = engine.apply(NavCommand::GoHome);
    assert!(!again.changed());
    assert!(matches!(again.status, NavStatus::Unchanged));
}

#[test]
fn launcher_goes_home_too() {
    let mut engine = NavigatorEngine::new();
    let _ = engine.apply(NavCommand::Open(AppId::Launcher));
    assert!(engine.apply(NavCommand::GoHome).changed());
    assert_eq!(engine.current(), AppId::Home);
}
