use crate::{Effect, Msg, WatchState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    if state.is_stopping() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::PathChanged { path, at_ms } => {
            if state.consider_change(&path, at_ms) {
                vec![Effect::Grab { trigger: path }]
            } else {
                Vec::new()
            }
        }
        Msg::Shutdown => {
            state.stop();
            vec![Effect::Stop]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
