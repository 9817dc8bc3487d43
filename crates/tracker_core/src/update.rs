use crate::{AppState, Effect, Msg, Operation};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SignedIn(user) => state.sign_in(user),
        Msg::SignedOut => state.sign_out(),
        Msg::RefreshRequested => state.refresh().into_iter().collect(),
        Msg::RemoteChanged => state.on_remote_change().into_iter().collect(),
        Msg::SubscriptionFailed(message) => {
            state.record_subscription_failure(message);
            Vec::new()
        }
        Msg::RecordsFetched { generation, result } => {
            let (_outcome, effect) = state.apply_fetch(generation, result);
            effect.into_iter().collect()
        }
        Msg::CreateRequested(fields) => state.create(fields).into_iter().collect(),
        Msg::StatusChangeRequested { id, status } => {
            state.update_status(id, status).into_iter().collect()
        }
        Msg::DeleteRequested { id } => state.delete(id).into_iter().collect(),
        Msg::CreateCompleted { origin, result } => state
            .complete_mutation(Operation::Create, origin, result.map(|_id| ()))
            .into_iter()
            .collect(),
        Msg::UpdateCompleted { origin, result, .. } => state
            .complete_mutation(Operation::Update, origin, result)
            .into_iter()
            .collect(),
        Msg::DeleteCompleted { origin, result, .. } => state
            .complete_mutation(Operation::Delete, origin, result)
            .into_iter()
            .collect(),
        Msg::FilterAllSelected => {
            state.set_all_filter();
            Vec::new()
        }
        Msg::FilterToggled(status) => {
            state.toggle_filter(status);
            Vec::new()
        }
        Msg::ComposeStarted => {
            state.start_create();
            Vec::new()
        }
        Msg::EditStarted(id) => {
            state.start_edit(&id);
            Vec::new()
        }
        Msg::FieldEdited { field, value } => {
            state.update_field(field, value);
            Vec::new()
        }
        Msg::SubmitClicked => state.submit().into_iter().collect(),
        Msg::EditCancelled => {
            state.cancel_edit();
            Vec::new()
        }
        Msg::EditDismissed => {
            state.dismiss_edit();
            Vec::new()
        }
        Msg::ErrorDismissed => {
            state.dismiss_error();
            Vec::new()
        }
    };

    (state, effects)
}
