//! Editor Supervisor - manages EditorActor instances
//!
//! One EditorActor per open session, spawned linked so the registry is
//! pruned when a session actor terminates or fails.

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};
use std::collections::HashMap;
use tracing::{error, info};

use crate::actors::editor::{EditorActor, EditorArguments, EditorMsg};
use crate::edit_service::EditServiceClient;

#[derive(Debug, Default)]
pub struct EditorSupervisor;

pub struct EditorSupervisorState {
    pub sessions: HashMap<String, ActorRef<EditorMsg>>,
    pub edit_service: EditServiceClient,
}

#[derive(Debug, Clone)]
pub struct EditorSupervisorArgs {
    pub edit_service: EditServiceClient,
}

#[derive(Debug)]
pub enum EditorSupervisorMsg {
    /// Spawn the session actor for a fresh session id (or hand back the
    /// existing one if the id is already registered).
    OpenSession {
        session_id: String,
        user_id: String,
        content: String,
        reply: RpcReplyPort<Result<ActorRef<EditorMsg>, String>>,
    },
    /// Resolve the ActorRef for a session id. `None` if not registered.
    Resolve {
        session_id: String,
        reply: RpcReplyPort<Option<ActorRef<EditorMsg>>>,
    },
    /// Stop a session actor and drop it from the registry. Replies with
    /// whether the session existed.
    CloseSession {
        session_id: String,
        reply: RpcReplyPort<bool>,
    },
    Supervision(SupervisionEvent),
}

#[ractor::async_trait]
impl Actor for EditorSupervisor {
    type Msg = EditorSupervisorMsg;
    type State = EditorSupervisorState;
    type Arguments = EditorSupervisorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(supervisor = %myself.get_id(), "EditorSupervisor starting");
        Ok(EditorSupervisorState {
            sessions: HashMap::new(),
            edit_service: args.edit_service,
        })
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        event: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let SupervisionEvent::ActorTerminated(actor_cell, _, _)
        | SupervisionEvent::ActorFailed(actor_cell, _) = &event
        {
            let actor_id = actor_cell.get_id();
            state
                .sessions
                .retain(|_, session| session.get_id() != actor_id);
        }
        info!(
            supervisor = %myself.get_id(),
            event = ?event,
            "EditorSupervisor supervision event"
        );
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            EditorSupervisorMsg::OpenSession {
                session_id,
                user_id,
                content,
                reply,
            } => {
                if let Some(session) = state.sessions.get(&session_id) {
                    let _ = reply.send(Ok(session.clone()));
                    return Ok(());
                }

                let actor_name = format!("editor:{session_id}");
                if let Some(cell) = ractor::registry::where_is(actor_name.clone()) {
                    let actor_ref: ActorRef<EditorMsg> = cell.into();
                    state.sessions.insert(session_id, actor_ref.clone());
                    let _ = reply.send(Ok(actor_ref));
                    return Ok(());
                }

                let args = EditorArguments {
                    session_id: session_id.clone(),
                    user_id,
                    content,
                    edit_service: state.edit_service.clone(),
                };

                match Actor::spawn_linked(Some(actor_name), EditorActor, args, myself.get_cell())
                    .await
                {
                    Ok((actor_ref, _)) => {
                        state.sessions.insert(session_id, actor_ref.clone());
                        let _ = reply.send(Ok(actor_ref));
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to spawn EditorActor");
                        let _ = reply.send(Err(e.to_string()));
                    }
                }
            }
            EditorSupervisorMsg::Resolve { session_id, reply } => {
                let _ = reply.send(state.sessions.get(&session_id).cloned());
            }
            EditorSupervisorMsg::CloseSession { session_id, reply } => {
                match state.sessions.remove(&session_id) {
                    Some(actor_ref) => {
                        actor_ref.stop(None);
                        let _ = reply.send(true);
                    }
                    None => {
                        let _ = reply.send(false);
                    }
                }
            }
            EditorSupervisorMsg::Supervision(event) => {
                self.handle_supervisor_evt(myself, event, state).await?;
            }
        }
        Ok(())
    }
}
