use ractor::{Actor, ActorRef};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::actors::editor::EditorMsg;
use crate::edit_service::EditServiceClient;
use crate::supervisor::{EditorSupervisor, EditorSupervisorArgs, EditorSupervisorMsg};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    edit_service: EditServiceClient,
    editor_supervisor: Mutex<Option<ActorRef<EditorSupervisorMsg>>>,
}

impl AppState {
    pub fn new(edit_service: EditServiceClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                edit_service,
                editor_supervisor: Mutex::new(None),
            }),
        }
    }

    pub async fn ensure_supervisor(&self) -> Result<ActorRef<EditorSupervisorMsg>, String> {
        let mut guard = self.inner.editor_supervisor.lock().await;
        if let Some(supervisor) = guard.as_ref() {
            return Ok(supervisor.clone());
        }

        let (supervisor, _) = Actor::spawn(
            Some(format!("editor_supervisor:{}", ulid::Ulid::new())),
            EditorSupervisor,
            EditorSupervisorArgs {
                edit_service: self.inner.edit_service.clone(),
            },
        )
        .await
        .map_err(|e| e.to_string())?;

        *guard = Some(supervisor.clone());
        Ok(supervisor)
    }

    /// Open a fresh editor session and return its id with the actor handle.
    pub async fn open_session(
        &self,
        user_id: String,
        content: String,
    ) -> Result<(String, ActorRef<EditorMsg>), String> {
        let supervisor = self.ensure_supervisor().await?;
        let session_id = ulid::Ulid::new().to_string();
        let session = ractor::call!(supervisor, |reply| {
            EditorSupervisorMsg::OpenSession {
                session_id: session_id.clone(),
                user_id,
                content,
                reply,
            }
        })
        .map_err(|e| e.to_string())??;
        Ok((session_id, session))
    }

    pub async fn resolve_session(
        &self,
        session_id: String,
    ) -> Result<Option<ActorRef<EditorMsg>>, String> {
        let supervisor = self.ensure_supervisor().await?;
        ractor::call!(supervisor, |reply| {
            EditorSupervisorMsg::Resolve { session_id, reply }
        })
        .map_err(|e| e.to_string())
    }

    /// Returns whether the session existed.
    pub async fn close_session(&self, session_id: String) -> Result<bool, String> {
        let supervisor = self.ensure_supervisor().await?;
        ractor::call!(supervisor, |reply| {
            EditorSupervisorMsg::CloseSession { session_id, reply }
        })
        .map_err(|e| e.to_string())
    }
}
